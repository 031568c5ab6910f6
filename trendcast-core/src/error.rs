use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Forum API error: {0}")]
    ForumApi(#[from] ForumApiError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Image generation error: {0}")]
    Image(#[from] ImageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Request failed: {message}")]
    RequestFailed {
        message: String,
        status_code: Option<u16>,
    },
}

#[derive(Error, Debug, Clone)]
pub enum ForumApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("API credentials are not configured")]
    CredentialsMissing,

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Channel not found: {channel}")]
    ChannelNotFound { channel: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Provider authentication failed: {provider}")]
    AuthenticationFailed { provider: String },

    #[error("API key invalid or missing for {provider}")]
    InvalidApiKey { provider: String },

    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    #[error("Model not available: {model}")]
    ModelNotAvailable { model: String },

    #[error("Provider service unavailable: {provider}")]
    ServiceUnavailable { provider: String },

    #[error("Request timeout for {provider}")]
    RequestTimeout { provider: String },

    #[error("Invalid response format from {provider}")]
    InvalidResponseFormat { provider: String },

    #[error("Empty completion from {provider}")]
    EmptyCompletion { provider: String },

    #[error("{provider} API error ({status_code}): {message}")]
    Api {
        provider: String,
        status_code: u16,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Prediction request rejected ({status_code}): {message}")]
    JobRejected { status_code: u16, message: String },

    #[error("Prediction response did not include a polling URL")]
    MissingPollingUrl,

    #[error("Prediction failed: {reason}")]
    JobFailed { reason: String },

    #[error("Prediction did not finish after {attempts} polls")]
    TimedOut { attempts: u32 },

    #[error("Prediction succeeded without any output")]
    NoOutput,

    #[error("Image download failed: {url}")]
    DownloadFailed { url: String },

    #[error("Image encoding failed: {reason}")]
    Encoding { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format: {details}")]
    InvalidFormat { details: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
