pub mod claude;
pub mod insight;
pub mod prompts;
#[cfg(any(test, feature = "test-support"))]
pub mod scripted;

pub use claude::ClaudeProvider;
pub use insight::{parse_topics, InsightExtractor};
pub use prompts::{apply_prompts, fallback_prompt, PromptSynthesizer};

use trendcast_core::CoreError;

/// A chat-completion backend that answers a single user prompt.
pub trait LlmProvider {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, CoreError>;
}
