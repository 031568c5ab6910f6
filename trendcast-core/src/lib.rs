pub mod config;
pub mod digest;
pub mod error;
pub mod error_utils;
pub mod extract;
pub mod types;

pub use config::*;
pub use digest::*;
pub use error::*;
pub use error_utils::*;
pub use extract::*;
pub use types::*;
