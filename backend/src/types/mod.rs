mod environment;
mod error;

pub use environment::{ConfigError, Environment, StorageMode};
pub use error::{ApiErrorResponse, AppError};
