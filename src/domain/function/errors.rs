//! Function Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("Invalid function name: {0}")]
    InvalidName(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Entrypoint file not found: {0}")]
    EntrypointNotFound(String),
}
