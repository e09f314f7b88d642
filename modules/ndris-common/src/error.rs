use thiserror::Error;

#[derive(Error, Debug)]
pub enum NdrisError {
    /// Store unreachable or a read/write against it failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type NdrisResult<T> = std::result::Result<T, NdrisError>;

impl NdrisError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
