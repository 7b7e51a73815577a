use thiserror::Error;

/// Store layer errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    CoreError(#[from] tatami_core::error::CoreError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
