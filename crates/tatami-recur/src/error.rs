use thiserror::Error;

/// Recurrence layer errors
#[derive(Error, Debug)]
pub enum RecurError {
    #[error("Empty recurrence rule")]
    EmptyRule,

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Unsupported frequency: {0}")]
    UnsupportedFrequency(String),

    #[error("COUNT and UNTIL are mutually exclusive in a recurrence rule")]
    ConflictingBounds,

    #[error("Rule expands to more than {limit} occurrences in the window")]
    TooManyOccurrences { limit: u16 },
}

pub type RecurResult<T> = std::result::Result<T, RecurError>;
