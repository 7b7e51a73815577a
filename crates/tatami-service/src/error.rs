use chrono::{DateTime, Utc};
use tatami_store::model::Booking;
use thiserror::Error;

/// Details of a detected double booking, surfaced so callers can render a
/// precise diagnostic.
#[derive(Debug, Clone)]
pub struct BookingConflict {
    /// The existing booking the candidate collides with.
    pub booking: Booking,
    /// For a collision with a recurring series, the start instant of the
    /// offending occurrence.
    pub occurrence: Option<DateTime<Utc>>,
    /// When a candidate series was being validated, the candidate occurrence
    /// that collided.
    pub candidate: Option<CandidateOccurrence>,
}

/// Position of a colliding occurrence within a candidate series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateOccurrence {
    pub index: usize,
    pub start: DateTime<Utc>,
}

impl std::fmt::Display for BookingConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "overlaps booking {}", self.booking.id)?;
        if let Some(occurrence) = self.occurrence {
            write!(f, " (occurrence at {occurrence})")?;
        }
        if let Some(candidate) = self.candidate {
            write!(
                f,
                "; candidate occurrence {} at {}",
                candidate.index, candidate.start
            )?;
        }
        Ok(())
    }
}

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    StoreError(#[from] tatami_store::error::StoreError),

    #[error(transparent)]
    CoreError(#[from] tatami_core::error::CoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(Box<BookingConflict>),
}

impl ServiceError {
    #[must_use]
    pub fn conflict(conflict: BookingConflict) -> Self {
        Self::Conflict(Box::new(conflict))
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
