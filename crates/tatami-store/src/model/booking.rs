//! Booking records and derived occurrences.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recurrence state carried by a recurring booking.
///
/// Present iff the booking is a recurring series; a single booking has no
/// rule and no exceptions, which the `Option` on [`Booking::recurrence`]
/// encodes structurally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRecurrence {
    /// RRULE-subset text, evaluated relative to the booking's start time.
    pub rule_text: String,
    /// Start instants of cancelled occurrences.
    pub exception_dates: Vec<DateTime<Utc>>,
}

impl SeriesRecurrence {
    #[must_use]
    pub fn new(rule_text: impl Into<String>) -> Self {
        Self {
            rule_text: rule_text.into(),
            exception_dates: Vec::new(),
        }
    }
}

/// A persisted room reservation.
///
/// The interval is half-open `[start_time, end_time)` with
/// `start_time < end_time`. For a recurring series the interval doubles as
/// the rule anchor and fixes the duration of every occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub title: String,
    /// Reference to an externally managed room.
    pub room_id: Uuid,
    pub owner_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub recurrence: Option<SeriesRecurrence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Fixed duration of the booking and, for a series, of every occurrence.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end_time - self.start_time
    }

    /// The occurrence of this booking starting at `start`.
    #[must_use]
    pub fn occurrence_at(&self, start: DateTime<Utc>) -> Occurrence {
        Occurrence {
            booking_id: self.id,
            start,
            end: start + self.duration(),
        }
    }
}

/// Insertion shape for a booking; the store assigns identity and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub title: String,
    pub room_id: Uuid,
    pub owner_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub recurrence: Option<SeriesRecurrence>,
}

/// One concrete instantiation of a booking's interval. Derived, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub booking_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
