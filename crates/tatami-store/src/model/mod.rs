//! Persisted and derived data model.

pub mod booking;
pub mod room;

pub use booking::{Booking, NewBooking, Occurrence, SeriesRecurrence};
pub use room::{NewRoom, Room};
