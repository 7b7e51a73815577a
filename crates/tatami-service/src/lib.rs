//! Booking engine service layer.
//!
//! [`booking::BookingService`] orchestrates scope-aware create/update/delete
//! over an abstract store, with [`booking::ConflictDetector`] guaranteeing
//! that no room is ever double-booked. All mutations of a room run inside
//! that room's critical section for the full check-then-write sequence.

pub mod booking;
pub mod error;

pub use booking::{
    BookingService, ConflictDetector, CreateBooking, DeleteOutcome, ScheduleEntry, UpdateBooking,
    UpdateOutcome,
};
pub use error::{BookingConflict, CandidateOccurrence, ServiceError, ServiceResult};
