//! Scope-aware booking mutations, conflict detection, and schedule views.

pub mod conflict;
pub mod locks;
pub mod schedule;
pub mod service;

pub use conflict::{ConflictDetector, ConflictHit};
pub use locks::RoomLocks;
pub use schedule::ScheduleEntry;
pub use service::{BookingService, CreateBooking, DeleteOutcome, UpdateBooking, UpdateOutcome};
