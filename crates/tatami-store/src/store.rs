//! Abstract persistence consumed by the booking engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::model::{Booking, NewBooking, NewRoom, Room};

/// Query and mutation surface for booking records.
///
/// Implementations are expected to be cheap to query; the engine performs no
/// caching of its own. None of the methods enforce conflict invariants; that
/// is the engine's job.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// ## Summary
    /// Looks up a booking by id.
    ///
    /// ## Errors
    /// Returns an error if the underlying store fails.
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// ## Summary
    /// Finds the first single (non-recurring) booking of the room whose
    /// interval overlaps `[start, end)` under half-open semantics, skipping
    /// `exclude` if given.
    ///
    /// ## Errors
    /// Returns an error if the underlying store fails.
    async fn find_overlapping_single(
        &self,
        room_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Booking>>;

    /// ## Summary
    /// All recurring series of the room, skipping `exclude` if given.
    ///
    /// ## Errors
    /// Returns an error if the underlying store fails.
    async fn find_recurring_series(
        &self,
        room_id: Uuid,
        exclude: Option<Uuid>,
    ) -> StoreResult<Vec<Booking>>;

    /// ## Summary
    /// All bookings, optionally restricted to one room. Used by schedule
    /// materialization.
    ///
    /// ## Errors
    /// Returns an error if the underlying store fails.
    async fn list_bookings(&self, room_id: Option<Uuid>) -> StoreResult<Vec<Booking>>;

    /// ## Summary
    /// Persists a new booking, assigning identity and timestamps.
    ///
    /// ## Errors
    /// Returns an error if the underlying store fails.
    async fn insert(&self, booking: NewBooking) -> StoreResult<Booking>;

    /// ## Summary
    /// Replaces a persisted booking in full, refreshing `updated_at`.
    ///
    /// ## Errors
    /// Returns `NotFound` if no booking with that id exists.
    async fn replace(&self, booking: Booking) -> StoreResult<Booking>;

    /// ## Summary
    /// Hard-deletes a booking.
    ///
    /// ## Errors
    /// Returns `NotFound` if no booking with that id exists.
    async fn delete_by_id(&self, id: Uuid) -> StoreResult<()>;
}

/// Externally managed room directory.
///
/// The engine only checks existence; it never creates rooms implicitly.
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// ## Summary
    /// Whether a room with this id exists.
    ///
    /// ## Errors
    /// Returns an error if the underlying store fails.
    async fn room_exists(&self, room_id: Uuid) -> StoreResult<bool>;

    /// ## Summary
    /// Adds a room to the directory. For embedders and tests; never called
    /// by the engine.
    ///
    /// ## Errors
    /// Returns an error if the underlying store fails.
    async fn insert_room(&self, room: NewRoom) -> StoreResult<Room>;
}
