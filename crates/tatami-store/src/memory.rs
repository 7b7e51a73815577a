//! In-memory reference store.
//!
//! Backs the workspace tests and embedders that do not bring their own
//! persistence. Interior mutability via `tokio::sync::RwLock`; iteration
//! order for queries is insertion order, which keeps conflict reporting
//! deterministic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::model::{Booking, NewBooking, NewRoom, Room};
use crate::store::{BookingStore, RoomDirectory};

#[derive(Debug, Default)]
pub struct MemoryStore {
    bookings: RwLock<Vec<Booking>>,
    rooms: RwLock<HashMap<Uuid, Room>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn overlaps(booking: &Booking, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    booking.start_time < end && booking.end_time > start
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn find_overlapping_single(
        &self,
        room_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .iter()
            .find(|b| {
                b.room_id == room_id
                    && !b.is_recurring()
                    && Some(b.id) != exclude
                    && overlaps(b, start, end)
            })
            .cloned())
    }

    async fn find_recurring_series(
        &self,
        room_id: Uuid,
        exclude: Option<Uuid>,
    ) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .iter()
            .filter(|b| b.room_id == room_id && b.is_recurring() && Some(b.id) != exclude)
            .cloned()
            .collect())
    }

    async fn list_bookings(&self, room_id: Option<Uuid>) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .iter()
            .filter(|b| room_id.is_none_or(|room| b.room_id == room))
            .cloned()
            .collect())
    }

    async fn insert(&self, booking: NewBooking) -> StoreResult<Booking> {
        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            title: booking.title,
            room_id: booking.room_id,
            owner_id: booking.owner_id,
            start_time: booking.start_time,
            end_time: booking.end_time,
            recurrence: booking.recurrence,
            created_at: now,
            updated_at: now,
        };
        tracing::trace!(booking_id = %booking.id, room_id = %booking.room_id, "Inserted booking");
        self.bookings.write().await.push(booking.clone());
        Ok(booking)
    }

    async fn replace(&self, mut booking: Booking) -> StoreResult<Booking> {
        let mut bookings = self.bookings.write().await;
        let slot = bookings
            .iter_mut()
            .find(|b| b.id == booking.id)
            .ok_or_else(|| StoreError::NotFound(format!("booking {}", booking.id)))?;
        booking.updated_at = Utc::now();
        *slot = booking.clone();
        Ok(booking)
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<()> {
        let mut bookings = self.bookings.write().await;
        let before = bookings.len();
        bookings.retain(|b| b.id != id);
        if bookings.len() == before {
            return Err(StoreError::NotFound(format!("booking {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RoomDirectory for MemoryStore {
    async fn room_exists(&self, room_id: Uuid) -> StoreResult<bool> {
        Ok(self.rooms.read().await.contains_key(&room_id))
    }

    async fn insert_room(&self, room: NewRoom) -> StoreResult<Room> {
        let room = Room {
            id: Uuid::new_v4(),
            name: room.name,
            capacity: room.capacity,
        };
        self.rooms.write().await.insert(room.id, room.clone());
        Ok(room)
    }
}
