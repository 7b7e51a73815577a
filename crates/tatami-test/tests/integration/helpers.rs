#![allow(clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Each harness owns an isolated in-memory store with one pre-seeded room,
//! so tests run in parallel without contention.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use tatami_test::component::config::BookingConfig;
use tatami_test::component::model::NewRoom;
use tatami_test::component::store::{MemoryStore, RoomDirectory};
use tatami_test::component::{BookingService, CreateBooking, ScheduleEntry, UpdateBooking};

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub service: Arc<BookingService<MemoryStore>>,
    pub room_id: Uuid,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let room = store
            .insert_room(NewRoom {
                name: "Tatami A".to_string(),
                capacity: 8,
            })
            .await
            .expect("Failed to seed room");
        let service = Arc::new(BookingService::new(
            Arc::clone(&store),
            BookingConfig::default(),
        ));
        Self {
            store,
            service,
            room_id: room.id,
        }
    }

    /// Seeds an additional room and returns its id.
    pub async fn extra_room(&self, name: &str) -> Uuid {
        self.store
            .insert_room(NewRoom {
                name: name.to_string(),
                capacity: 4,
            })
            .await
            .expect("Failed to seed room")
            .id
    }

    /// Schedule entries of the seeded room over `[start, end]`.
    pub async fn room_schedule(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<ScheduleEntry> {
        self.service
            .schedule(start, end, Some(self.room_id))
            .await
            .expect("Failed to list schedule")
    }
}

/// `2026-03-<day>T<hour>:00:00Z`. March 2, 2026 is a Monday.
pub fn instant(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0)
        .single()
        .expect("valid instant")
}

pub fn single(room_id: Uuid, day: u32, from: u32, to: u32) -> CreateBooking {
    CreateBooking {
        title: "Meeting".to_string(),
        room_id,
        owner_id: "alice".to_string(),
        start_time: instant(day, from),
        end_time: instant(day, to),
        recurrence_rule: None,
    }
}

pub fn series(room_id: Uuid, rule: &str, day: u32, from: u32, to: u32) -> CreateBooking {
    CreateBooking {
        recurrence_rule: Some(rule.to_string()),
        ..single(room_id, day, from, to)
    }
}

/// An update that only moves the interval.
pub fn reschedule(day: u32, from: u32, to: u32) -> UpdateBooking {
    UpdateBooking {
        start_time: Some(instant(day, from)),
        end_time: Some(instant(day, to)),
        ..UpdateBooking::default()
    }
}
