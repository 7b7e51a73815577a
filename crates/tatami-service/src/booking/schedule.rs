//! Materialized calendar view over a time window.

use chrono::{DateTime, Utc};
use tatami_recur::RecurrenceRule;
use tatami_store::{BookingStore, RoomDirectory};
use uuid::Uuid;

use crate::booking::service::BookingService;
use crate::error::{ServiceError, ServiceResult};

/// One concrete calendar slot: a single booking or one materialized
/// occurrence of a recurring series.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub booking_id: Uuid,
    pub room_id: Uuid,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub recurring: bool,
}

impl<S: BookingStore + RoomDirectory> BookingService<S> {
    /// ## Summary
    /// Lists every concrete slot inside `[window_start, window_end]`,
    /// optionally restricted to one room. Single bookings appear when they
    /// lie fully inside the window; recurring bookings are expanded with
    /// their exceptions applied. Entries are sorted by start instant.
    ///
    /// ## Errors
    /// `ValidationError` for an inverted window or when a stored series
    /// carries a rule that no longer parses.
    pub async fn schedule(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        room_id: Option<Uuid>,
    ) -> ServiceResult<Vec<ScheduleEntry>> {
        if window_start >= window_end {
            return Err(ServiceError::ValidationError(
                "window start must be before window end".into(),
            ));
        }

        let mut entries = Vec::new();
        for booking in self.store().list_bookings(room_id).await? {
            match &booking.recurrence {
                Some(recurrence) => {
                    let rule = RecurrenceRule::parse(&recurrence.rule_text, booking.start_time)
                        .map_err(|err| {
                            tracing::warn!(
                                booking_id = %booking.id,
                                rule = %recurrence.rule_text,
                                error = %err,
                                "Stored recurrence rule failed to parse"
                            );
                            ServiceError::ValidationError(format!(
                                "stored recurrence rule of booking {} is invalid: {err}",
                                booking.id
                            ))
                        })?;
                    let occurrences = rule
                        .expand(
                            &recurrence.exception_dates,
                            window_start,
                            window_end,
                            self.max_occurrences(),
                        )
                        .map_err(|err| {
                            ServiceError::ValidationError(format!(
                                "cannot expand recurrence of booking {}: {err}",
                                booking.id
                            ))
                        })?;
                    let duration = booking.duration();
                    for start in occurrences {
                        entries.push(ScheduleEntry {
                            booking_id: booking.id,
                            room_id: booking.room_id,
                            title: booking.title.clone(),
                            start,
                            end: start + duration,
                            recurring: true,
                        });
                    }
                }
                None => {
                    if booking.start_time >= window_start && booking.end_time <= window_end {
                        entries.push(ScheduleEntry {
                            booking_id: booking.id,
                            room_id: booking.room_id,
                            title: booking.title.clone(),
                            start: booking.start_time,
                            end: booking.end_time,
                            recurring: false,
                        });
                    }
                }
            }
        }

        entries.sort_by_key(|entry| entry.start);
        Ok(entries)
    }
}
