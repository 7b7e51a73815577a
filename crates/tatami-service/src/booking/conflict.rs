//! Read-only conflict detection for candidate intervals.

use chrono::{DateTime, Utc};
use tatami_recur::RecurrenceRule;
use tatami_store::BookingStore;
use tatami_store::model::Booking;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// The first live interval found to overlap a candidate.
#[derive(Debug, Clone)]
pub struct ConflictHit {
    /// The existing booking the candidate collides with.
    pub booking: Booking,
    /// Set when the collision is with an occurrence of a recurring series.
    pub occurrence: Option<DateTime<Utc>>,
}

/// Checks candidate intervals against a room's existing bookings.
///
/// Existence check only: the first match in store iteration order is
/// reported, with no attempt to find a "best" conflict.
pub struct ConflictDetector<'a, S> {
    store: &'a S,
    max_occurrences: u16,
}

impl<'a, S: BookingStore> ConflictDetector<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, max_occurrences: u16) -> Self {
        Self {
            store,
            max_occurrences,
        }
    }

    /// ## Summary
    /// Determines whether `[start, end)` in the given room overlaps any live
    /// single booking or series occurrence, skipping `exclude` if given.
    ///
    /// Recurring series are expanded over the candidate window buffered on
    /// both sides by `max(series duration, candidate duration)`, so an
    /// occurrence that starts before the candidate but runs into it is
    /// always materialized.
    ///
    /// ## Errors
    /// A stored series whose rule no longer parses is a data-integrity
    /// problem: it is logged and surfaced as a validation error rather than
    /// silently skipped.
    pub async fn check(
        &self,
        room_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> ServiceResult<Option<ConflictHit>> {
        if let Some(single) = self
            .store
            .find_overlapping_single(room_id, start, end, exclude)
            .await?
        {
            tracing::debug!(
                room_id = %room_id,
                conflicting = %single.id,
                "Candidate overlaps a single booking"
            );
            return Ok(Some(ConflictHit {
                booking: single,
                occurrence: None,
            }));
        }

        let candidate_duration = end - start;
        for series in self.store.find_recurring_series(room_id, exclude).await? {
            let Some(recurrence) = series.recurrence.clone() else {
                continue;
            };
            let rule = match RecurrenceRule::parse(&recurrence.rule_text, series.start_time) {
                Ok(rule) => rule,
                Err(err) => {
                    tracing::warn!(
                        booking_id = %series.id,
                        rule = %recurrence.rule_text,
                        error = %err,
                        "Stored recurrence rule failed to parse"
                    );
                    return Err(ServiceError::ValidationError(format!(
                        "stored recurrence rule of booking {} is invalid: {err}",
                        series.id
                    )));
                }
            };

            let buffer = series.duration().max(candidate_duration);
            let occurrences = rule
                .expand(
                    &recurrence.exception_dates,
                    start - buffer,
                    end + buffer,
                    self.max_occurrences,
                )
                .map_err(|err| {
                    ServiceError::ValidationError(format!(
                        "cannot expand recurrence of booking {}: {err}",
                        series.id
                    ))
                })?;

            for occurrence_start in occurrences {
                let occurrence_end = occurrence_start + series.duration();
                if occurrence_start < end && occurrence_end > start {
                    tracing::debug!(
                        room_id = %room_id,
                        conflicting = %series.id,
                        occurrence = %occurrence_start,
                        "Candidate overlaps a series occurrence"
                    );
                    return Ok(Some(ConflictHit {
                        booking: series,
                        occurrence: Some(occurrence_start),
                    }));
                }
            }
        }

        Ok(None)
    }
}
