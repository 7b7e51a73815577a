//! Scope-aware booking mutations.
//!
//! Every mutation runs inside its room's critical section for the full
//! check-then-write sequence. The `instance` and `future` scopes validate
//! the replacement or continuation *before* committing any change to the
//! original series, so a rejected edit never leaves the series mutilated.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tatami_core::config::BookingConfig;
use tatami_core::types::Scope;
use tatami_recur::RecurrenceRule;
use tatami_store::model::{Booking, NewBooking, SeriesRecurrence};
use tatami_store::{BookingStore, RoomDirectory};
use uuid::Uuid;

use crate::booking::conflict::{ConflictDetector, ConflictHit};
use crate::booking::locks::RoomLocks;
use crate::error::{BookingConflict, CandidateOccurrence, ServiceError, ServiceResult};

/// Parameters for creating a booking. A present `recurrence_rule` makes the
/// booking a recurring series anchored at `start_time`.
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub title: String,
    pub room_id: Uuid,
    pub owner_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub recurrence_rule: Option<String>,
}

/// Field-wise changes for an update; absent fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct UpdateBooking {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub recurrence_rule: Option<String>,
}

/// What an update produced.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// The booking was changed in place.
    Updated(Booking),
    /// One occurrence was cancelled from the series and replaced by a
    /// detached single booking.
    InstanceDetached { series: Booking, replacement: Booking },
    /// The series was split: the original truncated, the continuation
    /// persisted as an independent series.
    SeriesSplit {
        truncated: Booking,
        continuation: Booking,
    },
}

/// What a delete produced.
#[derive(Debug, Clone)]
pub enum DeleteOutcome {
    /// The booking record was removed.
    Deleted,
    /// One occurrence was soft-cancelled via an exception date.
    InstanceCancelled(Booking),
    /// The series was truncated to end before the named occurrence.
    FutureCancelled(Booking),
}

/// Orchestrates create/update/delete with scope semantics over an abstract
/// store, never committing a double booking.
pub struct BookingService<S> {
    store: Arc<S>,
    locks: RoomLocks,
    config: BookingConfig,
}

impl<S: BookingStore + RoomDirectory> BookingService<S> {
    #[must_use]
    pub fn new(store: Arc<S>, config: BookingConfig) -> Self {
        Self {
            store,
            locks: RoomLocks::new(),
            config,
        }
    }

    pub(crate) fn detector(&self) -> ConflictDetector<'_, S> {
        ConflictDetector::new(self.store.as_ref(), self.config.max_occurrences)
    }

    pub(crate) fn store(&self) -> &S {
        self.store.as_ref()
    }

    pub(crate) const fn max_occurrences(&self) -> u16 {
        self.config.max_occurrences
    }

    fn horizon(&self) -> TimeDelta {
        TimeDelta::days(self.config.horizon_days)
    }

    /// ## Summary
    /// Creates a single booking or a recurring series.
    ///
    /// A recurring series is validated occurrence by occurrence up to its
    /// horizon (UNTIL, else anchor + configured horizon) before anything is
    /// persisted; the first collision rejects the whole creation.
    ///
    /// ## Errors
    /// `ValidationError` for an empty title, inverted interval, or a rule
    /// outside the supported grammar; `NotFound` for an unknown room;
    /// `Conflict` when any validated interval overlaps a live booking.
    pub async fn create(&self, spec: CreateBooking) -> ServiceResult<Booking> {
        if spec.title.trim().is_empty() {
            return Err(ServiceError::ValidationError("title is required".into()));
        }
        validate_interval(spec.start_time, spec.end_time)?;
        if !self.store.room_exists(spec.room_id).await? {
            return Err(ServiceError::NotFound(format!("room {}", spec.room_id)));
        }

        let _guard = self.locks.acquire(spec.room_id).await;
        match &spec.recurrence_rule {
            None => {
                if let Some(hit) = self
                    .detector()
                    .check(spec.room_id, spec.start_time, spec.end_time, None)
                    .await?
                {
                    return Err(conflict_error(hit, None));
                }
                let booking = self.insert_from_spec(spec, None).await?;
                tracing::info!(booking_id = %booking.id, room_id = %booking.room_id, "Created booking");
                Ok(booking)
            }
            Some(rule_text) => {
                let rule = RecurrenceRule::parse(rule_text, spec.start_time)
                    .map_err(|err| ServiceError::ValidationError(err.to_string()))?;
                let horizon = rule.validation_horizon(self.horizon());
                let occurrences = rule
                    .expand(&[], spec.start_time, horizon, self.config.max_occurrences)
                    .map_err(|err| ServiceError::ValidationError(err.to_string()))?;
                let duration = spec.end_time - spec.start_time;

                for (index, start) in occurrences.iter().enumerate() {
                    if let Some(hit) = self
                        .detector()
                        .check(spec.room_id, *start, *start + duration, None)
                        .await?
                    {
                        return Err(conflict_error(
                            hit,
                            Some(CandidateOccurrence {
                                index,
                                start: *start,
                            }),
                        ));
                    }
                }

                let recurrence = SeriesRecurrence::new(rule_text.clone());
                let booking = self.insert_from_spec(spec, Some(recurrence)).await?;
                tracing::info!(
                    booking_id = %booking.id,
                    room_id = %booking.room_id,
                    occurrences = occurrences.len(),
                    "Created recurring series"
                );
                Ok(booking)
            }
        }
    }

    /// ## Summary
    /// Applies an update with `all`, `instance`, or `future` scope.
    ///
    /// For a single booking every scope behaves like `all`. The `instance`
    /// and `future` scopes require `instance_date` and validate the
    /// replacement or continuation before mutating the series. A `future`
    /// cutoff at or before the first occurrence replaces the series record
    /// wholesale rather than splitting it.
    ///
    /// ## Errors
    /// `NotFound` for an unknown booking; `ValidationError` for a missing
    /// `instance_date`, missing continuation rule, or malformed input;
    /// `Conflict` when the resulting interval or any continuation
    /// occurrence overlaps a live booking.
    pub async fn update(
        &self,
        id: Uuid,
        changes: UpdateBooking,
        scope: Scope,
        instance_date: Option<DateTime<Utc>>,
    ) -> ServiceResult<UpdateOutcome> {
        let booking = self.fetch_required(id).await?;
        let _guard = self.locks.acquire(booking.room_id).await;
        // Re-read under the lock; the record may have changed meanwhile.
        let booking = self.fetch_required(id).await?;

        if booking.is_recurring() {
            match scope {
                Scope::All => self.update_all(booking, changes).await,
                Scope::Instance => {
                    let instance_date = require_instance_date(scope, instance_date)?;
                    self.update_instance(booking, changes, instance_date).await
                }
                Scope::Future => {
                    let instance_date = require_instance_date(scope, instance_date)?;
                    self.update_future(booking, changes, instance_date).await
                }
            }
        } else {
            self.update_all(booking, changes).await
        }
    }

    /// ## Summary
    /// Deletes with `all`, `instance`, or `future` scope: hard delete,
    /// soft-cancel one occurrence, or truncate the series. A `future`
    /// cutoff at or before the first occurrence leaves nothing, so the
    /// record is removed outright.
    ///
    /// ## Errors
    /// `NotFound` for an unknown booking; `ValidationError` for a missing
    /// `instance_date` or a corrupt stored rule.
    pub async fn delete(
        &self,
        id: Uuid,
        scope: Scope,
        instance_date: Option<DateTime<Utc>>,
    ) -> ServiceResult<DeleteOutcome> {
        let booking = self.fetch_required(id).await?;
        let _guard = self.locks.acquire(booking.room_id).await;
        let mut booking = self.fetch_required(id).await?;

        if !booking.is_recurring() || scope == Scope::All {
            self.store.delete_by_id(booking.id).await?;
            tracing::info!(booking_id = %booking.id, "Deleted booking");
            return Ok(DeleteOutcome::Deleted);
        }

        let instance_date = require_instance_date(scope, instance_date)?;
        if scope == Scope::Instance {
            if let Some(recurrence) = booking.recurrence.as_mut() {
                recurrence.exception_dates.push(instance_date);
            }
            let series = self.store.replace(booking).await?;
            tracing::info!(
                booking_id = %series.id,
                occurrence = %instance_date,
                "Cancelled one occurrence"
            );
            Ok(DeleteOutcome::InstanceCancelled(series))
        } else {
            let Some(truncated_text) = self.truncated_rule_text(&booking, instance_date)? else {
                // No occurrence survives the cutoff; remove the record.
                self.store.delete_by_id(booking.id).await?;
                tracing::info!(
                    booking_id = %booking.id,
                    cutoff = %instance_date,
                    "Cancelled entire series"
                );
                return Ok(DeleteOutcome::Deleted);
            };
            if let Some(recurrence) = booking.recurrence.as_mut() {
                recurrence.rule_text = truncated_text;
            }
            let series = self.store.replace(booking).await?;
            tracing::info!(
                booking_id = %series.id,
                cutoff = %instance_date,
                "Cancelled series from occurrence onwards"
            );
            Ok(DeleteOutcome::FutureCancelled(series))
        }
    }

    async fn update_all(
        &self,
        mut booking: Booking,
        changes: UpdateBooking,
    ) -> ServiceResult<UpdateOutcome> {
        let start = changes.start_time.unwrap_or(booking.start_time);
        let end = changes.end_time.unwrap_or(booking.end_time);
        validate_interval(start, end)?;
        if let Some(title) = &changes.title
            && title.trim().is_empty()
        {
            return Err(ServiceError::ValidationError("title is required".into()));
        }

        if let Some(hit) = self
            .detector()
            .check(booking.room_id, start, end, Some(booking.id))
            .await?
        {
            return Err(conflict_error(hit, None));
        }

        if let Some(title) = changes.title {
            booking.title = title;
        }
        booking.start_time = start;
        booking.end_time = end;
        if let Some(rule_text) = changes.recurrence_rule
            && let Some(recurrence) = booking.recurrence.as_mut()
        {
            RecurrenceRule::parse(&rule_text, start)
                .map_err(|err| ServiceError::ValidationError(err.to_string()))?;
            recurrence.rule_text = rule_text;
        }

        let updated = self.store.replace(booking).await?;
        tracing::info!(booking_id = %updated.id, "Updated booking");
        Ok(UpdateOutcome::Updated(updated))
    }

    async fn update_instance(
        &self,
        booking: Booking,
        changes: UpdateBooking,
        instance_date: DateTime<Utc>,
    ) -> ServiceResult<UpdateOutcome> {
        let Some(recurrence) = booking.recurrence.clone() else {
            return Err(ServiceError::ValidationError(
                "instance scope requires a recurring booking".into(),
            ));
        };
        let duration = booking.duration();
        let start = changes.start_time.unwrap_or(instance_date);
        let end = changes.end_time.unwrap_or(start + duration);
        validate_interval(start, end)?;

        let rule = self.parse_stored_rule(&booking)?;

        // The replacement is a brand-new independent booking: check it
        // against everything else, then against what would remain of this
        // series once the occurrence is cancelled.
        if let Some(hit) = self
            .detector()
            .check(booking.room_id, start, end, Some(booking.id))
            .await?
        {
            return Err(conflict_error(hit, None));
        }
        let mut hypothetical = recurrence.exception_dates.clone();
        hypothetical.push(instance_date);
        if let Some(occurrence) =
            self.first_own_overlap(&rule, &hypothetical, duration, start, end)?
        {
            return Err(conflict_error(
                ConflictHit {
                    booking: booking.clone(),
                    occurrence: Some(occurrence),
                },
                None,
            ));
        }

        // Validation passed; now commit both writes.
        let mut series = booking.clone();
        if let Some(recurrence) = series.recurrence.as_mut() {
            recurrence.exception_dates.push(instance_date);
        }
        let series = self.store.replace(series).await?;
        let replacement = self
            .store
            .insert(NewBooking {
                title: changes.title.unwrap_or_else(|| booking.title.clone()),
                room_id: booking.room_id,
                owner_id: booking.owner_id.clone(),
                start_time: start,
                end_time: end,
                recurrence: None,
            })
            .await?;
        tracing::info!(
            series_id = %series.id,
            replacement_id = %replacement.id,
            occurrence = %instance_date,
            "Detached one occurrence"
        );
        Ok(UpdateOutcome::InstanceDetached {
            series,
            replacement,
        })
    }

    async fn update_future(
        &self,
        booking: Booking,
        changes: UpdateBooking,
        instance_date: DateTime<Utc>,
    ) -> ServiceResult<UpdateOutcome> {
        let Some(recurrence) = booking.recurrence.clone() else {
            return Err(ServiceError::ValidationError(
                "future scope requires a recurring booking".into(),
            ));
        };
        let rule_text = changes.recurrence_rule.ok_or_else(|| {
            ServiceError::ValidationError(
                "a recurrence rule is required for the continuation series".into(),
            )
        })?;

        let series_duration = booking.duration();
        let start = changes.start_time.unwrap_or(instance_date);
        let end = changes.end_time.unwrap_or(start + series_duration);
        validate_interval(start, end)?;
        let continuation_duration = end - start;

        let original_rule = self.parse_stored_rule(&booking)?;
        let truncated_rule = original_rule
            .truncate_before(instance_date)
            .map_err(|err| ServiceError::ValidationError(err.to_string()))?;
        let continuation_rule = RecurrenceRule::parse(&rule_text, start)
            .map_err(|err| ServiceError::ValidationError(err.to_string()))?;

        let horizon = continuation_rule.validation_horizon(self.horizon());
        let occurrences = continuation_rule
            .expand(&[], start, horizon, self.config.max_occurrences)
            .map_err(|err| ServiceError::ValidationError(err.to_string()))?;

        // Everything the truncated original will still generate, widened so
        // boundary occurrences running into the continuation are seen.
        let buffer = series_duration.max(continuation_duration);
        let remaining = match &truncated_rule {
            Some(rule) => rule
                .expand(
                    &recurrence.exception_dates,
                    start - buffer,
                    horizon + buffer,
                    self.config.max_occurrences,
                )
                .map_err(|err| ServiceError::ValidationError(err.to_string()))?,
            None => Vec::new(),
        };

        self.check_continuation(&booking, &occurrences, continuation_duration, &remaining)
            .await?;

        // Validation passed. A cutoff at or before the first occurrence
        // leaves nothing of the original to split off, so the continuation
        // takes over the record instead.
        let Some(truncated_rule) = truncated_rule else {
            return self
                .replace_series(booking, changes.title, start, end, rule_text, instance_date)
                .await;
        };

        // Truncate the original, then persist the continuation as an
        // independent series.
        let mut truncated = booking.clone();
        if let Some(recurrence) = truncated.recurrence.as_mut() {
            recurrence.rule_text = truncated_rule.as_str().to_string();
        }
        let truncated = self.store.replace(truncated).await?;
        let continuation = self
            .store
            .insert(NewBooking {
                title: changes.title.unwrap_or_else(|| booking.title.clone()),
                room_id: booking.room_id,
                owner_id: booking.owner_id.clone(),
                start_time: start,
                end_time: end,
                recurrence: Some(SeriesRecurrence::new(rule_text)),
            })
            .await?;
        tracing::info!(
            truncated_id = %truncated.id,
            continuation_id = %continuation.id,
            cutoff = %instance_date,
            "Split series"
        );
        Ok(UpdateOutcome::SeriesSplit {
            truncated,
            continuation,
        })
    }

    /// Hands an existing series record over to its continuation: same
    /// identity, new interval and rule, exceptions cleared.
    async fn replace_series(
        &self,
        mut booking: Booking,
        title: Option<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        rule_text: String,
        cutoff: DateTime<Utc>,
    ) -> ServiceResult<UpdateOutcome> {
        if let Some(title) = title {
            booking.title = title;
        }
        booking.start_time = start;
        booking.end_time = end;
        booking.recurrence = Some(SeriesRecurrence::new(rule_text));
        let updated = self.store.replace(booking).await?;
        tracing::info!(
            booking_id = %updated.id,
            cutoff = %cutoff,
            "Replaced series from its first occurrence"
        );
        Ok(UpdateOutcome::Updated(updated))
    }

    /// Checks every continuation occurrence against the store and against
    /// what the truncated original series will still generate.
    async fn check_continuation(
        &self,
        booking: &Booking,
        occurrences: &[DateTime<Utc>],
        continuation_duration: TimeDelta,
        remaining: &[DateTime<Utc>],
    ) -> ServiceResult<()> {
        let series_duration = booking.duration();
        for (index, occ_start) in occurrences.iter().enumerate() {
            let occ_end = *occ_start + continuation_duration;
            if let Some(hit) = self
                .detector()
                .check(booking.room_id, *occ_start, occ_end, Some(booking.id))
                .await?
            {
                return Err(conflict_error(
                    hit,
                    Some(CandidateOccurrence {
                        index,
                        start: *occ_start,
                    }),
                ));
            }
            if let Some(own) = remaining
                .iter()
                .find(|own| **own < occ_end && **own + series_duration > *occ_start)
            {
                return Err(conflict_error(
                    ConflictHit {
                        booking: booking.clone(),
                        occurrence: Some(*own),
                    },
                    Some(CandidateOccurrence {
                        index,
                        start: *occ_start,
                    }),
                ));
            }
        }
        Ok(())
    }

    /// First occurrence of `rule` (under the given exceptions) overlapping
    /// `[start, end)`, searching a window buffered by the larger duration.
    fn first_own_overlap(
        &self,
        rule: &RecurrenceRule,
        exceptions: &[DateTime<Utc>],
        series_duration: TimeDelta,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Option<DateTime<Utc>>> {
        let buffer = series_duration.max(end - start);
        let occurrences = rule
            .expand(
                exceptions,
                start - buffer,
                end + buffer,
                self.config.max_occurrences,
            )
            .map_err(|err| ServiceError::ValidationError(err.to_string()))?;
        Ok(occurrences
            .into_iter()
            .find(|occ| *occ < end && *occ + series_duration > start))
    }

    fn parse_stored_rule(&self, booking: &Booking) -> ServiceResult<RecurrenceRule> {
        let Some(recurrence) = &booking.recurrence else {
            return Err(ServiceError::ValidationError(format!(
                "booking {} is not recurring",
                booking.id
            )));
        };
        RecurrenceRule::parse(&recurrence.rule_text, booking.start_time).map_err(|err| {
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
        })
    }

    fn truncated_rule_text(
        &self,
        booking: &Booking,
        cutoff: DateTime<Utc>,
    ) -> ServiceResult<Option<String>> {
        let rule = self.parse_stored_rule(booking)?;
        let truncated = rule
            .truncate_before(cutoff)
            .map_err(|err| ServiceError::ValidationError(err.to_string()))?;
        Ok(truncated.map(|rule| rule.as_str().to_string()))
    }

    async fn insert_from_spec(
        &self,
        spec: CreateBooking,
        recurrence: Option<SeriesRecurrence>,
    ) -> ServiceResult<Booking> {
        Ok(self
            .store
            .insert(NewBooking {
                title: spec.title,
                room_id: spec.room_id,
                owner_id: spec.owner_id,
                start_time: spec.start_time,
                end_time: spec.end_time,
                recurrence,
            })
            .await?)
    }

    async fn fetch_required(&self, id: Uuid) -> ServiceResult<Booking> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("booking {id}")))
    }
}

fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> ServiceResult<()> {
    if start >= end {
        return Err(ServiceError::ValidationError(
            "start_time must be before end_time".into(),
        ));
    }
    Ok(())
}

fn require_instance_date(
    scope: Scope,
    instance_date: Option<DateTime<Utc>>,
) -> ServiceResult<DateTime<Utc>> {
    instance_date.ok_or_else(|| {
        ServiceError::ValidationError(format!("instance date is required for scope {scope}"))
    })
}

fn conflict_error(hit: ConflictHit, candidate: Option<CandidateOccurrence>) -> ServiceError {
    ServiceError::conflict(BookingConflict {
        booking: hit.booking,
        occurrence: hit.occurrence,
        candidate,
    })
}
