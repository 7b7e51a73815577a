//! Parsed, anchor-bound recurrence rules.

use chrono::{DateTime, TimeDelta, Utc, Weekday};
use rrule::{Frequency, NWeekday, RRule, RRuleSet, Tz, Unvalidated};

use crate::error::{RecurError, RecurResult};

/// An immutable recurrence rule bound to its anchor instant.
///
/// Grammar is the RFC 5545 RRULE subset: `FREQ` (required, one of
/// DAILY/WEEKLY/MONTHLY/YEARLY), `INTERVAL`, `COUNT` xor `UNTIL`, `BYDAY`.
/// The anchor plays the role of DTSTART and is supplied by the caller, never
/// embedded in the rule text.
#[derive(Debug, Clone)]
pub struct RecurrenceRule {
    set: RRuleSet,
    anchor: DateTime<Utc>,
    until: Option<DateTime<Utc>>,
    text: String,
}

impl RecurrenceRule {
    /// ## Summary
    /// Parses rule text relative to an anchor instant.
    ///
    /// Frequencies outside the supported subset and rules carrying both
    /// COUNT and UNTIL are rejected even where the underlying `rrule` crate
    /// would accept them.
    ///
    /// ## Errors
    /// Returns a [`RecurError`] describing the first syntactic or semantic
    /// problem found.
    pub fn parse(text: &str, anchor: DateTime<Utc>) -> RecurResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RecurError::EmptyRule);
        }
        reject_conflicting_bounds(text)?;

        let unvalidated = text
            .parse::<RRule<Unvalidated>>()
            .map_err(|err| RecurError::InvalidRule(err.to_string()))?;
        let set = unvalidated
            .build(anchor.with_timezone(&Tz::UTC))
            .map_err(|err| RecurError::InvalidRule(err.to_string()))?;

        let rrule = set.get_rrule().first().ok_or(RecurError::EmptyRule)?;
        let freq = rrule.get_freq();
        if !matches!(
            freq,
            Frequency::Daily | Frequency::Weekly | Frequency::Monthly | Frequency::Yearly
        ) {
            return Err(RecurError::UnsupportedFrequency(
                freq_name(freq).to_string(),
            ));
        }
        let until = rrule.get_until().map(|dt| dt.with_timezone(&Utc));

        tracing::trace!(rule = %text, anchor = %anchor, "Parsed recurrence rule");
        Ok(Self {
            set,
            anchor,
            until,
            text: text.to_string(),
        })
    }

    /// The anchor instant the rule is evaluated relative to.
    #[must_use]
    pub const fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    /// The rule's UNTIL bound, if any.
    #[must_use]
    pub const fn until(&self) -> Option<DateTime<Utc>> {
        self.until
    }

    /// The rule text as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// ## Summary
    /// The instant up to which a brand-new series must be validated: the
    /// rule's own UNTIL, else the anchor plus `fallback`.
    #[must_use]
    pub fn validation_horizon(&self, fallback: TimeDelta) -> DateTime<Utc> {
        self.until.unwrap_or(self.anchor + fallback)
    }

    /// ## Summary
    /// Materializes occurrence start instants inside
    /// `[window_start, window_end]`, inclusive of both bounds.
    ///
    /// Instants exactly equal to an entry in `exceptions` are omitted. The
    /// result is ordered and deduplicated. An inverted window yields an
    /// empty sequence.
    ///
    /// ## Errors
    /// Returns [`RecurError::TooManyOccurrences`] if the window would
    /// materialize more than `limit` instants.
    pub fn expand(
        &self,
        exceptions: &[DateTime<Utc>],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        limit: u16,
    ) -> RecurResult<Vec<DateTime<Utc>>> {
        if window_start > window_end {
            return Ok(Vec::new());
        }

        let mut set = self.set.clone();
        if !exceptions.is_empty() {
            let exdates: Vec<DateTime<Tz>> = exceptions
                .iter()
                .map(|dt| dt.with_timezone(&Tz::UTC))
                .collect();
            set = set.set_exdates(exdates);
        }

        // `after`/`before` are exclusive bounds; widen by a second and
        // filter back to the exact inclusive window.
        let inclusive_start = window_start - TimeDelta::seconds(1);
        let inclusive_end = window_end + TimeDelta::seconds(1);
        set = set
            .after(inclusive_start.with_timezone(&Tz::UTC))
            .before(inclusive_end.with_timezone(&Tz::UTC));

        let result = set.all(limit);
        if result.limited {
            tracing::warn!(
                rule = %self.text,
                limit,
                "Expansion hit the occurrence cap"
            );
            return Err(RecurError::TooManyOccurrences { limit });
        }

        let mut occurrences: Vec<DateTime<Utc>> = result
            .dates
            .iter()
            .map(|dt| dt.with_timezone(&Utc))
            .filter(|dt| *dt >= window_start && *dt <= window_end)
            .collect();
        occurrences.dedup();
        Ok(occurrences)
    }

    /// ## Summary
    /// Rebuilds the rule terminated at `UNTIL = cutoff - 1 day`, keeping the
    /// same anchor, FREQ, INTERVAL, and BYDAY. Returns `None` when that
    /// bound falls before the anchor: no occurrence survives the cutoff, so
    /// there is no truncated rule to represent.
    ///
    /// Any COUNT is dropped: COUNT and UNTIL are mutually exclusive, and the
    /// UNTIL bound takes over as the series terminator.
    ///
    /// ## Errors
    /// Returns an error if the truncated rule fails validation.
    pub fn truncate_before(&self, cutoff: DateTime<Utc>) -> RecurResult<Option<Self>> {
        let until = cutoff - TimeDelta::days(1);
        if until < self.anchor {
            return Ok(None);
        }
        let rrule = self.set.get_rrule().first().ok_or(RecurError::EmptyRule)?;
        let text = render_rule(
            rrule.get_freq(),
            rrule.get_interval(),
            Some(until),
            rrule.get_by_weekday(),
        );
        tracing::debug!(
            original = %self.text,
            truncated = %text,
            "Truncated recurrence rule"
        );
        Self::parse(&text, self.anchor).map(Some)
    }
}

/// Serializes the supported RRULE subset back to text.
fn render_rule(
    freq: Frequency,
    interval: u16,
    until: Option<DateTime<Utc>>,
    by_weekday: &[NWeekday],
) -> String {
    let mut text = format!("FREQ={}", freq_name(freq));
    if interval != 1 {
        text.push_str(&format!(";INTERVAL={interval}"));
    }
    if let Some(until) = until {
        text.push_str(&until.format(";UNTIL=%Y%m%dT%H%M%SZ").to_string());
    }
    if !by_weekday.is_empty() {
        let days: Vec<String> = by_weekday
            .iter()
            .map(|day| match day {
                NWeekday::Every(weekday) => weekday_code(*weekday).to_string(),
                NWeekday::Nth(n, weekday) => format!("{n}{}", weekday_code(*weekday)),
            })
            .collect();
        text.push_str(&format!(";BYDAY={}", days.join(",")));
    }
    text
}

const fn freq_name(freq: Frequency) -> &'static str {
    match freq {
        Frequency::Yearly => "YEARLY",
        Frequency::Monthly => "MONTHLY",
        Frequency::Weekly => "WEEKLY",
        Frequency::Daily => "DAILY",
        Frequency::Hourly => "HOURLY",
        Frequency::Minutely => "MINUTELY",
        Frequency::Secondly => "SECONDLY",
    }
}

const fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// COUNT and UNTIL together are rejected up front so the caller sees a
/// specific error instead of whatever the parser reports.
fn reject_conflicting_bounds(text: &str) -> RecurResult<()> {
    let upper = text.to_ascii_uppercase();
    let mut has_count = false;
    let mut has_until = false;
    for part in upper.split(';') {
        match part.split('=').next() {
            Some("COUNT") => has_count = true,
            Some("UNTIL") => has_until = true,
            _ => {}
        }
    }
    if has_count && has_until {
        return Err(RecurError::ConflictingBounds);
    }
    Ok(())
}
