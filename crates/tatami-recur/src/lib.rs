//! Recurrence rule parsing and occurrence expansion.
//!
//! Wraps the `rrule` crate behind an immutable, anchor-bound rule value.
//! Rules are always evaluated relative to an externally supplied anchor
//! instant; stored rule text never embeds DTSTART. Expansion is a pure
//! function of the rule, an exception set, and explicit window bounds, and
//! is always capped so unbounded rules can never be materialized in full.

pub mod error;
pub mod rule;

pub use error::{RecurError, RecurResult};
pub use rule::RecurrenceRule;
