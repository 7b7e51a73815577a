/// Validation horizon for recurring rules without an UNTIL bound, in days
/// past the anchor.
pub const DEFAULT_HORIZON_DAYS: i64 = 365;

/// Hard cap on the number of occurrences materialized for a single series in
/// one expansion. Hitting the cap is an error, never silent truncation.
pub const MAX_OCCURRENCES_PER_SERIES: u16 = 1000;
