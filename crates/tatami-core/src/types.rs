use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Granularity of an update or delete against a booking.
///
/// For a single (non-recurring) booking every scope behaves like `All`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// The whole booking: a single booking, or every occurrence of a series.
    #[default]
    All,
    /// Exactly one occurrence of a recurring series.
    Instance,
    /// One occurrence and everything after it, via a series split.
    Future,
}

impl Scope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Instance => "instance",
            Self::Future => "future",
        }
    }

    /// Whether this scope requires the caller to name an occurrence instant.
    #[must_use]
    pub const fn requires_instance_date(self) -> bool {
        matches!(self, Self::Instance | Self::Future)
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "instance" => Ok(Self::Instance),
            "future" => Ok(Self::Future),
            other => Err(CoreError::ValidationError(format!(
                "unsupported scope: {other}"
            ))),
        }
    }
}
