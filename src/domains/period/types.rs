use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Period granularity used to bucket donations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Month,
    Quarter,
    Year,
    AllTime,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
            Period::AllTime => "all_time",
        }
    }

    /// Accepts the snake_case names as well as the history screen labels
    /// ("This Month", "All Time", ...).
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        let normalized = normalized.strip_prefix("this ").unwrap_or(normalized.as_str());
        match normalized {
            "month" => Some(Period::Month),
            "quarter" => Some(Period::Quarter),
            "year" => Some(Period::Year),
            "all_time" | "all time" | "alltime" => Some(Period::AllTime),
            _ => None,
        }
    }

    /// Length of one bucket in calendar months; `None` for all-time.
    pub fn months(&self) -> Option<u32> {
        match self {
            Period::Month => Some(1),
            Period::Quarter => Some(3),
            Period::Year => Some(12),
            Period::AllTime => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A closed interval of instants. Both ends are inclusive and `start <= end`.
///
/// Only the bucketer constructs these, so every screen shares one boundary rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PeriodWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl PeriodWindow {
    pub(crate) fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// What a period resolves to: a concrete window, or no time filtering at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodScope {
    Bounded(PeriodWindow),
    Unbounded,
}

impl PeriodScope {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        match self {
            PeriodScope::Bounded(window) => window.contains(instant),
            PeriodScope::Unbounded => true,
        }
    }

    pub fn window(&self) -> Option<&PeriodWindow> {
        match self {
            PeriodScope::Bounded(window) => Some(window),
            PeriodScope::Unbounded => None,
        }
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self, PeriodScope::Bounded(_))
    }
}
