use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::domains::period::{window_for, Period, PeriodScope};
use crate::errors::DomainResult;
use crate::validation::{Validate, ValidationBuilder};

pub use crate::types::SortDirection;

/// Category value that disables category filtering
pub const CATEGORY_WILDCARD: &str = "All";

pub const MAX_SEARCH_TEXT_LENGTH: usize = 200;

/// Field a listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Amount,
    Name,
    Date,
    Distance,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Amount => "amount",
            SortKey::Name => "name",
            SortKey::Date => "date",
            SortKey::Distance => "distance",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub const fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }
}

/// A comparable projection of one item for one sort key.
///
/// `Missing` always sorts after present values, whatever the direction.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Amount(u64),
    Text(String),
    Date(DateTime<Utc>),
    Distance(f64),
    Missing,
}

impl SortValue {
    /// Case-insensitive text key
    pub fn text(value: &str) -> Self {
        SortValue::Text(value.to_lowercase())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, SortValue::Missing)
    }

    /// Compare two present values of the same kind. Mixed kinds compare equal
    /// so the stable sort keeps their input order.
    pub(crate) fn compare_present(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Amount(a), SortValue::Amount(b)) => a.cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            (SortValue::Distance(a), SortValue::Distance(b)) => a.total_cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Anything that can be shown in a searchable, sortable listing.
pub trait Viewable {
    /// Order used when the query names none
    const DEFAULT_SORT: SortSpec;

    /// Text matched by the free-text filter
    fn display_name(&self) -> &str;

    /// Matched by the category filter; `None` is uncategorized
    fn category(&self) -> Option<&str>;

    /// Instant used by period filtering; undated items never fall in a bounded period
    fn occurred_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn sort_value(&self, key: SortKey) -> SortValue;
}

/// Filters and ordering for one listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    /// History screen period ("This Month", ..., "All Time")
    #[serde(default)]
    pub period: Option<Period>,
    /// Window applied by the pipeline; set from `period` by `resolve_period`
    #[serde(skip)]
    pub within: Option<PeriodScope>,
}

impl ViewQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn sorted_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec::new(key, direction));
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn within(mut self, scope: PeriodScope) -> Self {
        self.within = Some(scope);
        self
    }

    /// Turn `period` into a concrete window relative to `now` in `tz`.
    /// An already resolved window is left alone when no period is named.
    pub fn resolve_period<Tz: TimeZone>(mut self, now: DateTime<Utc>, tz: &Tz) -> Self {
        if let Some(period) = self.period {
            self.within = Some(window_for(period, now, tz));
        }
        self
    }
}

impl Validate for ViewQuery {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("text", self.text.clone())
            .max_length(MAX_SEARCH_TEXT_LENGTH)
            .validate()?;
        ValidationBuilder::new("category", self.category.clone())
            .max_length(MAX_SEARCH_TEXT_LENGTH)
            .validate()
    }
}
