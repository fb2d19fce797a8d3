use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::view::{SortDirection, SortKey, SortSpec, SortValue, Viewable};

/// Donations left out of totals because they did not succeed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub failed: u64,
}

/// Most recent succeeded gift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestDonation {
    pub amount_cents: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Dashboard figures over succeeded donations.
///
/// `growth_percent` is `None` when the prior month has no giving to compare against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub current_period_total_cents: u64,
    pub prior_period_total_cents: u64,
    pub year_total_cents: u64,
    pub lifetime_total_cents: u64,
    pub growth_percent: Option<f64>,
    pub distinct_donor_count: u64,
    pub transaction_count: u64,
    pub average_donation_cents: Option<u64>,
    pub recurring_donor_count: u64,
    pub latest_donation: Option<LatestDonation>,
    pub excluded: StatusCounts,
}

impl AggregateSummary {
    pub fn empty() -> Self {
        Self {
            current_period_total_cents: 0,
            prior_period_total_cents: 0,
            year_total_cents: 0,
            lifetime_total_cents: 0,
            growth_percent: None,
            distinct_donor_count: 0,
            transaction_count: 0,
            average_donation_cents: None,
            recurring_donor_count: 0,
            latest_donation: None,
            excluded: StatusCounts::default(),
        }
    }
}

/// Per-donor totals, recomputed on every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorRollup {
    pub donor_id: String,
    pub display_name: Option<String>,
    pub total_cents: u64,
    pub donation_count: u64,
    pub last_donation_at: DateTime<Utc>,
}

impl DonorRollup {
    /// Name shown in listings; falls back to the donor id until names are merged in
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.donor_id)
    }
}

impl Viewable for DonorRollup {
    const DEFAULT_SORT: SortSpec = SortSpec::new(SortKey::Amount, SortDirection::Descending);

    fn display_name(&self) -> &str {
        self.label()
    }

    fn category(&self) -> Option<&str> {
        None
    }

    fn occurred_at(&self) -> Option<DateTime<Utc>> {
        Some(self.last_donation_at)
    }

    fn sort_value(&self, key: SortKey) -> SortValue {
        match key {
            SortKey::Amount => SortValue::Amount(self.total_cents),
            SortKey::Name => SortValue::text(self.label()),
            SortKey::Date => SortValue::Date(self.last_donation_at),
            SortKey::Distance => SortValue::Missing,
        }
    }
}

/// Succeeded giving within one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub year: i32,
    /// 1-based
    pub month: u32,
    pub total_cents: u64,
    pub transaction_count: u64,
}
