pub mod types;
pub mod aggregator;

pub use types::{AggregateSummary, DonorRollup, LatestDonation, MonthlyTotal, StatusCounts};
pub use aggregator::{
    apply_display_names, distinct_donors, donor_rollups, growth_percent, monthly_totals, period_total, summarize,
    summarize_in,
};
