use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domains::analytics::types::{
    AggregateSummary, DonorRollup, LatestDonation, MonthlyTotal, StatusCounts,
};
use crate::domains::donation::{DonationRecord, DonationStatus};
use crate::domains::period::{month_window, previous_period, window_for, Period, PeriodScope, PeriodWindow};

/// Summarize with period boundaries in UTC.
pub fn summarize(records: &[DonationRecord], now: DateTime<Utc>) -> AggregateSummary {
    summarize_in(records, now, &Utc)
}

/// Summarize with period boundaries computed in `tz`.
///
/// Only succeeded donations count toward totals; pending and failed ones
/// are tallied in `excluded`.
pub fn summarize_in<Tz: TimeZone>(records: &[DonationRecord], now: DateTime<Utc>, tz: &Tz) -> AggregateSummary {
    let current = window_for(Period::Month, now, tz);
    let prior = previous_period(Period::Month, now, tz);
    let year = window_for(Period::Year, now, tz);

    let mut summary = AggregateSummary::empty();
    let mut gifts_per_donor: BTreeMap<&str, u64> = BTreeMap::new();

    for record in records {
        match record.status {
            DonationStatus::Pending => {
                summary.excluded.pending += 1;
                continue;
            }
            DonationStatus::Failed => {
                summary.excluded.failed += 1;
                continue;
            }
            DonationStatus::Succeeded => {}
        }

        let amount = record.amount_cents;
        summary.lifetime_total_cents = summary.lifetime_total_cents.saturating_add(amount);
        summary.transaction_count += 1;
        *gifts_per_donor.entry(record.donor_id.as_str()).or_insert(0) += 1;

        if current.contains(record.occurred_at) {
            summary.current_period_total_cents = summary.current_period_total_cents.saturating_add(amount);
        }
        if prior.is_some_and(|window| window.contains(record.occurred_at)) {
            summary.prior_period_total_cents = summary.prior_period_total_cents.saturating_add(amount);
        }
        if year.contains(record.occurred_at) {
            summary.year_total_cents = summary.year_total_cents.saturating_add(amount);
        }

        let newer = summary
            .latest_donation
            .map_or(true, |latest| record.occurred_at > latest.occurred_at);
        if newer {
            summary.latest_donation = Some(LatestDonation {
                amount_cents: amount,
                occurred_at: record.occurred_at,
            });
        }
    }

    summary.growth_percent = growth_percent(summary.current_period_total_cents, summary.prior_period_total_cents);
    summary.distinct_donor_count = gifts_per_donor.len() as u64;
    summary.recurring_donor_count = gifts_per_donor.values().filter(|count| **count > 1).count() as u64;
    summary.average_donation_cents = summary
        .lifetime_total_cents
        .checked_div(summary.transaction_count);

    summary
}

/// Month-over-month change in percent; `None` without a prior baseline.
pub fn growth_percent(current_cents: u64, prior_cents: u64) -> Option<f64> {
    if prior_cents == 0 {
        return None;
    }
    let current = current_cents as f64;
    let prior = prior_cents as f64;
    Some((current - prior) / prior * 100.0)
}

/// Group succeeded donations by donor. Output is ordered by donor id;
/// callers sort through the view pipeline.
pub fn donor_rollups(records: &[DonationRecord]) -> Vec<DonorRollup> {
    let mut by_donor: BTreeMap<&str, DonorRollup> = BTreeMap::new();

    for record in records.iter().filter(|r| r.is_succeeded()) {
        by_donor
            .entry(record.donor_id.as_str())
            .and_modify(|rollup| {
                rollup.total_cents = rollup.total_cents.saturating_add(record.amount_cents);
                rollup.donation_count += 1;
                rollup.last_donation_at = rollup.last_donation_at.max(record.occurred_at);
            })
            .or_insert_with(|| DonorRollup {
                donor_id: record.donor_id.clone(),
                display_name: None,
                total_cents: record.amount_cents,
                donation_count: 1,
                last_donation_at: record.occurred_at,
            });
    }

    by_donor.into_values().collect()
}

/// Merge resolved names into rollups. Donors the directory could not name
/// get `fallback`.
pub fn apply_display_names(
    rollups: Vec<DonorRollup>,
    names: &HashMap<String, String>,
    fallback: &str,
) -> Vec<DonorRollup> {
    rollups
        .into_iter()
        .map(|mut rollup| {
            let name = names
                .get(&rollup.donor_id)
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .unwrap_or(fallback);
            rollup.display_name = Some(name.to_string());
            rollup
        })
        .collect()
}

/// Succeeded total for each month of `year` in `tz`, January first.
pub fn monthly_totals<Tz: TimeZone>(records: &[DonationRecord], year: i32, tz: &Tz) -> Vec<MonthlyTotal> {
    (1..=12)
        .map(|month| {
            let window: Option<PeriodWindow> = month_window(year, month, tz);
            let mut total = MonthlyTotal {
                year,
                month,
                total_cents: 0,
                transaction_count: 0,
            };
            if let Some(window) = window {
                for record in records.iter().filter(|r| r.is_succeeded() && window.contains(r.occurred_at)) {
                    total.total_cents = total.total_cents.saturating_add(record.amount_cents);
                    total.transaction_count += 1;
                }
            }
            total
        })
        .collect()
}

/// Succeeded total within any resolved scope
pub fn period_total(records: &[DonationRecord], scope: &PeriodScope) -> u64 {
    records
        .iter()
        .filter(|r| r.is_succeeded() && scope.contains(r.occurred_at))
        .fold(0u64, |acc, r| acc.saturating_add(r.amount_cents))
}

/// Distinct donors among succeeded records
pub fn distinct_donors(records: &[DonationRecord]) -> BTreeSet<&str> {
    records
        .iter()
        .filter(|r| r.is_succeeded())
        .map(|r| r.donor_id.as_str())
        .collect()
}
