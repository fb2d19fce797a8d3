use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::LedgerConfig;
use crate::domains::analytics::{self, AggregateSummary, DonorRollup, MonthlyTotal};
use crate::domains::donation::normalizer::normalize_all;
use crate::domains::donation::repository::{DonationRepository, DonorDirectory};
use crate::domains::donation::types::{DonationRecord, LedgerReport, NormalizedBatch};
use crate::domains::view::{view_with_wildcard, ViewQuery};
use crate::errors::ServiceResult;
use crate::types::LedgerOwner;
use crate::validation::Validate;

/// Fetch-then-aggregate operations behind the giving screens.
///
/// Every call recomputes from a fresh fetch, so a caller may drop the result
/// of a superseded request without coordinating with this service.
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Dashboard summary for a donor's own giving or a church's receipts
    async fn giving_summary(
        &self,
        owner: &LedgerOwner,
        now: DateTime<Utc>,
    ) -> ServiceResult<LedgerReport<AggregateSummary>>;

    /// Named per-donor totals for one church, filtered and sorted
    async fn donor_rollups(
        &self,
        payee_id: &str,
        query: &ViewQuery,
        now: DateTime<Utc>,
    ) -> ServiceResult<LedgerReport<Vec<DonorRollup>>>;

    /// Donation history listing
    async fn donation_history(
        &self,
        owner: &LedgerOwner,
        query: &ViewQuery,
        now: DateTime<Utc>,
    ) -> ServiceResult<LedgerReport<Vec<DonationRecord>>>;

    /// Twelve monthly totals for the yearly chart
    async fn monthly_breakdown(
        &self,
        owner: &LedgerOwner,
        year: i32,
    ) -> ServiceResult<LedgerReport<Vec<MonthlyTotal>>>;
}

pub struct LedgerServiceImpl {
    repo: Arc<dyn DonationRepository>,
    directory: Arc<dyn DonorDirectory>,
    config: LedgerConfig,
}

impl LedgerServiceImpl {
    pub fn new(
        repo: Arc<dyn DonationRepository>,
        directory: Arc<dyn DonorDirectory>,
        config: LedgerConfig,
    ) -> Self {
        Self { repo, directory, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    async fn load(&self, owner: &LedgerOwner) -> ServiceResult<NormalizedBatch> {
        let raws = self.repo.find_raw_by_owner(owner).await?;
        let batch = normalize_all(&raws);

        for skipped in &batch.skipped {
            log::warn!(
                "Skipping donation record {} (index {}) for {}: {}",
                skipped.record_id.as_deref().unwrap_or("<no id>"),
                skipped.index,
                owner,
                skipped.reason
            );
        }
        log::debug!(
            "Loaded {} donation records for {} ({} skipped)",
            batch.records.len(),
            owner,
            batch.skipped_count()
        );

        Ok(batch)
    }

    fn prepare_query(&self, query: &ViewQuery, now: DateTime<Utc>) -> ServiceResult<ViewQuery> {
        query.validate()?;
        Ok(query.clone().resolve_period(now, &self.config.utc_offset))
    }
}

#[async_trait]
impl LedgerService for LedgerServiceImpl {
    async fn giving_summary(
        &self,
        owner: &LedgerOwner,
        now: DateTime<Utc>,
    ) -> ServiceResult<LedgerReport<AggregateSummary>> {
        let batch = self.load(owner).await?;
        let summary = analytics::summarize_in(&batch.records, now, &self.config.utc_offset);
        Ok(LedgerReport::new(summary, batch.skipped))
    }

    async fn donor_rollups(
        &self,
        payee_id: &str,
        query: &ViewQuery,
        now: DateTime<Utc>,
    ) -> ServiceResult<LedgerReport<Vec<DonorRollup>>> {
        let query = self.prepare_query(query, now)?;
        let batch = self.load(&LedgerOwner::Payee(payee_id.to_string())).await?;

        let rollups = analytics::donor_rollups(&batch.records);
        let donor_ids: Vec<String> = rollups.iter().map(|r| r.donor_id.clone()).collect();
        let names = if donor_ids.is_empty() {
            Default::default()
        } else {
            self.directory.resolve_display_names(&donor_ids).await?
        };
        let named = analytics::apply_display_names(rollups, &names, &self.config.anonymous_label);

        let listed = view_with_wildcard(&named, &query, &self.config.category_wildcard);
        Ok(LedgerReport::new(listed, batch.skipped))
    }

    async fn donation_history(
        &self,
        owner: &LedgerOwner,
        query: &ViewQuery,
        now: DateTime<Utc>,
    ) -> ServiceResult<LedgerReport<Vec<DonationRecord>>> {
        let query = self.prepare_query(query, now)?;
        let batch = self.load(owner).await?;
        let listed = view_with_wildcard(&batch.records, &query, &self.config.category_wildcard);
        Ok(LedgerReport::new(listed, batch.skipped))
    }

    async fn monthly_breakdown(
        &self,
        owner: &LedgerOwner,
        year: i32,
    ) -> ServiceResult<LedgerReport<Vec<MonthlyTotal>>> {
        let batch = self.load(owner).await?;
        let months = analytics::monthly_totals(&batch.records, year, &self.config.utc_offset);
        Ok(LedgerReport::new(months, batch.skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::donation::repository::{InMemoryDonationRepository, InMemoryDonorDirectory};
    use crate::domains::donation::types::{DonorProfile, RawDonationRecord, RawScalar, SkipReason};
    use crate::domains::period::Period;
    use crate::domains::view::{SortDirection, SortKey};
    use crate::errors::{DomainError, DomainResult, ServiceError};
    use chrono::TimeZone;

    fn raw(id: &str, donor: &str, amount: &str, created_at: &str, category: Option<&str>) -> RawDonationRecord {
        RawDonationRecord {
            id: Some(RawScalar::from(id)),
            donor_id: Some(RawScalar::from(donor)),
            payee_id: Some(RawScalar::from("church-1")),
            amount: Some(RawScalar::from(amount)),
            created_at: Some(created_at.to_string()),
            category: category.map(str::to_string),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn service(records: Vec<RawDonationRecord>) -> LedgerServiceImpl {
        let directory = InMemoryDonorDirectory::new(vec![DonorProfile {
            id: "A".to_string(),
            first_name: Some("Lydia".to_string()),
            last_name: None,
        }]);
        LedgerServiceImpl::new(
            Arc::new(InMemoryDonationRepository::new(records)),
            Arc::new(directory),
            LedgerConfig::default(),
        )
    }

    fn church() -> LedgerOwner {
        LedgerOwner::Payee("church-1".to_string())
    }

    #[tokio::test]
    async fn test_summary_reports_growth() {
        let svc = service(vec![
            raw("1", "A", "100.00", "2025-03-02T10:00:00Z", None),
            raw("2", "A", "50", "2025-03-15T10:00:00Z", None),
            raw("3", "A", "$20.00", "2025-02-10T10:00:00Z", None),
        ]);

        let report = svc.giving_summary(&church(), now()).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.data.current_period_total_cents, 15000);
        assert_eq!(report.data.prior_period_total_cents, 2000);
        assert_eq!(report.data.growth_percent, Some(650.0));
    }

    #[tokio::test]
    async fn test_unreadable_amount_is_reported_not_zeroed() {
        let svc = service(vec![raw("1", "A", "abc", "2025-03-02T10:00:00Z", None)]);

        let report = svc.giving_summary(&church(), now()).await.unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::InvalidAmount { raw: Some("abc".to_string()) }
        );
        assert_eq!(report.data.current_period_total_cents, 0);
        assert_eq!(report.data.transaction_count, 0);
    }

    #[tokio::test]
    async fn test_empty_ledger() {
        let svc = service(vec![]);
        let report = svc.giving_summary(&church(), now()).await.unwrap();
        assert_eq!(report.data.distinct_donor_count, 0);
        assert_eq!(report.data.growth_percent, None);

        let rollups = svc.donor_rollups("church-1", &ViewQuery::new(), now()).await.unwrap();
        assert!(rollups.data.is_empty());
    }

    #[tokio::test]
    async fn test_rollups_are_named_and_sorted() {
        let svc = service(vec![
            raw("1", "A", "30", "2025-01-01T00:00:00Z", None),
            raw("2", "B", "5", "2025-01-02T00:00:00Z", None),
            raw("3", "A", "30", "2025-02-01T00:00:00Z", None),
            raw("4", "A", "30", "2025-03-01T00:00:00Z", None),
        ]);

        let report = svc.donor_rollups("church-1", &ViewQuery::new(), now()).await.unwrap();
        let rollups = report.data;
        assert_eq!(rollups.len(), 2);
        assert_eq!(rollups[0].donor_id, "A");
        assert_eq!(rollups[0].total_cents, 9000);
        assert_eq!(rollups[0].display_name.as_deref(), Some("Lydia"));
        assert_eq!(rollups[1].donor_id, "B");
        assert_eq!(rollups[1].total_cents, 500);
        assert_eq!(rollups[1].display_name.as_deref(), Some("Anonymous"));

        let by_name = ViewQuery::new().sorted_by(SortKey::Name, SortDirection::Ascending);
        let report = svc.donor_rollups("church-1", &by_name, now()).await.unwrap();
        assert_eq!(report.data[0].donor_id, "B");

        let search = ViewQuery::new().with_text("lyd");
        let report = svc.donor_rollups("church-1", &search, now()).await.unwrap();
        assert_eq!(report.data.len(), 1);
    }

    #[tokio::test]
    async fn test_history_filters_category_and_period() {
        let svc = service(vec![
            raw("1", "A", "10", "2025-03-01T00:00:00Z", Some("Tithe")),
            raw("2", "A", "20", "2025-03-05T00:00:00Z", Some("Missions")),
            raw("3", "B", "30", "2025-01-05T00:00:00Z", Some("tithe")),
            raw("4", "B", "40", "2025-03-06T00:00:00Z", None),
        ]);
        let donor = LedgerOwner::Payee("church-1".to_string());

        let tithe = svc
            .donation_history(&donor, &ViewQuery::new().with_category("Tithe"), now())
            .await
            .unwrap();
        let ids: Vec<&str> = tithe.data.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let all = svc
            .donation_history(&donor, &ViewQuery::new().with_category("All"), now())
            .await
            .unwrap();
        assert_eq!(all.data.len(), 4);

        let this_month = svc
            .donation_history(&donor, &ViewQuery::new().with_period(Period::Month), now())
            .await
            .unwrap();
        let ids: Vec<&str> = this_month.data.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "2", "1"]);
    }

    #[tokio::test]
    async fn test_monthly_breakdown() {
        let svc = service(vec![
            raw("1", "A", "10", "2025-03-01T00:00:00Z", None),
            raw("2", "A", "20", "2025-03-05T00:00:00Z", None),
            raw("3", "B", "bad", "2025-01-05T00:00:00Z", None),
        ]);

        let report = svc.monthly_breakdown(&church(), 2025).await.unwrap();
        assert_eq!(report.data.len(), 12);
        assert_eq!(report.data[2].total_cents, 3000);
        assert_eq!(report.skipped.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_query_is_rejected() {
        let svc = service(vec![]);
        let query = ViewQuery::new().with_text(&"x".repeat(201));
        let result = svc.donation_history(&church(), &query, now()).await;
        assert!(matches!(result, Err(ServiceError::Domain(DomainError::Validation(_)))));
    }

    struct UnavailableRepository;

    #[async_trait]
    impl DonationRepository for UnavailableRepository {
        async fn find_raw_by_owner(&self, _owner: &LedgerOwner) -> DomainResult<Vec<RawDonationRecord>> {
            Err(DomainError::External("datastore unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let svc = LedgerServiceImpl::new(
            Arc::new(UnavailableRepository),
            Arc::new(InMemoryDonorDirectory::new(vec![])),
            LedgerConfig::default(),
        );
        let result = svc.giving_summary(&church(), now()).await;
        assert!(matches!(result, Err(ServiceError::Domain(DomainError::External(_)))));
    }
}
