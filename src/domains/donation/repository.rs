use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domains::donation::types::{DonorProfile, RawDonationRecord, RawScalar};
use crate::errors::{DomainError, DomainResult};
use crate::types::LedgerOwner;

/// Source of raw donation rows, backed by the hosted datastore in the app.
#[async_trait]
pub trait DonationRepository: Send + Sync {
    /// Every donation row given by (donor) or to (payee) the owner, unfiltered.
    async fn find_raw_by_owner(&self, owner: &LedgerOwner) -> DomainResult<Vec<RawDonationRecord>>;
}

/// Maps donor ids to display names. Unknown ids are simply absent from the result.
#[async_trait]
pub trait DonorDirectory: Send + Sync {
    async fn resolve_display_names(&self, donor_ids: &[String]) -> DomainResult<HashMap<String, String>>;
}

/// In-process repository used by the diagnostics binary and tests
#[derive(Debug, Default)]
pub struct InMemoryDonationRepository {
    records: RwLock<Vec<RawDonationRecord>>,
}

impl InMemoryDonationRepository {
    pub fn new(records: Vec<RawDonationRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn insert(&self, record: RawDonationRecord) -> DomainResult<()> {
        self.records
            .write()
            .map_err(|_| DomainError::Internal("donation store lock poisoned".to_string()))?
            .push(record);
        Ok(())
    }
}

fn matches_owner(value: Option<&RawScalar>, id: &str) -> bool {
    value.is_some_and(|v| v.to_text().trim() == id)
}

#[async_trait]
impl DonationRepository for InMemoryDonationRepository {
    async fn find_raw_by_owner(&self, owner: &LedgerOwner) -> DomainResult<Vec<RawDonationRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| DomainError::Internal("donation store lock poisoned".to_string()))?;

        Ok(records
            .iter()
            .filter(|raw| match owner {
                LedgerOwner::Donor(id) => matches_owner(raw.donor_id.as_ref(), id),
                LedgerOwner::Payee(id) => matches_owner(raw.payee_id.as_ref(), id),
            })
            .cloned()
            .collect())
    }
}

/// Directory over a fixed set of donor profiles
#[derive(Debug, Default, Clone)]
pub struct InMemoryDonorDirectory {
    profiles: HashMap<String, DonorProfile>,
}

impl InMemoryDonorDirectory {
    pub fn new(profiles: Vec<DonorProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}

#[async_trait]
impl DonorDirectory for InMemoryDonorDirectory {
    async fn resolve_display_names(&self, donor_ids: &[String]) -> DomainResult<HashMap<String, String>> {
        Ok(donor_ids
            .iter()
            .filter_map(|id| {
                let name = self.profiles.get(id)?.display_name()?;
                Some((id.clone(), name))
            })
            .collect())
    }
}
