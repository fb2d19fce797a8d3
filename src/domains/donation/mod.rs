pub mod types;
pub mod normalizer;
pub mod repository;
pub mod service;

pub use types::{
    cents_to_decimal, DonationRecord, DonationStatus, DonorProfile, LedgerReport, NormalizedBatch, RawDonationRecord,
    RawScalar, SkipReason, SkippedRecord, UNCATEGORIZED_TITLE,
};
pub use normalizer::{normalize, normalize_all, parse_amount_cents, parse_timestamp};
pub use repository::{DonationRepository, DonorDirectory, InMemoryDonationRepository, InMemoryDonorDirectory};
pub use service::{LedgerService, LedgerServiceImpl};
