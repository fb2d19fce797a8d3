//! Donation ledger aggregation for the giving app.
//!
//! Raw donation rows go through the normalizer, are bucketed into calendar
//! periods, summarized, and listed through one filter/sort pipeline. The core
//! is pure: callers pass `now`, the records and the configuration explicitly.

pub mod config;
pub mod domains;
pub mod errors;
pub mod ffi;
pub mod types;
pub mod validation;

pub use config::LedgerConfig;
pub use domains::analytics::{donor_rollups, summarize, summarize_in, AggregateSummary, DonorRollup};
pub use domains::donation::{normalize, normalize_all, DonationRecord, LedgerReport, SkipReason};
pub use domains::period::{previous_period, window_for, Period, PeriodScope, PeriodWindow};
pub use domains::view::{view, ViewQuery, Viewable};
pub use errors::{DomainError, DomainResult, ServiceError, ServiceResult, ValidationError};
pub use types::{LedgerOwner, SortDirection};
