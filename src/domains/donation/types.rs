use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domains::view::{SortDirection, SortKey, SortSpec, SortValue, Viewable};

/// Title shown for a donation that carries no category
pub const UNCATEGORIZED_TITLE: &str = "Donation";

/// A scalar that the datastore delivers either as a JSON string or a JSON number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Text(String),
    Number(serde_json::Number),
}

impl RawScalar {
    pub fn to_text(&self) -> String {
        match self {
            RawScalar::Text(text) => text.clone(),
            RawScalar::Number(number) => number.to_string(),
        }
    }
}

impl From<&str> for RawScalar {
    fn from(value: &str) -> Self {
        RawScalar::Text(value.to_string())
    }
}

impl From<i64> for RawScalar {
    fn from(value: i64) -> Self {
        RawScalar::Number(value.into())
    }
}

/// A donation row exactly as the datastore returned it.
///
/// Every historical column name is accepted: `user_id`/`donor_id`,
/// `church_id`/`payee_id`, `notes`/`note`, `offering_type`/`title`/`category`,
/// and the timestamp under `created_at` or `datetime_created`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDonationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RawScalar>,
    #[serde(default, alias = "user_id", skip_serializing_if = "Option::is_none")]
    pub donor_id: Option<RawScalar>,
    #[serde(default, alias = "church_id", skip_serializing_if = "Option::is_none")]
    pub payee_id: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime_created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, alias = "notes", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, alias = "offering_type", alias = "title", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl RawDonationRecord {
    /// Best-effort id for diagnostics, even when the record is otherwise unreadable
    pub fn display_id(&self) -> Option<String> {
        self.id
            .as_ref()
            .map(RawScalar::to_text)
            .filter(|id| !id.trim().is_empty())
    }
}

/// Payment outcome of a donation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Pending,
    Succeeded,
    Failed,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Succeeded => "succeeded",
            DonationStatus::Failed => "failed",
        }
    }

    /// Maps our own names, the history screen labels and the payment
    /// processor's payment-intent statuses.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "succeeded" | "success" | "completed" | "complete" | "paid" => Some(DonationStatus::Succeeded),
            "pending" | "processing" | "requires_action" | "requires_confirmation" | "requires_capture" => {
                Some(DonationStatus::Pending)
            }
            "failed" | "canceled" | "cancelled" | "requires_payment_method" => Some(DonationStatus::Failed),
            _ => None,
        }
    }
}

impl Default for DonationStatus {
    fn default() -> Self {
        DonationStatus::Succeeded
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical donation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationRecord {
    pub id: String,
    pub donor_id: String,
    pub payee_id: String,
    /// Minor currency units, never negative
    pub amount_cents: u64,
    pub occurred_at: DateTime<Utc>,
    pub status: DonationStatus,
    pub note: Option<String>,
    pub category: Option<String>,
}

impl DonationRecord {
    pub fn is_succeeded(&self) -> bool {
        self.status == DonationStatus::Succeeded
    }

    pub fn title(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED_TITLE)
    }
}

impl Viewable for DonationRecord {
    const DEFAULT_SORT: SortSpec = SortSpec::new(SortKey::Date, SortDirection::Descending);

    fn display_name(&self) -> &str {
        self.title()
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn occurred_at(&self) -> Option<DateTime<Utc>> {
        Some(self.occurred_at)
    }

    fn sort_value(&self, key: SortKey) -> SortValue {
        match key {
            SortKey::Amount => SortValue::Amount(self.amount_cents),
            SortKey::Date => SortValue::Date(self.occurred_at),
            SortKey::Name => SortValue::text(self.title()),
            SortKey::Distance => SortValue::Missing,
        }
    }
}

/// Why a raw record could not become a `DonationRecord`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidAmount { raw: Option<String> },
    InvalidTimestamp { raw: Option<String> },
    MissingIdentifier { field: String },
    UnknownStatus { status: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidAmount { raw: Some(raw) } => write!(f, "invalid amount '{}'", raw),
            SkipReason::InvalidAmount { raw: None } => write!(f, "missing amount"),
            SkipReason::InvalidTimestamp { raw: Some(raw) } => write!(f, "invalid timestamp '{}'", raw),
            SkipReason::InvalidTimestamp { raw: None } => write!(f, "missing timestamp"),
            SkipReason::MissingIdentifier { field } => write!(f, "missing identifier '{}'", field),
            SkipReason::UnknownStatus { status } => write!(f, "unknown status '{}'", status),
        }
    }
}

/// A raw record that was left out, with its position in the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub record_id: Option<String>,
    pub reason: SkipReason,
}

/// Result of normalizing a whole fetch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedBatch {
    pub records: Vec<DonationRecord>,
    pub skipped: Vec<SkippedRecord>,
}

impl NormalizedBatch {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// True when every raw record was readable
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Donor identity as stored in the user table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorProfile {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl DonorProfile {
    /// "first last", trimmed; `None` when both parts are blank
    pub fn display_name(&self) -> Option<String> {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or("").trim(),
            self.last_name.as_deref().unwrap_or("").trim()
        );
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

/// Convert minor units back to a decimal amount for display or export
pub fn cents_to_decimal(cents: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(cents), 2)
}

/// Any ledger payload plus the records that could not be read to produce it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerReport<T> {
    pub data: T,
    pub skipped: Vec<SkippedRecord>,
}

impl<T> LedgerReport<T> {
    pub fn new(data: T, skipped: Vec<SkippedRecord>) -> Self {
        Self { data, skipped }
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_accepts_historical_shapes() {
        let legacy: RawDonationRecord = serde_json::from_str(
            r#"{"id": 42, "user_id": "u1", "church_id": "c1", "amount": "120.00",
                "created_at": "2025-11-01T10:00:00Z", "notes": "Faithful giving",
                "stripe_payment_intent_id": "pi_123"}"#,
        )
        .unwrap();
        assert_eq!(legacy.display_id().as_deref(), Some("42"));
        assert_eq!(legacy.donor_id, Some(RawScalar::from("u1")));
        assert_eq!(legacy.payee_id, Some(RawScalar::from("c1")));
        assert_eq!(legacy.note.as_deref(), Some("Faithful giving"));

        let newer: RawDonationRecord = serde_json::from_str(
            r#"{"id": "d-1", "donor_id": "u1", "payee_id": "c1", "amount": 75.5,
                "datetime_created": "2025-01-01T00:00:00Z", "offering_type": "Missions",
                "status": null}"#,
        )
        .unwrap();
        assert!(matches!(newer.amount, Some(RawScalar::Number(_))));
        assert_eq!(newer.category.as_deref(), Some("Missions"));
        assert!(newer.status.is_none());
        assert!(newer.created_at.is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(DonationStatus::from_str("succeeded"), Some(DonationStatus::Succeeded));
        assert_eq!(DonationStatus::from_str("Completed"), Some(DonationStatus::Succeeded));
        assert_eq!(DonationStatus::from_str("processing"), Some(DonationStatus::Pending));
        assert_eq!(DonationStatus::from_str("requires_payment_method"), Some(DonationStatus::Failed));
        assert_eq!(DonationStatus::from_str("canceled"), Some(DonationStatus::Failed));
        assert_eq!(DonationStatus::from_str("refunded"), None);
        assert_eq!(DonationStatus::default(), DonationStatus::Succeeded);
    }

    #[test]
    fn test_profile_display_name() {
        let full = DonorProfile {
            id: "u1".to_string(),
            first_name: Some("Ruth".to_string()),
            last_name: Some(" Boaz ".to_string()),
        };
        assert_eq!(full.display_name().as_deref(), Some("Ruth Boaz"));

        let first_only = DonorProfile {
            id: "u2".to_string(),
            first_name: Some("Naomi".to_string()),
            last_name: None,
        };
        assert_eq!(first_only.display_name().as_deref(), Some("Naomi"));

        let blank = DonorProfile {
            id: "u3".to_string(),
            first_name: Some("  ".to_string()),
            last_name: None,
        };
        assert_eq!(blank.display_name(), None);
    }

    #[test]
    fn test_skip_reason_serializes_with_kind_tag() {
        let json = serde_json::to_value(SkipReason::InvalidAmount { raw: Some("abc".to_string()) }).unwrap();
        assert_eq!(json["kind"], "invalid_amount");
        assert_eq!(json["raw"], "abc");
    }

    #[test]
    fn test_cents_to_decimal() {
        assert_eq!(cents_to_decimal(12345).to_string(), "123.45");
        assert_eq!(cents_to_decimal(0).to_string(), "0.00");
    }
}
