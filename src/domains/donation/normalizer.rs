use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::sync::OnceLock;

use crate::domains::donation::types::{
    DonationRecord, DonationStatus, NormalizedBatch, RawDonationRecord, RawScalar, SkipReason, SkippedRecord,
};

// Offset-carrying forms chrono's RFC 3339 parser does not take,
// e.g. Postgres' "2025-11-01 12:00:00.123+00"
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

// Wall-clock forms without an offset are read as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn amount_regex() -> &'static Regex {
    static AMOUNT_REGEX: OnceLock<Regex> = OnceLock::new();
    AMOUNT_REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:usd)?\s*(?P<sign>[-+])?\s*\$?\s*(?P<number>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?|\.\d+)\s*(?:usd)?$",
        )
        .expect("amount pattern is valid")
    })
}

/// Convert one raw record into the canonical form.
///
/// Never panics; every failure is a `SkipReason`. Checks run in order:
/// identifiers, amount, timestamp, status.
pub fn normalize(raw: &RawDonationRecord) -> Result<DonationRecord, SkipReason> {
    let id = required_identifier(raw.id.as_ref(), "id")?;
    let donor_id = required_identifier(raw.donor_id.as_ref(), "donor_id")?;
    let payee_id = required_identifier(raw.payee_id.as_ref(), "payee_id")?;

    let amount_cents = match raw.amount.as_ref() {
        Some(amount) => parse_amount_cents(amount).ok_or_else(|| SkipReason::InvalidAmount {
            raw: Some(amount.to_text()),
        })?,
        None => return Err(SkipReason::InvalidAmount { raw: None }),
    };

    // created_at wins when both historical names are present
    let raw_timestamp = non_blank(raw.created_at.as_deref()).or_else(|| non_blank(raw.datetime_created.as_deref()));
    let occurred_at = match raw_timestamp {
        Some(text) => parse_timestamp(text).ok_or_else(|| SkipReason::InvalidTimestamp {
            raw: Some(text.to_string()),
        })?,
        None => return Err(SkipReason::InvalidTimestamp { raw: None }),
    };

    let status = match non_blank(raw.status.as_deref()) {
        Some(text) => DonationStatus::from_str(text).ok_or_else(|| SkipReason::UnknownStatus {
            status: text.to_string(),
        })?,
        None => DonationStatus::default(),
    };

    Ok(DonationRecord {
        id,
        donor_id,
        payee_id,
        amount_cents,
        occurred_at,
        status,
        note: non_blank(raw.note.as_deref()).map(str::to_string),
        category: non_blank(raw.category.as_deref()).map(str::to_string),
    })
}

/// Normalize a whole fetch, keeping input order and recording every skip.
pub fn normalize_all(raws: &[RawDonationRecord]) -> NormalizedBatch {
    let mut batch = NormalizedBatch {
        records: Vec::with_capacity(raws.len()),
        skipped: Vec::new(),
    };

    for (index, raw) in raws.iter().enumerate() {
        match normalize(raw) {
            Ok(record) => batch.records.push(record),
            Err(reason) => batch.skipped.push(SkippedRecord {
                index,
                record_id: raw.display_id(),
                reason,
            }),
        }
    }

    batch
}

/// Parse a money amount into integer cents.
///
/// Accepts JSON numbers and strings with an optional `$`, `USD` code and
/// thousands separators. Rounds half away from zero (half-up for the
/// non-negative amounts we keep). Negative, non-numeric or overflowing
/// values yield `None`.
pub fn parse_amount_cents(amount: &RawScalar) -> Option<u64> {
    let (negative, value) = match amount {
        RawScalar::Number(number) => {
            let text = number.to_string();
            let value = if text.contains(['e', 'E']) {
                Decimal::from_scientific(&text).ok()?
            } else {
                Decimal::from_str(&text).ok()?
            };
            (value.is_sign_negative(), value)
        }
        RawScalar::Text(text) => {
            let captures = amount_regex().captures(text.trim())?;
            let mut digits = captures.name("number")?.as_str().replace(',', "");
            if digits.starts_with('.') {
                digits.insert(0, '0');
            }
            let negative = captures.name("sign").is_some_and(|sign| sign.as_str() == "-");
            (negative, Decimal::from_str(&digits).ok()?)
        }
    };

    if negative && !value.is_zero() {
        return None;
    }

    let cents = value
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::from(100))?;
    cents.to_u64()
}

/// Parse an ISO-8601 timestamp into a UTC instant.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(text, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

fn required_identifier(value: Option<&RawScalar>, field: &str) -> Result<String, SkipReason> {
    value
        .map(RawScalar::to_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| SkipReason::MissingIdentifier {
            field: field.to_string(),
        })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
