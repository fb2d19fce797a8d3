// FFI bindings for the ledger computations.
//
// Every function takes one JSON payload and writes one JSON document into
// `result`, which the host must release with `ledger_free`. The host supplies
// `now` explicitly; nothing here reads the system clock. Records are passed
// raw, exactly as the datastore returned them, and the response lists the ones
// that could not be read under `skipped`.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::os::raw::{c_char, c_int};

use crate::config::{parse_utc_offset, LedgerConfig};
use crate::domains::analytics;
use crate::domains::church::ChurchListing;
use crate::domains::donation::{normalize_all, LedgerReport, NormalizedBatch, RawDonationRecord};
use crate::domains::view::{view_with_wildcard, ViewQuery};
use crate::ffi::error::{FFIError, FFIResult};
use crate::ffi::{handle_status_result, read_json, write_json};
use crate::validation::Validate;

/// Settings a payload may override; anything absent keeps the default.
#[derive(Debug, Default, Deserialize)]
struct ConfigDto {
    #[serde(default)]
    utc_offset: Option<String>,
    #[serde(default)]
    anonymous_label: Option<String>,
    #[serde(default)]
    category_wildcard: Option<String>,
}

impl ConfigDto {
    fn into_config(self) -> FFIResult<LedgerConfig> {
        let mut config = LedgerConfig::default();
        if let Some(raw) = self.utc_offset {
            config.utc_offset = parse_utc_offset(&raw)?;
        }
        if let Some(label) = self.anonymous_label {
            config.anonymous_label = label;
        }
        if let Some(wildcard) = self.category_wildcard {
            config.category_wildcard = wildcard;
        }
        config.validate()?;
        Ok(config)
    }
}

fn normalize_logged(records: &[RawDonationRecord]) -> NormalizedBatch {
    let batch = normalize_all(records);
    if !batch.is_complete() {
        log::warn!(
            "{} of {} donation records could not be read",
            batch.skipped_count(),
            records.len()
        );
    }
    batch
}

fn prepare_query(query: ViewQuery, now: Option<DateTime<Utc>>, tz: &FixedOffset) -> FFIResult<ViewQuery> {
    query.validate()?;
    match now {
        Some(now) => Ok(query.resolve_period(now, tz)),
        None if query.period.is_some() => Err(FFIError::invalid_argument("'now' is required when query.period is set")),
        None => Ok(query),
    }
}

/// Dashboard summary.
/// Expected JSON payload:
/// {
///   "records": [ RawDonationRecord ],
///   "now": "2025-03-20T12:00:00Z",
///   "config": { "utc_offset": "-05:00" }   // optional
/// }
/// Result: `{ "data": AggregateSummary, "skipped": [ SkippedRecord ] }`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ledger_summarize(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    #[derive(Deserialize)]
    struct Payload {
        records: Vec<RawDonationRecord>,
        now: DateTime<Utc>,
        #[serde(default)]
        config: ConfigDto,
    }

    handle_status_result(|| unsafe {
        let p: Payload = read_json(payload_json, "payload_json")?;
        let config = p.config.into_config()?;
        let batch = normalize_logged(&p.records);
        let summary = analytics::summarize_in(&batch.records, p.now, &config.utc_offset);
        write_json(result, &LedgerReport::new(summary, batch.skipped))
    })
}

/// Per-donor totals, named and listed.
/// Expected JSON payload:
/// {
///   "records": [ RawDonationRecord ],
///   "names": { "donor-id": "Display Name" },   // optional
///   "query": { ViewQuery },                    // optional
///   "now": "2025-03-20T12:00:00Z",             // required when query.period is set
///   "config": { ... }                          // optional
/// }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ledger_donor_rollups(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    #[derive(Deserialize)]
    struct Payload {
        records: Vec<RawDonationRecord>,
        #[serde(default)]
        names: HashMap<String, String>,
        #[serde(default)]
        query: ViewQuery,
        #[serde(default)]
        now: Option<DateTime<Utc>>,
        #[serde(default)]
        config: ConfigDto,
    }

    handle_status_result(|| unsafe {
        let p: Payload = read_json(payload_json, "payload_json")?;
        let config = p.config.into_config()?;
        let query = prepare_query(p.query, p.now, &config.utc_offset)?;

        let batch = normalize_logged(&p.records);
        let rollups = analytics::donor_rollups(&batch.records);
        let named = analytics::apply_display_names(rollups, &p.names, &config.anonymous_label);
        let listed = view_with_wildcard(&named, &query, &config.category_wildcard);
        write_json(result, &LedgerReport::new(listed, batch.skipped))
    })
}

/// Donation history listing.
/// Expected JSON payload:
/// {
///   "records": [ RawDonationRecord ],
///   "query": { "text": "tithe", "category": "All", "period": "month" },
///   "now": "2025-03-20T12:00:00Z",   // required when query.period is set
///   "config": { ... }
/// }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ledger_view_history(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    #[derive(Deserialize)]
    struct Payload {
        records: Vec<RawDonationRecord>,
        #[serde(default)]
        query: ViewQuery,
        #[serde(default)]
        now: Option<DateTime<Utc>>,
        #[serde(default)]
        config: ConfigDto,
    }

    handle_status_result(|| unsafe {
        let p: Payload = read_json(payload_json, "payload_json")?;
        let config = p.config.into_config()?;
        let query = prepare_query(p.query, p.now, &config.utc_offset)?;

        let batch = normalize_logged(&p.records);
        let listed = view_with_wildcard(&batch.records, &query, &config.category_wildcard);
        write_json(result, &LedgerReport::new(listed, batch.skipped))
    })
}

/// Church directory search.
/// Expected JSON payload:
/// {
///   "churches": [ ChurchListing ],
///   "query": { "text": "grace", "category": "Baptist", "sort": {"key": "distance", "direction": "ascending"} }
/// }
/// Result: `[ ChurchListing ]`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ledger_search_churches(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    #[derive(Deserialize)]
    struct Payload {
        churches: Vec<ChurchListing>,
        #[serde(default)]
        query: ViewQuery,
        #[serde(default)]
        config: ConfigDto,
    }

    handle_status_result(|| unsafe {
        let p: Payload = read_json(payload_json, "payload_json")?;
        let config = p.config.into_config()?;
        p.query.validate()?;
        let listed = view_with_wildcard(&p.churches, &p.query, &config.category_wildcard);
        write_json(result, &listed)
    })
}

/// Twelve monthly totals.
/// Expected JSON payload:
/// {
///   "records": [ RawDonationRecord ],
///   "year": 2025,
///   "config": { ... }
/// }
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ledger_monthly_totals(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    #[derive(Deserialize)]
    struct Payload {
        records: Vec<RawDonationRecord>,
        year: i32,
        #[serde(default)]
        config: ConfigDto,
    }

    handle_status_result(|| unsafe {
        let p: Payload = read_json(payload_json, "payload_json")?;
        let config = p.config.into_config()?;
        let batch = normalize_logged(&p.records);
        let months = analytics::monthly_totals(&batch.records, p.year, &config.utc_offset);
        write_json(result, &LedgerReport::new(months, batch.skipped))
    })
}
