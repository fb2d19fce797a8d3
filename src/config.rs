use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::env;

use crate::errors::{DomainResult, ServiceError, ServiceResult, ValidationError};
use crate::validation::{Validate, ValidationBuilder};

pub const ENV_UTC_OFFSET: &str = "LEDGER_UTC_OFFSET";
pub const ENV_ANONYMOUS_LABEL: &str = "LEDGER_ANONYMOUS_LABEL";
pub const ENV_CATEGORY_WILDCARD: &str = "LEDGER_CATEGORY_WILDCARD";

const MAX_OFFSET_SECONDS: i32 = 18 * 3600;

/// Settings shared by every ledger computation.
///
/// All period boundaries are computed in `utc_offset`; nothing reads the
/// device's local zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(with = "offset_format")]
    pub utc_offset: FixedOffset,
    /// Shown for donors whose name could not be resolved
    pub anonymous_label: String,
    /// Category filter value that matches everything
    pub category_wildcard: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            utc_offset: utc(),
            anonymous_label: "Anonymous".to_string(),
            category_wildcard: "All".to_string(),
        }
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

impl LedgerConfig {
    /// Build a config from the process environment, loading `.env` first when present.
    pub fn from_env() -> ServiceResult<Self> {
        // A missing .env file is fine
        let _ = dotenv::dotenv();

        let mut config = Self::default();

        if let Ok(raw) = env::var(ENV_UTC_OFFSET) {
            config.utc_offset = parse_utc_offset(&raw).map_err(|e| {
                ServiceError::Configuration(format!("{}: {}", ENV_UTC_OFFSET, e))
            })?;
        }
        if let Ok(label) = env::var(ENV_ANONYMOUS_LABEL) {
            config.anonymous_label = label;
        }
        if let Ok(wildcard) = env::var(ENV_CATEGORY_WILDCARD) {
            config.category_wildcard = wildcard;
        }

        config
            .validate()
            .map_err(|e| ServiceError::Configuration(e.to_string()))?;

        log::debug!(
            "Ledger config loaded: offset={}, anonymous_label='{}', wildcard='{}'",
            config.utc_offset,
            config.anonymous_label,
            config.category_wildcard
        );

        Ok(config)
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }
}

impl Validate for LedgerConfig {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("anonymous_label", Some(self.anonymous_label.clone()))
            .required()
            .max_length(64)
            .validate()?;
        ValidationBuilder::new("category_wildcard", Some(self.category_wildcard.clone()))
            .required()
            .max_length(32)
            .validate()?;
        ValidationBuilder::new("utc_offset", Some(self.utc_offset.local_minus_utc()))
            .range(-MAX_OFFSET_SECONDS, MAX_OFFSET_SECONDS)
            .validate()
    }
}

/// Parse `UTC`, `Z`, `±HH:MM`, `±HHMM` or `±HH` into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return Ok(utc());
    }

    let invalid = || ValidationError::format("utc_offset", "expected UTC, Z or ±HH:MM");

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().map_err(|_| invalid())?, 0),
        4 => (
            digits[..2].parse::<i32>().map_err(|_| invalid())?,
            digits[2..].parse::<i32>().map_err(|_| invalid())?,
        ),
        _ => return Err(invalid()),
    };
    if minutes >= 60 {
        return Err(invalid());
    }

    let seconds = sign * (hours * 3600 + minutes * 60);
    if seconds.abs() > MAX_OFFSET_SECONDS {
        return Err(ValidationError::range("utc_offset", "-18:00", "+18:00"));
    }
    FixedOffset::east_opt(seconds).ok_or_else(invalid)
}

mod offset_format {
    use chrono::FixedOffset;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(offset: &FixedOffset, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&offset.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FixedOffset, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_utc_offset(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utc_offset_forms() {
        assert_eq!(parse_utc_offset("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("+05:30").unwrap().local_minus_utc(), 19800);
        assert_eq!(parse_utc_offset("-0800").unwrap().local_minus_utc(), -28800);
        assert_eq!(parse_utc_offset("+02").unwrap().local_minus_utc(), 7200);
    }

    #[test]
    fn test_parse_utc_offset_rejects_garbage() {
        assert!(parse_utc_offset("local").is_err());
        assert!(parse_utc_offset("05:00").is_err());
        assert!(parse_utc_offset("+5:0").is_err());
        assert!(parse_utc_offset("+05:75").is_err());
        assert!(parse_utc_offset("+19:00").is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = LedgerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.utc_offset.local_minus_utc(), 0);
        assert_eq!(config.anonymous_label, "Anonymous");
        assert_eq!(config.category_wildcard, "All");
    }

    #[test]
    fn test_blank_label_is_invalid() {
        let config = LedgerConfig {
            anonymous_label: " ".to_string(),
            ..LedgerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serde_uses_offset_string() {
        let config = LedgerConfig::default().with_utc_offset(parse_utc_offset("-05:00").unwrap());
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"-05:00\""));
        let back: LedgerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
