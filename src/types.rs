use serde::{Deserialize, Serialize};
use std::fmt;

/// Whose donations a ledger query is about.
///
/// Donors see what they gave; payees (churches) see what they received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LedgerOwner {
    Donor(String),
    Payee(String),
}

impl LedgerOwner {
    pub fn id(&self) -> &str {
        match self {
            LedgerOwner::Donor(id) | LedgerOwner::Payee(id) => id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerOwner::Donor(_) => "donor",
            LedgerOwner::Payee(_) => "payee",
        }
    }
}

impl fmt::Display for LedgerOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_str(), self.id())
    }
}

/// Sort direction for view listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
