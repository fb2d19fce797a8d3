use serde::{Deserialize, Serialize};

use crate::domains::view::{SortDirection, SortKey, SortSpec, SortValue, Viewable};

/// A church as listed in the directory search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurchListing {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub denomination: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Distance from the member; absent when location is unknown
    #[serde(default, alias = "distance_miles")]
    pub distance_miles: Option<f64>,
    #[serde(default)]
    pub members: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

impl Viewable for ChurchListing {
    const DEFAULT_SORT: SortSpec = SortSpec::new(SortKey::Name, SortDirection::Ascending);

    fn display_name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> Option<&str> {
        self.denomination.as_deref()
    }

    fn sort_value(&self, key: SortKey) -> SortValue {
        match key {
            SortKey::Name => SortValue::text(&self.name),
            SortKey::Distance => self
                .distance_miles
                .filter(|d| d.is_finite())
                .map_or(SortValue::Missing, SortValue::Distance),
            SortKey::Amount | SortKey::Date => SortValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::view::{view, ViewQuery};

    fn churches() -> Vec<ChurchListing> {
        serde_json::from_str(
            r#"[
                {"id": "1", "name": "Grace Community Church", "denomination": "Non-Denominational",
                 "address": "123 Main Street, Springfield", "distanceMiles": 0.5, "verified": true},
                {"id": "2", "name": "First Baptist Church", "denomination": "Baptist",
                 "address": "456 Oak Avenue, Springfield", "distanceMiles": 1.2, "verified": true},
                {"id": "3", "name": "New Life Fellowship", "denomination": "Christian"},
                {"id": "4", "name": "Calvary Baptist", "denomination": "baptist", "distance_miles": 0.9}
            ]"#,
        )
        .unwrap()
    }

    fn ids(list: &[ChurchListing]) -> Vec<&str> {
        list.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_directory_defaults_to_name_order() {
        let result = view(&churches(), &ViewQuery::new());
        assert_eq!(ids(&result), vec!["4", "2", "1", "3"]);
    }

    #[test]
    fn test_distance_sort_puts_unknown_last() {
        let query = ViewQuery::new().sorted_by(SortKey::Distance, SortDirection::Ascending);
        assert_eq!(ids(&view(&churches(), &query)), vec!["1", "4", "2", "3"]);

        let query = ViewQuery::new().sorted_by(SortKey::Distance, SortDirection::Descending);
        assert_eq!(ids(&view(&churches(), &query)), vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn test_denomination_filter_and_search() {
        let baptist = view(&churches(), &ViewQuery::new().with_category("Baptist"));
        assert_eq!(ids(&baptist), vec!["4", "2"]);

        let search = view(&churches(), &ViewQuery::new().with_text("church").with_category("All"));
        assert_eq!(ids(&search), vec!["2", "1"]);
    }
}
