//! Legends loaded from the backend, their images and keyword search.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CATEGORY_ID;
use crate::error::Result;
use crate::geo::Coordinate;

/// A user-submitted point of interest. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub coordinate: Coordinate,
    pub user_id: Option<i64>,
    pub category_id: i64,
}

// Structure of a `/places` entry
#[derive(Debug, Clone, Deserialize)]
pub struct LegendRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<i64>,
    #[serde(rename = "categoryId", alias = "category_id", default)]
    pub category_id: Option<i64>,
}

impl TryFrom<LegendRecord> for Legend {
    type Error = crate::error::LegendMapError;

    fn try_from(record: LegendRecord) -> Result<Self> {
        // a missing coordinate fails range validation like an out-of-range one
        let latitude = record.latitude.unwrap_or(f64::NAN);
        let longitude = record.longitude.unwrap_or(f64::NAN);
        Ok(Legend {
            coordinate: Coordinate::new(latitude, longitude)?,
            id: record.id,
            name: record.name,
            description: record.description,
            user_id: record.user_id,
            category_id: record.category_id.unwrap_or(DEFAULT_CATEGORY_ID),
        })
    }
}

/// Image reference from `/images`; passed to the detail panel as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub serde_json::Value);

/// Case-insensitive substring search over legend names.
pub fn search_legends<'a>(legends: &'a [Legend], keyword: &str) -> Vec<&'a Legend> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    legends
        .iter()
        .filter(|legend| legend.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legend(id: i64, name: &str) -> Legend {
        Legend {
            id,
            name: name.to_string(),
            description: String::new(),
            coordinate: Coordinate { latitude: 51.0, longitude: 19.0 },
            user_id: None,
            category_id: 1,
        }
    }

    #[test]
    fn test_record_parsing() {
        let json = r#"{"id": 7, "name": "Smok Wawelski", "description": "d",
                       "latitude": 50.054, "longitude": 19.935, "userId": 3}"#;
        let record: LegendRecord = serde_json::from_str(json).unwrap();
        let legend = Legend::try_from(record).unwrap();
        assert_eq!(legend.id, 7);
        assert_eq!(legend.user_id, Some(3));
        assert_eq!(legend.category_id, DEFAULT_CATEGORY_ID);
        assert_eq!(legend.coordinate.latitude, 50.054);
    }

    #[test]
    fn test_record_with_bad_coordinate_is_rejected() {
        let json = r#"{"id": 1, "name": "x", "latitude": 200.0, "longitude": 0.0}"#;
        let record: LegendRecord = serde_json::from_str(json).unwrap();
        assert!(Legend::try_from(record).is_err());
    }

    #[test]
    fn test_null_coordinate_rejects_only_that_record() {
        let json = r#"[
            {"id": 1, "name": "ok", "latitude": 51.1, "longitude": 17.0},
            {"id": 2, "name": "no position", "latitude": null, "longitude": 17.0},
            {"id": 3, "name": "no keys"}
        ]"#;
        let records: Vec<LegendRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 3);

        let legends: Vec<Legend> = records.into_iter().filter_map(|r| Legend::try_from(r).ok()).collect();
        assert_eq!(legends.len(), 1);
        assert_eq!(legends[0].id, 1);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let legends = vec![legend(1, "Smok Wawelski"), legend(2, "Syrenka"), legend(3, "Bazyliszek")];
        let found: Vec<_> = search_legends(&legends, "SMOK").iter().map(|l| l.id).collect();
        assert_eq!(found, [1]);

        let found: Vec<_> = search_legends(&legends, "s").iter().map(|l| l.id).collect();
        assert_eq!(found, [1, 2, 3]);
    }

    #[test]
    fn test_search_with_blank_keyword_matches_nothing() {
        let legends = vec![legend(1, "Syrenka")];
        assert!(search_legends(&legends, "   ").is_empty());
    }
}
