//! Country grouping

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::Place;

const FLAG_CDN_BASE_URL: &str = "https://flagcdn.com/w160";

/// Flag image URL for a two-letter country code
pub fn flag_url(country_code: &str) -> String {
    format!(
        "{}/{}.png",
        FLAG_CDN_BASE_URL,
        country_code.trim().to_lowercase()
    )
}

/// Places grouped under their resolved country
///
/// `places` keeps insertion order. A country with no places is never kept
/// in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub name: String,
    pub flag_url: String,
    #[serde(default)]
    pub places: Vec<Place>,
}

impl Country {
    pub fn new(name: impl Into<String>, country_code: &str) -> Self {
        Self {
            name: name.into(),
            flag_url: flag_url(country_code),
            places: Vec::new(),
        }
    }

    /// Alphabetical ordering used for the country collection
    ///
    /// Case-insensitive first, then exact.
    pub fn cmp_by_name(&self, other: &Self) -> Ordering {
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then_with(|| self.name.cmp(&other.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_url_lowercases_code() {
        assert_eq!(flag_url("PE"), "https://flagcdn.com/w160/pe.png");
        assert_eq!(flag_url(" jp "), "https://flagcdn.com/w160/jp.png");
    }

    #[test]
    fn test_cmp_by_name() {
        let mut countries = vec![
            Country::new("peru", "PE"),
            Country::new("Japan", "JP"),
            Country::new("Chile", "CL"),
        ];
        countries.sort_by(|a, b| a.cmp_by_name(b));
        let names: Vec<_> = countries.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Chile", "Japan", "peru"]);
    }
}
