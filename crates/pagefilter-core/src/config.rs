//! Filter configuration
//!
//! Everything a front end collects before running a filter. Can be read from
//! a JSON file so a recurring layout does not have to be retyped.

use crate::criteria::FilterCriteria;
use crate::error::PageFilterError;
use crate::region::HeaderRegion;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub search_term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_keyword: Option<String>,
    #[serde(default)]
    pub region: HeaderRegion,
}

impl FilterConfig {
    pub fn new(search_term: impl Into<String>, header_keyword: Option<String>) -> Self {
        Self {
            search_term: search_term.into(),
            header_keyword,
            region: HeaderRegion::default(),
        }
    }

    pub fn with_region(mut self, region: HeaderRegion) -> Self {
        self.region = region;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, PageFilterError> {
        serde_json::from_str(json).map_err(|e| PageFilterError::ConfigError(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PageFilterError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| PageFilterError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Validated, case-folded criteria
    pub fn criteria(&self) -> Result<FilterCriteria, PageFilterError> {
        FilterCriteria::new(&self.search_term, self.header_keyword.as_deref())
    }

    pub fn validate(&self) -> Result<(), PageFilterError> {
        self.region.validate()?;
        self.criteria().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::HeaderMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_minimal_json_uses_default_region() {
        let config = FilterConfig::from_json(r#"{"search_term":"milan"}"#).unwrap();
        assert_eq!(config.region, HeaderRegion::default());
        assert_eq!(config.header_keyword, None);
    }

    #[test]
    fn test_full_json() {
        let json = r#"{
            "search_term": "milan",
            "header_keyword": "indirizzo sede di lavoro",
            "region": {"x": 0, "y": 120, "width": 400, "height": 30}
        }"#;
        let config = FilterConfig::from_json(json).unwrap();
        assert_eq!(config.region, HeaderRegion::new(0.0, 120.0, 400.0, 30.0).unwrap());
        assert_eq!(
            config.criteria().unwrap().header(),
            &HeaderMode::Keyword("INDIRIZZO SEDE DI LAVORO".into())
        );
    }

    #[test]
    fn test_missing_search_term_is_config_error() {
        let result = FilterConfig::from_json(r#"{"header_keyword":"x"}"#);
        assert!(matches!(result, Err(PageFilterError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_region() {
        let config = FilterConfig {
            search_term: "milan".into(),
            header_keyword: None,
            region: HeaderRegion {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 10.0,
            },
        };
        assert!(matches!(
            config.validate(),
            Err(PageFilterError::InvalidRegion(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.json");
        std::fs::write(&path, r#"{"search_term":"rome","header_keyword":""}"#).unwrap();

        let config = FilterConfig::from_json_file(&path).unwrap();
        assert_eq!(config.criteria().unwrap().header(), &HeaderMode::EveryPage);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = FilterConfig::from_json_file("/nonexistent/filter.json");
        assert!(matches!(result, Err(PageFilterError::ConfigError(_))));
    }
}
