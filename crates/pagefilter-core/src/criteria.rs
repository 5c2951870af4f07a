//! Filter criteria
//!
//! A search term plus an optional header keyword. Both are upper-cased on
//! construction so every comparison downstream is case-insensitive.

use crate::error::PageFilterError;

/// Header literal used by the single-criterion work-address layout.
pub const WORK_ADDRESS_HEADER: &str = "INDIRIZZO SEDE DI LAVORO";

/// How header pages are recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMode {
    /// No keyword configured: every page is a header and is judged on its own.
    EveryPage,
    /// A page is a header iff its region text contains this (upper-cased) keyword.
    Keyword(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    search_term: String,
    header: HeaderMode,
}

impl FilterCriteria {
    /// Build criteria from raw user input.
    ///
    /// An absent or empty `header_keyword` selects [`HeaderMode::EveryPage`].
    /// Whitespace is a real keyword and is kept as given.
    /// A blank `search_term` is rejected.
    pub fn new(search_term: &str, header_keyword: Option<&str>) -> Result<Self, PageFilterError> {
        if search_term.trim().is_empty() {
            return Err(PageFilterError::InvalidCriteria(
                "Search term must not be empty".into(),
            ));
        }

        let header = match header_keyword {
            Some(keyword) if !keyword.is_empty() => {
                HeaderMode::Keyword(keyword.to_uppercase())
            }
            _ => HeaderMode::EveryPage,
        };

        Ok(Self {
            search_term: search_term.to_uppercase(),
            header,
        })
    }

    /// Criteria for the work-address layout, where the header literal is fixed.
    pub fn work_address(search_term: &str) -> Result<Self, PageFilterError> {
        Self::new(search_term, Some(WORK_ADDRESS_HEADER))
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn header(&self) -> &HeaderMode {
        &self.header
    }

    pub fn header_keyword(&self) -> Option<&str> {
        match &self.header {
            HeaderMode::EveryPage => None,
            HeaderMode::Keyword(keyword) => Some(keyword),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_upper_cases_inputs() {
        let criteria = FilterCriteria::new("Milan", Some("Indirizzo Sede")).unwrap();
        assert_eq!(criteria.search_term(), "MILAN");
        assert_eq!(criteria.header_keyword(), Some("INDIRIZZO SEDE"));
    }

    #[test]
    fn test_blank_search_term_rejected() {
        assert!(FilterCriteria::new("", None).is_err());
        assert!(FilterCriteria::new("   ", Some("HEADER")).is_err());
    }

    #[test]
    fn test_missing_or_empty_keyword_means_every_page() {
        let none = FilterCriteria::new("rome", None).unwrap();
        let empty = FilterCriteria::new("rome", Some("")).unwrap();

        assert_eq!(none.header(), &HeaderMode::EveryPage);
        assert_eq!(empty.header(), &HeaderMode::EveryPage);
    }

    #[test]
    fn test_whitespace_keyword_is_kept() {
        let blank = FilterCriteria::new("rome", Some("  ")).unwrap();
        assert_eq!(blank.header(), &HeaderMode::Keyword("  ".into()));
    }

    #[test]
    fn test_work_address_uses_fixed_literal() {
        let criteria = FilterCriteria::work_address("torino").unwrap();
        assert_eq!(criteria.header_keyword(), Some(WORK_ADDRESS_HEADER));
    }
}
