//! Page classification
//!
//! Decides from a page's header-region text whether the page starts a new
//! record and, if so, whether that record matches the search term.

use crate::criteria::{FilterCriteria, HeaderMode};
use serde::Serialize;

/// Per-page verdict, recomputed on every scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageVerdict {
    /// Header page whose region text contains the search term
    HeaderMatch,
    /// Header page without the search term
    HeaderNoMatch,
    /// Not a header; inherits the decision of the previous header
    Continuation,
}

impl PageVerdict {
    pub fn is_header(self) -> bool {
        !matches!(self, PageVerdict::Continuation)
    }
}

/// Classify one page from the raw text of its header region.
///
/// Case folding happens here, not in the caller. Empty text never matches.
pub fn classify(region_text: &str, criteria: &FilterCriteria) -> PageVerdict {
    let text = region_text.to_uppercase();

    let is_header = match criteria.header() {
        HeaderMode::EveryPage => true,
        HeaderMode::Keyword(keyword) => text.contains(keyword.as_str()),
    };

    if !is_header {
        PageVerdict::Continuation
    } else if text.contains(criteria.search_term()) {
        PageVerdict::HeaderMatch
    } else {
        PageVerdict::HeaderNoMatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "INDIRIZZO SEDE DI LAVORO";

    fn keyword_criteria(term: &str) -> FilterCriteria {
        FilterCriteria::new(term, Some(HEADER)).unwrap()
    }

    #[test]
    fn test_header_with_term_matches() {
        let verdict = classify(
            "INDIRIZZO SEDE DI LAVORO: MILAN",
            &keyword_criteria("MILAN"),
        );
        assert_eq!(verdict, PageVerdict::HeaderMatch);
    }

    #[test]
    fn test_header_without_term_does_not_match() {
        let verdict = classify("INDIRIZZO SEDE DI LAVORO: ROME", &keyword_criteria("MILAN"));
        assert_eq!(verdict, PageVerdict::HeaderNoMatch);
    }

    #[test]
    fn test_term_without_header_is_continuation() {
        let verdict = classify("Payslip detail for Milan", &keyword_criteria("MILAN"));
        assert_eq!(verdict, PageVerdict::Continuation);
    }

    #[test]
    fn test_matching_ignores_case() {
        let criteria = FilterCriteria::new("milan", Some("indirizzo sede di lavoro")).unwrap();
        let verdict = classify("Indirizzo Sede di Lavoro: Milan", &criteria);
        assert_eq!(verdict, PageVerdict::HeaderMatch);
    }

    #[test]
    fn test_empty_text_never_matches() {
        assert_eq!(
            classify("", &keyword_criteria("MILAN")),
            PageVerdict::Continuation
        );

        let every_page = FilterCriteria::new("MILAN", None).unwrap();
        assert_eq!(classify("", &every_page), PageVerdict::HeaderNoMatch);
    }

    #[test]
    fn test_every_page_mode_has_no_continuations() {
        let criteria = FilterCriteria::new("MILAN", None).unwrap();
        assert_eq!(classify("MILAN", &criteria), PageVerdict::HeaderMatch);
        assert_eq!(classify("plain text", &criteria), PageVerdict::HeaderNoMatch);
    }

    #[test]
    fn test_is_header() {
        assert!(PageVerdict::HeaderMatch.is_header());
        assert!(PageVerdict::HeaderNoMatch.is_header());
        assert!(!PageVerdict::Continuation.is_header());
    }
}
