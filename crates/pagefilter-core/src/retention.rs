//! Record retention
//!
//! Single forward pass over the pages. The verdict of each header page
//! decides the fate of the continuation pages that follow it, until the next
//! header page resets the decision. Records of any length are therefore kept
//! or dropped as a unit without knowing their length in advance.

use crate::classifier::{classify, PageVerdict};
use crate::criteria::FilterCriteria;
use crate::error::PageFilterError;
use crate::region::RegionTextSource;
use serde::Serialize;
use tracing::{debug, info};

/// Where the scan stands with respect to the current record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordState {
    /// No header seen yet; continuation pages are dropped
    #[default]
    AwaitingHeader,
    InIncludedRecord,
    InExcludedRecord,
}

impl RecordState {
    /// Apply a page verdict, returning the next state and whether the page is kept.
    pub fn advance(self, verdict: PageVerdict) -> (Self, bool) {
        match verdict {
            PageVerdict::HeaderMatch => (RecordState::InIncludedRecord, true),
            PageVerdict::HeaderNoMatch => (RecordState::InExcludedRecord, false),
            PageVerdict::Continuation => (self, self == RecordState::InIncludedRecord),
        }
    }
}

/// Ascending 0-based indices of the pages to retain. Empty means no record matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeptPages(Vec<usize>);

impl KeptPages {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn contains(&self, page: usize) -> bool {
        self.0.binary_search(&page).is_ok()
    }

    /// 1-based page numbers, for reporting to users
    pub fn page_numbers(&self) -> Vec<u32> {
        self.0.iter().map(|&page| page as u32 + 1).collect()
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }
}

impl TryFrom<Vec<usize>> for KeptPages {
    type Error = PageFilterError;

    /// Accepts only strictly ascending indices
    fn try_from(pages: Vec<usize>) -> Result<Self, Self::Error> {
        if pages.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(PageFilterError::InvalidSelection(
                "Page indices must be strictly ascending".into(),
            ));
        }
        Ok(Self(pages))
    }
}

/// Outcome of scanning one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDecision {
    pub page: usize,
    pub verdict: PageVerdict,
    pub kept: bool,
    /// Header-region text the verdict was based on
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct RetentionEngine {
    criteria: FilterCriteria,
}

impl RetentionEngine {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Scan every page in order and return the per-page decisions.
    ///
    /// The first extraction failure aborts the scan.
    pub fn scan<S>(&self, source: &S) -> Result<Vec<PageDecision>, PageFilterError>
    where
        S: RegionTextSource + ?Sized,
    {
        let page_count = source.page_count();
        let mut state = RecordState::default();
        let mut decisions = Vec::with_capacity(page_count);

        for page in 0..page_count {
            let text = source.extract(page)?;
            let verdict = classify(&text, &self.criteria);
            let (next, kept) = state.advance(verdict);

            debug!(page = page + 1, ?verdict, kept, "classified page");

            state = next;
            decisions.push(PageDecision {
                page,
                verdict,
                kept,
                text,
            });
        }

        Ok(decisions)
    }

    /// Select the pages belonging to matching records.
    pub fn select_pages<S>(&self, source: &S) -> Result<KeptPages, PageFilterError>
    where
        S: RegionTextSource + ?Sized,
    {
        let kept: Vec<usize> = self
            .scan(source)?
            .into_iter()
            .filter(|decision| decision.kept)
            .map(|decision| decision.page)
            .collect();

        info!(
            kept = kept.len(),
            total = source.page_count(),
            search_term = self.criteria.search_term(),
            "page selection complete"
        );

        Ok(KeptPages(kept))
    }
}
