//! Header-delimited PDF record filter
//!
//! Splits a document made of repeated records (one header page followed by
//! zero or more continuation pages) down to the records whose header region
//! contains a search term.
//!
//! Pipeline:
//! - [`PdfDocument::load`]: parse the source
//! - [`RegionExtractor`]: read the header-region text of each page
//! - [`RetentionEngine::select_pages`]: classify pages and pick matching records
//! - [`assemble_pages`]: copy the kept pages, in order, into a new document
//!
//! A scan that matches nothing yields [`FilterOutcome::NoMatch`], which is a
//! normal result and never an error.

pub mod assemble;
pub mod classifier;
pub mod command;
pub mod config;
pub mod criteria;
pub mod document;
pub mod error;
pub mod extract;
pub mod font;
pub mod region;
pub mod retention;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use assemble::assemble_pages;
pub use classifier::{classify, PageVerdict};
pub use command::{FilterResult, ProcessMetrics};
pub use config::FilterConfig;
pub use criteria::{FilterCriteria, HeaderMode, WORK_ADDRESS_HEADER};
pub use document::{document_to_bytes, write_document, PdfDocument};
pub use error::PageFilterError;
pub use extract::RegionExtractor;
pub use region::{HeaderRegion, RegionTextSource};
pub use retention::{KeptPages, PageDecision, RecordState, RetentionEngine};

use base64::Engine as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default output file name, placed next to the input
pub const DEFAULT_OUTPUT_NAME: &str = "filtered_output.pdf";

/// Result of filtering a loaded document
#[derive(Debug)]
pub enum FilterOutcome {
    /// No header page matched; nothing should be written
    NoMatch,
    Filtered {
        kept: KeptPages,
        document: lopdf::Document,
    },
}

/// Summary of a file-to-file run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterReport {
    NoMatch {
        search_term: String,
    },
    Written {
        output: PathBuf,
        page_count: usize,
        kept: KeptPages,
    },
}

/// `filtered_output.pdf` in the input's directory
pub fn default_output_path(input: &Path) -> PathBuf {
    input
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(DEFAULT_OUTPUT_NAME)
}

/// Select the pages of matching records without assembling anything.
pub fn select_pages(
    document: &PdfDocument,
    config: &FilterConfig,
) -> Result<KeptPages, PageFilterError> {
    config.region.validate()?;
    let engine = RetentionEngine::new(config.criteria()?);
    engine.select_pages(&RegionExtractor::new(document, config.region))
}

/// Per-page verdicts and region text, for calibrating the header region.
pub fn inspect_pages(
    document: &PdfDocument,
    config: &FilterConfig,
) -> Result<Vec<PageDecision>, PageFilterError> {
    config.region.validate()?;
    let engine = RetentionEngine::new(config.criteria()?);
    engine.scan(&RegionExtractor::new(document, config.region))
}

/// Select and assemble; assembly is skipped when nothing matched.
pub fn filter_document(
    document: &PdfDocument,
    config: &FilterConfig,
) -> Result<FilterOutcome, PageFilterError> {
    let kept = select_pages(document, config)?;
    if kept.is_empty() {
        return Ok(FilterOutcome::NoMatch);
    }

    let assembled = assemble_pages(document, &kept)?;
    Ok(FilterOutcome::Filtered {
        kept,
        document: assembled,
    })
}

/// Load `input`, filter it and write the result to `output`.
///
/// Nothing is written when no record matches.
pub fn filter_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &FilterConfig,
) -> Result<FilterReport, PageFilterError> {
    let output = output.as_ref();
    let document = PdfDocument::load(input)?;

    match filter_document(&document, config)? {
        FilterOutcome::NoMatch => {
            info!(search_term = %config.search_term, "no matching record");
            Ok(FilterReport::NoMatch {
                search_term: config.criteria()?.search_term().to_string(),
            })
        }
        FilterOutcome::Filtered {
            kept,
            document: mut filtered,
        } => {
            write_document(&mut filtered, output)?;
            info!(
                output = %output.display(),
                kept = kept.len(),
                total = document.page_count(),
                "filtered document written"
            );
            Ok(FilterReport::Written {
                output: output.to_path_buf(),
                page_count: document.page_count(),
                kept,
            })
        }
    }
}

/// In-memory filter for front ends that hold the file as bytes.
///
/// Failures are reported inside the result rather than returned, so the
/// result can be handed straight to a serializer. `processing_time_ms` is
/// left for the caller to fill in.
pub fn filter_bytes(bytes: &[u8], config: &FilterConfig) -> FilterResult {
    let run = || -> Result<FilterResult, PageFilterError> {
        let document = PdfDocument::load_mem(bytes)?;
        let page_count = document.page_count() as u32;

        let (kept, data) = match filter_document(&document, config)? {
            FilterOutcome::NoMatch => (KeptPages::default(), None),
            FilterOutcome::Filtered {
                kept,
                document: mut filtered,
            } => {
                let data = document_to_bytes(&mut filtered)?;
                (kept, Some(data))
            }
        };

        let output_size_bytes = data.as_ref().map_or(0, Vec::len);
        Ok(FilterResult {
            success: true,
            matched: !kept.is_empty(),
            kept_pages: kept.page_numbers(),
            data: data.map(|d| base64::engine::general_purpose::STANDARD.encode(d)),
            error: None,
            metrics: Some(ProcessMetrics {
                input_size_bytes: bytes.len(),
                output_size_bytes,
                page_count,
                kept_page_count: kept.len() as u32,
                processing_time_ms: 0,
            }),
        })
    };

    run().unwrap_or_else(FilterResult::failure)
}
