//! Upload checks and document summary

use pagefilter_core::PdfDocument;
use serde::Serialize;

/// What the page shows about a loaded file before filtering
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentSummary {
    pub name: String,
    pub page_count: u32,
    pub size_bytes: usize,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    pub encrypted: bool,
}

impl DocumentSummary {
    pub fn new(name: &str, size_bytes: usize, document: &PdfDocument) -> Self {
        Self {
            name: name.to_string(),
            page_count: document.page_count() as u32,
            size_bytes,
            version: document.inner().version.clone(),
            encrypted: document.inner().is_encrypted(),
        }
    }
}

/// Cheap header and trailer check, run before a full parse
pub fn quick_validate(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() < 8 {
        return Err("File too small to be a valid PDF".to_string());
    }

    if !bytes.starts_with(b"%PDF-") {
        return Err("Not a valid PDF file (missing %PDF- header)".to_string());
    }

    let tail = if bytes.len() > 1024 {
        &bytes[bytes.len() - 1024..]
    } else {
        bytes
    };

    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err("PDF appears truncated (missing %%EOF marker)".to_string());
    }

    Ok(())
}
