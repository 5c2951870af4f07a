use serde::Serialize;

/// Outcome of an in-memory filter run, shaped for front ends
#[derive(Debug, Clone, Serialize)]
pub struct FilterResult {
    pub success: bool,
    /// False when the scan found no matching record; distinct from failure
    pub matched: bool,
    /// 1-based page numbers retained in the output
    pub kept_pages: Vec<u32>,
    /// Base64-encoded PDF data
    pub data: Option<String>,
    pub error: Option<String>,
    pub metrics: Option<ProcessMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
    pub kept_page_count: u32,
    pub processing_time_ms: u64,
}

impl FilterResult {
    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            matched: false,
            kept_pages: Vec::new(),
            data: None,
            error: Some(error.to_string()),
            metrics: None,
        }
    }
}
