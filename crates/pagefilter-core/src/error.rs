use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageFilterError {
    #[error("Failed to load PDF: {0}")]
    LoadError(String),

    #[error("Failed to extract header region on page {}: {reason}", .page + 1)]
    ExtractionError { page: usize, reason: String },

    #[error("Failed to write PDF: {0}")]
    WriteError(String),

    #[error("Invalid filter criteria: {0}")]
    InvalidCriteria(String),

    #[error("Invalid header region: {0}")]
    InvalidRegion(String),

    #[error("Invalid page selection: {0}")]
    InvalidSelection(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PageFilterError {
    pub(crate) fn extraction(page: usize, reason: impl Into<String>) -> Self {
        Self::ExtractionError {
            page,
            reason: reason.into(),
        }
    }
}
