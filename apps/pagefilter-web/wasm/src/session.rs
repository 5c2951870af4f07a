//! Stateful filter session
//!
//! Holds the loaded document and the current criteria in Rust so the page
//! only forwards form input and downloads the result.

use crate::validation::{quick_validate, DocumentSummary};
use pagefilter_core::{
    document_to_bytes, filter_document, select_pages, FilterConfig, FilterOutcome, HeaderRegion,
    PdfDocument,
};
use wasm_bindgen::prelude::*;

struct LoadedDocument {
    summary: DocumentSummary,
    document: PdfDocument,
}

#[wasm_bindgen]
pub struct FilterSession {
    loaded: Option<LoadedDocument>,
    config: Option<FilterConfig>,
    region: HeaderRegion,
    progress_callback: Option<js_sys::Function>,
}

impl Default for FilterSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl FilterSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            loaded: None,
            config: None,
            region: HeaderRegion::default(),
            progress_callback: None,
        }
    }

    /// Callback signature: (current: number, total: number, message: string) => void
    #[wasm_bindgen(js_name = setProgressCallback)]
    pub fn set_progress_callback(&mut self, callback: js_sys::Function) {
        self.progress_callback = Some(callback);
    }

    /// Load (or replace) the source document. Returns its summary.
    #[wasm_bindgen(js_name = loadDocument)]
    pub fn load_document(&mut self, name: &str, bytes: &[u8]) -> Result<JsValue, JsValue> {
        let summary = self
            .load_document_internal(name, bytes)
            .map_err(|e| JsValue::from_str(&e))?;

        serde_wasm_bindgen::to_value(&summary)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// An empty keyword treats every page as a record header.
    #[wasm_bindgen(js_name = setCriteria)]
    pub fn set_criteria(
        &mut self,
        search_term: &str,
        header_keyword: Option<String>,
    ) -> Result<(), JsValue> {
        self.set_criteria_internal(search_term, header_keyword)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Header region in points from the top-left corner of the page
    #[wasm_bindgen(js_name = setRegion)]
    pub fn set_region(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<(), JsValue> {
        self.region = HeaderRegion::new(x, y, width, height)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        if let Some(config) = self.config.as_mut() {
            config.region = self.region;
        }
        Ok(())
    }

    /// Summary of the loaded document, or `undefined`
    #[wasm_bindgen(js_name = documentSummary)]
    pub fn document_summary(&self) -> Result<JsValue, JsValue> {
        match self.summary() {
            Some(summary) => serde_wasm_bindgen::to_value(summary)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = canExecute)]
    pub fn can_execute(&self) -> bool {
        self.loaded.is_some() && self.config.is_some()
    }

    /// 1-based page numbers the current criteria would keep
    pub fn preview(&self) -> Result<Vec<u32>, JsValue> {
        self.preview_internal().map_err(|e| JsValue::from_str(&e))
    }

    /// Filtered PDF, or `undefined` when no record matched
    pub fn execute(&self) -> Result<Option<js_sys::Uint8Array>, JsValue> {
        self.report_progress(0, 100, "Scanning pages...");

        let output = self.execute_internal().map_err(|e| JsValue::from_str(&e))?;

        self.report_progress(100, 100, "Complete");

        Ok(output.map(|bytes| {
            let array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
            array.copy_from(&bytes);
            array
        }))
    }
}

impl FilterSession {
    fn load_document_internal(
        &mut self,
        name: &str,
        bytes: &[u8],
    ) -> Result<DocumentSummary, String> {
        quick_validate(bytes)?;
        let document = PdfDocument::load_mem(bytes).map_err(|e| e.to_string())?;

        let summary = DocumentSummary::new(name, bytes.len(), &document);
        self.loaded = Some(LoadedDocument {
            summary: summary.clone(),
            document,
        });
        Ok(summary)
    }

    fn set_criteria_internal(
        &mut self,
        search_term: &str,
        header_keyword: Option<String>,
    ) -> Result<(), String> {
        let config = FilterConfig::new(search_term, header_keyword).with_region(self.region);
        config.validate().map_err(|e| e.to_string())?;
        self.config = Some(config);
        Ok(())
    }

    fn ready(&self) -> Result<(&LoadedDocument, &FilterConfig), String> {
        let loaded = self.loaded.as_ref().ok_or("No document loaded")?;
        let config = self.config.as_ref().ok_or("Please enter a search term")?;
        Ok((loaded, config))
    }

    fn preview_internal(&self) -> Result<Vec<u32>, String> {
        let (loaded, config) = self.ready()?;
        let kept = select_pages(&loaded.document, config).map_err(|e| e.to_string())?;
        Ok(kept.page_numbers())
    }

    fn execute_internal(&self) -> Result<Option<Vec<u8>>, String> {
        let (loaded, config) = self.ready()?;

        match filter_document(&loaded.document, config).map_err(|e| e.to_string())? {
            FilterOutcome::NoMatch => Ok(None),
            FilterOutcome::Filtered { mut document, .. } => {
                self.report_progress(90, 100, "Saving...");
                document_to_bytes(&mut document)
                    .map(Some)
                    .map_err(|e| e.to_string())
            }
        }
    }

    fn report_progress(&self, current: u32, total: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            let this = JsValue::null();
            let _ = callback.call3(
                &this,
                &JsValue::from(current),
                &JsValue::from(total),
                &JsValue::from_str(message),
            );
        }
    }

    fn summary(&self) -> Option<&DocumentSummary> {
        self.loaded.as_ref().map(|loaded| &loaded.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pdf::build_pdf;
    use pretty_assertions::assert_eq;

    fn loaded_session(headers: &[&str]) -> FilterSession {
        let mut session = FilterSession::new();
        session
            .load_document_internal("payroll.pdf", &build_pdf(headers))
            .unwrap();
        session
    }

    #[test]
    fn test_new_session_cannot_execute() {
        let session = FilterSession::new();
        assert!(!session.can_execute());
        assert!(session.preview_internal().is_err());
    }

    #[test]
    fn test_load_document_reports_summary() {
        let session = loaded_session(&["SITE MILAN", "", "SITE ROME"]);
        let summary = session.summary().unwrap();
        assert_eq!(summary.page_count, 3);
        assert_eq!(summary.name, "payroll.pdf");
    }

    #[test]
    fn test_load_rejects_non_pdf() {
        let mut session = FilterSession::new();
        assert!(session.load_document_internal("x.pdf", b"plain text").is_err());
        assert!(session.summary().is_none());
    }

    #[test]
    fn test_blank_search_term_rejected() {
        let mut session = loaded_session(&["SITE MILAN"]);
        assert!(session.set_criteria_internal("   ", None).is_err());
        assert!(!session.can_execute());
    }

    #[test]
    fn test_preview_keeps_records() {
        let mut session = loaded_session(&["SITE MILAN", "", "SITE ROME", "", "SITE MILAN"]);
        session
            .set_criteria_internal("milan", Some("site".to_string()))
            .unwrap();
        assert_eq!(session.preview_internal().unwrap(), vec![1, 2, 5]);
    }

    #[test]
    fn test_execute_writes_kept_pages() {
        let mut session = loaded_session(&["SITE MILAN", "", "SITE ROME"]);
        session
            .set_criteria_internal("milan", Some("site".to_string()))
            .unwrap();

        let bytes = session.execute_internal().unwrap().unwrap();
        assert_eq!(PdfDocument::load_mem(&bytes).unwrap().page_count(), 2);
    }

    #[test]
    fn test_execute_no_match_returns_none() {
        let mut session = loaded_session(&["SITE ROME"]);
        session.set_criteria_internal("milan", None).unwrap();
        assert_eq!(session.execute_internal().unwrap(), None);
    }

    #[test]
    fn test_zero_page_document_is_no_match() {
        let mut session = loaded_session(&[]);
        assert_eq!(session.summary().unwrap().page_count, 0);

        session.set_criteria_internal("milan", None).unwrap();
        assert!(session.can_execute());
        assert_eq!(session.preview_internal().unwrap(), Vec::<u32>::new());
        assert_eq!(session.execute_internal().unwrap(), None);
    }
}
