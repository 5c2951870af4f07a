//! WASM bindings for the header-region page filter
//!
//! Two ways in:
//! - stateless `filter_pdf` / `preview_pages` for one-shot calls
//! - `FilterSession`, which keeps the parsed document in Rust between
//!   preview and execution
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { FilterSession } from './pkg/pagefilter_wasm.js';
//!
//! await init();
//!
//! const session = new FilterSession();
//! session.loadDocument("payroll.pdf", bytes);
//! session.setCriteria("milano", "INDIRIZZO SEDE DI LAVORO");
//! const pages = session.preview();
//! const result = session.execute();
//! if (result === undefined) showNoMatch(); else downloadBlob(result, "filtered_output.pdf");
//! ```

pub mod session;
pub mod validation;

use pagefilter_core::{filter_bytes, select_pages, FilterConfig, FilterResult, PdfDocument};
use wasm_bindgen::prelude::*;

pub use session::FilterSession;
pub use validation::DocumentSummary;

/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Quick header check for a dropped file
#[wasm_bindgen]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    validation::quick_validate(bytes).map_err(|e| JsValue::from_str(&e))
}

/// Filter `bytes` in one call.
///
/// Resolves to a `FilterResult` object. `matched: false` with `success: true`
/// means no record matched; `data` then stays empty.
#[wasm_bindgen]
pub fn filter_pdf(
    bytes: &[u8],
    search_term: &str,
    header_keyword: Option<String>,
) -> Result<JsValue, JsValue> {
    let started = js_sys::Date::now();
    let mut result = filter_pdf_internal(bytes, search_term, header_keyword);
    if let Some(metrics) = result.metrics.as_mut() {
        metrics.processing_time_ms = (js_sys::Date::now() - started).max(0.0) as u64;
    }

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// 1-based page numbers that `filter_pdf` would keep
#[wasm_bindgen]
pub fn preview_pages(
    bytes: &[u8],
    search_term: &str,
    header_keyword: Option<String>,
) -> Result<Vec<u32>, JsValue> {
    preview_pages_internal(bytes, search_term, header_keyword).map_err(|e| JsValue::from_str(&e))
}

fn filter_pdf_internal(
    bytes: &[u8],
    search_term: &str,
    header_keyword: Option<String>,
) -> FilterResult {
    filter_bytes(bytes, &FilterConfig::new(search_term, header_keyword))
}

fn preview_pages_internal(
    bytes: &[u8],
    search_term: &str,
    header_keyword: Option<String>,
) -> Result<Vec<u32>, String> {
    let config = FilterConfig::new(search_term, header_keyword);
    let document = PdfDocument::load_mem(bytes).map_err(|e| e.to_string())?;
    let kept = select_pages(&document, &config).map_err(|e| e.to_string())?;
    Ok(kept.page_numbers())
}
