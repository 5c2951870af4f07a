//! PDF loading and saving
//!
//! Boundary I/O only: failures surface verbatim as `LoadError` / `WriteError`
//! and are never retried.

use crate::error::PageFilterError;
use crate::region::PageFrame;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;
use tracing::{debug, warn};

/// US Letter, used when no MediaBox can be found
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Guards against cyclic `/Parent` chains
const MAX_TREE_DEPTH: usize = 32;

/// A parsed PDF with its pages addressable by 0-based index
#[derive(Debug, Clone)]
pub struct PdfDocument {
    inner: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PageFilterError> {
        let path = path.as_ref();
        let doc = Document::load(path)
            .map_err(|e| PageFilterError::LoadError(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded PDF");
        Ok(Self::from_document(doc))
    }

    pub fn load_mem(bytes: &[u8]) -> Result<Self, PageFilterError> {
        let doc =
            Document::load_mem(bytes).map_err(|e| PageFilterError::LoadError(e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: Document) -> Self {
        // get_pages is keyed by 1-based page number, already in page order
        let page_ids = doc.get_pages().into_values().collect();
        Self {
            inner: doc,
            page_ids,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn page_id(&self, page: usize) -> Option<ObjectId> {
        self.page_ids.get(page).copied()
    }

    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Page dictionary entry, inherited through `/Parent` when the page
    /// does not carry its own. References are resolved.
    fn inherited(&self, page: usize, key: &[u8]) -> Option<&Object> {
        let page_id = self.page_id(page)?;
        let mut dict = self.inner.get_object(page_id).ok()?.as_dict().ok()?;

        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            dict = self.parent_of(dict)?;
        }

        None
    }

    fn inherited_box(&self, page: usize, key: &[u8]) -> Option<[f32; 4]> {
        self.inherited(page, key)
            .and_then(|obj| obj.as_array().ok())
            .and_then(|array| parse_box_array(array))
    }

    /// MediaBox `[llx, lly, urx, ury]` of a page
    pub fn media_box(&self, page: usize) -> Option<[f32; 4]> {
        self.inherited_box(page, b"MediaBox")
    }

    /// CropBox of a page, falling back to its MediaBox
    pub fn crop_box(&self, page: usize) -> Option<[f32; 4]> {
        self.inherited_box(page, b"CropBox")
            .or_else(|| self.media_box(page))
    }

    /// `/Rotate` in degrees, 0 when absent
    pub fn rotation(&self, page: usize) -> i64 {
        self.inherited(page, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0)
    }

    /// Visible area and rotation that region coordinates are measured against.
    /// Defaults to US Letter when the page has no usable box.
    pub fn page_frame(&self, page: usize) -> PageFrame {
        let rotation = self.rotation(page);
        match self.crop_box(page) {
            Some(bounds) => PageFrame::new(bounds, rotation),
            None => {
                warn!(page = page + 1, "no MediaBox found, assuming US Letter");
                PageFrame::new(DEFAULT_MEDIA_BOX, rotation)
            }
        }
    }

    /// Resource dictionary of a page, inherited through `/Parent`
    pub fn page_resources(&self, page: usize) -> Option<&Dictionary> {
        self.inherited(page, b"Resources")
            .and_then(|obj| obj.as_dict().ok())
    }

    /// Follow a reference, returning the object itself for direct values
    pub(crate) fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.inner.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    fn parent_of(&self, dict: &Dictionary) -> Option<&Dictionary> {
        let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        self.inner.get_object(parent_id).ok()?.as_dict().ok()
    }
}

/// Parse a box array `[x1, y1, x2, y2]`
fn parse_box_array(array: &[Object]) -> Option<[f32; 4]> {
    if array.len() != 4 {
        return None;
    }

    let mut result = [0.0; 4];
    for (slot, obj) in result.iter_mut().zip(array) {
        *slot = number(obj)?;
    }
    Some(result)
}

/// Numeric value of an integer or real operand
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(n) => Some(*n as f32),
        Object::Real(n) => Some(*n as f32),
        _ => None,
    }
}

/// Save a document to `path`
pub fn write_document(doc: &mut Document, path: impl AsRef<Path>) -> Result<(), PageFilterError> {
    let path = path.as_ref();
    doc.save(path)
        .map_err(|e| PageFilterError::WriteError(format!("{}: {}", path.display(), e)))?;
    debug!(path = %path.display(), "wrote PDF");
    Ok(())
}

/// Serialize a document to bytes
pub fn document_to_bytes(doc: &mut Document) -> Result<Vec<u8>, PageFilterError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PageFilterError::WriteError(format!("Save failed: {}", e)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        box_array, create_pdf_with_inherited_media_box, create_single_page_pdf, create_test_pdf,
        TestPage,
    };

    #[test]
    fn test_load_mem_counts_pages() {
        let pdf = create_test_pdf(&[TestPage::blank(), TestPage::blank(), TestPage::blank()]);
        let doc = PdfDocument::load_mem(&pdf).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert!(doc.page_id(2).is_some());
        assert!(doc.page_id(3).is_none());
    }

    #[test]
    fn test_load_garbage_is_load_error() {
        let result = PdfDocument::load_mem(b"definitely not a pdf");
        assert!(matches!(result, Err(PageFilterError::LoadError(_))));
    }

    #[test]
    fn test_load_missing_file_is_load_error() {
        let result = PdfDocument::load("/nonexistent/input.pdf");
        assert!(matches!(result, Err(PageFilterError::LoadError(_))));
    }

    #[test]
    fn test_media_box_read_from_page() {
        let pdf = create_test_pdf(&[TestPage::blank()]);
        let doc = PdfDocument::load_mem(&pdf).unwrap();
        assert_eq!(doc.media_box(0), Some([0.0, 0.0, 612.0, 792.0]));
        assert_eq!(doc.page_frame(0), PageFrame::default());
    }

    #[test]
    fn test_media_box_inherited_from_parent() {
        let pdf = create_pdf_with_inherited_media_box(595.0, 842.0);
        let doc = PdfDocument::load_mem(&pdf).unwrap();
        assert_eq!(doc.page_frame(0).bounds(), [0.0, 0.0, 595.0, 842.0]);
    }

    #[test]
    fn test_crop_box_and_rotation_win_over_media_box() {
        let pdf = create_single_page_pdf(|_| {
            Dictionary::from_iter(vec![
                ("MediaBox", box_array([0, 0, 612, 792])),
                ("CropBox", box_array([36, 36, 576, 756])),
                ("Rotate", Object::Integer(90)),
            ])
        });
        let doc = PdfDocument::load_mem(&pdf).unwrap();
        let frame = doc.page_frame(0);
        assert_eq!(frame.bounds(), [36.0, 36.0, 576.0, 756.0]);
        assert_eq!(frame.rotation(), 90);
    }

    #[test]
    fn test_missing_media_box_defaults_to_letter() {
        let pdf = create_single_page_pdf(|_| Dictionary::new());
        let doc = PdfDocument::load_mem(&pdf).unwrap();
        assert_eq!(doc.media_box(0), None);
        assert_eq!(doc.page_frame(0), PageFrame::default());
    }

    #[test]
    fn test_page_resources_found() {
        let pdf = create_test_pdf(&[TestPage::header("X")]);
        let doc = PdfDocument::load_mem(&pdf).unwrap();
        assert!(doc.page_resources(0).unwrap().has(b"Font"));
    }

    #[test]
    fn test_write_to_missing_directory_is_write_error() {
        let pdf = create_test_pdf(&[TestPage::blank()]);
        let mut doc = Document::load_mem(&pdf).unwrap();
        let result = write_document(&mut doc, "/nonexistent/dir/out.pdf");
        assert!(matches!(result, Err(PageFilterError::WriteError(_))));
    }

    #[test]
    fn test_document_to_bytes_round_trips() {
        let pdf = create_test_pdf(&[TestPage::blank(), TestPage::blank()]);
        let mut doc = Document::load_mem(&pdf).unwrap();
        let bytes = document_to_bytes(&mut doc).unwrap();
        assert_eq!(PdfDocument::load_mem(&bytes).unwrap().page_count(), 2);
    }
}
