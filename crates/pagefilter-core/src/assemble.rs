//! Output assembly
//!
//! Builds the filtered document by whitelist: every page that is not kept is
//! removed from a copy of the source, then orphaned objects are pruned.

use crate::document::PdfDocument;
use crate::error::PageFilterError;
use crate::retention::KeptPages;
use lopdf::Document;
use tracing::debug;

/// Build a document containing exactly the kept pages, in source order.
///
/// An empty selection is refused; callers report "no match" instead of
/// writing a degenerate document.
pub fn assemble_pages(source: &PdfDocument, kept: &KeptPages) -> Result<Document, PageFilterError> {
    if kept.is_empty() {
        return Err(PageFilterError::InvalidSelection("No pages selected".into()));
    }

    let page_count = source.page_count();
    if let Some(&last) = kept.as_slice().last() {
        if last >= page_count {
            return Err(PageFilterError::InvalidSelection(format!(
                "Page {} does not exist (document has {} pages)",
                last + 1,
                page_count
            )));
        }
    }

    let mut doc = source.inner().clone();

    // lopdf numbers pages from 1; delete back to front so numbers stay valid
    let mut pages_to_delete: Vec<u32> = (0..page_count)
        .filter(|&page| !kept.contains(page))
        .map(|page| page as u32 + 1)
        .collect();
    pages_to_delete.reverse();

    debug!(
        keep = kept.len(),
        delete = pages_to_delete.len(),
        "assembling filtered document"
    );

    for page_num in pages_to_delete {
        doc.delete_pages(&[page_num]);
    }

    doc.prune_objects();
    doc.compress();

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RegionExtractor;
    use crate::region::{HeaderRegion, RegionTextSource};
    use crate::testing::{create_test_pdf, TestPage};
    use pretty_assertions::assert_eq;

    fn numbered_pdf(pages: usize) -> PdfDocument {
        let pages: Vec<TestPage> = (0..pages)
            .map(|i| TestPage::header(&format!("PAGE {}", i + 1)))
            .collect();
        PdfDocument::load_mem(&create_test_pdf(&pages)).unwrap()
    }

    fn header_texts(doc: Document) -> Vec<String> {
        let doc = PdfDocument::from_document(doc);
        let extractor = RegionExtractor::new(&doc, HeaderRegion::default());
        (0..extractor.page_count())
            .map(|page| extractor.extract(page).unwrap())
            .collect()
    }

    #[test]
    fn test_assemble_empty_selection_fails() {
        let source = numbered_pdf(3);
        let result = assemble_pages(&source, &KeptPages::default());
        assert!(matches!(result, Err(PageFilterError::InvalidSelection(_))));
    }

    #[test]
    fn test_assemble_out_of_range_fails() {
        let source = numbered_pdf(3);
        let kept = KeptPages::try_from(vec![0, 3]).unwrap();
        assert!(assemble_pages(&source, &kept).is_err());
    }

    #[test]
    fn test_assemble_keeps_selected_pages_in_order() {
        let source = numbered_pdf(5);
        let kept = KeptPages::try_from(vec![0, 2, 3]).unwrap();
        let doc = assemble_pages(&source, &kept).unwrap();
        assert_eq!(
            header_texts(doc),
            vec!["PAGE 1".to_string(), "PAGE 3".to_string(), "PAGE 4".to_string()]
        );
    }

    #[test]
    fn test_assemble_all_pages_is_identity_on_content() {
        let source = numbered_pdf(3);
        let kept = KeptPages::try_from(vec![0, 1, 2]).unwrap();
        let doc = assemble_pages(&source, &kept).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_assemble_does_not_touch_source() {
        let source = numbered_pdf(4);
        let kept = KeptPages::try_from(vec![1]).unwrap();
        let doc = assemble_pages(&source, &kept).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert_eq!(source.page_count(), 4);
    }
}
