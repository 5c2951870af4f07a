//! In-memory PDF builders for tests
//!
//! Compiled for this crate's own tests and, with the `test-util` feature,
//! for the tests of the front ends.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// Baseline that falls inside the default header region on a US Letter page
pub const HEADER_BASELINE: i64 = 650;

/// Baseline well below the default header region
pub const BODY_BASELINE: i64 = 400;

#[derive(Debug, Clone, Default)]
pub struct TestPage {
    pub header: Option<String>,
    pub body: Option<String>,
}

impl TestPage {
    pub fn blank() -> Self {
        Self::default()
    }

    /// Page with `text` printed inside the header region
    pub fn header(text: &str) -> Self {
        Self {
            header: Some(text.to_string()),
            body: None,
        }
    }

    /// Page with `text` printed outside the header region
    pub fn body(text: &str) -> Self {
        Self {
            header: None,
            body: Some(text.to_string()),
        }
    }

    pub fn with_body(mut self, text: &str) -> Self {
        self.body = Some(text.to_string());
        self
    }
}

fn show_text(x: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
        Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
        Operation::new(
            "Tj",
            vec![Object::String(
                text.as_bytes().to_vec(),
                StringFormat::Literal,
            )],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// `[llx lly urx ury]` box array
pub fn box_array(values: [i64; 4]) -> Object {
    Object::Array(values.iter().map(|&v| Object::Integer(v)).collect())
}

/// Build a PDF whose pages carry the given header/body texts
pub fn create_test_pdf(pages: &[TestPage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]));

    let mut page_ids = Vec::new();
    for page in pages {
        let mut operations = Vec::new();
        if let Some(header) = &page.header {
            operations.extend(show_text(10, HEADER_BASELINE, header));
        }
        if let Some(body) = &page.body {
            operations.extend(show_text(72, BODY_BASELINE, body));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().unwrap(),
        ));
        let mut page = Dictionary::from_iter(vec![
            ("Resources", Object::Reference(resources_id)),
            ("Contents", Object::Reference(content_id)),
            ("MediaBox", box_array([0, 0, 612, 792])),
        ]);
        page_ids.push(add_page(&mut doc, pages_id, &mut page));
    }

    finish(&mut doc, pages_id, page_ids, None)
}

/// Single-page PDF whose MediaBox lives only on the page tree root
pub fn create_pdf_with_inherited_media_box(width: f32, height: f32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = add_page(&mut doc, pages_id, &mut Dictionary::new());
    finish(
        &mut doc,
        pages_id,
        vec![page_id],
        Some(Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width),
            Object::Real(height),
        ])),
    )
}

/// Single-page US Letter PDF with a raw content stream and no resources
pub fn create_pdf_with_content(content: &[u8]) -> Vec<u8> {
    let content = content.to_vec();
    create_single_page_pdf(move |doc| {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        Dictionary::from_iter(vec![
            ("Contents", Object::Reference(content_id)),
            ("MediaBox", box_array([0, 0, 612, 792])),
        ])
    })
}

/// Single-page PDF whose page entries (`Contents`, `Resources`, boxes...)
/// come from `build`, which may add supporting objects to the document.
pub fn create_single_page_pdf(build: impl FnOnce(&mut Document) -> Dictionary) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut page = build(&mut doc);
    let page_id = add_page(&mut doc, pages_id, &mut page);
    finish(&mut doc, pages_id, vec![page_id], None)
}

fn add_page(doc: &mut Document, pages_id: ObjectId, page: &mut Dictionary) -> ObjectId {
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    doc.add_object(page.clone())
}

fn finish(
    doc: &mut Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    media_box: Option<Object>,
) -> Vec<u8> {
    let mut pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    if let Some(media_box) = media_box {
        pages.set("MediaBox", media_box);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
