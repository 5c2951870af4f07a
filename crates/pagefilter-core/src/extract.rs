//! Header-region text extraction over lopdf content streams
//!
//! Walks a page's content stream with a reduced text-rendering state machine
//! and keeps the glyphs whose baseline origin falls inside the configured
//! [`HeaderRegion`]. Positions are measured against the page's [`PageFrame`]
//! (crop box origin and `/Rotate`).
//!
//! | Operator | Action |
//! |----------|--------|
//! | `q` `Q` `cm` | Save / restore / concatenate the graphics CTM |
//! | `BT` | Reset text and line matrices |
//! | `Tf` | Select font and size from the current resources |
//! | `Tm` `Td` `TD` `T*` `TL` | Position the text line |
//! | `Tc` `Tw` `Tz` `Ts` | Spacing, scaling, rise |
//! | `Tj` `TJ` `'` `"` | Show text |
//! | `Do` | Run a Form XObject with its matrix and resources |
//!
//! String operands are decoded through the selected font (see
//! [`FontDecoder`]). Glyphs whose font gives no width advance by
//! [`APPROX_GLYPH_WIDTH`] em.

use crate::document::{number, PdfDocument};
use crate::error::PageFilterError;
use crate::font::{stream_bytes, FontDecoder, Glyph};
use crate::region::{HeaderRegion, PageFrame, RegionTextSource};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// Average glyph advance as a fraction of the font size
pub const APPROX_GLYPH_WIDTH: f32 = 0.5;

/// TJ adjustments below this (in thousandths of an em) read as a word gap
const TJ_SPACE_THRESHOLD: f32 = -100.0;

/// Baselines closer than this (in points) belong to the same line
const SAME_LINE_TOLERANCE: f32 = 1.0;

/// Form XObjects nested deeper than this are skipped
const MAX_FORM_DEPTH: usize = 8;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `lhs × rhs` in PDF row-vector convention
fn multiply(lhs: &Matrix, rhs: &Matrix) -> Matrix {
    [
        lhs[0] * rhs[0] + lhs[1] * rhs[2],
        lhs[0] * rhs[1] + lhs[1] * rhs[3],
        lhs[2] * rhs[0] + lhs[3] * rhs[2],
        lhs[2] * rhs[1] + lhs[3] * rhs[3],
        lhs[4] * rhs[0] + lhs[5] * rhs[2] + rhs[4],
        lhs[4] * rhs[1] + lhs[5] * rhs[3] + rhs[5],
    ]
}

fn transform_point(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (slot, operand) in m.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(m)
}

/// Graphics and text state saved by `q` and restored by `Q`
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Option<Rc<FontDecoder>>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horiz_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horiz_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Collects the glyphs that land inside the region
struct RegionCollector {
    region: HeaderRegion,
    frame: PageFrame,
    text: String,
    last_baseline: Option<f32>,
    pending_space: bool,
}

impl RegionCollector {
    fn push(&mut self, glyph: &str, x: f32, y: f32) {
        let (x, y) = self.frame.to_display(x, y);
        if glyph.is_empty() || !self.region.contains_display(x, y) {
            return;
        }

        match self.last_baseline {
            Some(baseline) if (baseline - y).abs() > SAME_LINE_TOLERANCE => {
                self.text.push('\n');
            }
            Some(_) if self.pending_space && !self.text.ends_with(' ') => {
                self.text.push(' ');
            }
            _ => {}
        }

        self.text.push_str(glyph);
        self.last_baseline = Some(y);
        self.pending_space = false;
    }
}

/// Text-state machine for one page and the forms it draws
struct PageWalker<'a> {
    doc: &'a Document,
    resources: Option<&'a Dictionary>,
    fonts: HashMap<ObjectId, Rc<FontDecoder>>,
    form_depth: usize,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    collector: RegionCollector,
}

impl<'a> PageWalker<'a> {
    fn new(
        doc: &'a Document,
        resources: Option<&'a Dictionary>,
        region: HeaderRegion,
        frame: PageFrame,
    ) -> Self {
        Self {
            doc,
            resources,
            fonts: HashMap::new(),
            form_depth: 0,
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            collector: RegionCollector {
                region,
                frame,
                text: String::new(),
                last_baseline: None,
                pending_space: false,
            },
        }
    }

    fn set_number(operands: &[Object], target: &mut f32) {
        if let Some(value) = operands.first().and_then(number) {
            *target = value;
        }
    }

    fn run(&mut self, content: &Content) -> Result<(), String> {
        for op in &content.operations {
            self.apply(op.operator.as_str(), &op.operands)?;
        }
        Ok(())
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) -> Result<(), String> {
        match operator {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(operands) {
                    self.state.ctm = multiply(&m, &self.state.ctm);
                }
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.state.font = self.font(name);
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    self.state.font_size = size;
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operand(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = Self::pair(operands) {
                    self.next_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = Self::pair(operands) {
                    self.state.leading = -ty;
                    self.next_line(tx, ty);
                }
            }
            "T*" => self.next_line(0.0, -self.state.leading),
            "TL" => Self::set_number(operands, &mut self.state.leading),
            "Tc" => Self::set_number(operands, &mut self.state.char_spacing),
            "Tw" => Self::set_number(operands, &mut self.state.word_spacing),
            "Ts" => Self::set_number(operands, &mut self.state.rise),
            "Tz" => {
                if let Some(scale) = operands.first().and_then(number) {
                    self.state.horiz_scale = scale / 100.0;
                }
            }
            "Tj" => {
                if let Some(operand) = operands.first() {
                    self.show(operand);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match number(item) {
                            Some(adjustment) => self.adjust(adjustment),
                            None => self.show(item),
                        }
                    }
                }
            }
            "'" => {
                self.next_line(0.0, -self.state.leading);
                if let Some(operand) = operands.first() {
                    self.show(operand);
                }
            }
            "\"" => {
                if operands.len() >= 3 {
                    Self::set_number(&operands[0..1], &mut self.state.word_spacing);
                    Self::set_number(&operands[1..2], &mut self.state.char_spacing);
                    self.next_line(0.0, -self.state.leading);
                    self.show(&operands[2]);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.draw_form(name)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn pair(operands: &[Object]) -> (Option<f32>, Option<f32>) {
        (
            operands.first().and_then(number),
            operands.get(1).and_then(number),
        )
    }

    /// Entry `name` of resource category `category` (`Font`, `XObject`)
    fn resource(&self, category: &[u8], name: &[u8]) -> Option<(Option<ObjectId>, &'a Object)> {
        let doc = self.doc;
        let entries = self
            .resources?
            .get_deref(category, doc)
            .ok()?
            .as_dict()
            .ok()?;
        doc.dereference(entries.get(name).ok()?).ok()
    }

    fn font(&mut self, name: &[u8]) -> Option<Rc<FontDecoder>> {
        let doc = self.doc;
        let (id, font) = self.resource(b"Font", name)?;
        let font = font.as_dict().ok()?;

        match id {
            Some(id) => Some(
                self.fonts
                    .entry(id)
                    .or_insert_with(|| Rc::new(FontDecoder::new(doc, font)))
                    .clone(),
            ),
            None => Some(Rc::new(FontDecoder::new(doc, font))),
        }
    }

    fn draw_form(&mut self, name: &[u8]) -> Result<(), String> {
        let Some((_, object)) = self.resource(b"XObject", name) else {
            return Ok(());
        };
        let Ok(stream) = object.as_stream() else {
            return Ok(());
        };
        if !matches!(stream.dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Form")) {
            return Ok(());
        }
        if self.form_depth >= MAX_FORM_DEPTH {
            debug!(
                form = %String::from_utf8_lossy(name),
                "form nesting too deep, skipped"
            );
            return Ok(());
        }

        let bytes = stream_bytes(stream)?;
        let content = Content::decode(&bytes).map_err(|e| e.to_string())?;
        let matrix = stream
            .dict
            .get(b"Matrix")
            .and_then(Object::as_array)
            .ok()
            .and_then(|array| matrix_operand(array))
            .unwrap_or(IDENTITY);
        let resources = stream
            .dict
            .get_deref(b"Resources", self.doc)
            .and_then(Object::as_dict)
            .ok()
            .or(self.resources);

        let saved_state = self.state.clone();
        let saved_stack = self.stack.len();
        let saved_text = (self.text_matrix, self.line_matrix);
        let saved_resources = std::mem::replace(&mut self.resources, resources);

        self.state.ctm = multiply(&matrix, &self.state.ctm);
        self.form_depth += 1;
        let result = self.run(&content);
        self.form_depth -= 1;

        self.resources = saved_resources;
        self.state = saved_state;
        self.stack.truncate(saved_stack);
        (self.text_matrix, self.line_matrix) = saved_text;
        result
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.text_matrix = self.line_matrix;
    }

    fn advance(&mut self, tx: f32) {
        self.text_matrix[4] += tx * self.text_matrix[0];
        self.text_matrix[5] += tx * self.text_matrix[1];
    }

    /// TJ number: move left by `adjustment` thousandths of an em
    fn adjust(&mut self, adjustment: f32) {
        if adjustment < TJ_SPACE_THRESHOLD {
            self.collector.pending_space = true;
        }
        let tx = -adjustment / 1000.0 * self.state.font_size * self.state.horiz_scale;
        self.advance(tx);
    }

    fn show(&mut self, operand: &Object) {
        let Object::String(bytes, _) = operand else {
            return;
        };

        let glyphs = match &self.state.font {
            Some(font) => font.decode(bytes),
            None => decode_pdf_string(bytes)
                .chars()
                .map(|ch| Glyph {
                    text: ch.to_string(),
                    width: None,
                    is_space: ch == ' ',
                })
                .collect(),
        };

        for glyph in glyphs {
            let rendering = multiply(&self.text_matrix, &self.state.ctm);
            let (x, y) = transform_point(&rendering, 0.0, self.state.rise);
            self.collector.push(&glyph.text, x, y);

            let width = glyph.width.unwrap_or(APPROX_GLYPH_WIDTH);
            let mut tx = self.state.font_size * width + self.state.char_spacing;
            if glyph.is_space {
                tx += self.state.word_spacing;
            }
            self.advance(tx * self.state.horiz_scale);
        }
    }

    fn finish(self) -> String {
        self.collector.text
    }
}

/// Decode a string operand shown without a usable font: UTF-8, then
/// UTF-16BE with BOM, then Latin-1
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        if let Ok(s) = String::from_utf16(&units) {
            return s;
        }
    }
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// [`RegionTextSource`] over the pages of a loaded PDF
pub struct RegionExtractor<'a> {
    document: &'a PdfDocument,
    region: HeaderRegion,
}

impl<'a> RegionExtractor<'a> {
    pub fn new(document: &'a PdfDocument, region: HeaderRegion) -> Self {
        Self { document, region }
    }
}

impl RegionTextSource for RegionExtractor<'_> {
    fn page_count(&self) -> usize {
        self.document.page_count()
    }

    fn extract(&self, page: usize) -> Result<String, PageFilterError> {
        let page_id = self
            .document
            .page_id(page)
            .ok_or_else(|| PageFilterError::extraction(page, "page index out of range"))?;

        let doc = self.document.inner();
        let raw = doc
            .get_page_content(page_id)
            .map_err(|e| PageFilterError::extraction(page, e.to_string()))?;
        let content = Content::decode(&raw)
            .map_err(|e| PageFilterError::extraction(page, e.to_string()))?;

        let mut walker = PageWalker::new(
            doc,
            self.document.page_resources(page),
            self.region,
            self.document.page_frame(page),
        );
        walker
            .run(&content)
            .map_err(|e| PageFilterError::extraction(page, e))?;

        let text = walker.finish();
        trace!(page = page + 1, text = %text, "extracted header region");
        Ok(text)
    }
}
