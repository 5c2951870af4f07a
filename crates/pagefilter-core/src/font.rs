//! Font-aware decoding of string operands
//!
//! A [`FontDecoder`] turns the bytes of a `Tj`/`TJ` operand into glyphs with
//! their Unicode text and advance width, using in order of preference:
//! - the font's `/ToUnicode` CMap
//! - for simple fonts, the `/Encoding` base table patched by `/Differences`
//!
//! Widths come from `/FirstChar` + `/Widths` (simple fonts) or `/DW` + `/W`
//! of the descendant font (Type0). Glyphs without a known width report
//! `None` and the caller picks an approximation.

use crate::document::number;
use lopdf::{Dictionary, Document, Object};
use std::collections::BTreeMap;

/// Nesting limit when dereferencing font sub-objects
const MAX_DEREF: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    /// Advance in text space units (fraction of the font size)
    pub width: Option<f32>,
    /// Single-byte code 32, the only code word spacing applies to
    pub is_space: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FontDecoder {
    /// Bytes per character code
    code_len: usize,
    to_unicode: BTreeMap<u32, String>,
    /// Simple fonts only: text for each single-byte code
    encoding: Option<Vec<String>>,
    widths: BTreeMap<u32, f32>,
    default_width: Option<f32>,
}

fn deref<'a>(doc: &'a Document, mut obj: &'a Object) -> &'a Object {
    for _ in 0..MAX_DEREF {
        match obj {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => obj = target,
                Err(_) => break,
            },
            _ => break,
        }
    }
    obj
}

fn get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| deref(doc, obj))
}

/// Raw bytes of a stream, decompressed when it carries a filter
pub(crate) fn stream_bytes(stream: &lopdf::Stream) -> Result<Vec<u8>, String> {
    if stream.dict.has(b"Filter") {
        stream.decompressed_content().map_err(|e| e.to_string())
    } else {
        Ok(stream.content.clone())
    }
}

impl FontDecoder {
    pub fn new(doc: &Document, font: &Dictionary) -> Self {
        let is_type0 = matches!(
            font.get(b"Subtype").and_then(Object::as_name),
            Ok(b"Type0")
        );

        let mut decoder = Self {
            code_len: if is_type0 { 2 } else { 1 },
            ..Self::default()
        };

        if let Some(cmap) = get(doc, font, b"ToUnicode")
            .and_then(|obj| obj.as_stream().ok())
            .and_then(|stream| stream_bytes(stream).ok())
        {
            let parsed = parse_to_unicode(&cmap);
            if let Some(len) = parsed.code_len {
                decoder.code_len = len;
            }
            decoder.to_unicode = parsed.map;
        }

        if is_type0 {
            decoder.read_cid_widths(doc, font);
        } else {
            decoder.encoding = Some(simple_encoding(doc, font));
            decoder.read_simple_widths(doc, font);
        }

        decoder
    }

    fn read_simple_widths(&mut self, doc: &Document, font: &Dictionary) {
        let first = get(doc, font, b"FirstChar")
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0)
            .max(0) as u32;
        if let Some(widths) = get(doc, font, b"Widths").and_then(|obj| obj.as_array().ok()) {
            for (offset, width) in widths.iter().enumerate() {
                if let Some(width) = number(deref(doc, width)) {
                    self.widths.insert(first + offset as u32, width / 1000.0);
                }
            }
        }
    }

    fn read_cid_widths(&mut self, doc: &Document, font: &Dictionary) {
        let Some(descendant) = get(doc, font, b"DescendantFonts")
            .and_then(|obj| obj.as_array().ok())
            .and_then(|array| array.first())
            .and_then(|obj| deref(doc, obj).as_dict().ok())
        else {
            self.default_width = Some(1.0);
            return;
        };

        let default = get(doc, descendant, b"DW").and_then(number).unwrap_or(1000.0);
        self.default_width = Some(default / 1000.0);

        let Some(entries) = get(doc, descendant, b"W").and_then(|obj| obj.as_array().ok()) else {
            return;
        };

        // W: `c [w1 w2 ...]` or `c_first c_last w`
        let mut i = 0;
        while i < entries.len() {
            let Some(start) = number(deref(doc, &entries[i])) else {
                break;
            };
            let start = start as u32;
            match entries.get(i + 1).map(|obj| deref(doc, obj)) {
                Some(Object::Array(widths)) => {
                    for (offset, width) in widths.iter().enumerate() {
                        if let Some(width) = number(deref(doc, width)) {
                            self.widths.insert(start + offset as u32, width / 1000.0);
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let (Some(last), Some(width)) = (
                        number(last),
                        entries.get(i + 2).and_then(|obj| number(deref(doc, obj))),
                    ) else {
                        break;
                    };
                    for code in start..=last as u32 {
                        self.widths.insert(code, width / 1000.0);
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        bytes
            .chunks(self.code_len.max(1))
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                Glyph {
                    text: self.text_for(code, chunk),
                    width: self.widths.get(&code).copied().or(self.default_width),
                    is_space: chunk.len() == 1 && code == 32,
                }
            })
            .collect()
    }

    fn text_for(&self, code: u32, chunk: &[u8]) -> String {
        if let Some(text) = self.to_unicode.get(&code) {
            return text.clone();
        }
        if let (Some(table), [byte]) = (&self.encoding, chunk) {
            let text = &table[*byte as usize];
            if !text.is_empty() {
                return text.clone();
            }
            return char::from(*byte).to_string();
        }
        char::from_u32(code).map(String::from).unwrap_or_default()
    }
}

/// Single-byte code table from `/Encoding` (a name, or a dictionary with
/// `/BaseEncoding` and `/Differences`)
fn simple_encoding(doc: &Document, font: &Dictionary) -> Vec<String> {
    let encoding = get(doc, font, b"Encoding");

    let base = match encoding {
        Some(Object::Name(name)) => Some(name.as_slice()),
        Some(Object::Dictionary(dict)) => get(doc, dict, b"BaseEncoding")
            .and_then(|obj| obj.as_name().ok()),
        _ => None,
    }
    .and_then(|name| std::str::from_utf8(name).ok())
    .filter(|name| {
        matches!(
            *name,
            "StandardEncoding" | "MacRomanEncoding" | "MacExpertEncoding" | "WinAnsiEncoding"
        )
    })
    .unwrap_or("StandardEncoding");

    let mut table: Vec<String> = (0..=255u8)
        .map(|byte| Document::decode_text(Some(base), &[byte]))
        .collect();

    if let Some(Object::Dictionary(dict)) = encoding {
        if let Some(differences) = get(doc, dict, b"Differences").and_then(|obj| obj.as_array().ok()) {
            let mut code = 0usize;
            for item in differences {
                match deref(doc, item) {
                    Object::Integer(start) => code = (*start).clamp(0, 255) as usize,
                    Object::Name(name) => {
                        if let (Some(slot), Some(ch)) = (
                            table.get_mut(code),
                            std::str::from_utf8(name).ok().and_then(glyph_name_to_char),
                        ) {
                            *slot = ch.to_string();
                        }
                        code += 1;
                    }
                    _ => {}
                }
            }
        }
    }

    table
}

/// Unicode for an Adobe glyph name. Covers `uniXXXX`, `uXXXX[XX]`,
/// single-character names and the common Latin names.
fn glyph_name_to_char(name: &str) -> Option<char> {
    let name = name.split('.').next().unwrap_or(name);

    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 {
            return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            if let Some(ch) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                return Some(ch);
            }
        }
    }

    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return Some(ch);
    }

    let ch = match name {
        "space" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "minus" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "underscore" => '_',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "degree" => '°',
        "Euro" => '€',
        "agrave" => 'à',
        "egrave" => 'è',
        "eacute" => 'é',
        "igrave" => 'ì',
        "ograve" => 'ò',
        "ugrave" => 'ù',
        "Agrave" => 'À',
        "Egrave" => 'È',
        "Eacute" => 'É',
        "Igrave" => 'Ì',
        "Ograve" => 'Ò',
        "Ugrave" => 'Ù',
        _ => return None,
    };
    Some(ch)
}

/// Result of reading a `/ToUnicode` CMap
#[derive(Debug, Default)]
struct ToUnicode {
    map: BTreeMap<u32, String>,
    /// Byte length of the first codespace range
    code_len: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < data.len() {
        match data[i] {
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => {
                tokens.push(Token::Word("<<".into()));
                i += 2;
            }
            b'>' if data.get(i + 1) == Some(&b'>') => {
                tokens.push(Token::Word(">>".into()));
                i += 2;
            }
            b'<' => {
                let end = data[i..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(data.len(), |p| i + p);
                let digits: Vec<u8> = data[i + 1..end]
                    .iter()
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .collect();
                let bytes = digits
                    .chunks(2)
                    .filter_map(|pair| {
                        let hex = std::str::from_utf8(pair).ok()?;
                        let value = u8::from_str_radix(hex, 16).ok()?;
                        // Odd trailing digit is padded with 0
                        Some(if pair.len() == 1 { value << 4 } else { value })
                    })
                    .collect();
                tokens.push(Token::Hex(bytes));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'>' | b'[' | b']' | b'%')
                {
                    i += 1;
                }
                tokens.push(Token::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
        }
    }

    tokens
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// `dst` with its last UTF-16 unit advanced by `offset`
fn offset_text(dst: &[u8], offset: u32) -> String {
    let mut units: Vec<u16> = dst
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect();
    if let Some(last) = units.last_mut() {
        *last = last.wrapping_add(offset as u16);
    }
    String::from_utf16_lossy(&units)
}

fn parse_to_unicode(data: &[u8]) -> ToUnicode {
    let tokens = tokenize(data);
    let mut result = ToUnicode::default();
    let mut i = 0;

    while i < tokens.len() {
        let Token::Word(word) = &tokens[i] else {
            i += 1;
            continue;
        };
        i += 1;

        match word.as_str() {
            "begincodespacerange" => {
                while let (Some(Token::Hex(low)), Some(Token::Hex(_))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    result.code_len.get_or_insert(low.len().max(1));
                    i += 2;
                }
            }
            "beginbfchar" => {
                while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    result.map.insert(code_of(src), utf16_text(dst));
                    i += 2;
                }
            }
            "beginbfrange" => loop {
                let (Some(Token::Hex(low)), Some(Token::Hex(high))) =
                    (tokens.get(i), tokens.get(i + 1))
                else {
                    break;
                };
                let (low, high) = (code_of(low), code_of(high));
                i += 2;

                match tokens.get(i) {
                    Some(Token::Hex(dst)) => {
                        for code in low..=high.min(low.saturating_add(0xFFFF)) {
                            result.map.insert(code, offset_text(dst, code - low));
                        }
                        i += 1;
                    }
                    Some(Token::ArrayStart) => {
                        i += 1;
                        let mut code = low;
                        while let Some(Token::Hex(dst)) = tokens.get(i) {
                            if code <= high {
                                result.map.insert(code, utf16_text(dst));
                            }
                            code += 1;
                            i += 1;
                        }
                        if tokens.get(i) == Some(&Token::ArrayEnd) {
                            i += 1;
                        }
                    }
                    _ => break,
                }
            },
            _ => {}
        }
    }

    result
}
