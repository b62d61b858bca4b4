//! UTF-8 ↔ UTF-16 offset conversion for the WASM API.
//!
//! Editors running in JavaScript (Monaco, CodeMirror) address text in UTF-16
//! code units, while the core works in UTF-8 byte offsets. Cursor offsets are
//! converted on the way in and every span of the result on the way out.

use ctescope_core::{ExtractResult, Span};
use serde::{Deserialize, Serialize};

/// Text encoding for offset interpretation.
///
/// When `Utf16` is specified, the cursor offset in requests is interpreted as
/// UTF-16 code units, and span offsets in responses are converted to UTF-16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// UTF-8 byte offsets
    #[default]
    Utf8,
    /// UTF-16 code unit offsets
    Utf16,
}

/// Convert a UTF-16 code unit offset to a UTF-8 byte offset.
///
/// Fails when the offset is past the end of `sql` or splits a surrogate pair.
pub fn utf16_to_utf8_offset(sql: &str, utf16_offset: usize) -> Result<usize, String> {
    let mut utf16_count = 0;

    for (byte_offset, ch) in sql.char_indices() {
        if utf16_count == utf16_offset {
            return Ok(byte_offset);
        }
        if utf16_count > utf16_offset {
            return Err(format!(
                "UTF-16 offset {utf16_offset} splits a surrogate pair"
            ));
        }
        utf16_count += ch.len_utf16();
    }

    if utf16_count == utf16_offset {
        return Ok(sql.len());
    }

    Err(format!(
        "UTF-16 offset {utf16_offset} exceeds string length (max: {utf16_count})"
    ))
}

/// Maps UTF-8 byte offsets of one document to UTF-16 code units.
///
/// Offsets are looked up by binary search over the character starts, so
/// converting every span of a result stays linear in the document size.
pub struct Utf16Index {
    /// `(byte_offset, utf16_offset)` at each character start, plus the end.
    starts: Vec<(usize, usize)>,
}

impl Utf16Index {
    pub fn new(sql: &str) -> Self {
        let mut starts = Vec::with_capacity(sql.len() + 1);
        let mut utf16 = 0;
        for (byte, ch) in sql.char_indices() {
            starts.push((byte, utf16));
            utf16 += ch.len_utf16();
        }
        starts.push((sql.len(), utf16));
        Self { starts }
    }

    /// UTF-16 offset of `byte_offset`, rounding down inside a character and
    /// clamping past the end.
    pub fn to_utf16(&self, byte_offset: usize) -> usize {
        match self
            .starts
            .binary_search_by_key(&byte_offset, |(byte, _)| *byte)
        {
            Ok(index) => self.starts[index].1,
            Err(0) => 0,
            Err(index) => self.starts[index - 1].1,
        }
    }

    fn span(&self, span: Span) -> Span {
        Span::new(self.to_utf16(span.start), self.to_utf16(span.end))
    }
}

/// Rewrite every span in `result` from UTF-8 bytes to UTF-16 code units.
pub fn convert_result_to_utf16(sql: &str, result: &mut ExtractResult) {
    let index = Utf16Index::new(sql);

    for span in &mut result.highlight_spans {
        *span = index.span(*span);
    }
    if let Some(target) = &mut result.target {
        target.span = index.span(target.span);
    }
    for cte in &mut result.ctes {
        cte.span = index.span(cte.span);
        cte.body_span = cte.body_span.map(|span| index.span(span));
    }
    for issue in &mut result.issues {
        issue.span = issue.span.map(|span| index.span(span));
    }
}
