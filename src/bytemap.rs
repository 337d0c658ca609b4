//! Maps between 16-bit code-unit offsets (parser-native spans) and UTF-8
//! byte offsets (the storage-native representation of the source buffer).

use serde::{Deserialize, Serialize};

/// A closed-open source interval carrying both code-unit and byte endpoints.
///
/// Invariant: `end >= start`, `byte_end >= byte_start`, and both intervals
/// describe the same underlying source slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub byte_start: usize,
    pub byte_end: usize,
}

impl Span {
    pub fn len_code_units(&self) -> usize {
        self.end - self.start
    }

    pub fn len_bytes(&self) -> usize {
        self.byte_end - self.byte_start
    }

    pub fn contains_point(&self, byte: usize) -> bool {
        byte >= self.byte_start && byte < self.byte_end
    }

    pub fn contains_range(&self, byte_start: usize, byte_end: usize) -> bool {
        byte_start >= self.byte_start && byte_end <= self.byte_end
    }

    pub fn range_label(&self) -> String {
        format!("{}:{}", self.byte_start, self.byte_end)
    }
}

/// A span as received from an external producer, not yet mapper-normalized.
pub enum RawSpan {
    /// Parser-native: 1-origin byte offsets, `start` is the first byte of
    /// the token.
    Parser { start: usize, end: usize },
    /// Legacy 0-origin byte offsets.
    Legacy { lo: usize, hi: usize },
    /// Already normalized; passed through unchanged.
    Normalized(Span),
}

/// Bidirectional index between UTF-16 code-unit offsets and UTF-8 byte
/// offsets for one immutable source buffer.
pub struct ByteMapper {
    source: String,
    /// `cu_to_byte[i]` is the byte offset of code unit `i`. Surrogate-pair
    /// members share the same entry. Length is `code_unit_len() + 1`.
    cu_to_byte: Vec<usize>,
}

impl ByteMapper {
    pub fn new(source: &str) -> Self {
        let mut cu_to_byte = Vec::with_capacity(source.len() + 1);
        let mut byte_offset = 0usize;

        for ch in source.chars() {
            let width = ch.len_utf16();
            let byte_len = ch.len_utf8();
            for _ in 0..width {
                cu_to_byte.push(byte_offset);
            }
            byte_offset += byte_len;
        }
        cu_to_byte.push(byte_offset);

        Self {
            source: source.to_string(),
            cu_to_byte,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn byte_len(&self) -> usize {
        self.source.len()
    }

    pub fn code_unit_len(&self) -> usize {
        self.cu_to_byte.len().saturating_sub(1)
    }

    pub fn code_unit_to_byte(&self, cu: usize) -> usize {
        let idx = cu.min(self.cu_to_byte.len() - 1);
        self.cu_to_byte[idx]
    }

    /// Binary search over the code-unit index to find the first code unit
    /// whose byte offset is `>= byte`.
    pub fn byte_to_code_unit(&self, byte: usize) -> usize {
        let byte = byte.min(self.byte_len());
        match self.cu_to_byte.binary_search(&byte) {
            Ok(idx) => idx,
            Err(idx) => idx.min(self.cu_to_byte.len() - 1),
        }
    }

    /// Converts a raw span into mapper-normalized coordinates.
    ///
    /// Out-of-range byte offsets clamp to `[0, len]`. A span with `end <
    /// start` normalizes to zero-length at `start`.
    pub fn normalize_span(&self, raw: RawSpan) -> Span {
        match raw {
            RawSpan::Normalized(span) => span,
            RawSpan::Parser { start, end } => {
                let byte_start = start.saturating_sub(1).min(self.byte_len());
                let byte_end = end.max(byte_start).min(self.byte_len());
                self.span_from_bytes(byte_start, byte_end)
            }
            RawSpan::Legacy { lo, hi } => {
                let byte_start = lo.min(self.byte_len());
                let byte_end = hi.max(byte_start).min(self.byte_len());
                self.span_from_bytes(byte_start, byte_end)
            }
        }
    }

    fn span_from_bytes(&self, byte_start: usize, byte_end: usize) -> Span {
        Span {
            start: self.byte_to_code_unit(byte_start),
            end: self.byte_to_code_unit(byte_end),
            byte_start,
            byte_end,
        }
    }

    /// Builds a normalized span directly from byte offsets, e.g. ones
    /// produced by a fresh AST traversal (already 0-origin).
    pub fn span_from_byte_range(&self, byte_start: usize, byte_end: usize) -> Span {
        let byte_start = byte_start.min(self.byte_len());
        let byte_end = byte_end.max(byte_start).min(self.byte_len());
        self.span_from_bytes(byte_start, byte_end)
    }

    pub fn slice_string(&self, span: &Span) -> &str {
        &self.source[span.byte_start..span.byte_end]
    }

    pub fn slice_buffer(&self, span: &Span) -> &[u8] {
        self.source.as_bytes()[span.byte_start..span.byte_end].as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trip() {
        let mapper = ByteMapper::new("function alpha() { return 1; }");
        assert_eq!(mapper.code_unit_len(), mapper.byte_len());
        let span = mapper.span_from_byte_range(9, 14);
        assert_eq!(mapper.slice_string(&span), "alpha");
    }

    #[test]
    fn multibyte_identifier_has_differing_lengths() {
        let source = "const caf\u{00e9} = 1;"; // 'é' is 2 bytes, 1 code unit
        let mapper = ByteMapper::new(source);
        assert!(mapper.byte_len() > mapper.code_unit_len());
        let span = mapper.span_from_byte_range(6, 11);
        assert_eq!(mapper.slice_string(&span), "caf\u{00e9}");
        assert_eq!(span.len_bytes(), 5);
        assert_eq!(span.len_code_units(), 4);
    }

    #[test]
    fn surrogate_pair_members_share_byte_offset() {
        let source = "const x = \u{1F600};"; // emoji: 4 bytes utf8, 2 utf16 code units
        let mapper = ByteMapper::new(source);
        let emoji_byte_start = source.find('\u{1F600}').unwrap();
        let cu_first = mapper.byte_to_code_unit(emoji_byte_start);
        let byte_of_cu = mapper.code_unit_to_byte(cu_first);
        let byte_of_next_cu = mapper.code_unit_to_byte(cu_first + 1);
        assert_eq!(byte_of_cu, emoji_byte_start);
        assert_eq!(byte_of_next_cu, emoji_byte_start);
    }

    #[test]
    fn out_of_range_clamps() {
        let mapper = ByteMapper::new("abc");
        let span = mapper.normalize_span(RawSpan::Parser {
            start: 0,
            end: 9999,
        });
        assert_eq!(span.byte_end, 3);
    }

    #[test]
    fn inverted_range_normalizes_to_zero_length() {
        let mapper = ByteMapper::new("abcdef");
        let span = mapper.normalize_span(RawSpan::Legacy { lo: 4, hi: 1 });
        assert_eq!(span.byte_start, 4);
        assert_eq!(span.byte_end, 4);
        assert_eq!(mapper.slice_string(&span), "");
    }

    #[test]
    fn parser_native_is_one_origin() {
        let mapper = ByteMapper::new("xy");
        let span = mapper.normalize_span(RawSpan::Parser { start: 1, end: 2 });
        assert_eq!(span.byte_start, 0);
        assert_eq!(span.byte_end, 2);
        assert_eq!(mapper.slice_string(&span), "xy");
    }
}
