//! Detects and normalizes line-terminator style.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewlineStyle {
    Lf,
    Crlf,
    Cr,
    /// No line terminators present in the sample.
    None,
    /// More than one style present, no single dominant style.
    Mixed,
}

impl fmt::Display for NewlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NewlineStyle::Lf => "lf",
            NewlineStyle::Crlf => "crlf",
            NewlineStyle::Cr => "cr",
            NewlineStyle::None => "none",
            NewlineStyle::Mixed => "mixed",
        };
        write!(f, "{s}")
    }
}

impl NewlineStyle {
    pub fn terminator(&self) -> &'static str {
        match self {
            NewlineStyle::Crlf => "\r\n",
            NewlineStyle::Cr => "\r",
            _ => "\n",
        }
    }
}

/// Line-terminator counts for a piece of text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewlineCounts {
    pub lf: usize,
    pub crlf: usize,
    pub cr: usize,
}

impl NewlineCounts {
    pub fn count(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut lf = 0;
        let mut crlf = 0;
        let mut cr = 0;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' => {
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        crlf += 1;
                        i += 2;
                        continue;
                    }
                    cr += 1;
                }
                b'\n' => lf += 1,
                _ => {}
            }
            i += 1;
        }
        Self { lf, crlf, cr }
    }

    /// The dominant style, or `Mixed` if more than one style is present,
    /// or `None` if no terminators occur at all.
    pub fn dominant(&self) -> NewlineStyle {
        let present = [self.lf > 0, self.crlf > 0, self.cr > 0]
            .iter()
            .filter(|p| **p)
            .count();
        if present == 0 {
            return NewlineStyle::None;
        }
        if present > 1 {
            return NewlineStyle::Mixed;
        }
        if self.crlf > 0 {
            NewlineStyle::Crlf
        } else if self.cr > 0 {
            NewlineStyle::Cr
        } else {
            NewlineStyle::Lf
        }
    }
}

pub fn detect_style(text: &str) -> NewlineStyle {
    NewlineCounts::count(text).dominant()
}

/// Result of normalizing a replacement snippet to a target newline style.
#[derive(Debug, Clone)]
pub struct NormalizedSnippet {
    pub text: String,
    pub original_style: NewlineStyle,
    pub result_style: NewlineStyle,
    pub converted: bool,
    pub trailing_added: bool,
}

/// Options controlling snippet normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    pub ensure_trailing_newline: bool,
}

/// Collapses all line terminators in `snippet` to LF, then re-emits them in
/// `target_style`, optionally appending the target terminator if the
/// snippet does not already end with one.
pub fn prepare_normalized_snippet(
    snippet: &str,
    target_style: NewlineStyle,
    options: NormalizeOptions,
) -> NormalizedSnippet {
    let original_style = detect_style(snippet);
    let collapsed = snippet.replace("\r\n", "\n").replace('\r', "\n");

    let terminator = target_style.terminator();
    let mut normalized = if terminator == "\n" {
        collapsed.clone()
    } else {
        collapsed.replace('\n', terminator)
    };

    let mut trailing_added = false;
    if options.ensure_trailing_newline && !normalized.ends_with(terminator) {
        normalized.push_str(terminator);
        trailing_added = true;
    }

    let converted = normalized != snippet;

    NormalizedSnippet {
        text: normalized,
        original_style,
        result_style: detect_style_or(target_style, &collapsed),
        converted,
        trailing_added,
    }
}

fn detect_style_or(target: NewlineStyle, collapsed: &str) -> NewlineStyle {
    if collapsed.contains('\n') || target != NewlineStyle::None {
        target
    } else {
        NewlineStyle::None
    }
}

/// A newline guard record: file style, original snippet style, the
/// resulting style after normalization, the byte delta the replacement
/// introduced, and whether a trailing terminator was appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewlineGuard {
    pub status: String,
    pub file_style: String,
    pub original_snippet_style: String,
    pub result_style: String,
    pub byte_delta: i64,
    pub trailing_newline_added: bool,
}

impl NewlineGuard {
    pub fn from_normalization(
        file_style: NewlineStyle,
        before_len: usize,
        normalized: &NormalizedSnippet,
    ) -> Self {
        let status = if normalized.converted {
            "converted"
        } else {
            "none"
        };
        Self {
            status: status.to_string(),
            file_style: file_style.to_string(),
            original_snippet_style: normalized.original_style.to_string(),
            result_style: normalized.result_style.to_string(),
            byte_delta: normalized.text.len() as i64 - before_len as i64,
            trailing_newline_added: normalized.trailing_added,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_lf() {
        assert_eq!(detect_style("a\nb\nc"), NewlineStyle::Lf);
    }

    #[test]
    fn detects_crlf() {
        assert_eq!(detect_style("a\r\nb\r\n"), NewlineStyle::Crlf);
    }

    #[test]
    fn detects_mixed() {
        assert_eq!(detect_style("a\nb\r\nc"), NewlineStyle::Mixed);
    }

    #[test]
    fn no_terminators_is_none() {
        assert_eq!(detect_style("abc"), NewlineStyle::None);
    }

    #[test]
    fn normalizes_lf_snippet_to_crlf_file_style() {
        let snippet = "line one\nline two\n";
        let result = prepare_normalized_snippet(
            snippet,
            NewlineStyle::Crlf,
            NormalizeOptions {
                ensure_trailing_newline: true,
            },
        );
        assert!(result.text.contains("\r\n"));
        assert!(result.converted);
        assert_eq!(result.original_style, NewlineStyle::Lf);
    }

    #[test]
    fn appends_trailing_terminator_when_missing() {
        let result = prepare_normalized_snippet(
            "no trailing newline",
            NewlineStyle::Lf,
            NormalizeOptions {
                ensure_trailing_newline: true,
            },
        );
        assert!(result.trailing_added);
        assert!(result.text.ends_with('\n'));
    }

    #[test]
    fn no_conversion_when_already_matching() {
        let result = prepare_normalized_snippet(
            "same\nstyle\n",
            NewlineStyle::Lf,
            NormalizeOptions::default(),
        );
        assert!(!result.converted);
    }
}
