//! Pre- and post-operation invariant checks: hash, span, path, syntax,
//! result, and newline guards.

use crate::bytemap::Span;
use crate::newline::NewlineGuard;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStatus {
    Ok,
    Mismatch,
    Bypass,
    Pending,
    Skipped,
    Converted,
    Unchanged,
    Changed,
    None,
    Error,
}

impl GuardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardStatus::Ok => "ok",
            GuardStatus::Mismatch => "mismatch",
            GuardStatus::Bypass => "bypass",
            GuardStatus::Pending => "pending",
            GuardStatus::Skipped => "skipped",
            GuardStatus::Converted => "converted",
            GuardStatus::Unchanged => "unchanged",
            GuardStatus::Changed => "changed",
            GuardStatus::None => "none",
            GuardStatus::Error => "error",
        }
    }
}

impl Serialize for GuardStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GuardStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "ok" => GuardStatus::Ok,
            "mismatch" => GuardStatus::Mismatch,
            "bypass" => GuardStatus::Bypass,
            "pending" => GuardStatus::Pending,
            "skipped" => GuardStatus::Skipped,
            "converted" => GuardStatus::Converted,
            "unchanged" => GuardStatus::Unchanged,
            "changed" => GuardStatus::Changed,
            "error" => GuardStatus::Error,
            _ => GuardStatus::None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashGuard {
    pub status: GuardStatus,
    pub actual: String,
    pub expected: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanGuard {
    pub status: GuardStatus,
    pub actual: String,
    pub expected: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathGuard {
    pub status: GuardStatus,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxGuard {
    pub status: GuardStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultGuard {
    pub status: GuardStatus,
    pub before_hash: String,
    pub after_hash: Option<String>,
}

/// The composite guard attached to every mutating operation's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guard {
    pub span: SpanGuard,
    pub hash: HashGuard,
    pub path: PathGuard,
    pub syntax: SyntaxGuard,
    pub result: ResultGuard,
    pub newline: Option<NewlineGuard>,
}

impl Guard {
    pub fn has_failed(&self) -> bool {
        matches!(self.hash.status, GuardStatus::Mismatch)
            || matches!(self.span.status, GuardStatus::Mismatch)
            || matches!(self.path.status, GuardStatus::Mismatch)
            || matches!(self.syntax.status, GuardStatus::Error)
    }
}

/// Compares an expected hash against the actual digest, downgrading a
/// mismatch to `bypass` under force mode.
pub fn check_hash(actual: &str, expected: Option<&str>, force: bool) -> HashGuard {
    let status = match expected {
        None => GuardStatus::Ok,
        Some(expected) if crate::digest::hash_matches(expected, actual) => GuardStatus::Ok,
        Some(_) if force => GuardStatus::Bypass,
        Some(_) => GuardStatus::Mismatch,
    };
    HashGuard {
        status,
        actual: actual.to_string(),
        expected: expected.map(str::to_string),
    }
}

pub fn check_span(actual: &Span, expected: Option<(usize, usize)>, force: bool) -> SpanGuard {
    let status = match expected {
        None => GuardStatus::Ok,
        Some((s, e)) if s == actual.byte_start && e == actual.byte_end => GuardStatus::Ok,
        Some(_) if force => GuardStatus::Bypass,
        Some(_) => GuardStatus::Mismatch,
    };
    SpanGuard {
        status,
        actual: actual.range_label(),
        expected: expected.map(|(s, e)| format!("{s}:{e}")),
    }
}

/// Searches a freshly re-collected path signature set for the pre-edit
/// signature, tolerating the same suffix variations the selector's path
/// filter does.
pub fn check_path(pre_edit_signature: &str, post_edit_signatures: &[String], force: bool) -> PathGuard {
    const TOLERATED_SUFFIXES: &[&str] = &[
        ".ArrowFunctionExpression",
        ".FunctionExpression",
        ".init",
        ".right",
    ];
    let strip = |s: &str| -> String {
        for suffix in TOLERATED_SUFFIXES {
            if let Some(stripped) = s.strip_suffix(suffix) {
                return stripped.to_string();
            }
        }
        s.to_string()
    };
    let target = strip(pre_edit_signature);
    let found = post_edit_signatures.iter().any(|s| strip(s) == target);

    let status = if found {
        GuardStatus::Ok
    } else if force {
        GuardStatus::Bypass
    } else {
        GuardStatus::Mismatch
    };
    PathGuard {
        status,
        signature: pre_edit_signature.to_string(),
    }
}

/// Re-parses the full post-edit source. Never bypassed, even under force.
pub fn check_syntax(post_edit_source: &str) -> SyntaxGuard {
    match crate::lang::reparse_is_valid(post_edit_source) {
        Ok(true) => SyntaxGuard {
            status: GuardStatus::Ok,
            message: None,
        },
        Ok(false) => SyntaxGuard {
            status: GuardStatus::Error,
            message: Some("post-edit source contains syntax errors".to_string()),
        },
        Err(e) => SyntaxGuard {
            status: GuardStatus::Error,
            message: Some(e.to_string()),
        },
    }
}

pub fn check_result(before_hash: &str, after_hash: &str) -> ResultGuard {
    let status = if before_hash == after_hash {
        GuardStatus::Unchanged
    } else {
        GuardStatus::Changed
    };
    ResultGuard {
        status,
        before_hash: before_hash.to_string(),
        after_hash: Some(after_hash.to_string()),
    }
}

pub fn pending_result(before_hash: &str) -> ResultGuard {
    ResultGuard {
        status: GuardStatus::Pending,
        before_hash: before_hash.to_string(),
        after_hash: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_guard_ok_when_no_expectation() {
        let g = check_hash("abc", None, false);
        assert_eq!(g.status, GuardStatus::Ok);
    }

    #[test]
    fn hash_guard_mismatch_without_force() {
        let g = check_hash("abc", Some("def"), false);
        assert_eq!(g.status, GuardStatus::Mismatch);
    }

    #[test]
    fn hash_guard_bypasses_under_force() {
        let g = check_hash("abc", Some("def"), true);
        assert_eq!(g.status, GuardStatus::Bypass);
    }

    #[test]
    fn syntax_guard_never_bypasses() {
        let g = check_syntax("function( { bad syntax");
        assert_eq!(g.status, GuardStatus::Error);
    }

    #[test]
    fn result_guard_unchanged_when_hashes_equal() {
        let g = check_result("h1", "h1");
        assert_eq!(g.status, GuardStatus::Unchanged);
    }

    #[test]
    fn path_guard_tolerates_suffix_difference() {
        let g = check_path(
            "module.body[0].ArrowFunctionExpression",
            &["module.body[0].init".to_string()],
            false,
        );
        assert_eq!(g.status, GuardStatus::Ok);
    }
}
