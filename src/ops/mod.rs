//! Implements `list`/`locate`/`preview`/`context`/`scan-targets`/
//! `extract`/`replace`/`rename` over the symbol pool. Every mutating
//! operation follows the shared frame: resolve match set, build
//! pre-guards, produce candidate text, re-parse, build post-guards,
//! commit or hold.

use crate::bytemap::Span;
use crate::digest::HashConfig;
use crate::error::{EditError, Result};
use crate::guard::{self, Guard};
use crate::lang;
use crate::newline::{self, NewlineStyle, NormalizeOptions};
use crate::selector::{self, Match, ResolveOptions, Selector, VariableTargetMode};
use crate::symbol::SymbolPool;
use serde::Serialize;

/// Shared options threaded through every operation invocation.
#[derive(Debug, Clone)]
pub struct OperationOptions {
    pub force: bool,
    pub fix: bool,
    pub allow_multiple: bool,
    pub select_hash: Option<String>,
    pub select_path: Option<String>,
    pub select_index: Option<usize>,
    pub expect_hash: Option<String>,
    pub expect_span: Option<(usize, usize)>,
}

impl Default for OperationOptions {
    fn default() -> Self {
        Self {
            force: false,
            fix: false,
            allow_multiple: false,
            select_hash: None,
            select_path: None,
            select_index: None,
            expect_hash: None,
            expect_span: None,
        }
    }
}

impl OperationOptions {
    fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            select_hash: self.select_hash.clone(),
            select_path: self.select_path.clone(),
            select_index: self.select_index,
            allow_multiple: self.allow_multiple,
        }
    }
}

fn resolve_one<'a>(pool: &'a SymbolPool, selector: &Selector, opts: &OperationOptions) -> Result<Match<'a>> {
    let candidates = selector::resolve_candidates(pool, selector);
    let mut resolved = selector::disambiguate(candidates, &opts.resolve_options())?;
    Ok(resolved.remove(0))
}

fn resolve_many<'a>(pool: &'a SymbolPool, selector: &Selector, opts: &OperationOptions) -> Result<Vec<Match<'a>>> {
    let candidates = selector::resolve_candidates(pool, selector);
    selector::disambiguate(candidates, &opts.resolve_options())
}

// ---------------------------------------------------------------------
// Listing
// --------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    pub canonical_name: String,
    pub kind: String,
    pub export: String,
    pub replaceable: bool,
    pub hash: String,
    pub byte_span: (usize, usize),
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub filter_text: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

fn glob_allows(filter: &ListFilter, name: &str) -> Result<bool> {
    if let Some(text) = &filter.filter_text {
        if !name.to_lowercase().contains(&text.to_lowercase()) {
            return Ok(false);
        }
    }
    if !filter.include.is_empty() {
        let mut matched = false;
        for pattern in &filter.include {
            let glob = globset::Glob::new(pattern)?.compile_matcher();
            if glob.is_match(name) {
                matched = true;
                break;
            }
        }
        if !matched {
            return Ok(false);
        }
    }
    for pattern in &filter.exclude {
        let glob = globset::Glob::new(pattern)?.compile_matcher();
        if glob.is_match(name) {
            return Ok(false);
        }
    }
    Ok(true)
}

pub fn list_functions(pool: &SymbolPool, filter: &ListFilter) -> Result<Vec<ListEntry>> {
    let mut out = Vec::new();
    for f in &pool.functions {
        if glob_allows(filter, &f.canonical_name)? {
            out.push(ListEntry {
                canonical_name: f.canonical_name.clone(),
                kind: f.kind.as_str().to_string(),
                export: f.export_kind.as_str().to_string(),
                replaceable: f.replaceable,
                hash: f.digest.clone(),
                byte_span: (f.span.byte_start, f.span.byte_end),
                line: Some(f.line),
            });
        }
    }
    Ok(out)
}

pub fn list_variables(pool: &SymbolPool, filter: &ListFilter) -> Result<Vec<ListEntry>> {
    let mut out = Vec::new();
    for v in &pool.variables {
        if glob_allows(filter, &v.name)? {
            out.push(ListEntry {
                canonical_name: v.name.clone(),
                kind: v.kind.as_str().to_string(),
                export: v.export_kind.as_str().to_string(),
                replaceable: true,
                hash: v.declarator_digest.clone(),
                byte_span: (v.declarator_span.byte_start, v.declarator_span.byte_end),
                line: None,
            });
        }
    }
    Ok(out)
}

pub fn list_constructors(pool: &SymbolPool) -> Vec<ListEntry> {
    pool.functions
        .iter()
        .filter(|f| f.original_name == "constructor")
        .map(|f| ListEntry {
            canonical_name: f.canonical_name.clone(),
            kind: f.kind.as_str().to_string(),
            export: f.export_kind.as_str().to_string(),
            replaceable: f.replaceable,
            hash: f.digest.clone(),
            byte_span: (f.span.byte_start, f.span.byte_end),
            line: Some(f.line),
        })
        .collect()
}

// ---------------------------------------------------------------------
// Locate / preview / context
// --------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LocateResult {
    pub canonical_name: String,
    pub kind: String,
    pub hash: String,
    pub byte_span: (usize, usize),
    pub path: String,
}

pub fn locate(pool: &SymbolPool, selector: &Selector, opts: &OperationOptions) -> Result<LocateResult> {
    let m = resolve_one(pool, selector, opts)?;
    let (start, end) = match &m {
        Match::Function(f) => (f.span.byte_start, f.span.byte_end),
        Match::Variable(v) => (v.declarator_span.byte_start, v.declarator_span.byte_end),
    };
    Ok(LocateResult {
        canonical_name: m.canonical_name().to_string(),
        kind: m.kind_str().to_string(),
        hash: m.digest().to_string(),
        byte_span: (start, end),
        path: m.path_signature().to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnclosingMode {
    Exact,
    Class,
    Function,
}

impl EnclosingMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "exact" => Ok(Self::Exact),
            "class" => Ok(Self::Class),
            "function" => Ok(Self::Function),
            other => Err(EditError::InvalidArgument(format!("unknown context-enclosing mode: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextResult {
    pub canonical_name: String,
    pub snippet: String,
    pub byte_span: (usize, usize),
}

pub fn preview(pool: &SymbolPool, selector: &Selector, context_before: usize, context_after: usize, opts: &OperationOptions) -> Result<ContextResult> {
    let m = resolve_one(pool, selector, opts)?;
    let (start, end) = match &m {
        Match::Function(f) => (f.span.byte_start, f.span.byte_end),
        Match::Variable(v) => (v.declarator_span.byte_start, v.declarator_span.byte_end),
    };
    let source = pool.mapper.source();
    let padded_start = start.saturating_sub(context_before).max(0);
    let padded_end = (end + context_after).min(source.len());
    let padded_start = floor_char_boundary(source, padded_start);
    let padded_end = ceil_char_boundary(source, padded_end);
    Ok(ContextResult {
        canonical_name: m.canonical_name().to_string(),
        snippet: source[padded_start..padded_end].to_string(),
        byte_span: (padded_start, padded_end),
    })
}

pub fn context(pool: &SymbolPool, selector: &Selector, mode: EnclosingMode, opts: &OperationOptions) -> Result<ContextResult> {
    let m = resolve_one(pool, selector, opts)?;
    let span = match (&m, mode) {
        (Match::Function(f), EnclosingMode::Exact) => f.span,
        (Match::Variable(v), EnclosingMode::Exact) => v.declarator_span,
        (Match::Function(f), EnclosingMode::Class) => enclosing_span(&f.enclosing, "class").unwrap_or(f.span),
        (Match::Variable(v), EnclosingMode::Class) => enclosing_span(&v.enclosing, "class").unwrap_or(v.declarator_span),
        (Match::Function(f), EnclosingMode::Function) => {
            enclosing_span(&f.enclosing, "function-declaration").unwrap_or(f.span)
        }
        (Match::Variable(v), EnclosingMode::Function) => {
            enclosing_span(&v.enclosing, "function-declaration").unwrap_or(v.declarator_span)
        }
    };
    let source = pool.mapper.source();
    Ok(ContextResult {
        canonical_name: m.canonical_name().to_string(),
        snippet: source[span.byte_start..span.byte_end].to_string(),
        byte_span: (span.byte_start, span.byte_end),
    })
}

fn enclosing_span(stack: &[crate::symbol::EnclosingContext], kind: &str) -> Option<Span> {
    stack.iter().rev().find(|e| e.kind == kind).map(|e| e.span)
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

// ---------------------------------------------------------------------
// Scan targets / search text
// --------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ScanTarget {
    pub canonical_name: String,
    pub kind: String,
    pub byte_span: (usize, usize),
}

pub fn scan_targets(pool: &SymbolPool, kind: &str) -> Vec<ScanTarget> {
    match kind {
        "variable" => pool
            .variables
            .iter()
            .map(|v| ScanTarget {
                canonical_name: v.name.clone(),
                kind: v.kind.as_str().to_string(),
                byte_span: (v.declarator_span.byte_start, v.declarator_span.byte_end),
            })
            .collect(),
        _ => pool
            .functions
            .iter()
            .filter(|f| f.replaceable)
            .map(|f| ScanTarget {
                canonical_name: f.canonical_name.clone(),
                kind: f.kind.as_str().to_string(),
                byte_span: (f.span.byte_start, f.span.byte_end),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub byte_offset: usize,
    pub line: usize,
    pub context: String,
}

pub fn search_text(source: &str, needle: &str, limit: usize, context_chars: usize) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    let mut start = 0;
    while let Some(pos) = source[start..].find(needle) {
        let abs = start + pos;
        let line = source[..abs].matches('\n').count() + 1;
        let ctx_start = floor_char_boundary(source, abs.saturating_sub(context_chars));
        let ctx_end = ceil_char_boundary(source, (abs + needle.len() + context_chars).min(source.len()));
        hits.push(SearchHit {
            byte_offset: abs,
            line,
            context: source[ctx_start..ctx_end].to_string(),
        });
        if hits.len() >= limit {
            break;
        }
        start = abs + needle.len().max(1);
    }
    hits
}

// ---------------------------------------------------------------------
// Extract
// --------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ExtractResult {
    pub canonical_name: String,
    pub hash: String,
    pub code: String,
}

pub fn extract(pool: &SymbolPool, selector: &Selector, opts: &OperationOptions) -> Result<ExtractResult> {
    let m = resolve_one(pool, selector, opts)?;
    extract_match(pool, &m)
}

fn extract_match(pool: &SymbolPool, m: &Match) -> Result<ExtractResult> {
    let span = match m {
        Match::Function(f) => f.span,
        Match::Variable(v) => v.declarator_span,
    };
    Ok(ExtractResult {
        canonical_name: m.canonical_name().to_string(),
        hash: m.digest().to_string(),
        code: pool.mapper.slice_string(&span).to_string(),
    })
}

/// Given a list of hashes, finds exactly one match per hash. Errors if any
/// hash matches zero or more than one record.
pub fn extract_hashes(pool: &SymbolPool, hashes: &[String]) -> Result<Vec<ExtractResult>> {
    let mut out = Vec::with_capacity(hashes.len());
    for hash in hashes {
        let matches: Vec<Match> = pool
            .functions
            .iter()
            .map(Match::Function)
            .chain(pool.variables.iter().map(Match::Variable))
            .filter(|m| crate::digest::hash_matches(hash, m.digest()))
            .collect();
        if matches.is_empty() {
            return Err(EditError::NoMatch);
        }
        if matches.len() > 1 {
            return Err(EditError::AmbiguousMatch {
                count: matches.len(),
                names: matches
                    .iter()
                    .map(|m| m.canonical_name().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        out.push(extract_match(pool, &matches[0])?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------
// Replace
// --------------------------------------------------------------------

pub enum ReplacementSource {
    Inline(String),
    SubRange { text: String, start: usize, end: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplaceOutcome {
    pub canonical_name: String,
    pub new_source: String,
    pub guard: Guard,
    pub written: bool,
}

/// Runs the replacement state machine for a function record: resolving
/// -> guarding -> rewriting -> verifying -> committing.
pub fn replace_function(
    pool: &SymbolPool,
    selector: &Selector,
    replacement: ReplacementSource,
    rename: Option<&str>,
    opts: &OperationOptions,
) -> Result<ReplaceOutcome> {
    let m = resolve_one(pool, selector, opts)?;
    let Match::Function(record) = &m else {
        return Err(EditError::InvalidArgument("selector resolved to a variable, not a function".to_string()));
    };
    if !record.replaceable {
        return Err(EditError::NotReplaceable {
            name: record.canonical_name.clone(),
        });
    }

    let pre_digest = record.digest.clone();
    let hash_guard = guard::check_hash(&pre_digest, opts.expect_hash.as_deref(), opts.force);
    let span_guard = guard::check_span(&record.span, opts.expect_span, opts.force);
    if matches!(hash_guard.status, crate::guard::GuardStatus::Mismatch)
        || matches!(span_guard.status, crate::guard::GuardStatus::Mismatch)
    {
        return Err(if matches!(hash_guard.status, crate::guard::GuardStatus::Mismatch) {
            EditError::HashMismatch {
                expected: hash_guard.expected.clone().unwrap_or_default(),
                actual: hash_guard.actual.clone(),
            }
        } else {
            EditError::SpanMismatch {
                expected: span_guard.expected.clone().unwrap_or_default(),
                actual: span_guard.actual.clone(),
            }
        });
    }

    let original_snippet = pool.mapper.slice_string(&record.span).to_string();
    let mut new_snippet = match replacement {
        ReplacementSource::Inline(text) => text,
        ReplacementSource::SubRange { text, start, end } => {
            splice_sub_range(&original_snippet, start, end, &text)?
        }
    };

    if let Some(new_name) = rename {
        if !lang::is_valid_identifier(new_name) {
            return Err(EditError::InvalidIdentifier(new_name.to_string()));
        }
        new_snippet = rename_in_snippet(record, &original_snippet, new_name)?;
    }

    let file_style = newline::detect_style(pool.mapper.source());
    let normalized = newline::prepare_normalized_snippet(
        &new_snippet,
        file_style,
        NormalizeOptions {
            ensure_trailing_newline: false,
        },
    );

    let source = pool.mapper.source();
    let mut new_source = String::with_capacity(source.len());
    new_source.push_str(&source[..record.span.byte_start]);
    new_source.push_str(&normalized.text);
    new_source.push_str(&source[record.span.byte_end..]);

    let syntax_guard = guard::check_syntax(&new_source);
    if matches!(syntax_guard.status, crate::guard::GuardStatus::Error) {
        return Err(EditError::ReparseFailed {
            message: syntax_guard.message.clone().unwrap_or_default(),
        });
    }

    let post_pool = SymbolPool::collect(&new_source, pool.hash_config)?;
    let post_signatures: Vec<String> = post_pool
        .functions
        .iter()
        .map(|f| f.path_signature.clone())
        .collect();
    let path_guard = guard::check_path(&record.path_signature, &post_signatures, opts.force);
    if matches!(path_guard.status, crate::guard::GuardStatus::Mismatch) {
        return Err(EditError::PathMismatch {
            expected: record.path_signature.clone(),
        });
    }

    let after_hash = crate::digest::create_digest(&normalized.text, &pool.hash_config);
    let result_guard = guard::check_result(&pre_digest, &after_hash);
    let newline_guard = crate::newline::NewlineGuard::from_normalization(file_style, original_snippet.len(), &normalized);

    let guard = Guard {
        span: span_guard,
        hash: hash_guard,
        path: path_guard,
        syntax: syntax_guard,
        result: result_guard,
        newline: Some(newline_guard),
    };

    Ok(ReplaceOutcome {
        canonical_name: record.canonical_name.clone(),
        new_source,
        guard,
        written: false,
    })
}

pub fn replace_variable(
    pool: &SymbolPool,
    selector: &Selector,
    replacement_text: String,
    mode: VariableTargetMode,
    opts: &OperationOptions,
) -> Result<ReplaceOutcome> {
    let m = resolve_one(pool, selector, opts)?;
    let Match::Variable(record) = &m else {
        return Err(EditError::InvalidArgument("selector resolved to a function, not a variable".to_string()));
    };

    let span = pick_variable_span(record, mode);
    let pre_digest = match mode {
        VariableTargetMode::Binding => record.binding_digest.clone(),
        VariableTargetMode::Declarator => record.declarator_digest.clone(),
        VariableTargetMode::Declaration => record.declaration_digest.clone(),
    };

    let hash_guard = guard::check_hash(&pre_digest, opts.expect_hash.as_deref(), opts.force);
    let span_guard = guard::check_span(&span, opts.expect_span, opts.force);
    if matches!(hash_guard.status, crate::guard::GuardStatus::Mismatch)
        || matches!(span_guard.status, crate::guard::GuardStatus::Mismatch)
    {
        return Err(if matches!(hash_guard.status, crate::guard::GuardStatus::Mismatch) {
            EditError::HashMismatch {
                expected: hash_guard.expected.clone().unwrap_or_default(),
                actual: hash_guard.actual.clone(),
            }
        } else {
            EditError::SpanMismatch {
                expected: span_guard.expected.clone().unwrap_or_default(),
                actual: span_guard.actual.clone(),
            }
        });
    }

    let file_style = newline::detect_style(pool.mapper.source());
    let normalized = newline::prepare_normalized_snippet(
        &replacement_text,
        file_style,
        NormalizeOptions {
            ensure_trailing_newline: true,
        },
    );

    let source = pool.mapper.source();
    let mut new_source = String::with_capacity(source.len());
    new_source.push_str(&source[..span.byte_start]);
    new_source.push_str(&normalized.text);
    new_source.push_str(&source[span.byte_end..]);

    let syntax_guard = guard::check_syntax(&new_source);
    if matches!(syntax_guard.status, crate::guard::GuardStatus::Error) {
        return Err(EditError::ReparseFailed {
            message: syntax_guard.message.clone().unwrap_or_default(),
        });
    }

    let post_pool = SymbolPool::collect(&new_source, pool.hash_config)?;
    let post_signatures: Vec<String> = post_pool
        .variables
        .iter()
        .map(|v| v.declarator_path.clone())
        .collect();
    let path_guard = guard::check_path(&record.declarator_path, &post_signatures, opts.force);
    if matches!(path_guard.status, crate::guard::GuardStatus::Mismatch) {
        return Err(EditError::PathMismatch {
            expected: record.declarator_path.clone(),
        });
    }

    let after_hash = crate::digest::create_digest(&normalized.text, &pool.hash_config);
    let result_guard = guard::check_result(&pre_digest, &after_hash);
    let newline_guard = crate::newline::NewlineGuard::from_normalization(file_style, span.len_bytes(), &normalized);

    Ok(ReplaceOutcome {
        canonical_name: record.name.clone(),
        new_source,
        guard: Guard {
            span: span_guard,
            hash: hash_guard,
            path: path_guard,
            syntax: syntax_guard,
            result: result_guard,
            newline: Some(newline_guard),
        },
        written: false,
    })
}

fn pick_variable_span(record: &crate::symbol::VariableRecord, mode: VariableTargetMode) -> Span {
    for candidate in mode.preference_order() {
        let span = match candidate {
            VariableTargetMode::Binding => record.binding_span,
            VariableTargetMode::Declarator => record.declarator_span,
            VariableTargetMode::Declaration => record.declaration_span,
        };
        if span.len_bytes() > 0 {
            return span;
        }
    }
    record.declarator_span
}

fn splice_sub_range(original: &str, start: usize, end: usize, text: &str) -> Result<String> {
    if start > end || end > original.len() {
        return Err(EditError::InvalidArgument(format!(
            "sub-range {start}:{end} out of bounds for a snippet of length {}",
            original.len()
        )));
    }
    let mut out = String::with_capacity(original.len());
    out.push_str(&original[..start]);
    out.push_str(text);
    out.push_str(&original[end..]);
    Ok(out)
}

/// Renames a function's identifier within its extracted snippet: locates
/// the first identifier occurrence at the record's identifier-span offset
/// (relative to the snippet start) and substitutes `new_name`.
fn rename_in_snippet(record: &crate::symbol::FunctionRecord, snippet: &str, new_name: &str) -> Result<String> {
    let Some(id_span) = record.identifier_span else {
        return Err(EditError::InvalidArgument(
            "record has no identifier span to rename".to_string(),
        ));
    };
    let rel_start = id_span.byte_start - record.span.byte_start;
    let rel_end = id_span.byte_end - record.span.byte_start;
    if rel_end > snippet.len() || rel_start > rel_end {
        return Err(EditError::InvalidArgument("identifier span outside snippet bounds".to_string()));
    }
    let mut out = String::with_capacity(snippet.len());
    out.push_str(&snippet[..rel_start]);
    out.push_str(new_name);
    out.push_str(&snippet[rel_end..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::HashConfig;

    fn pool(source: &str) -> SymbolPool {
        SymbolPool::collect(source, HashConfig::default()).unwrap()
    }

    #[test]
    fn extract_by_hash_returns_exact_source() {
        let source = "exports.alpha = function alpha() { return 1; };";
        let p = pool(source);
        let entry = p.functions.iter().find(|f| f.canonical_name == "exports.alpha").unwrap();
        let results = extract_hashes(&p, &[entry.digest.clone()]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].code, "function alpha() { return 1; }");
    }

    #[test]
    fn rename_changes_only_identifier_token() {
        let source = "function utilityHelper() { return x + 1; }";
        let p = pool(source);
        let selector = Selector::parse("utilityHelper").unwrap();
        let outcome = replace_function(
            &p,
            &selector,
            ReplacementSource::Inline(source.to_string()),
            Some("fooBar"),
            &OperationOptions::default(),
        )
        .unwrap();
        assert!(outcome.new_source.contains("function fooBar() { return x + 1; }"));
    }

    #[test]
    fn stale_hash_guard_rejects_replacement() {
        let source = "function foo() { return 1; }";
        let p = pool(source);
        let selector = Selector::parse("foo").unwrap();
        let opts = OperationOptions {
            expect_hash: Some("definitely-not-the-real-hash".to_string()),
            ..OperationOptions::default()
        };
        let err = replace_function(
            &p,
            &selector,
            ReplacementSource::Inline("function foo() { return 2; }".to_string()),
            None,
            &opts,
        )
        .unwrap_err();
        assert!(matches!(err, EditError::HashMismatch { .. }));
    }

    #[test]
    fn extract_then_replace_with_extracted_text_is_noop() {
        let source = "function alpha() { return 1; }";
        let p = pool(source);
        let selector = Selector::parse("alpha").unwrap();
        let extracted = extract(&p, &selector, &OperationOptions::default()).unwrap();
        let outcome = replace_function(
            &p,
            &selector,
            ReplacementSource::Inline(extracted.code),
            None,
            &OperationOptions::default(),
        )
        .unwrap();
        assert_eq!(outcome.guard.result.status, crate::guard::GuardStatus::Unchanged);
    }

    #[test]
    fn crlf_file_replacement_converts_newline_style() {
        let source = "function alpha() {\r\n  return 1;\r\n}\r\n";
        let p = pool(source);
        let selector = Selector::parse("alpha").unwrap();
        let outcome = replace_function(
            &p,
            &selector,
            ReplacementSource::Inline("function alpha() {\n  return 2;\n}".to_string()),
            None,
            &OperationOptions::default(),
        )
        .unwrap();
        let newline_guard = outcome.guard.newline.unwrap();
        assert_eq!(newline_guard.status, "converted");
        assert!(outcome.new_source.contains("\r\n"));
    }

    #[test]
    fn not_replaceable_class_rejected() {
        let source = "class Widget {}";
        let p = pool(source);
        let selector = Selector::parse("Widget").unwrap();
        let err = replace_function(
            &p,
            &selector,
            ReplacementSource::Inline("class Widget2 {}".to_string()),
            None,
            &OperationOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EditError::NotReplaceable { .. }));
    }
}
