//! Versioned JSON plan and digest-snapshot emission for review tooling
//! and CI gating.

use crate::guard::Guard;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub const PLAN_VERSION: u32 = 1;
pub const DIGEST_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPayload {
    pub canonical_name: String,
    pub kind: String,
    pub scope: Vec<String>,
    pub path: String,
    pub span: String,
    pub byte_span: (usize, usize),
    pub identifier_span: Option<(usize, usize)>,
    pub hash: String,
    pub expected_hash: Option<String>,
    pub expected_span: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_count: usize,
    pub allow_multiple: bool,
    pub span_range: SpanRange,
    pub expected_hashes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanRange {
    pub start: usize,
    pub end: usize,
    pub length: usize,
    pub byte_start: usize,
    pub byte_end: usize,
    pub byte_length: usize,
}

impl SpanRange {
    pub fn aggregate(spans: &[(usize, usize, usize, usize)]) -> Self {
        if spans.is_empty() {
            return Self {
                start: 0,
                end: 0,
                length: 0,
                byte_start: 0,
                byte_end: 0,
                byte_length: 0,
            };
        }
        let start = spans.iter().map(|s| s.0).min().unwrap();
        let end = spans.iter().map(|s| s.1).max().unwrap();
        let byte_start = spans.iter().map(|s| s.2).min().unwrap();
        let byte_end = spans.iter().map(|s| s.3).max().unwrap();
        Self {
            start,
            end,
            length: end - start,
            byte_start,
            byte_end,
            byte_length: byte_end - byte_start,
        }
    }
}

/// A versioned JSON record describing an intended or completed operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub version: u32,
    pub generated_at: String,
    pub operation: String,
    pub file: String,
    pub selector: String,
    pub summary: MatchSummary,
    pub matches: Vec<MatchPayload>,
    pub extras: Value,
}

pub struct PlanBuilder {
    pub operation: String,
    pub file: String,
    pub selector: String,
    pub matches: Vec<MatchPayload>,
    pub expected_hashes: Option<Vec<String>>,
    pub allow_multiple: bool,
    pub extras: Value,
}

impl PlanBuilder {
    pub fn build(self, generated_at: impl Into<String>) -> Plan {
        let spans: Vec<(usize, usize, usize, usize)> = self
            .matches
            .iter()
            .map(|m| (m.byte_span.0, m.byte_span.1, m.byte_span.0, m.byte_span.1))
            .collect();

        Plan {
            version: PLAN_VERSION,
            generated_at: generated_at.into(),
            operation: self.operation,
            file: self.file,
            selector: self.selector,
            summary: MatchSummary {
                match_count: self.matches.len(),
                allow_multiple: self.allow_multiple,
                span_range: SpanRange::aggregate(&spans),
                expected_hashes: self.expected_hashes,
            },
            matches: self.matches,
            extras: self.extras,
        }
    }
}

pub fn write_plan(plan: &Plan, path: &Path) -> crate::error::Result<()> {
    let json = serde_json::to_string_pretty(plan)?;
    fs::write(path, json)?;
    Ok(())
}

/// A before/after digest-snapshot artifact for one mutating call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestSnapshot {
    pub version: u32,
    pub timestamp: String,
    pub operation: String,
    pub file: String,
    pub selector: String,
    pub mode: Option<String>,
    pub stage: String,
    pub record: String,
    pub guard: Option<Guard>,
    pub hash: String,
    pub span: String,
    pub snippet: Option<String>,
}

impl DigestSnapshot {
    pub fn file_name(&self, hash_prefix: Option<&str>) -> String {
        let name_part = sanitize_for_filename(&self.record);
        let file_part = sanitize_for_filename(&self.file);
        match hash_prefix {
            Some(prefix) => format!(
                "{}__{}__{}__{}__{}--{}.json",
                self.timestamp, self.operation, file_part, name_part, prefix, self.stage
            ),
            None => format!(
                "{}__{}__{}__{}--{}.json",
                self.timestamp, self.operation, file_part, name_part, self.stage
            ),
        }
    }
}

fn sanitize_for_filename(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

pub fn write_digest_snapshot(snapshot: &DigestSnapshot, dir: &Path, hash_prefix: Option<&str>) -> crate::error::Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(snapshot.file_name(hash_prefix));
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_span_range_across_matches() {
        let range = SpanRange::aggregate(&[(0, 5, 0, 5), (10, 20, 10, 20)]);
        assert_eq!(range.start, 0);
        assert_eq!(range.end, 20);
        assert_eq!(range.length, 20);
    }

    #[test]
    fn empty_matches_yields_zeroed_range() {
        let range = SpanRange::aggregate(&[]);
        assert_eq!(range.length, 0);
    }

    #[test]
    fn plan_serializes_with_version_field() {
        let builder = PlanBuilder {
            operation: "extract".to_string(),
            file: "a.ts".to_string(),
            selector: "alpha".to_string(),
            matches: vec![],
            expected_hashes: None,
            allow_multiple: false,
            extras: Value::Null,
        };
        let plan = builder.build("2026-01-01T00:00:00Z");
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"version\":1"));
    }

    #[test]
    fn digest_snapshot_file_name_includes_stage() {
        let snapshot = DigestSnapshot {
            version: DIGEST_SNAPSHOT_VERSION,
            timestamp: "20260101T000000Z".to_string(),
            operation: "replace".to_string(),
            file: "src/a.ts".to_string(),
            selector: "alpha".to_string(),
            mode: None,
            stage: "before".to_string(),
            record: "alpha".to_string(),
            guard: None,
            hash: "abc".to_string(),
            span: "0:5".to_string(),
            snippet: None,
        };
        let name = snapshot.file_name(Some("abc123"));
        assert!(name.ends_with("--before.json"));
        assert!(name.contains("abc123"));
    }
}
