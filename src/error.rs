//! Error types for the guarded source editor.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for editor operations.
#[derive(Error, Debug)]
pub enum EditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("Parse error for {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Tree-sitter query error: {0}")]
    Query(#[from] tree_sitter::QueryError),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("no selector matched any record")]
    NoMatch,

    #[error("selector matched {count} records; pass --allow-multiple, --select, or a more specific selector ({names})")]
    AmbiguousMatch { count: usize, names: String },

    #[error("--select index {index} out of range (only {available} match(es))")]
    SelectOutOfRange { index: usize, available: usize },

    #[error("record is not replaceable: {name}")]
    NotReplaceable { name: String },

    #[error("hash guard mismatch: expected {expected}, actual {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("span guard mismatch: expected {expected}, actual {actual}")]
    SpanMismatch { expected: String, actual: String },

    #[error("path signature mismatch after edit: expected {expected}")]
    PathMismatch { expected: String },

    #[error("post-edit source failed to re-parse: {message}")]
    ReparseFailed { message: String },

    #[error("rename target {0:?} is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("invalid selector expression: {0}")]
    InvalidSelector(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("mutually exclusive flags: {0}")]
    MutuallyExclusive(String),

    #[error("recipe manifest invalid: {0}")]
    InvalidRecipe(String),

    #[error("unknown recipe operation: {0}")]
    UnknownOperation(String),

    #[error("condition evaluation failed: {0}")]
    ConditionError(String),

    #[error("unresolved recipe variable: {0}")]
    UnresolvedVariable(String),

    #[error("recipe step {step} failed: {message}")]
    StepFailed { step: String, message: String },
}

/// A specialized Result type for editor operations.
pub type Result<T> = std::result::Result<T, EditError>;
