//! # jsedit
//!
//! A guarded, AST-directed source editor for the JavaScript/TypeScript
//! family. Exposes `list`, `locate`, `preview`, `context`, `scan-targets`,
//! `extract`, `replace`, and `rename` over function and variable symbols,
//! orchestrated through a declarative recipe engine for multi-step
//! refactoring.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use jsedit::prelude::*;
//!
//! let source = std::fs::read_to_string("app.js")?;
//! let pool = SymbolPool::collect(&source, HashConfig::default())?;
//! let selector = Selector::parse("alpha")?;
//! let matches = jsedit::selector::resolve_candidates(&pool, &selector);
//! # Ok::<(), jsedit::error::EditError>(())
//! ```
//!
//! Each invocation targets a single source file and does not resolve
//! cross-file references; see the module docs for the per-component
//! design (byte mapping, digesting, newline handling, symbol collection,
//! selector resolution, guards, operations, recipes).

pub mod bytemap;
pub mod digest;
pub mod diff;
pub mod error;
pub mod guard;
pub mod lang;
pub mod newline;
pub mod ops;
pub mod plan;
pub mod recipe;
pub mod selector;
pub mod symbol;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::bytemap::{ByteMapper, RawSpan, Span};
    pub use crate::digest::{create_digest, HashConfig};
    pub use crate::error::{EditError, Result};
    pub use crate::guard::Guard;
    pub use crate::plan::Plan;
    pub use crate::recipe::{Environment, RecipeManifest, StepHandler};
    pub use crate::selector::Selector;
    pub use crate::symbol::SymbolPool;
}

pub use prelude::*;
