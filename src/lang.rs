//! TypeScript/JavaScript grammar wrapper. The editor targets a single
//! source dialect: the curly-brace scripting language family served by
//! the `tree-sitter-typescript` grammar (covers `.ts`, `.tsx`, `.js`,
//! `.jsx`, `.mjs`, `.cjs`).

use crate::error::{EditError, Result};
use std::path::Path;
use tree_sitter::{Language as TsLanguage, Parser, Query, Tree};

const EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

pub fn extensions() -> &'static [&'static str] {
    EXTENSIONS
}

pub fn matches_extension(ext: &str) -> bool {
    EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

pub fn detect(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(matches_extension)
}

fn grammar() -> TsLanguage {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

/// Parses source text into a tree-sitter AST using the TSX grammar, which
/// is a superset covering both JavaScript and TypeScript syntax.
pub fn parse(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&grammar())
        .map_err(|e| EditError::Parse {
            path: Path::new("<source>").to_path_buf(),
            message: format!("failed to set language: {e}"),
        })?;

    parser.parse(source, None).ok_or_else(|| EditError::Parse {
        path: Path::new("<source>").to_path_buf(),
        message: "failed to parse source".to_string(),
    })
}

/// Re-parses `source` and returns whether the tree contains syntax errors.
pub fn reparse_is_valid(source: &str) -> Result<bool> {
    let tree = parse(source)?;
    Ok(!tree.root_node().has_error())
}

pub fn query(pattern: &str) -> Result<Query> {
    Ok(Query::new(&grammar(), pattern)?)
}

/// True if `name` is a valid JS/TS identifier: starts with a letter, `_`,
/// or `$`, followed by letters, digits, `_`, or `$`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_extensions() {
        assert!(matches_extension("ts"));
        assert!(matches_extension("TSX"));
        assert!(!matches_extension("py"));
    }

    #[test]
    fn parses_function_declaration() {
        let tree = parse("function alpha() { return 1; }").unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn detects_syntax_error() {
        let tree = parse("function alpha( { return 1 }").unwrap();
        assert!(tree.root_node().has_error());
    }

    #[test]
    fn identifier_validation() {
        assert!(is_valid_identifier("fooBar"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("$jquery"));
        assert!(!is_valid_identifier("1abc"));
        assert!(!is_valid_identifier("has-dash"));
        assert!(!is_valid_identifier(""));
    }
}
