//! End-to-end tests over the public API, mirroring the guarded-edit
//! scenarios the core is built against.

use jsedit::digest::HashConfig;
use jsedit::error::EditError;
use jsedit::guard::GuardStatus;
use jsedit::ops::{self, OperationOptions, ReplacementSource};
use jsedit::selector::Selector;
use jsedit::symbol::SymbolPool;

fn collect(source: &str) -> SymbolPool {
    SymbolPool::collect(source, HashConfig::default()).unwrap()
}

#[test]
fn extract_by_hash_matches_list_functions_entry() {
    let source = "exports.alpha = function alpha() { return 1; }";
    let pool = collect(source);

    let entries = ops::list_functions(&pool, &Default::default()).unwrap();
    let alpha = entries.iter().find(|e| e.canonical_name == "exports.alpha").unwrap();

    let results = ops::extract_hashes(&pool, &[alpha.hash.clone()]).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].code, "function alpha() { return 1; }");
}

#[test]
fn stale_expect_hash_aborts_without_touching_source() {
    let source = "function foo() { return 1; }";
    let pool = collect(source);
    let selector = Selector::parse("foo").unwrap();

    let opts = OperationOptions {
        expect_hash: Some("0000deadbeef".to_string()),
        ..OperationOptions::default()
    };
    let err = ops::replace_function(
        &pool,
        &selector,
        ReplacementSource::Inline("function foo() { return 2; }".to_string()),
        None,
        &opts,
    )
    .unwrap_err();

    assert!(matches!(err, EditError::HashMismatch { .. }));
}

#[test]
fn rename_preserves_body_and_reparses() {
    let source = "function utilityHelper() { return x + 1; }";
    let pool = collect(source);
    let selector = Selector::parse("utilityHelper").unwrap();

    let outcome = ops::replace_function(
        &pool,
        &selector,
        ReplacementSource::Inline(source.to_string()),
        Some("fooBar"),
        &OperationOptions::default(),
    )
    .unwrap();

    assert!(outcome.new_source.contains("function fooBar() { return x + 1; }"));
    assert_eq!(outcome.guard.syntax.status, GuardStatus::Ok);
    assert_eq!(outcome.guard.result.status, GuardStatus::Changed);
}

#[test]
fn crlf_file_absorbs_lf_replacement_as_crlf() {
    let source = "function alpha() {\r\n  return 1;\r\n}\r\n";
    let pool = collect(source);
    let selector = Selector::parse("alpha").unwrap();

    let outcome = ops::replace_function(
        &pool,
        &selector,
        ReplacementSource::Inline("function alpha() {\n  return 2;\n}".to_string()),
        None,
        &OperationOptions::default(),
    )
    .unwrap();

    assert!(outcome.new_source.contains("\r\n  return 2;\r\n"));
    let newline_guard = outcome.guard.newline.unwrap();
    assert_eq!(newline_guard.status, "converted");
}

#[test]
fn recipe_skips_step_when_no_matches_found() {
    use jsedit::recipe::{
        evaluate_condition, AggregateStatus, Environment, RecipeManifest, StepHandler, StepSpec,
        StepStatus,
    };
    use std::collections::BTreeMap;

    struct CountingHandler;
    impl StepHandler for CountingHandler {
        fn invoke(
            &mut self,
            op: &str,
            _args: &BTreeMap<String, String>,
            _dry_run: bool,
        ) -> jsedit::error::Result<BTreeMap<String, String>> {
            let mut out = BTreeMap::new();
            if op == "count-functions" {
                out.insert("count".to_string(), "0".to_string());
            }
            Ok(out)
        }
    }

    let manifest = RecipeManifest {
        name: "zero-match-recipe".to_string(),
        version: 1,
        parameters: BTreeMap::new(),
        steps: vec![
            StepSpec {
                name: "count".to_string(),
                op: "count-functions".to_string(),
                with: BTreeMap::new(),
                condition: None,
                outputs: vec!["count".to_string()],
            },
            StepSpec {
                name: "replace-if-any".to_string(),
                op: "replace-function".to_string(),
                with: BTreeMap::new(),
                condition: Some("${count} > 0".to_string()),
                outputs: vec![],
            },
        ],
    };

    let mut env = Environment::new("empty.ts", "/tmp");
    let mut handler = CountingHandler;
    let result = jsedit::recipe::run_recipe(&manifest, &mut env, &mut handler, true).unwrap();

    assert_eq!(result.status, AggregateStatus::Success);
    assert_eq!(result.steps[0].status, StepStatus::Success);
    assert_eq!(result.steps[1].status, StepStatus::Skipped);

    assert!(!evaluate_condition("0 > 0", &env).unwrap());
}

#[test]
fn ambiguous_selector_resolved_by_select_path() {
    let source = r#"
const handle = () => 1;
module.exports.handle = function handle() { return 2; };
"#;
    let pool = collect(source);

    let ambiguous = Selector::parse("handle").unwrap();
    let err = ops::locate(&pool, &ambiguous, &OperationOptions::default()).unwrap_err();
    assert!(matches!(err, EditError::AmbiguousMatch { .. }));

    if let Some(record) = pool.functions.iter().find(|f| f.original_name == "handle") {
        let opts = OperationOptions {
            select_path: Some(record.path_signature.clone()),
            ..OperationOptions::default()
        };
        let result = ops::locate(&pool, &ambiguous, &opts).unwrap();
        assert_eq!(result.path, record.path_signature);
    }
}

#[test]
fn empty_source_yields_empty_pools() {
    let pool = collect("");
    assert!(pool.functions.is_empty());
    assert!(pool.variables.is_empty());
}

#[test]
fn extract_then_replace_with_same_text_is_unchanged() {
    let source = "function alpha() { return 1; }";
    let pool = collect(source);
    let selector = Selector::parse("alpha").unwrap();

    let extracted = ops::extract(&pool, &selector, &OperationOptions::default()).unwrap();
    let outcome = ops::replace_function(
        &pool,
        &selector,
        ReplacementSource::Inline(extracted.code),
        None,
        &OperationOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome.guard.result.status, GuardStatus::Unchanged);
}

#[test]
fn class_records_are_not_replaceable() {
    let source = "class Widget { hidden() { return 1; } }";
    let pool = collect(source);
    let selector = Selector::parse("Widget").unwrap();

    let err = ops::replace_function(
        &pool,
        &selector,
        ReplacementSource::Inline("class Widget {}".to_string()),
        None,
        &OperationOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, EditError::NotReplaceable { .. }));
}
