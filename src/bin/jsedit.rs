//! CLI for the guarded source editor. One command, mutually exclusive
//! operation flags, dry-run by default.

use anyhow::{bail, Context, Result};
use clap::Parser;
use jsedit::digest::HashConfig;
use jsedit::ops::{self, EnclosingMode, ListFilter, OperationOptions, ReplacementSource};
use jsedit::recipe::{Environment, RecipeManifest, StepHandler};
use jsedit::selector::{Selector, VariableTargetMode};
use jsedit::symbol::SymbolPool;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Guarded, AST-directed editing of a single JS/TS source file.
#[derive(Parser, Debug)]
#[command(name = "jsedit", author, version, about, long_about = None)]
struct Cli {
    #[arg(long)]
    file: PathBuf,

    // -- operations (mutually exclusive, exactly one required) --
    #[arg(long)]
    list_functions: bool,
    #[arg(long)]
    list_variables: bool,
    #[arg(long)]
    list_constructors: bool,
    #[arg(long)]
    outline: bool,
    #[arg(long)]
    extract_hashes: Option<String>,
    #[arg(long)]
    locate: Option<String>,
    #[arg(long)]
    locate_variable: Option<String>,
    #[arg(long)]
    preview: Option<String>,
    #[arg(long)]
    preview_variable: Option<String>,
    #[arg(long)]
    context_function: Option<String>,
    #[arg(long)]
    context_variable: Option<String>,
    #[arg(long)]
    scan_targets: bool,
    #[arg(long)]
    search_text: Option<String>,
    #[arg(long)]
    extract: Option<String>,
    #[arg(long)]
    extract_variable: Option<String>,
    #[arg(long)]
    replace: Option<String>,
    #[arg(long)]
    replace_variable: Option<String>,
    #[arg(long)]
    recipe: Option<PathBuf>,

    // -- modifiers --
    #[arg(long)]
    with: Option<String>,
    #[arg(long)]
    with_file: Option<PathBuf>,
    #[arg(long)]
    rename: Option<String>,
    #[arg(long, value_name = "start:end")]
    replace_range: Option<String>,
    #[arg(long)]
    expect_hash: Option<String>,
    #[arg(long, value_name = "start:end")]
    expect_span: Option<String>,
    #[arg(long)]
    select: Option<String>,
    #[arg(long)]
    select_path: Option<String>,
    #[arg(long)]
    allow_multiple: bool,
    #[arg(long)]
    fix: bool,
    #[arg(long)]
    preview_edit: bool,
    #[arg(long)]
    emit_diff: bool,
    #[arg(long)]
    emit_plan: Option<PathBuf>,
    #[arg(long)]
    force: bool,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    quiet: bool,
    #[arg(long, default_value = "declarator")]
    variable_target: String,
    #[arg(long, default_value_t = 0)]
    context_before: usize,
    #[arg(long, default_value_t = 0)]
    context_after: usize,
    #[arg(long, default_value = "exact")]
    context_enclosing: String,
    #[arg(long, default_value_t = 20)]
    search_limit: usize,
    #[arg(long, default_value_t = 40)]
    search_context: usize,
    #[arg(long)]
    scan_target_kind: Option<String>,
    #[arg(long)]
    filter_text: Option<String>,
    #[arg(long)]
    r#match: Vec<String>,
    #[arg(long)]
    exclude: Vec<String>,
    #[arg(long)]
    param: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => {}
        Err(e) => {
            if cli.json || cli.quiet {
                let payload = serde_json::json!({ "error": e.to_string() });
                println!("{}", payload);
            } else {
                eprintln!("error: {e:#}");
            }
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if let Some(recipe_path) = &cli.recipe {
        return run_recipe(cli, recipe_path);
    }

    let source = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let pool = SymbolPool::collect(&source, HashConfig::default())
        .with_context(|| "failed to parse source")?;

    let opts = build_options(cli)?;

    if cli.list_functions {
        let filter = build_list_filter(cli);
        let entries = ops::list_functions(&pool, &filter)?;
        return emit(cli, &entries);
    }
    if cli.list_variables {
        let filter = build_list_filter(cli);
        let entries = ops::list_variables(&pool, &filter)?;
        return emit(cli, &entries);
    }
    if cli.list_constructors {
        return emit(cli, &ops::list_constructors(&pool));
    }
    if cli.outline {
        let functions = ops::list_functions(&pool, &ListFilter::default())?;
        let variables = ops::list_variables(&pool, &ListFilter::default())?;
        return emit(cli, &serde_json::json!({ "functions": functions, "variables": variables }));
    }
    if let Some(hashes) = &cli.extract_hashes {
        let list: Vec<String> = hashes.split(',').map(str::to_string).collect();
        let results = ops::extract_hashes(&pool, &list)?;
        return emit(cli, &results);
    }
    if let Some(sel) = &cli.locate {
        let selector = Selector::parse(sel)?;
        let result = ops::locate(&pool, &selector, &opts)?;
        return emit(cli, &result);
    }
    if let Some(sel) = &cli.locate_variable {
        let selector = Selector::parse(&format!("variable:{sel}"))?;
        let result = ops::locate(&pool, &selector, &opts)?;
        return emit(cli, &result);
    }
    if let Some(sel) = &cli.preview {
        let selector = Selector::parse(sel)?;
        let result = ops::preview(&pool, &selector, cli.context_before, cli.context_after, &opts)?;
        return emit(cli, &result);
    }
    if let Some(sel) = &cli.preview_variable {
        let selector = Selector::parse(&format!("variable:{sel}"))?;
        let result = ops::preview(&pool, &selector, cli.context_before, cli.context_after, &opts)?;
        return emit(cli, &result);
    }
    if let Some(sel) = &cli.context_function {
        let selector = Selector::parse(sel)?;
        let mode = EnclosingMode::parse(&cli.context_enclosing)?;
        let result = ops::context(&pool, &selector, mode, &opts)?;
        return emit(cli, &result);
    }
    if let Some(sel) = &cli.context_variable {
        let selector = Selector::parse(&format!("variable:{sel}"))?;
        let mode = EnclosingMode::parse(&cli.context_enclosing)?;
        let result = ops::context(&pool, &selector, mode, &opts)?;
        return emit(cli, &result);
    }
    if cli.scan_targets {
        let kind = cli.scan_target_kind.as_deref().unwrap_or("function");
        return emit(cli, &ops::scan_targets(&pool, kind));
    }
    if let Some(needle) = &cli.search_text {
        let hits = ops::search_text(&source, needle, cli.search_limit, cli.search_context);
        return emit(cli, &hits);
    }
    if let Some(sel) = &cli.extract {
        let selector = Selector::parse(sel)?;
        let result = ops::extract(&pool, &selector, &opts)?;
        return emit(cli, &result);
    }
    if let Some(sel) = &cli.extract_variable {
        let selector = Selector::parse(&format!("variable:{sel}"))?;
        let result = ops::extract(&pool, &selector, &opts)?;
        return emit(cli, &result);
    }
    if let Some(sel) = &cli.replace {
        return do_replace_function(cli, &pool, sel, &opts);
    }
    if let Some(sel) = &cli.replace_variable {
        return do_replace_variable(cli, &pool, sel, &opts);
    }

    bail!("no operation flag given; pass one of --list-functions, --locate, --extract, --replace, --recipe, …");
}

fn build_options(cli: &Cli) -> Result<OperationOptions> {
    let expect_span = match &cli.expect_span {
        Some(s) => Some(parse_range(s)?),
        None => None,
    };
    let select_index = match &cli.select {
        Some(s) if s.starts_with("hash:") => None,
        Some(s) if s.starts_with("path:") => None,
        Some(s) => Some(s.parse::<usize>().context("--select must be a 1-based index or hash:/path: prefixed value")?),
        None => None,
    };
    let select_hash = cli.select.as_ref().and_then(|s| s.strip_prefix("hash:")).map(str::to_string);
    let select_path = cli
        .select
        .as_ref()
        .and_then(|s| s.strip_prefix("path:"))
        .map(str::to_string)
        .or_else(|| cli.select_path.clone());

    Ok(OperationOptions {
        force: cli.force,
        fix: cli.fix,
        allow_multiple: cli.allow_multiple,
        select_hash,
        select_path,
        select_index,
        expect_hash: cli.expect_hash.clone(),
        expect_span,
    })
}

fn parse_range(s: &str) -> Result<(usize, usize)> {
    let (start, end) = s.split_once(':').context("range must be start:end")?;
    Ok((start.parse()?, end.parse()?))
}

fn build_list_filter(cli: &Cli) -> ListFilter {
    ListFilter {
        filter_text: cli.filter_text.clone(),
        include: cli.r#match.clone(),
        exclude: cli.exclude.clone(),
    }
}

fn load_replacement(cli: &Cli) -> Result<String> {
    if let Some(path) = &cli.with_file {
        return Ok(std::fs::read_to_string(path)?);
    }
    if let Some(code) = &cli.with {
        return Ok(code.clone());
    }
    bail!("replace requires --with <code> or --with-file <path>")
}

fn do_replace_function(cli: &Cli, pool: &SymbolPool, sel: &str, opts: &OperationOptions) -> Result<()> {
    let selector = Selector::parse(sel)?;
    let replacement = if let Some(range) = &cli.replace_range {
        let (start, end) = parse_range(range)?;
        ReplacementSource::SubRange {
            text: load_replacement(cli)?,
            start,
            end,
        }
    } else {
        ReplacementSource::Inline(load_replacement(cli)?)
    };
    let outcome = ops::replace_function(pool, &selector, replacement, cli.rename.as_deref(), opts)?;
    finish_mutation(cli, pool, outcome)
}

fn do_replace_variable(cli: &Cli, pool: &SymbolPool, sel: &str, opts: &OperationOptions) -> Result<()> {
    let selector = Selector::parse(&format!("variable:{sel}"))?;
    let mode = VariableTargetMode::parse(&cli.variable_target)?;
    let replacement = load_replacement(cli)?;
    let outcome = ops::replace_variable(pool, &selector, replacement, mode, opts)?;
    finish_mutation(cli, pool, outcome)
}

fn finish_mutation(cli: &Cli, pool: &SymbolPool, outcome: ops::ReplaceOutcome) -> Result<()> {
    if outcome.guard.has_failed() {
        emit(cli, &outcome)?;
        bail!("guard check failed");
    }

    if let Some(plan_path) = &cli.emit_plan {
        let plan = jsedit::plan::PlanBuilder {
            operation: "replace".to_string(),
            file: cli.file.display().to_string(),
            selector: outcome.canonical_name.clone(),
            matches: vec![],
            expected_hashes: None,
            allow_multiple: cli.allow_multiple,
            extras: serde_json::json!({ "guard": outcome.guard }),
        }
        .build("1970-01-01T00:00:00Z");
        jsedit::plan::write_plan(&plan, plan_path)?;
    }

    if cli.emit_diff || cli.preview_edit {
        let diff = jsedit::diff::unified_diff(pool.mapper.source(), &outcome.new_source, cli.file.as_path());
        if !cli.quiet {
            println!("{diff}");
        }
    }

    let mut written = false;
    if cli.fix {
        std::fs::write(&cli.file, &outcome.new_source)?;
        written = true;
    }

    let mut outcome = outcome;
    outcome.written = written;
    emit(cli, &outcome)
}

fn run_recipe(cli: &Cli, recipe_path: &PathBuf) -> Result<()> {
    let manifest_text = std::fs::read_to_string(recipe_path)
        .with_context(|| format!("failed to read recipe manifest {}", recipe_path.display()))?;
    let manifest = RecipeManifest::from_json(&manifest_text)?;

    let cwd = std::env::current_dir().unwrap_or_default();
    let mut env = Environment::new(&cli.file.display().to_string(), &cwd.display().to_string());

    let mut overrides = BTreeMap::new();
    for param in &cli.param {
        let (key, value) = param.split_once('=').context("--param expects key=value")?;
        overrides.insert(key.to_string(), value.trim_matches('"').to_string());
    }
    env.resolve_parameters(&manifest, &overrides);

    let mut handler = CliStepHandler {
        file: cli.file.clone(),
        fix: cli.fix,
    };
    let result = jsedit::recipe::run_recipe(&manifest, &mut env, &mut handler, !cli.fix)?;
    emit(cli, &result)?;

    if matches!(result.status, jsedit::recipe::AggregateStatus::Failed) {
        std::process::exit(1);
    }
    Ok(())
}

/// Dispatches recipe steps to the same operation handlers the flat CLI
/// uses, re-reading the file between steps so each step observes prior
/// writebacks.
struct CliStepHandler {
    file: PathBuf,
    fix: bool,
}

impl StepHandler for CliStepHandler {
    fn invoke(
        &mut self,
        op: &str,
        args: &BTreeMap<String, String>,
        dry_run: bool,
    ) -> jsedit::error::Result<BTreeMap<String, String>> {
        let source = std::fs::read_to_string(&self.file)?;
        let pool = SymbolPool::collect(&source, HashConfig::default())?;
        let mut outputs = BTreeMap::new();

        match op {
            "count-functions" => {
                outputs.insert("count".to_string(), pool.functions.len().to_string());
            }
            "count-variables" => {
                outputs.insert("count".to_string(), pool.variables.len().to_string());
            }
            "replace-function" => {
                let selector_str = args.get("selector").cloned().unwrap_or_default();
                let selector = Selector::parse(&selector_str)?;
                let code = args.get("with").cloned().unwrap_or_default();
                let outcome = ops::replace_function(
                    &pool,
                    &selector,
                    ReplacementSource::Inline(code),
                    args.get("rename").map(String::as_str),
                    &OperationOptions::default(),
                )?;
                if !dry_run && self.fix {
                    std::fs::write(&self.file, &outcome.new_source)?;
                }
            }
            "replace-variable" => {
                let selector_str = args.get("selector").cloned().unwrap_or_default();
                let selector = Selector::parse(&format!("variable:{selector_str}"))?;
                let code = args.get("with").cloned().unwrap_or_default();
                let mode = args
                    .get("variable_target")
                    .map(|s| VariableTargetMode::parse(s))
                    .transpose()?
                    .unwrap_or(VariableTargetMode::Declarator);
                let outcome = ops::replace_variable(&pool, &selector, code, mode, &OperationOptions::default())?;
                if !dry_run && self.fix {
                    std::fs::write(&self.file, &outcome.new_source)?;
                }
            }
            other => {
                return Err(jsedit::error::EditError::UnknownOperation(other.to_string()));
            }
        }

        Ok(outputs)
    }
}

fn emit<T: serde::Serialize>(cli: &Cli, value: &T) -> Result<()> {
    if cli.quiet {
        return Ok(());
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}
