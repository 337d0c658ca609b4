//! Parameterized, conditional, multi-step workflow executor built atop
//! the operation dispatcher.

mod condition;

pub use condition::{evaluate_condition, Value as ConditionValue};

use crate::error::{EditError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub default: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    pub name: String,
    pub op: String,
    #[serde(default)]
    pub with: BTreeMap<String, String>,
    #[serde(rename = "when", default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// A recipe manifest: name, parameters (with defaults and descriptions),
/// ordered steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeManifest {
    pub name: String,
    pub version: u32,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterSpec>,
    pub steps: Vec<StepSpec>,
}

impl RecipeManifest {
    pub fn from_json(text: &str) -> Result<Self> {
        let manifest: RecipeManifest = serde_json::from_str(text)?;
        if manifest.name.is_empty() {
            return Err(EditError::InvalidRecipe("manifest missing name".to_string()));
        }
        if manifest.steps.is_empty() {
            return Err(EditError::InvalidRecipe("manifest has no steps".to_string()));
        }
        Ok(manifest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub name: String,
    pub status: StepStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeRunResult {
    pub steps: Vec<StepResult>,
    pub status: AggregateStatus,
}

/// A handler invoked per step: given the operation name and its
/// `${var}`-substituted argument map, performs the operation and
/// optionally returns values to bind to declared outputs.
pub trait StepHandler {
    fn invoke(&mut self, op: &str, args: &BTreeMap<String, String>, dry_run: bool) -> Result<BTreeMap<String, String>>;
}

/// The variable environment: built-ins (file path, cwd, step index) plus
/// resolved parameters, mutated as steps bind outputs.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new(file: &str, cwd: &str) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert("file".to_string(), file.to_string());
        vars.insert("cwd".to_string(), cwd.to_string());
        Self { vars }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// Resolves parameters with precedence: defaults < recipe-supplied <
    /// CLI overrides.
    pub fn resolve_parameters(
        &mut self,
        manifest: &RecipeManifest,
        cli_overrides: &BTreeMap<String, String>,
    ) {
        for (name, spec) in &manifest.parameters {
            if let Some(default) = &spec.default {
                self.set(name.clone(), default.clone());
            }
        }
        for (key, value) in cli_overrides {
            self.set(key.clone(), value.clone());
        }
    }

    /// Substitutes every `${var}` occurrence in `input` with its bound
    /// value. Unknown references raise an error.
    pub fn substitute(&self, input: &str) -> Result<String> {
        let mut out = String::with_capacity(input.len());
        let bytes = input.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
                let Some(close) = input[i + 2..].find('}') else {
                    out.push_str(&input[i..]);
                    break;
                };
                let var_name = &input[i + 2..i + 2 + close];
                let value = self
                    .get(var_name)
                    .ok_or_else(|| EditError::UnresolvedVariable(var_name.to_string()))?;
                out.push_str(value);
                i += 2 + close + 1;
            } else {
                out.push(bytes[i] as char);
                i += 1;
            }
        }
        Ok(out)
    }
}

/// Executes a recipe against a handler. Steps run sequentially; a step
/// failure records the error and exits the loop with aggregate status
/// `failed`. `dry_run` suppresses writeback in every mutating handler
/// while still running all guards.
pub fn run_recipe<H: StepHandler>(
    manifest: &RecipeManifest,
    env: &mut Environment,
    handler: &mut H,
    dry_run: bool,
) -> Result<RecipeRunResult> {
    let mut results = Vec::with_capacity(manifest.steps.len());
    let mut failed = false;

    for (index, step) in manifest.steps.iter().enumerate() {
        env.set("step_index", index.to_string());

        if failed {
            break;
        }

        let should_run = match &step.condition {
            None => true,
            Some(expr) => {
                let substituted = env.substitute(expr)?;
                evaluate_condition(&substituted, env)?
            }
        };

        if !should_run {
            results.push(StepResult {
                name: step.name.clone(),
                status: StepStatus::Skipped,
                duration_ms: 0,
                error: None,
            });
            continue;
        }

        let mut args = BTreeMap::new();
        for (key, value) in &step.with {
            args.insert(key.clone(), env.substitute(value)?);
        }

        match handler.invoke(&step.op, &args, dry_run) {
            Ok(outputs) => {
                for name in &step.outputs {
                    if let Some(value) = outputs.get(name) {
                        env.set(name.clone(), value.clone());
                    }
                }
                results.push(StepResult {
                    name: step.name.clone(),
                    status: StepStatus::Success,
                    duration_ms: 0,
                    error: None,
                });
            }
            Err(e) => {
                results.push(StepResult {
                    name: step.name.clone(),
                    status: StepStatus::Failed,
                    duration_ms: 0,
                    error: Some(e.to_string()),
                });
                failed = true;
            }
        }
    }

    Ok(RecipeRunResult {
        status: if failed {
            AggregateStatus::Failed
        } else {
            AggregateStatus::Success
        },
        steps: results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct RecordingHandler {
        invocations: RefCell<Vec<String>>,
    }

    impl StepHandler for RecordingHandler {
        fn invoke(&mut self, op: &str, _args: &BTreeMap<String, String>, _dry_run: bool) -> Result<BTreeMap<String, String>> {
            self.invocations.borrow_mut().push(op.to_string());
            let mut out = BTreeMap::new();
            out.insert("count".to_string(), "0".to_string());
            Ok(out)
        }
    }

    fn manifest_with_condition(condition: &str) -> RecipeManifest {
        RecipeManifest {
            name: "demo".to_string(),
            version: 1,
            parameters: BTreeMap::new(),
            steps: vec![
                StepSpec {
                    name: "set-count".to_string(),
                    op: "noop".to_string(),
                    with: BTreeMap::new(),
                    condition: None,
                    outputs: vec!["count".to_string()],
                },
                StepSpec {
                    name: "replace".to_string(),
                    op: "replace-function".to_string(),
                    with: BTreeMap::new(),
                    condition: Some(condition.to_string()),
                    outputs: vec![],
                },
            ],
        }
    }

    #[test]
    fn step_b_skips_when_condition_false() {
        let manifest = manifest_with_condition("${count} > 0");
        let mut env = Environment::new("a.ts", "/tmp");
        let mut handler = RecordingHandler {
            invocations: RefCell::new(Vec::new()),
        };
        let result = run_recipe(&manifest, &mut env, &mut handler, true).unwrap();
        assert_eq!(result.status, AggregateStatus::Success);
        assert_eq!(result.steps[1].status, StepStatus::Skipped);
    }

    #[test]
    fn unresolved_variable_errors() {
        let env = Environment::new("a.ts", "/tmp");
        assert!(env.substitute("${missing}").is_err());
    }

    #[test]
    fn parameter_precedence_cli_overrides_default() {
        let mut params = BTreeMap::new();
        params.insert(
            "name".to_string(),
            ParameterSpec {
                default: Some("fallback".to_string()),
                description: String::new(),
            },
        );
        let manifest = RecipeManifest {
            name: "demo".to_string(),
            version: 1,
            parameters: params,
            steps: vec![StepSpec {
                name: "s".to_string(),
                op: "noop".to_string(),
                with: BTreeMap::new(),
                condition: None,
                outputs: vec![],
            }],
        };
        let mut env = Environment::new("a.ts", "/tmp");
        let mut overrides = BTreeMap::new();
        overrides.insert("name".to_string(), "override".to_string());
        env.resolve_parameters(&manifest, &overrides);
        assert_eq!(env.get("name"), Some("override"));
    }

    #[test]
    fn step_failure_halts_remaining_steps() {
        struct FailingHandler;
        impl StepHandler for FailingHandler {
            fn invoke(&mut self, op: &str, _args: &BTreeMap<String, String>, _dry_run: bool) -> Result<BTreeMap<String, String>> {
                if op == "boom" {
                    return Err(EditError::StepFailed {
                        step: "boom".to_string(),
                        message: "simulated".to_string(),
                    });
                }
                Ok(BTreeMap::new())
            }
        }
        let manifest = RecipeManifest {
            name: "demo".to_string(),
            version: 1,
            parameters: BTreeMap::new(),
            steps: vec![
                StepSpec {
                    name: "a".to_string(),
                    op: "boom".to_string(),
                    with: BTreeMap::new(),
                    condition: None,
                    outputs: vec![],
                },
                StepSpec {
                    name: "b".to_string(),
                    op: "noop".to_string(),
                    with: BTreeMap::new(),
                    condition: None,
                    outputs: vec![],
                },
            ],
        };
        let mut env = Environment::new("a.ts", "/tmp");
        let mut handler = FailingHandler;
        let result = run_recipe(&manifest, &mut env, &mut handler, true).unwrap();
        assert_eq!(result.status, AggregateStatus::Failed);
        assert_eq!(result.steps.len(), 1);
    }
}
