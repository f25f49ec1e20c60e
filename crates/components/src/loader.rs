// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-defined components.
//!
//! Extra verbs load from the component directory as declarative YAML
//! templates: an argument spec plus a shell command rendered from the
//! bound vars. Clients enumerate their local set and advertise it in
//! heartbeats; the server never ships component bodies.

use crate::{ClientCtx, Component, ComponentError, ComponentOutcome};
use dird_core::Job;
use dird_dsl::ArgSpec;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// On-disk definition of a user component.
#[derive(Debug, Deserialize)]
struct UserComponentDef {
    /// Uppercase verb name
    verb: String,
    /// Shell command template; `${var}` placeholders render from bound vars
    command: String,
    #[serde(default)]
    positionals: Vec<PositionalDef>,
    #[serde(default)]
    options: Vec<OptionDef>,
    #[serde(default)]
    no_block: bool,
}

#[derive(Debug, Deserialize)]
struct PositionalDef {
    name: String,
    #[serde(default)]
    greedy: bool,
    #[serde(default = "default_true")]
    required: bool,
}

#[derive(Debug, Deserialize)]
struct OptionDef {
    name: String,
    #[serde(default = "default_true")]
    takes_value: bool,
}

fn default_true() -> bool {
    true
}

/// A verb defined by a YAML template in the component directory.
pub struct UserComponent {
    command: String,
    positionals: Vec<PositionalDef>,
    options: Vec<OptionDef>,
    no_block: bool,
}

#[async_trait::async_trait]
impl Component for UserComponent {
    fn args(&self) -> ArgSpec {
        let mut spec = ArgSpec::new();
        for p in &self.positionals {
            spec = match (p.greedy, p.required) {
                (true, _) => spec.greedy(p.name.clone()),
                (false, true) => spec.positional(p.name.clone()),
                (false, false) => spec.optional(p.name.clone()),
            };
        }
        for o in &self.options {
            spec = if o.takes_value {
                spec.option(o.name.clone())
            } else {
                spec.flag(o.name.clone())
            };
        }
        spec
    }

    fn server(
        &self,
        _exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ComponentError> {
        let mut rendered: HashMap<String, String> = HashMap::new();
        for (key, value) in vars {
            rendered.insert(
                key.clone(),
                match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            );
        }
        for p in &self.positionals {
            if p.required && !vars.contains_key(&p.name) {
                return Err(ComponentError::malformed(format!("{} is required", p.name)));
            }
        }
        let command = dird_dsl::interpolate(&self.command, &rendered);
        let mut def = Map::new();
        def.insert("command".to_string(), Value::String(command));
        if self.no_block {
            def.insert("no_block".to_string(), Value::Bool(true));
        }
        Ok(def)
    }

    async fn client(&self, ctx: &ClientCtx, job: &Job) -> Result<ComponentOutcome, ComponentError> {
        // Same execution path as RUN: the definition carries a command
        crate::builtins::run::Run.client(ctx, job).await
    }

    fn no_block(&self) -> bool {
        self.no_block
    }
}

/// Scan a directory for `*.yaml`/`*.yml` component templates.
pub fn load_dir(dir: &Path) -> Result<Vec<(String, Arc<dyn Component>)>, ComponentError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut out: Vec<(String, Arc<dyn Component>)> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if ext != "yaml" && ext != "yml" {
            continue;
        }
        let text = std::fs::read_to_string(&path)?;
        let def: UserComponentDef = serde_yaml::from_str(&text)
            .map_err(|e| ComponentError::malformed(format!("{}: {e}", path.display())))?;
        if !def.verb.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            return Err(ComponentError::malformed(format!(
                "{}: verb must be uppercase: {}",
                path.display(),
                def.verb
            )));
        }
        tracing::debug!(verb = %def.verb, path = %path.display(), "loaded user component");
        out.push((
            def.verb,
            Arc::new(UserComponent {
                command: def.command,
                positionals: def.positionals,
                options: def.options,
                no_block: def.no_block,
            }),
        ));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
