// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component registry: verb → implementation.
//!
//! Built-ins register statically at construction; user-defined verbs
//! are scanned from a component directory at startup. The registry is
//! the compiler's view of the verb catalog.

use crate::builtins;
use crate::{Component, ComponentError};
use dird_dsl::ArgSpec;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub struct Registry {
    components: BTreeMap<String, Arc<dyn Component>>,
}

impl Registry {
    /// Registry with every built-in verb.
    pub fn with_builtins() -> Self {
        let mut registry = Self { components: BTreeMap::new() };
        builtins::register(&mut registry);
        registry
    }

    pub fn register(&mut self, verb: impl Into<String>, component: Arc<dyn Component>) {
        self.components.insert(verb.into(), component);
    }

    pub fn get(&self, verb: &str) -> Option<Arc<dyn Component>> {
        self.components.get(verb).cloned()
    }

    /// Verbs this registry can execute, for capability advertisement.
    pub fn verbs(&self) -> Vec<String> {
        self.components.keys().cloned().collect()
    }

    /// Scan a directory for user-defined components and register them.
    /// Returns how many were loaded.
    pub fn load_user_components(&mut self, dir: &Path) -> Result<usize, ComponentError> {
        let loaded = crate::loader::load_dir(dir)?;
        let count = loaded.len();
        for (verb, component) in loaded {
            self.register(verb, component);
        }
        Ok(count)
    }
}

impl dird_dsl::Catalog for Registry {
    fn arg_spec(&self, verb: &str) -> Option<ArgSpec> {
        self.get(verb).map(|c| c.args())
    }

    fn normalize(
        &self,
        verb: &str,
        exec: &[String],
        vars: &Map<String, Value>,
    ) -> Result<Map<String, Value>, String> {
        let component = self.get(verb).ok_or_else(|| format!("unknown verb: {verb}"))?;
        component.server(exec, vars).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
