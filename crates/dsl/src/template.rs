// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template variable interpolation.
//!
//! `${name}` placeholders expand from a vars map. Unknown variables are
//! left as-is, which is what lets interpolation run in two passes: once
//! at submission with CLI overrides, once on the client with its
//! argument cache.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("constant regex pattern is valid")
});

/// Interpolate `${name}` placeholders with values from the vars map.
pub fn interpolate(template: &str, vars: &HashMap<String, String>) -> String {
    if !template.contains("${") {
        return template.to_string();
    }
    VAR_PATTERN
        .replace_all(template, |caps: &regex::Captures| {
            let name = &caps[1];
            match vars.get(name) {
                Some(val) => val.clone(),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

/// Interpolate every string inside a JSON value, recursively.
///
/// Used on dict-form vars at submission and on whole definitions
/// during the client's render pass.
pub fn interpolate_json(value: &mut serde_json::Value, vars: &HashMap<String, String>) {
    match value {
        serde_json::Value::String(s) => *s = interpolate(s, vars),
        serde_json::Value::Array(items) => {
            for item in items {
                interpolate_json(item, vars);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values_mut() {
                interpolate_json(item, vars);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
