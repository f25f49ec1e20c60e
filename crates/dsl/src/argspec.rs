// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument specifications: how a verb's inline tokens bind to vars.
//!
//! Each component declares the positionals and named options its inline
//! form accepts. The binder turns a token list into the vars map the
//! dict form would have carried directly.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("unknown option --{0}")]
    UnknownOption(String),

    #[error("option --{0} requires a value")]
    MissingValue(String),

    #[error("missing required argument <{0}>")]
    MissingPositional(String),

    #[error("unexpected extra arguments: {0}")]
    ExtraArguments(String),
}

/// A positional argument slot.
#[derive(Debug, Clone)]
pub struct Positional {
    pub name: String,
    /// Greedy positionals absorb every remaining word, joined by spaces
    pub greedy: bool,
    pub required: bool,
}

/// A named `--option`.
#[derive(Debug, Clone)]
pub struct Named {
    pub name: String,
    /// Options without a value bind to `true`
    pub takes_value: bool,
}

/// Parser specification for one verb's inline form.
#[derive(Debug, Clone, Default)]
pub struct ArgSpec {
    positionals: Vec<Positional>,
    options: Vec<Named>,
}

impl ArgSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(mut self, name: impl Into<String>) -> Self {
        self.positionals.push(Positional { name: name.into(), greedy: false, required: true });
        self
    }

    /// A required positional that absorbs all remaining words.
    pub fn greedy(mut self, name: impl Into<String>) -> Self {
        self.positionals.push(Positional { name: name.into(), greedy: true, required: true });
        self
    }

    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.positionals.push(Positional { name: name.into(), greedy: false, required: false });
        self
    }

    pub fn option(mut self, name: impl Into<String>) -> Self {
        self.options.push(Named { name: name.into(), takes_value: true });
        self
    }

    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.options.push(Named { name: name.into(), takes_value: false });
        self
    }

    /// Add the options every verb accepts: timeouts, cache control, and
    /// result capture.
    pub fn with_common_options(self) -> Self {
        self.option("timeout_seconds")
            .flag("run_once")
            .flag("skip_cache")
            .flag("extend_args")
            .flag("parent_async_bypass")
            .option("stdout_arg")
    }

    /// Bind a token list to a vars map.
    ///
    /// `--flag value` and `--flag=value` are equivalent. Option names use
    /// hyphens on the wire and underscores in the vars map. Values that
    /// parse as integers or booleans bind as such; everything else stays
    /// a string.
    pub fn bind(&self, tokens: &[String]) -> Result<Map<String, Value>, BindError> {
        let mut vars = Map::new();
        let mut leftover: Vec<String> = Vec::new();
        let mut iter = tokens.iter().peekable();

        while let Some(token) = iter.next() {
            let Some(stripped) = token.strip_prefix("--") else {
                leftover.push(token.clone());
                continue;
            };
            let (raw_name, inline_value) = match stripped.split_once('=') {
                Some((n, v)) => (n, Some(v.to_string())),
                None => (stripped, None),
            };
            let key = raw_name.replace('-', "_");
            let Some(named) = self.options.iter().find(|o| o.name == key) else {
                return Err(BindError::UnknownOption(raw_name.to_string()));
            };
            if !named.takes_value {
                vars.insert(key, Value::Bool(true));
                continue;
            }
            let value = match inline_value {
                Some(v) => v,
                None => match iter.next() {
                    Some(v) => v.clone(),
                    None => return Err(BindError::MissingValue(raw_name.to_string())),
                },
            };
            vars.insert(key, coerce(&value));
        }

        let mut remaining = leftover.into_iter();
        for pos in &self.positionals {
            if pos.greedy {
                let rest: Vec<String> = remaining.by_ref().collect();
                if rest.is_empty() {
                    if pos.required {
                        return Err(BindError::MissingPositional(pos.name.clone()));
                    }
                    continue;
                }
                vars.insert(pos.name.clone(), Value::String(rest.join(" ")));
                continue;
            }
            match remaining.next() {
                Some(word) => {
                    vars.insert(pos.name.clone(), coerce(&word));
                }
                None if pos.required => {
                    return Err(BindError::MissingPositional(pos.name.clone()));
                }
                None => {}
            }
        }

        let extras: Vec<String> = remaining.collect();
        if !extras.is_empty() {
            return Err(BindError::ExtraArguments(extras.join(" ")));
        }
        Ok(vars)
    }
}

fn coerce(word: &str) -> Value {
    if let Ok(n) = word.parse::<u64>() {
        return Value::Number(n.into());
    }
    match word {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
#[path = "argspec_tests.rs"]
mod tests;
