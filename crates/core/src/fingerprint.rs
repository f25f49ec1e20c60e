// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content fingerprints for job definitions.
//!
//! `job_sha` must be a pure function of `(verb, canonical definition)`:
//! object keys are sorted, volatile targeting fields are excluded, and the
//! result is hashed with SHA-256. Two submissions with byte-identical
//! canonical forms always produce the same fingerprint, which is the basis
//! for client-side cache hits and `run_once` idempotence.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Definition fields that never participate in the fingerprint: they alter
/// where a job runs, not what it does.
pub const VOLATILE_FIELDS: &[&str] = &["targets", "restrict", "parent_async_bypass"];

/// Compute the content fingerprint for a job definition.
pub fn job_sha(verb: &str, definition: &Map<String, Value>) -> String {
    let mut canonical = String::with_capacity(128);
    canonical.push_str(verb);
    canonical.push('\n');
    write_canonical_map(&mut canonical, definition, true);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

/// Write a JSON value in canonical form: object keys sorted, no whitespace.
///
/// Hand-rolled so canonicalization is infallible and independent of
/// serializer defaults.
fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_escaped(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_canonical_map(out, map, false),
    }
}

fn write_canonical_map(out: &mut String, map: &Map<String, Value>, skip_volatile: bool) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    out.push('{');
    let mut first = true;
    for key in keys {
        if skip_volatile && VOLATILE_FIELDS.contains(&key.as_str()) {
            continue;
        }
        if !first {
            out.push(',');
        }
        first = false;
        write_escaped(out, key);
        out.push(':');
        if let Some(v) = map.get(key) {
            write_canonical(out, v);
        }
    }
    out.push('}');
}

fn write_escaped(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                use std::fmt::Write;
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
