// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Volatile in-memory backend, process lifetime only.

use crate::{Datastore, StoreError};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// In-memory datastore. Tables are nested maps behind a single lock;
/// writers are short-lived so one lock is enough.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Datastore for MemoryStore {
    fn get(&self, table: &str, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.tables.lock().get(table).and_then(|t| t.get(key)).cloned())
    }

    fn put(&self, table: &str, key: &str, value: Value) -> Result<(), StoreError> {
        self.tables.lock().entry(table.to_string()).or_default().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, table: &str, key: &str) -> Result<(), StoreError> {
        if let Some(t) = self.tables.lock().get_mut(table) {
            t.remove(key);
        }
        Ok(())
    }

    fn scan(&self, table: &str, prefix: Option<&str>) -> Result<Vec<(String, Value)>, StoreError> {
        let tables = self.tables.lock();
        let Some(t) = tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(t.iter()
            .filter(|(k, _)| prefix.is_none_or(|p| k.starts_with(p)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
