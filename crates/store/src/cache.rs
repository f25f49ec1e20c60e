// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TTL-wrapped cache partitions over a datastore.
//!
//! The client keeps its argument, environment, query, and job-outcome
//! caches here. Expiry is lazy: entries carry an absolute deadline and
//! are dropped on the read that first finds them stale.

use crate::{Datastore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Addressable cache partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTag {
    Jobs,
    Parents,
    Args,
    Envs,
    Query,
    All,
}

dird_core::simple_display! {
    CacheTag {
        Jobs => "jobs",
        Parents => "parents",
        Args => "args",
        Envs => "envs",
        Query => "query",
        All => "all",
    }
}

impl FromStr for CacheTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jobs" => Ok(CacheTag::Jobs),
            "parents" => Ok(CacheTag::Parents),
            "args" => Ok(CacheTag::Args),
            "envs" => Ok(CacheTag::Envs),
            "query" => Ok(CacheTag::Query),
            "all" => Ok(CacheTag::All),
            other => Err(format!("unknown cache tag: {other}")),
        }
    }
}

const TAGGED: &[CacheTag] =
    &[CacheTag::Jobs, CacheTag::Parents, CacheTag::Args, CacheTag::Envs, CacheTag::Query];

#[derive(Serialize, Deserialize)]
struct Entry {
    value: Value,
    expires_at_ms: u64,
}

/// Keyed cache partitions with a shared default TTL.
#[derive(Clone)]
pub struct CacheStore {
    store: Arc<dyn Datastore>,
    default_ttl_secs: u64,
}

impl CacheStore {
    pub fn new(store: Arc<dyn Datastore>, default_ttl_secs: u64) -> Self {
        Self { store, default_ttl_secs }
    }

    pub fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    /// Store a value under the default TTL.
    pub fn put(&self, tag: CacheTag, key: &str, value: Value, now_ms: u64) -> Result<(), StoreError> {
        self.put_with_ttl(tag, key, value, self.default_ttl_secs, now_ms)
    }

    pub fn put_with_ttl(
        &self,
        tag: CacheTag,
        key: &str,
        value: Value,
        ttl_secs: u64,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        let entry = Entry { value, expires_at_ms: now_ms + ttl_secs * 1_000 };
        self.store.put(&tag.to_string(), key, serde_json::to_value(&entry)?)
    }

    /// Read a value, dropping it if its TTL has lapsed.
    pub fn get(&self, tag: CacheTag, key: &str, now_ms: u64) -> Result<Option<Value>, StoreError> {
        let table = tag.to_string();
        let Some(raw) = self.store.get(&table, key)? else {
            return Ok(None);
        };
        let entry: Entry = match serde_json::from_value(raw) {
            Ok(entry) => entry,
            Err(_) => {
                // Unreadable entries are treated as absent and cleared
                self.store.delete(&table, key)?;
                return Ok(None);
            }
        };
        if now_ms >= entry.expires_at_ms {
            self.store.delete(&table, key)?;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    /// Remove every entry under a tag. `All` clears every partition.
    /// Returns the number of entries removed.
    pub fn evict(&self, tag: CacheTag) -> Result<usize, StoreError> {
        let mut removed = 0;
        for t in TAGGED {
            if tag != CacheTag::All && *t != tag {
                continue;
            }
            let table = t.to_string();
            for (key, _) in self.store.scan(&table, None)? {
                self.store.delete(&table, &key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Accumulate into the query cache: `query[key][identity] = value`.
    pub fn accumulate_query(
        &self,
        key: &str,
        identity: &str,
        value: Value,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        let mut map = match self.get(CacheTag::Query, key, now_ms)? {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        map.insert(identity.to_string(), value);
        self.put(CacheTag::Query, key, Value::Object(map), now_ms)
    }

    /// Flatten a partition's live scalar entries to strings, for template
    /// rendering.
    pub fn snapshot_strings(
        &self,
        tag: CacheTag,
        now_ms: u64,
    ) -> Result<HashMap<String, String>, StoreError> {
        let table = tag.to_string();
        let mut out = HashMap::new();
        for (key, _) in self.store.scan(&table, None)? {
            if let Some(value) = self.get(tag, &key, now_ms)? {
                out.insert(key, scalar_to_string(&value));
            }
        }
        Ok(out)
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
