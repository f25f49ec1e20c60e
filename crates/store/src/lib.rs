// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dird-store: pluggable persistence for coordinator tables and client caches.
//!
//! Backends provide atomic single-key get/put/delete plus prefix scans.
//! Nothing stronger: coordinator code assumes last-writer-wins on
//! concurrent puts.

mod cache;
mod file;
mod memory;

pub use cache::{CacheStore, CacheTag};
pub use file::FileStore;
pub use memory::MemoryStore;

use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors from datastore operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("datastore is locked by another process: {0}")]
    Locked(PathBuf),

    #[error("invalid datastore URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported datastore scheme: {0}")]
    UnsupportedScheme(String),
}

/// Minimal key-value contract every backend satisfies.
///
/// Tables partition the keyspace; keys are opaque strings; values are JSON.
pub trait Datastore: Send + Sync {
    fn get(&self, table: &str, key: &str) -> Result<Option<Value>, StoreError>;
    fn put(&self, table: &str, key: &str, value: Value) -> Result<(), StoreError>;
    fn delete(&self, table: &str, key: &str) -> Result<(), StoreError>;
    /// Keys and values whose key starts with `prefix` (all keys when None).
    fn scan(&self, table: &str, prefix: Option<&str>) -> Result<Vec<(String, Value)>, StoreError>;
}

/// Open a datastore from an RFC-1738-style URL.
///
/// Supported: `memory` and `file:///path`. Other schemes are reserved
/// for out-of-tree backends and rejected here.
pub fn open(spec: &str) -> Result<Arc<dyn Datastore>, StoreError> {
    if spec == "memory" {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let parsed =
        url::Url::parse(spec).map_err(|e| StoreError::InvalidUrl(format!("{spec}: {e}")))?;
    match parsed.scheme() {
        "file" => {
            let path = parsed
                .to_file_path()
                .map_err(|()| StoreError::InvalidUrl(format!("{spec}: not a local path")))?;
            Ok(Arc::new(FileStore::open(&path)?))
        }
        other => Err(StoreError::UnsupportedScheme(other.to_string())),
    }
}
