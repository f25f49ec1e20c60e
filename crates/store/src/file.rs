// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-writer file backend: one directory per table, one JSON file
//! per key, atomic write via temp file + rename.

use crate::{Datastore, StoreError};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Envelope stored on disk. The original key travels inside the file so
/// prefix scans don't depend on filename encoding.
#[derive(Serialize, Deserialize)]
struct Envelope {
    key: String,
    value: Value,
}

/// File-backed datastore rooted at a directory.
///
/// Holds an advisory lock on `<root>/.lock` for its lifetime; a second
/// opener fails with [`StoreError::Locked`].
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    _lock: fs::File,
}

impl FileStore {
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(root)?;
        let lock_path = root.join(".lock");
        let lock = fs::OpenOptions::new().create(true).truncate(false).write(true).open(&lock_path)?;
        lock.try_lock_exclusive().map_err(|_| StoreError::Locked(lock_path))?;
        Ok(Self { root: root.to_path_buf(), _lock: lock })
    }

    fn table_dir(&self, table: &str) -> PathBuf {
        self.root.join(sanitize(table))
    }

    fn key_path(&self, table: &str, key: &str) -> PathBuf {
        self.table_dir(table).join(format!("{}.json", sanitize(key)))
    }
}

/// Encode a key as a safe filename: alphanumerics, `.`, `_`, and `-`
/// pass through, everything else becomes `%xx`.
fn sanitize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                out.push(byte as char);
            }
            other => {
                use std::fmt::Write;
                let _ = write!(out, "%{:02x}", other);
            }
        }
    }
    out
}

impl Datastore for FileStore {
    fn get(&self, table: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.key_path(table, key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let envelope: Envelope = serde_json::from_slice(&bytes)?;
        Ok(Some(envelope.value))
    }

    fn put(&self, table: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let dir = self.table_dir(table);
        fs::create_dir_all(&dir)?;
        let envelope = Envelope { key: key.to_string(), value };
        let bytes = serde_json::to_vec_pretty(&envelope)?;

        let path = self.key_path(table, key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, table: &str, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(table, key);
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn scan(&self, table: &str, prefix: Option<&str>) -> Result<Vec<(String, Value)>, StoreError> {
        let dir = self.table_dir(table);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                // A concurrent delete between read_dir and read is fine
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let envelope: Envelope = match serde_json::from_slice(&bytes) {
                Ok(env) => env,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if prefix.is_none_or(|p| envelope.key.starts_with(p)) {
                out.push((envelope.key, envelope.value));
            }
        }
        out.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(out)
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
