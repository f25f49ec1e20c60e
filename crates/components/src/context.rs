// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution context handed to components on the client.

use crate::ComponentError;
use dird_core::{DynClock, Identity};
use dird_store::CacheStore;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Source of file bytes for ADD/COPY.
///
/// The worker wires this to the driver's transfer channel; single-host
/// runs and tests read the local filesystem instead.
#[async_trait::async_trait]
pub trait FileSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, ComponentError>;
}

/// FileSource over the client's own filesystem.
pub struct LocalFileSource;

#[async_trait::async_trait]
impl FileSource for LocalFileSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, ComponentError> {
        Ok(tokio::fs::read(path).await?)
    }
}

/// What a component sees while executing: its node's identity, the TTL
/// caches, the working directory, and a cancellation token the executor
/// trips on timeout.
///
/// Clones share the caches and working directory; the cancellation
/// token is per-execution, re-armed by the executor for each job.
#[derive(Clone)]
pub struct ClientCtx {
    pub identity: Identity,
    pub caches: CacheStore,
    pub clock: Arc<dyn DynClock>,
    pub cancel: CancellationToken,
    pub files: Arc<dyn FileSource>,
    workdir: Arc<Mutex<Option<PathBuf>>>,
}

impl ClientCtx {
    pub fn new(
        identity: Identity,
        caches: CacheStore,
        clock: Arc<dyn DynClock>,
        files: Arc<dyn FileSource>,
    ) -> Self {
        Self {
            identity,
            caches,
            clock,
            cancel: CancellationToken::new(),
            files,
            workdir: Arc::new(Mutex::new(None)),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    /// Working directory set by the last WORKDIR job, if any.
    pub fn workdir(&self) -> Option<PathBuf> {
        self.workdir.lock().clone()
    }

    pub fn set_workdir(&self, path: PathBuf) {
        *self.workdir.lock() = Some(path);
    }

    /// Replace the cancellation token ahead of a new execution.
    pub fn arm_cancel(&mut self) -> CancellationToken {
        self.cancel = CancellationToken::new();
        self.cancel.clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ClientCtx {
    /// Context over in-memory caches, for component tests.
    pub fn for_tests(identity: &str) -> Self {
        use dird_store::MemoryStore;
        Self::new(
            Identity::from(identity),
            CacheStore::new(Arc::new(MemoryStore::new()), dird_core::consts::DEFAULT_CACHE_TTL_SECS),
            Arc::new(dird_core::FakeClock::new()),
            Arc::new(LocalFileSource),
        )
    }
}
