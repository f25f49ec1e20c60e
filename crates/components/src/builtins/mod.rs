// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in components.

mod cache_args;
mod cacheevict;
mod cachefile;
mod query;
pub(crate) mod run;
mod transfer;
mod waiters;
mod workdir;

use crate::Registry;
use std::sync::Arc;

/// Register every built-in verb.
pub fn register(registry: &mut Registry) {
    registry.register("RUN", Arc::new(run::Run));
    registry.register("ARG", Arc::new(cache_args::Arg));
    registry.register("ENV", Arc::new(cache_args::Env));
    registry.register("ADD", Arc::new(transfer::Transfer));
    registry.register("COPY", Arc::new(transfer::Transfer));
    registry.register("WORKDIR", Arc::new(workdir::Workdir));
    registry.register("CACHEFILE", Arc::new(cachefile::CacheFile));
    registry.register("CACHEEVICT", Arc::new(cacheevict::CacheEvict));
    registry.register("QUERY", Arc::new(query::Query));
    registry.register("QUERYSTORE", Arc::new(query::QueryStore));
    registry.register("QUERY_WAIT", Arc::new(waiters::QueryWait));
    registry.register("JOB_WAIT", Arc::new(waiters::JobWait));
}
