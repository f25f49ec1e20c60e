// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster harness: one coordinator plus named workers, all in-process.

use dird_client::{Worker, WorkerConfig};
use dird_core::SystemClock;
use dird_driver::DriverConfig;
use dird_server::{Server, ServerConfig};
use dird_wire::{JobDetail, JobSummary, Request, Response};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixStream;

static HUB_COUNTER: AtomicUsize = AtomicUsize::new(0);

const IPC_TIMEOUT: Duration = Duration::from_secs(5);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);

pub struct Cluster {
    pub socket: PathBuf,
    _server: Server,
    _workers: Vec<Worker>,
    _tmp: tempfile::TempDir,
}

impl Cluster {
    /// Start a coordinator and one worker per identity, then wait for
    /// every worker's first heartbeat to land.
    pub async fn start(identities: &[&str]) -> Cluster {
        let hub = format!("spec-hub-{}", HUB_COUNTER.fetch_add(1, Ordering::SeqCst));
        let tmp = tempfile::tempdir().expect("tempdir");
        let socket = tmp.path().join("directord.sock");

        let server_config = ServerConfig {
            socket_path: socket.clone(),
            datastore: "memory".to_string(),
            driver: DriverConfig {
                driver: "inproc".to_string(),
                bind_address: hub.clone(),
                server_address: hub.clone(),
                ..DriverConfig::default()
            },
            component_path: None,
        };
        let server = Server::start(server_config, Arc::new(SystemClock))
            .await
            .expect("server start");

        let mut workers = Vec::new();
        for identity in identities {
            let worker_config = WorkerConfig {
                driver: DriverConfig {
                    driver: "inproc".to_string(),
                    bind_address: hub.clone(),
                    server_address: hub.clone(),
                    identity: (*identity).into(),
                    ..DriverConfig::default()
                },
                cache_store: "memory".to_string(),
                ..WorkerConfig::default()
            };
            workers
                .push(Worker::start(worker_config, Arc::new(SystemClock)).await.expect("worker"));
        }

        let cluster = Cluster { socket, _server: server, _workers: workers, _tmp: tmp };
        cluster.await_alive(identities.len()).await;
        cluster
    }

    async fn await_alive(&self, count: usize) {
        for _ in 0..200 {
            if let Response::Nodes { nodes } = self.request(Request::ListNodes).await {
                if nodes.iter().filter(|n| n.alive).count() >= count {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("workers never became alive");
    }

    /// One framed request over the control socket.
    pub async fn request(&self, request: Request) -> Response {
        let mut stream = UnixStream::connect(&self.socket).await.expect("connect");
        let (mut reader, mut writer) = stream.split();
        dird_wire::write_request(&mut writer, &request, IPC_TIMEOUT).await.expect("write");
        dird_wire::read_response(&mut reader, IPC_TIMEOUT).await.expect("read")
    }

    /// Submit orchestration YAML; returns the parent ids.
    pub async fn submit_yaml(&self, yaml: &str) -> Vec<String> {
        self.submit_yaml_with(yaml, Vec::new(), false).await
    }

    pub async fn submit_yaml_with(
        &self,
        yaml: &str,
        targets: Vec<String>,
        ignore_cache: bool,
    ) -> Vec<String> {
        let docs = dird_dsl::load_documents(yaml).expect("valid orchestration yaml");
        let response = self
            .request(Request::SubmitOrchestrations {
                docs,
                targets,
                restrict: Vec::new(),
                ignore_cache,
                overrides: Default::default(),
            })
            .await;
        match response {
            Response::Accepted { parent_ids } => parent_ids,
            other => panic!("submission refused: {other:?}"),
        }
    }

    /// Poll until every job under the given parents settles.
    pub async fn settle(&self, parent_ids: &[String]) -> Vec<JobSummary> {
        let deadline = std::time::Instant::now() + SETTLE_TIMEOUT;
        loop {
            let Response::Jobs { jobs } = self.request(Request::ListJobs).await else {
                panic!("expected Jobs response");
            };
            let mine: Vec<JobSummary> =
                jobs.into_iter().filter(|j| parent_ids.contains(&j.parent_id)).collect();
            if !mine.is_empty() && mine.iter().all(|j| j.state.is_terminal()) {
                return mine;
            }
            assert!(std::time::Instant::now() < deadline, "jobs never settled: {mine:?}");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    pub async fn job_detail(&self, id: &str) -> JobDetail {
        match self.request(Request::JobInfo { id: id.to_string() }).await {
            Response::Job { job: Some(detail) } => *detail,
            other => panic!("job {id} not found: {other:?}"),
        }
    }
}
