// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dird manage`: inspection and maintenance over the control socket.

use crate::cli::ManageArgs;
use crate::client_conn;
use crate::config::Settings;
use crate::exit_error::ExitError;
use crate::output;
use dird_wire::{Request, Response};
use std::time::{SystemTime, UNIX_EPOCH};

pub async fn run(settings: &Settings, args: ManageArgs) -> Result<(), ExitError> {
    let request = to_request(args)?;
    let response = client_conn::request(&settings.socket_path, &request).await?;
    render(response)
}

fn to_request(args: ManageArgs) -> Result<Request, ExitError> {
    if args.list_nodes {
        return Ok(Request::ListNodes);
    }
    if args.list_jobs {
        return Ok(Request::ListJobs);
    }
    if let Some(id) = args.job_info {
        return Ok(Request::JobInfo { id });
    }
    if let Some(path) = args.export_jobs {
        return Ok(Request::ExportJobs { path });
    }
    if let Some(id) = args.analyze_job {
        return Ok(Request::AnalyzeJob { id });
    }
    if let Some(id) = args.analyze_parent {
        return Ok(Request::AnalyzeParent { id });
    }
    if args.purge_jobs {
        return Ok(Request::PurgeJobs);
    }
    if args.purge_nodes {
        return Ok(Request::PurgeNodes);
    }
    if args.generate_keys {
        return Ok(Request::GenerateKeys);
    }
    Err(ExitError::invalid("no manage action given"))
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

fn render(response: Response) -> Result<(), ExitError> {
    match response {
        Response::Nodes { nodes } => output::print_nodes(&nodes, now_ms()),
        Response::Jobs { jobs } => output::print_jobs(&jobs, now_ms()),
        Response::Job { job: Some(detail) } => output::print_job_detail(&detail),
        Response::Job { job: None } => return Err(ExitError::failure("job not found")),
        Response::Purged { count } => println!("purged {count} record(s)"),
        Response::Exported { path, count } => {
            println!("exported {count} job(s) to {}", path.display());
        }
        Response::Analysis { report } => output::print_job_analysis(&report),
        Response::ParentAnalysis { report } => output::print_parent_analysis(&report),
        Response::Keys { message } => println!("{message}"),
        other => return Err(ExitError::failure(format!("unexpected response: {other:?}"))),
    }
    Ok(())
}
