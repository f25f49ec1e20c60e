// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text rendering for CLI responses.

use dird_core::{JobAnalysis, NodeTiming, ParentAnalysis};
use dird_wire::{JobDetail, JobSummary, NodeEntry};

/// Format elapsed seconds like "5s", "2m", "1h", "3d".
pub fn format_elapsed(secs: u64) -> String {
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3_599 => format!("{}m", secs / 60),
        3_600..=86_399 => format!("{}h", secs / 3_600),
        _ => format!("{}d", secs / 86_400),
    }
}

/// Relative age of an epoch-ms timestamp.
pub fn format_time_ago(epoch_ms: u64, now_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    format_elapsed(now_ms.saturating_sub(epoch_ms) / 1_000)
}

pub fn print_nodes(nodes: &[NodeEntry], now_ms: u64) {
    if nodes.is_empty() {
        println!("No known nodes");
        return;
    }
    println!("{:<24} {:<8} {:<12} {:<10} COMPONENTS", "IDENTITY", "ALIVE", "VERSION", "SEEN");
    for node in nodes {
        println!(
            "{:<24} {:<8} {:<12} {:<10} {}",
            node.identity,
            if node.alive { "yes" } else { "no" },
            node.version,
            format_time_ago(node.last_seen_ms, now_ms),
            node.components.len(),
        );
    }
}

pub fn print_jobs(jobs: &[JobSummary], now_ms: u64) {
    if jobs.is_empty() {
        println!("No jobs");
        return;
    }
    println!(
        "{:<38} {:<12} {:<10} {:<8} {:<6} {:<6} AGE",
        "JOB", "VERB", "STATE", "NODES", "OK", "FAIL"
    );
    for job in jobs {
        println!(
            "{:<38} {:<12} {:<10} {:<8} {:<6} {:<6} {}",
            job.job_id,
            job.verb,
            job.state,
            job.node_count,
            job.success_count,
            job.failure_count,
            format_time_ago(job.created_at_ms, now_ms),
        );
    }
}

pub fn print_job_detail(job: &JobDetail) {
    println!("job:        {}", job.job_id);
    println!("parent:     {}", job.parent_id);
    println!("verb:       {}", job.verb);
    println!("sha:        {}", job.job_sha);
    println!("state:      {}", job.state);
    if let Some(reason) = &job.failure_reason {
        println!("reason:     {reason}");
    }
    match serde_json::to_string_pretty(&job.definition) {
        Ok(pretty) => println!("definition: {pretty}"),
        Err(_) => println!("definition: <unprintable>"),
    }
    for (identity, result) in &job.per_node {
        println!("--- {identity} ({}) ---", result.state);
        println!(
            "    execution {:.3}s, roundtrip {:.3}s",
            result.execution_seconds, result.roundtrip_seconds
        );
        if !result.stdout.is_empty() {
            println!("    stdout: {}", result.stdout.trim_end());
        }
        if !result.stderr.is_empty() {
            println!("    stderr: {}", result.stderr.trim_end());
        }
        if !result.info.is_empty() {
            println!("    info:   {}", result.info);
        }
    }
}

fn timing(slot: &Option<NodeTiming>) -> String {
    match slot {
        Some(t) => format!("{} ({:.3}s)", t.identity, t.seconds),
        None => "-".to_string(),
    }
}

pub fn print_job_analysis(report: &JobAnalysis) {
    println!("job:                {}", report.job_id);
    println!("verb:               {}", report.verb);
    println!("nodes:              {}", report.total_node_count);
    println!("successes:          {}", report.total_successes);
    println!("failures:           {}", report.total_failures);
    println!("combined execution: {:.3}s", report.combined_execution_seconds);
    println!("avg execution:      {:.3}s", report.avg_execution_seconds);
    println!("fastest execution:  {}", timing(&report.fastest_execution));
    println!("slowest execution:  {}", timing(&report.slowest_execution));
    println!("fastest roundtrip:  {}", timing(&report.fastest_roundtrip));
    println!("slowest roundtrip:  {}", timing(&report.slowest_roundtrip));
}

pub fn print_parent_analysis(report: &ParentAnalysis) {
    println!("parent:             {}", report.parent_id);
    println!("jobs:               {}", report.total_jobs);
    println!("nodes:              {}", report.total_node_count);
    println!("successes:          {}", report.total_successes);
    println!("failures:           {}", report.total_failures);
    println!("actual runtime:     {:.3}s", report.actual_runtime_seconds);
    println!("combined execution: {:.3}s", report.combined_execution_seconds);
    println!("avg execution:      {:.3}s", report.avg_execution_seconds);
    println!("fastest execution:  {}", timing(&report.fastest_execution));
    println!("slowest execution:  {}", timing(&report.slowest_execution));
    println!("fastest roundtrip:  {}", timing(&report.fastest_roundtrip));
    println!("slowest roundtrip:  {}", timing(&report.slowest_roundtrip));
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
