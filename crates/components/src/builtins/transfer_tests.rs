// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn job_with(vars: Value) -> Job {
    let vars = match vars {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    let definition = Transfer.server(&[], &vars).unwrap();
    Job::new("COPY", definition, None, false, 0)
}

#[tokio::test]
async fn copies_bytes_to_the_destination() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    let dest = dir.path().join("sub/dest.txt");
    std::fs::write(&src, b"payload").unwrap();

    let ctx = ClientCtx::for_tests("n1");
    let job = job_with(json!({
        "source": src.to_string_lossy(),
        "dest": dest.to_string_lossy(),
    }));
    let outcome = Transfer.client(&ctx, &job).await.unwrap();

    assert!(outcome.success);
    assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
}

#[tokio::test]
async fn blueprint_renders_file_bytes_from_the_arg_cache() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("config.tmpl");
    let dest = dir.path().join("config");
    std::fs::write(&src, "listen ${port}\n").unwrap();

    let ctx = ClientCtx::for_tests("n1");
    ctx.caches.put(CacheTag::Args, "port", json!(9000), 0).unwrap();

    let job = job_with(json!({
        "source": src.to_string_lossy(),
        "dest": dest.to_string_lossy(),
        "blueprint": true,
    }));
    Transfer.client(&ctx, &job).await.unwrap();

    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "listen 9000\n");
}

#[tokio::test]
async fn mode_is_applied_octal() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("script.sh");
    let dest = dir.path().join("run.sh");
    std::fs::write(&src, "#!/bin/sh\n").unwrap();

    let ctx = ClientCtx::for_tests("n1");
    let job = job_with(json!({
        "source": src.to_string_lossy(),
        "dest": dest.to_string_lossy(),
        "mode": "755",
    }));
    Transfer.client(&ctx, &job).await.unwrap();

    let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[tokio::test]
async fn relative_dest_lands_in_the_workdir() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src.txt");
    std::fs::write(&src, b"x").unwrap();

    let ctx = ClientCtx::for_tests("n1");
    ctx.set_workdir(dir.path().to_path_buf());

    let job = job_with(json!({
        "source": src.to_string_lossy(),
        "dest": "relative.txt",
    }));
    Transfer.client(&ctx, &job).await.unwrap();

    assert!(dir.path().join("relative.txt").exists());
}

#[test]
fn server_rejects_bad_modes() {
    let vars = match json!({"source": "a", "dest": "b", "mode": "9z9"}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    assert!(Transfer.server(&[], &vars).is_err());
}
