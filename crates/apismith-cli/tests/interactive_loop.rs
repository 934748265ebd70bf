#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::{MODEL_PATH, apismith_cmd, model_answer, mount_codegen, mount_docs, mount_extraction};
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn quit_ends_loop_immediately() -> Result<()> {
    let config_dir = tempdir()?;

    apismith_cmd(config_dir.path(), None)
        .write_stdin("QUIT\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Developer Tools query"))
        .stderr(predicate::str::contains("Resource").not());
    Ok(())
}

#[test]
fn end_of_input_ends_loop() -> Result<()> {
    let config_dir = tempdir()?;

    apismith_cmd(config_dir.path(), None)
        .arg("interactive")
        .write_stdin("")
        .assert()
        .success();
    Ok(())
}

#[tokio::test]
async fn loop_runs_each_query_and_survives_failures() -> Result<()> {
    let server = MockServer::start().await;
    let config_dir = tempdir()?;
    let out_dir = tempdir()?;

    mount_docs(&server, "<h1>Status API</h1><p>GET /status</p>").await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_extraction(
        &server,
        &json!({"title": "Status API", "endpoints": [{"http_method": "GET", "path": "/status"}]}),
    )
    .await;
    mount_codegen(&server, "/status", "import requests\n").await;

    // First run fails on the page fetch, second succeeds, then exit
    let stdin = format!(
        "check status\n{base}/gone\ncheck status\n{base}/docs\nexit\n",
        base = server.uri()
    );

    apismith_cmd(config_dir.path(), Some(&server.uri()))
        .arg("--output-dir")
        .arg(out_dir.path())
        .write_stdin(stdin)
        .assert()
        .success()
        .stderr(predicate::str::contains("error:"))
        .stdout(predicate::str::contains("Status API"));

    assert_eq!(
        std::fs::read_to_string(out_dir.path().join("Status API.py"))?,
        "import requests\n"
    );
    Ok(())
}

#[tokio::test]
async fn empty_resource_splits_link_out_of_goal() -> Result<()> {
    let server = MockServer::start().await;
    let config_dir = tempdir()?;
    let out_dir = tempdir()?;
    let docs_url = format!("{}/docs", server.uri());

    mount_docs(&server, "<h1>Status API</h1>").await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(body_string_contains("Request: "))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_answer(
            &json!({"url": docs_url, "task": "check status"}).to_string(),
        )))
        .expect(1)
        .mount(&server)
        .await;
    mount_extraction(&server, &json!({"title": "Status API", "endpoints": []})).await;
    mount_codegen(&server, "Status API", "import requests\n").await;

    apismith_cmd(config_dir.path(), Some(&server.uri()))
        .arg("--output-dir")
        .arg(out_dir.path())
        .write_stdin(format!("use {docs_url} to check status\n\nquit\n"))
        .assert()
        .success();

    assert!(out_dir.path().join("Status API.py").exists());
    Ok(())
}
