/*!
 * Test the preview server in bin/serve.rs as a set of integration tests.
 * Each test spins up a running ps2stats-serve over a small site in a temporary directory and issues
 * http requests to it.  The file resolution logic itself is covered by the unit tests in server.rs.
 */
use std::fs;
use std::path::Path;

use tokio::process::{Child, Command};
use tokio::time::{sleep, Duration};

extern crate ps2stats;
extern crate log;
extern crate pretty_env_logger;

use tempfile::TempDir;

const SERVER_ADDRESS: &str = "127.0.0.1";
const SERVER_PATH: &str = env!("CARGO_BIN_EXE_ps2stats-serve");

/**
 * Spawns a server over `directory` and returns a handle to it.
 * The handle must be kept alive for the duration of the test, otherwise kill_on_drop stops the server.
 */
async fn spawn_test_server(port: u16, directory: &Path) -> Child {
    let handle = Command::new(SERVER_PATH)
        .arg("-p")
        .arg(port.to_string())
        .arg("-d")
        .arg(directory)
        .kill_on_drop(true)
        .spawn()
        .expect("Server failed to start.");

    let _ = pretty_env_logger::try_init();

    sleep(Duration::from_millis(500)).await;

    handle
}

fn test_site() -> TempDir {
    let site = tempfile::tempdir().unwrap();
    fs::create_dir_all(site.path().join("stats/infantry-weapons")).unwrap();
    fs::create_dir_all(site.path().join("simulations/infantry-weapons")).unwrap();
    fs::write(site.path().join("index.html"), "<html><body>PS2 stats</body></html>").unwrap();
    fs::write(
        site.path().join("stats/infantry-weapons/gauss-rifle-80.html"),
        "<html><body>Gauss Rifle</body></html>",
    )
    .unwrap();
    fs::write(
        site.path().join("simulations/infantry-weapons/gauss-rifle-80-fg100-magdump.json"),
        r#"{"hconcat":[]}"#,
    )
    .unwrap();
    site
}

fn path(port: u16, request_path: &str) -> String {
    format!("http://{SERVER_ADDRESS}:{port}/{request_path}")
}

#[tokio::test]
async fn test_get_index() {
    const PORT: u16 = 3110;
    let site = test_site();
    let _server = spawn_test_server(PORT, site.path()).await;

    let response = reqwest::get(path(PORT, "")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );
    assert_eq!(
        response.text().await.unwrap(),
        "<html><body>PS2 stats</body></html>"
    );
}

#[tokio::test]
async fn test_get_stats_page_and_chart() {
    const PORT: u16 = 3111;
    let site = test_site();
    let _server = spawn_test_server(PORT, site.path()).await;

    let body = reqwest::get(path(PORT, "stats/infantry-weapons/gauss-rifle-80.html"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Gauss Rifle"));

    let chart: serde_json::Value = reqwest::get(path(
        PORT,
        "simulations/infantry-weapons/gauss-rifle-80-fg100-magdump.json",
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(chart, serde_json::json!({"hconcat": []}));
}

#[tokio::test]
async fn test_unknown_path() {
    const PORT: u16 = 3112;
    let site = test_site();
    let _server = spawn_test_server(PORT, site.path()).await;

    let response = reqwest::get(path(PORT, "unknown.html")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_not_allowed() {
    const PORT: u16 = 3113;
    let site = test_site();
    let _server = spawn_test_server(PORT, site.path()).await;

    let response = reqwest::Client::new()
        .post(path(PORT, ""))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
}
