//! Integration tests for the `pokedex` CLI binary.
//!
//! Argument parsing, help output, completions, and error handling run
//! without a backend; catalog commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `pokedex` binary with env isolation.
///
/// Clears all `POKEDEX_*` env vars, points the config file at a
/// nonexistent path, and turns off the remembered session so tests
/// never touch the user's configuration or keyring.
fn pokedex_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("pokedex");
    cmd.env("HOME", "/tmp/pokedex-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/pokedex-cli-test-nonexistent")
        .env("POKEDEX_CONFIG", "/tmp/pokedex-cli-test-nonexistent/config.toml")
        .env("POKEDEX_DEFAULTS__REMEMBER_SESSION", "false")
        .env_remove("POKEDEX_URL")
        .env_remove("POKEDEX_ANON_KEY")
        .env_remove("POKEDEX_OUTPUT")
        .env_remove("POKEDEX_TIMEOUT")
        .env_remove("POKEDEX_PASSWORD")
        .env_remove("POKEDEX_BACKEND__URL")
        .env_remove("POKEDEX_BACKEND__ANON_KEY");
    cmd
}

/// Same, with a backend configured through the environment.
fn pokedex_with_backend(url: &str) -> assert_cmd::Command {
    let mut cmd = pokedex_cmd();
    cmd.env("POKEDEX_URL", url).env("POKEDEX_ANON_KEY", "anon-key");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Nothing listens here; commands that stay offline never notice.
const UNREACHABLE: &str = "http://127.0.0.1:9";

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = pokedex_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    pokedex_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("catalog")
            .and(predicate::str::contains("list"))
            .and(predicate::str::contains("favorites"))
            .and(predicate::str::contains("login")),
    );
}

#[test]
fn test_version_flag() {
    pokedex_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pokedex"));
}

#[test]
fn test_unknown_subcommand() {
    pokedex_cmd()
        .arg("evolve")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_zsh() {
    pokedex_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pokedex"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_env() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("pokedex.toml");
    pokedex_cmd()
        .env("POKEDEX_CONFIG", &file)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pokedex.toml"));
}

#[test]
fn test_config_show_masks_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(
        &file,
        "[backend]\nurl = \"https://abc.supabase.co\"\nanon_key = \"very-secret\"\n\n[catalog]\nitems_per_page = 12\n",
    )
    .unwrap();

    pokedex_cmd()
        .env("POKEDEX_CONFIG", &file)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("anon_key = \"****\"")
                .and(predicate::str::contains("items_per_page = 12"))
                .and(predicate::str::contains("very-secret").not()),
        );
}

// ── Errors before any request ───────────────────────────────────────

#[test]
fn test_list_without_backend_is_not_configured() {
    let output = pokedex_cmd().arg("list").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("not configured"), "{text}");
    assert!(text.contains("pokedex config init"), "{text}");
}

#[test]
fn test_show_rejects_non_numeric_id() {
    let output = pokedex_with_backend(UNREACHABLE)
        .args(["show", "abc"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Invalid Pokemon ID format"));
}

#[test]
fn test_favorites_requires_sign_in() {
    let output = pokedex_with_backend(UNREACHABLE)
        .args(["favorites", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("pokedex login"));
}

#[test]
fn test_invalid_page_size_in_config() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(&file, "[catalog]\nitems_per_page = 0\n").unwrap();

    let output = pokedex_with_backend(UNREACHABLE)
        .env("POKEDEX_CONFIG", &file)
        .arg("list")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("items_per_page"));
}

// ── Route guard ─────────────────────────────────────────────────────

#[test]
fn test_visit_public_route_proceeds() {
    pokedex_with_backend(UNREACHABLE)
        .args(["visit", "/pokemon/25", "-o", "plain"])
        .assert()
        .success()
        .stdout("proceed\n");
}

#[test]
fn test_visit_protected_route_redirects_when_signed_out() {
    pokedex_with_backend(UNREACHABLE)
        .args(["visit", "/favorites", "-o", "plain"])
        .assert()
        .success()
        .stdout("/login?redirect=%2Ffavorites\n");
}

// ── Catalog against a mock backend ──────────────────────────────────

async fn catalog_server(total: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/pokemon"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("content-range", format!("*/{total}")),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_json_reports_page_and_totals() {
    let server = catalog_server(2).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/pokemon"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "bulbasaur", "japanese_name": "フシギダネ", "sprite_url": null },
            { "id": 2, "name": "ivysaur", "japanese_name": "フシギソウ", "sprite_url": null }
        ])))
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        pokedex_with_backend(&uri)
            .args(["list", "-o", "json-compact"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["page"], 1);
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["items"][1]["name"], "ivysaur");
    assert_eq!(body["items"][0]["localized_name"], "フシギダネ");
    assert_eq!(body["items"][0]["favorite"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_show_missing_entry_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/pokemon"))
        .and(query_param("id", "eq.9999"))
        .respond_with(ResponseTemplate::new(406).set_body_json(json!({
            "code": "PGRST116",
            "message": "JSON object requested, multiple (or no) rows returned",
            "details": "The result contains 0 rows",
            "hint": null
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        pokedex_with_backend(&uri).args(["show", "9999"]).output().unwrap()
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("not found"));
}
