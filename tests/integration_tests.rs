use std::fs;

use assert_cmd::Command;
use mockito::{Matcher, Server, ServerGuard};
use predicates::prelude::*;
use tempfile::TempDir;

/// Variables the config loader reads; cleared so the host environment can't leak in.
const CONFIG_ENV_VARS: &[&str] = &[
    "SONARQUBE_URL",
    "SONARQUBE_TOKEN",
    "SONARQUBE_PROJECT_KEY",
    "SONARQUBE_ORGANIZATION",
    "EXPORT_OUTPUT_PATH",
    "EXPORT_FILENAME",
    "EXPORT_EXCLUDE_STATUSES",
    "EXPORT_INCLUDE_RESOLVED",
    "EXPORT_MAX_ISSUES",
    "EXPORT_TEMPLATE",
    "LOG_LEVEL",
    "LOG_FILE",
    "RUST_LOG",
];

const ISSUES_BODY: &str = r#"{
    "paging": { "pageIndex": 1, "pageSize": 500, "total": 3 },
    "issues": [
        {
            "key": "AX1", "rule": "java:S2259", "severity": "BLOCKER",
            "component": "demo:src/main/java/Service.java", "line": 12, "status": "OPEN",
            "message": "A \"NullPointerException\" could be thrown", "creationDate": "2024-01-15T10:30:00+0000",
            "type": "BUG"
        },
        {
            "key": "AX2", "rule": "java:S2068", "severity": "CRITICAL",
            "component": "demo:src/main/java/Config.java", "status": "CONFIRMED",
            "message": "Remove this hard-coded password", "creationDate": "2024-01-16T08:00:00+0000",
            "type": "VULNERABILITY"
        },
        {
            "key": "AX3", "rule": "java:S1172", "severity": "MAJOR",
            "component": "demo:src/main/java/Service.java", "line": 40, "status": "OPEN",
            "message": "Remove this unused method parameter", "creationDate": "2024-01-17T09:15:00+0000",
            "type": "CODE_SMELL", "tags": ["unused"]
        }
    ]
}"#;

fn exporter(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sonarqube-exporter").expect("binary exists");
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("NO_COLOR", "1");
    for var in CONFIG_ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn connection_args(server: &ServerGuard) -> Vec<String> {
    vec![
        "--url".to_string(),
        server.url(),
        "--token".to_string(),
        "secret".to_string(),
        "--project".to_string(),
        "demo".to_string(),
    ]
}

fn mock_healthy_server(server: &mut ServerGuard) {
    server
        .mock("GET", "/api/system/status")
        .with_status(200)
        .with_body(r#"{"status":"UP"}"#)
        .create();
    server
        .mock("GET", "/api/projects/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"components":[{"key":"demo","name":"Demo Service"}]}"#)
        .create();
}

// ---------------------------------------------------------------------------
// CLI smoke tests
// ---------------------------------------------------------------------------

#[test]
fn test_help_output() {
    let dir = TempDir::new().unwrap();
    exporter(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Export SonarQube issues"))
        .stdout(predicate::str::contains("setup"));
}

#[test]
fn test_no_arguments_prints_help() {
    let dir = TempDir::new().unwrap();
    exporter(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn test_validate_reports_all_missing_fields() {
    let dir = TempDir::new().unwrap();
    exporter(&dir)
        .arg("validate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("SonarQube token is required"))
        .stderr(predicate::str::contains("SonarQube project key is required"))
        .stderr(predicate::str::contains("Configuration validation failed"));
}

#[test]
fn test_validate_against_server() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    mock_healthy_server(&mut server);

    exporter(&dir)
        .arg("validate")
        .args(connection_args(&server))
        .assert()
        .success()
        .stdout(predicate::str::contains("connection successful"))
        .stdout(predicate::str::contains("Project found: Demo Service (demo)"));
}

#[test]
fn test_validate_unreachable_server_fails() {
    let dir = TempDir::new().unwrap();
    exporter(&dir)
        .args([
            "validate",
            "--url",
            "http://127.0.0.1:1",
            "--token",
            "t",
            "--project",
            "demo",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("connection failed"));
}

#[test]
fn test_validate_reads_dotenv_file() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    mock_healthy_server(&mut server);
    fs::write(
        dir.path().join(".env"),
        format!(
            "SONARQUBE_URL={}\nSONARQUBE_TOKEN=secret\nSONARQUBE_PROJECT_KEY=demo\n",
            server.url()
        ),
    )
    .unwrap();

    exporter(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Project found: Demo Service (demo)"));
}

#[test]
fn test_env_max_issues_must_be_integer() {
    let dir = TempDir::new().unwrap();
    exporter(&dir)
        .env("EXPORT_MAX_ISSUES", "plenty")
        .arg("validate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("EXPORT_MAX_ISSUES"));
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

#[test]
fn test_export_writes_report() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    mock_healthy_server(&mut server);
    let search = server
        .mock("GET", "/api/issues/search")
        .match_header("authorization", "Basic c2VjcmV0Og==")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("componentKeys".into(), "demo".into()),
            Matcher::UrlEncoded("statuses".into(), "OPEN,CONFIRMED,REOPENED".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ISSUES_BODY)
        .create();

    exporter(&dir)
        .arg("export")
        .args(connection_args(&server))
        .assert()
        .success()
        .stdout(predicate::str::contains("Report generated successfully!"))
        .stdout(predicate::str::contains("Issues:          3"))
        .stdout(predicate::str::contains("Critical:        2"))
        .stdout(predicate::str::contains("Bugs:            1"))
        .stdout(predicate::str::contains("Vulnerabilities: 1"));

    search.assert();
    let report = dir.path().join("reports/sonarqube-issues-report.html");
    let html = fs::read_to_string(report).unwrap();
    assert!(html.contains("Demo Service"));
    assert!(html.contains("Service.java"));
    assert!(html.contains("A &quot;NullPointerException&quot; could be thrown"));
}

#[test]
fn test_export_enhanced_template_from_config_file() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    mock_healthy_server(&mut server);
    server
        .mock("GET", "/api/issues/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ISSUES_BODY)
        .create();

    let config = serde_json::json!({
        "sonarqube": { "url": server.url(), "token": "secret", "projectKey": "demo" },
        "export": { "template": "enhanced", "outputPath": "out", "filename": "dashboard.html" }
    });
    fs::write(
        dir.path().join(".sonarqube-exporter.json"),
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();

    exporter(&dir).arg("export").assert().success();

    let html = fs::read_to_string(dir.path().join("out/dashboard.html")).unwrap();
    assert!(html.contains("Download CSV"));
    assert!(html.contains("Remove this hard-coded password"));
}

#[test]
fn test_export_excluded_statuses_from_flag() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    mock_healthy_server(&mut server);
    server
        .mock("GET", "/api/issues/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ISSUES_BODY)
        .create();

    exporter(&dir)
        .arg("export")
        .args(connection_args(&server))
        .args(["--exclude-statuses", "CONFIRMED", "-f", "open.html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Issues:          2"));

    let html = fs::read_to_string(dir.path().join("reports/open.html")).unwrap();
    assert!(!html.contains("hard-coded password"));
}

#[test]
fn test_export_without_issues_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    mock_healthy_server(&mut server);
    server
        .mock("GET", "/api/issues/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"paging":{"pageIndex":1,"pageSize":500,"total":0},"issues":[]}"#)
        .create();

    exporter(&dir)
        .arg("export")
        .args(connection_args(&server))
        .assert()
        .success()
        .stderr(predicate::str::contains("No issues found"));

    assert!(!dir.path().join("reports").exists());
}

#[test]
fn test_export_unauthorized_fails() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    mock_healthy_server(&mut server);
    server
        .mock("GET", "/api/issues/search")
        .match_query(Matcher::Any)
        .with_status(401)
        .create();

    exporter(&dir)
        .arg("export")
        .args(connection_args(&server))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("401 Unauthorized"));
}

#[test]
fn test_export_unknown_template_fails() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::new();
    mock_healthy_server(&mut server);
    server
        .mock("GET", "/api/issues/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ISSUES_BODY)
        .create();

    exporter(&dir)
        .arg("export")
        .args(connection_args(&server))
        .args(["--template", "fancy"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Template not found: fancy"));
}

// ---------------------------------------------------------------------------
// setup
// ---------------------------------------------------------------------------

#[test]
fn test_setup_with_flags_writes_local_config() {
    let dir = TempDir::new().unwrap();
    exporter(&dir)
        .args([
            "setup",
            "--url",
            "https://sonarcloud.io",
            "--token",
            "abc",
            "--project",
            "demo",
            "--organization",
            "acme",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration saved"));

    let written = fs::read_to_string(dir.path().join(".sonarqube-exporter.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json["sonarqube"]["projectKey"], "demo");
    assert_eq!(json["sonarqube"]["organization"], "acme");
    assert_eq!(json["export"]["maxIssues"], 10000);
    assert_eq!(json["export"]["excludeStatuses"], serde_json::json!(["CLOSED"]));
}

#[test]
fn test_setup_global_writes_home_config() {
    let dir = TempDir::new().unwrap();
    let work = dir.path().join("work");
    fs::create_dir_all(&work).unwrap();

    exporter(&dir)
        .current_dir(&work)
        .args([
            "setup", "--global", "--url", "http://localhost:9000", "--token", "t", "--project",
            "p",
        ])
        .assert()
        .success();

    assert!(dir.path().join(".sonarqube-exporter.json").is_file());
    assert!(!work.join(".sonarqube-exporter.json").exists());
}
