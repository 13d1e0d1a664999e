use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::Write;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEATHER: &str = r#"{
  "response": {"count": "10", "status": "ok"},
  "weather": [
    {"city": "Kyiv", "temp": 12.5},
    {"city": "Lviv", "temp": 10.0, "wind": {"speed": 4}}
  ]
}"#;

#[test]
fn test_help_lists_subcommands() {
    cargo_bin_cmd!("declarest")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build a request URL"))
        .stdout(predicate::str::contains("normalize"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("declarest")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("declarest"));
}

#[test]
fn test_url_appends_to_existing_query() {
    cargo_bin_cmd!("declarest")
        .args(["url", "/search?format=json", "-p", "q=New York"])
        .assert()
        .success()
        .stdout("/search?format=json&q=New%20York\n");
}

#[test]
fn test_url_fills_placeholders() {
    cargo_bin_cmd!("declarest")
        .args([
            "url",
            "https://api.example.com/cities/{id}",
            "-p",
            "id=42",
            "-p",
            "units=metric",
        ])
        .assert()
        .success()
        .stdout("https://api.example.com/cities/42?units=metric\n");
}

#[test]
fn test_url_missing_placeholder_fails() {
    cargo_bin_cmd!("declarest")
        .args(["url", "https://api.example.com/cities/{id}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required parameter(s): id"));
}

#[test]
fn test_url_rejects_malformed_param() {
    cargo_bin_cmd!("declarest")
        .args(["url", "/search", "-p", "nonsense"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAME=VALUE"));
}

#[test]
fn test_normalize_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(WEATHER.as_bytes()).unwrap();

    cargo_bin_cmd!("declarest")
        .arg("normalize")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""response.count": "10""#))
        .stdout(predicate::str::contains(r#""wind.speed": 4"#))
        .stdout(predicate::str::contains(r#""wind.speed": null"#));
}

#[test]
fn test_normalize_yaml_from_stdin() {
    cargo_bin_cmd!("declarest")
        .args(["normalize", "--format", "yaml", "--compact"])
        .write_stdin("station:\n  name: Boryspil\n  alt: 130\n")
        .assert()
        .success()
        .stdout("{\"station.name\":\"Boryspil\",\"station.alt\":130}\n");
}

#[test]
fn test_normalize_invalid_json_fails() {
    cargo_bin_cmd!("declarest")
        .arg("normalize")
        .write_stdin("{not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON parse error"));
}

#[test]
fn test_normalize_missing_file_fails() {
    cargo_bin_cmd!("declarest")
        .args(["normalize", "/definitely/not/here.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_prints_normalized_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Kyiv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(WEATHER))
        .mount(&server)
        .await;

    let template = format!("{}/weather", server.uri());
    cargo_bin_cmd!("declarest")
        .args(["fetch", template.as_str(), "-p", "q=Kyiv", "--compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""response.status":"ok""#))
        .stdout(predicate::str::contains(r#"{"city":"Kyiv","temp":12.5,"wind.speed":null}"#));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_reports_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"message": "Invalid API key"}"#),
        )
        .mount(&server)
        .await;

    let template = format!("{}/weather", server.uri());
    cargo_bin_cmd!("declarest")
        .args(["fetch", template.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 401"))
        .stderr(predicate::str::contains("Invalid API key"));
}
