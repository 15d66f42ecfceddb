//! End-to-end tests for the `read`, `list` and `table` commands.
//!
//! These tests invoke the binary directly and check what it prints.

#[allow(dead_code)]
mod common;
use common::prelude::*;

fn stdout_yaml(output: &std::process::Output) -> serde_yaml::Value {
    yaml(&String::from_utf8_lossy(&output.stdout))
}

#[test]
fn test_read_help() {
    let mut cmd = cargo_bin_cmd!("yamlbatch");
    cmd.args(["read", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--yamlpath"))
        .stdout(predicate::str::contains("--input"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_read_single_value() {
    let fixture = TestFixture::new().with_file("openapi.yaml", docs::PETSTORE);
    let output = fixture
        .command()
        .args(["read", "-i", "openapi.yaml", "-p", "info.title"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    insta::assert_snapshot!(String::from_utf8_lossy(&output.stdout).trim_end(), @"- Swagger Petstore");
}

#[test]
fn test_read_wildcards_in_document_order() {
    let fixture = TestFixture::new().with_file("openapi.yaml", docs::PETSTORE);
    let output = fixture
        .command()
        .args(["read", "-i", "openapi.yaml", "-p", "paths.*.*.operationId"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(
        stdout_yaml(&output),
        yaml("[listPets, createPets, showPetById]")
    );
}

#[test]
fn test_read_greedy_pattern() {
    let fixture = TestFixture::new().with_file("openapi.yaml", docs::PETSTORE);
    let output = fixture
        .command()
        .args(["read", "-i", "openapi.yaml", "-p", "**.x-next.description"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(stdout_yaml(&output), yaml("['A link to the next page']"));
}

#[test]
fn test_read_regex_segment() {
    let fixture = TestFixture::new().with_file("openapi.yaml", docs::PETSTORE);
    let output = fixture
        .command()
        .args([
            "read",
            "-i",
            "openapi.yaml",
            "-p",
            "paths.*.*.responses.2\\d\\d.description",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(
        stdout_yaml(&output),
        yaml("['A paged array of pets', 'Null response', 'Expected response to a valid request']")
    );
}

#[test]
fn test_read_root_from_stdin() {
    let fixture = TestFixture::new();
    let output = fixture
        .command()
        .args(["read", "-p", "/"])
        .write_stdin("a: 1\n")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(stdout_yaml(&output), yaml("[{a: 1}]"));
}

#[test]
fn test_read_json_output() {
    let fixture = TestFixture::new().with_file("openapi.yaml", docs::PETSTORE);
    let output = fixture
        .command()
        .args(["read", "-i", "openapi.yaml", "-p", "info.version", "--json"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(parsed, serde_json::json!(["1.0.0"]));
}

#[test]
fn test_read_custom_delimiter() {
    let fixture = TestFixture::new().with_file("openapi.yaml", docs::PETSTORE);
    let output = fixture
        .command()
        .args([
            "read",
            "--delimiter",
            "::",
            "-i",
            "openapi.yaml",
            "-p",
            "paths::/pets::get::operationId",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(stdout_yaml(&output), yaml("[listPets]"));
}

#[test]
fn test_read_delimiter_from_env() {
    let fixture = TestFixture::new().with_file("openapi.yaml", docs::PETSTORE);
    let output = fixture
        .command()
        .env("YAMLBATCH_DELIMITER", "/")
        .args(["read", "-i", "openapi.yaml", "-p", "info/title"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(stdout_yaml(&output), yaml("['Swagger Petstore']"));
}

#[test]
fn test_read_yaml_rust2_backend() {
    let fixture = TestFixture::new().with_file("openapi.yaml", docs::PETSTORE);
    let output = fixture
        .command()
        .args([
            "read",
            "--yaml-library",
            "yaml-rust2",
            "-i",
            "openapi.yaml",
            "-p",
            "paths./pets.post.operationId",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(stdout_yaml(&output), yaml("[createPets]"));
}

#[test]
fn test_list_labels() {
    let fixture = TestFixture::new().with_file("openapi.yaml", docs::PETSTORE);
    let output = fixture
        .command()
        .args(["list", "-i", "openapi.yaml", "-p", "paths.*.get.operationId"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(
        stdout_yaml(&output),
        yaml("['paths,/pets,get', 'paths,/pets/{petId},get']")
    );
}

#[test]
fn test_list_custom_list_delimiter() {
    let fixture = TestFixture::new().with_file("users.yaml", docs::USERS);
    let output = fixture
        .command()
        .args([
            "list",
            "--list-delimiter",
            "/",
            "-i",
            "users.yaml",
            "-p",
            "users.*.name",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(stdout_yaml(&output), yaml("['users/[0]', 'users/[1]']"));
}

#[test]
fn test_list_root() {
    let fixture = TestFixture::new();
    let output = fixture
        .command()
        .args(["list", "-p", "/"])
        .write_stdin("a: 1\n")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(stdout_yaml(&output), yaml("['/']"));
}

#[test]
fn test_table_projects_columns() {
    let fixture = TestFixture::new().with_file("users.yaml", docs::USERS);
    let output = fixture
        .command()
        .args(["table", "-i", "users.yaml", "-p", "users", "name,email"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(
        stdout_yaml(&output),
        yaml(
            "- {name: ada, email: ada@example.com}\n\
             - {name: linus, email: linus@example.com}"
        )
    );
}

#[test]
fn test_table_missing_column_fails() {
    let fixture = TestFixture::new().with_file("users.yaml", docs::USERS);
    fixture
        .command()
        .args(["table", "-i", "users.yaml", "-p", "users", "name,phone"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("column 'phone' is missing"));
}

#[test]
fn test_table_requires_columns() {
    let fixture = TestFixture::new().with_file("users.yaml", docs::USERS);
    fixture
        .command()
        .args(["table", "-i", "users.yaml", "-p", "users", ","])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No columns given"));
}
