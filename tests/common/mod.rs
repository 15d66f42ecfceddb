//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures, helper functions, and sample
//! documents to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_file("doc.yaml", docs::PETSTORE);
//!     fixture.command().args(["read", "-i", "doc.yaml", "-p", "info.title"]);
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::docs;
    #[allow(unused_imports)]
    pub use super::yaml;
    pub use super::TestFixture;
}

/// Sample documents.
#[allow(dead_code)]
pub mod docs {
    /// A trimmed OpenAPI document.
    pub const PETSTORE: &str = r#"openapi: 3.0.0
info:
  title: Swagger Petstore
  version: 1.0.0
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        '200':
          description: A paged array of pets
          headers:
            x-next:
              description: A link to the next page
        default:
          description: unexpected error
    post:
      operationId: createPets
      responses:
        '201':
          description: Null response
  /pets/{petId}:
    get:
      operationId: showPetById
      responses:
        '200':
          description: Expected response to a valid request
"#;

    /// A list of user mappings, for `table`.
    pub const USERS: &str = r#"users:
  - name: ada
    email: ada@example.com
    role: admin
  - name: linus
    email: linus@example.com
    role: dev
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "invalid: yaml: content:";
}

/// Parse YAML text into a value, panicking on bad test input.
#[allow(dead_code)]
pub fn yaml(text: &str) -> serde_yaml::Value {
    serde_yaml::from_str(text).expect("test YAML should parse")
}

/// A test fixture that provides a temporary directory with input files.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_file("doc.yaml", docs::USERS)
///     .with_file("script.batch", "useAsInput @doc.yaml\n");
///
/// fixture.command()
///     .args(["batch", "script.batch"])
///     .assert()
///     .success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Read a file from the fixture and parse it as YAML.
    #[allow(dead_code)]
    pub fn read_yaml(&self, path: &str) -> serde_yaml::Value {
        let text = std::fs::read_to_string(self.path().join(path)).expect("Failed to read file");
        yaml(&text)
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("yamlbatch");
        cmd.current_dir(self.path());
        cmd.env_remove("YAMLBATCH_DELIMITER");
        cmd.env_remove("YAMLBATCH_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_file() {
        let fixture = TestFixture::new().with_file("test.yaml", "a: 1");
        assert!(fixture.path().join("test.yaml").exists());
        assert_eq!(fixture.read_yaml("test.yaml"), yaml("a: 1"));
    }

    #[test]
    fn test_docs_are_valid_yaml() {
        for doc in [docs::PETSTORE, docs::USERS] {
            serde_yaml::from_str::<serde_yaml::Value>(doc).expect("Doc should be valid YAML");
        }
    }

    #[test]
    fn test_invalid_yaml_is_actually_invalid() {
        let result = serde_yaml::from_str::<serde_yaml::Value>(docs::INVALID_YAML);
        assert!(result.is_err(), "INVALID_YAML should not parse");
    }
}
