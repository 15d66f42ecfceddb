//! # yamlbatch
//!
//! Path-pattern queries and edits over YAML documents, plus a small batch
//! language that strings them together.
//!
//! ## Quick Example
//!
//! ```
//! use yamlbatch::operators::{apply, Verb};
//! use yamlbatch::path::YamlPath;
//!
//! let document: serde_yaml::Value = serde_yaml::from_str(
//!     r#"
//! paths:
//!   /pets:
//!     get:
//!       operationId: listPets
//!     post:
//!       operationId: createPet
//! "#,
//! )
//! .unwrap();
//!
//! let path = YamlPath::compile("paths.*.*.operationId", ".").unwrap();
//! let ids = apply(document, Verb::Read, &path, ",").unwrap();
//! assert_eq!(ids, serde_yaml::from_str::<serde_yaml::Value>("[listPets, createPet]").unwrap());
//! ```
//!
//! ## Core Concepts
//!
//! - **Patterns (`path`)**: delimiter-separated segments. A segment is a regex
//!   over the key text, `*` (one level), `**` (any depth) or `[n]` (a sequence
//!   index). `/` alone is the whole document.
//! - **Matching (`matcher`)**: a depth-first walk that reports full matches,
//!   partial matches and dead ends to a [`matcher::MatchVisitor`].
//! - **Operators (`operators`)**: read, list, delete and table are visitors;
//!   insert and replace come from the `planner`, which also creates missing
//!   intermediate levels.
//! - **Batch scripts (`batch`)**: line-oriented scripts with `foreach` loops,
//!   `${NS::KEY}` macros (`macros`), properties, named stores and file
//!   references (`context`).
//! - **Formats (`codec`)**: YAML through `serde_yaml` or `yaml-rust2`, JSON,
//!   properties and TOML.

pub mod batch;
pub mod codec;
pub mod context;
pub mod error;
pub mod macros;
pub mod matcher;
pub mod operators;
pub mod path;
pub mod planner;
pub mod tree;

mod path_proptest;
