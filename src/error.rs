//! # Error Handling
//!
//! This module defines the centralized error type for `yamlbatch`. It uses the
//! `thiserror` library to build a single `Error` enum covering every failure a
//! query, mutation or batch run can produce.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant corresponds to one failure class
//!   and carries enough context (pattern text, location, script line) to
//!   diagnose the problem without a debugger.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! The failure classes are:
//!
//! - Malformed path patterns (`Pattern`).
//! - Semantically invalid matches, e.g. looping over a scalar (`MatchSemantic`).
//! - Mutations that would silently lose data (`StructuralConflict`).
//! - Malformed batch scripts (`BatchGrammar`).
//! - Missing files or named values (`Resource`).
//! - Unresolvable `${NS::KEY}` macros (`UnresolvedMacro`).
//! - Documents that cannot be converted between formats (`Format`).
//! - Explicitly unsupported pattern shapes (`Unsupported`).
//! - Any of the above raised while running a script line (`Batch`).
//!
//! None of these are retried; every caller propagates them with `?`.

use thiserror::Error;

/// Main error type for yamlbatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// A path pattern could not be compiled.
    #[error("Invalid path pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// A match resolved to something the operation cannot work with.
    #[error("Match error: {message}")]
    MatchSemantic { message: String },

    /// An insert or replace would clobber existing data or mix incompatible
    /// node kinds.
    #[error("Structural conflict at '{location}': {message}")]
    StructuralConflict { location: String, message: String },

    /// A batch script is malformed.
    ///
    /// `line` is the 1-based script line, or 0 when the problem is not tied to
    /// a single line.
    #[error("Batch script error (line {line}): {message}")]
    BatchGrammar { line: usize, message: String },

    /// A referenced file or named value is missing or unreadable.
    #[error("Resource error for '{reference}': {message}")]
    Resource { reference: String, message: String },

    /// A `${NS::KEY}` macro could not be resolved.
    #[error("Unresolved macro '{token}'")]
    UnresolvedMacro { token: String },

    /// A document could not be converted to or from a file format.
    #[error("{format} conversion error: {message}")]
    Format { format: String, message: String },

    /// The pattern/document combination is deliberately not supported.
    #[error("Unsupported: {feature}")]
    Unsupported { feature: String },

    /// A failure raised while executing one line of a batch script.
    #[error("Batch command failed at line {line} ('{command}'): {source}")]
    Batch {
        line: usize,
        command: String,
        #[source]
        source: Box<Error>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing or serialization error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing or serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Strip any `Batch` wrappers and return the error that caused them.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Batch { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
