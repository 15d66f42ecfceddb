//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `yamlbatch` command-line tool.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An entry function that takes the parsed `Args` plus the global options
//!   and performs the command's logic.
//!
//! Reading the input document and writing the result is shared by all of them
//! and lives here.

pub mod batch;
pub mod completions;
pub mod mutate;
pub mod query;

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context as _, Result};
use clap::Args;
use serde_yaml::Value;

use yamlbatch::codec::{self, Format, YamlBackend};

/// Where the document comes from and where the result goes
#[derive(Args, Debug, Clone)]
pub struct IoArgs {
    /// Input document (`-` reads standard input)
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub input: String,

    /// Output file (`-` writes standard output)
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub output: String,

    /// Write the result as JSON instead of YAML
    #[arg(long)]
    pub json: bool,
}

/// Read a document from a file, or from standard input for `-`.
pub fn read_input(input: &str, backend: YamlBackend) -> Result<Value> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read standard input")?;
        return Ok(codec::parse(&text, Format::Yaml, backend)?);
    }
    codec::read_file(input, backend).with_context(|| format!("Failed to read '{}'", input))
}

/// Write a document to a file, or to standard output for `-`.
///
/// Files get the format their extension names unless `json` is set.
pub fn write_output(value: &Value, output: &str, json: bool, backend: YamlBackend) -> Result<()> {
    let format = match (json, output) {
        (true, _) => Format::Json,
        (false, "-") => Format::Yaml,
        (false, path) => Format::from_path(path),
    };
    let text = codec::to_string(value, format, backend)?;
    if output == "-" {
        std::io::stdout()
            .lock()
            .write_all(text.as_bytes())
            .context("Failed to write standard output")?;
    } else {
        std::fs::write(Path::new(output), text)
            .with_context(|| format!("Failed to write '{}'", output))?;
    }
    Ok(())
}
