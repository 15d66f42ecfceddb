//! # Batch Command Implementation
//!
//! Runs a batch script. The script starts with the document given by
//! `--input` (or an empty document), and the final document is written to
//! `--output` when one is given. `print` output always goes to standard
//! output.
//!
//! Relative `@file` references inside the script resolve against the
//! script's own directory.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use log::info;
use serde_yaml::Value;

use yamlbatch::batch::{self, Script};
use yamlbatch::context::Context;

use super::{read_input, write_output};
use crate::cli::GlobalArgs;

/// Arguments for `batch`
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Script file to run
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Initial input document (`-` reads standard input)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<String>,

    /// Where to write the final document (`-` for standard output)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,

    /// Write the final document as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: BatchArgs, global: &GlobalArgs) -> Result<()> {
    let script = Script::load(&args.script)
        .with_context(|| format!("Failed to load script '{}'", args.script.display()))?;

    let mut options = global.batch_options();
    options.base_dir = args
        .script
        .parent()
        .map(|dir| dir.to_path_buf())
        .unwrap_or_default();
    let mut ctx = Context::new(options);

    let input = match &args.input {
        Some(input) => read_input(input, global.yaml_library)?,
        None => Value::Null,
    };

    let result = batch::run(&script, input, &mut ctx)?;
    info!("Script '{}' finished", args.script.display());

    if let Some(output) = &args.output {
        write_output(&result, output, args.json, ctx.options.backend)?;
    }
    Ok(())
}
