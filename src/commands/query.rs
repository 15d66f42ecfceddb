//! # Query Command Implementations
//!
//! `read`, `list` and `table` leave the document untouched and print what the
//! path pattern selects:
//!
//! ```bash
//! yamlbatch read -i openapi.yaml --yamlpath 'paths.*.*.responses.200.description'
//! yamlbatch list -i openapi.yaml --yamlpath 'paths.*.get'
//! yamlbatch table -i users.yaml --yamlpath users name,email
//! ```

use anyhow::Result;
use clap::Args;

use yamlbatch::operators::{self, columns, Verb};
use yamlbatch::path::YamlPath;

use super::{read_input, write_output, IoArgs};
use crate::cli::GlobalArgs;

/// Arguments for `read` and `list`
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Path pattern to match
    #[arg(short = 'p', long, value_name = "PATTERN")]
    pub yamlpath: String,

    #[command(flatten)]
    pub io: IoArgs,
}

/// Arguments for `table`
#[derive(Args, Debug)]
pub struct TableArgs {
    /// Path pattern to match
    #[arg(short = 'p', long, value_name = "PATTERN")]
    pub yamlpath: String,

    /// Comma-separated column names
    #[arg(value_name = "COLUMNS")]
    pub columns: String,

    #[command(flatten)]
    pub io: IoArgs,
}

pub fn read(args: QueryArgs, global: &GlobalArgs) -> Result<()> {
    run(&args.yamlpath, Verb::Read, &args.io, global)
}

pub fn list(args: QueryArgs, global: &GlobalArgs) -> Result<()> {
    run(&args.yamlpath, Verb::List, &args.io, global)
}

pub fn table(args: TableArgs, global: &GlobalArgs) -> Result<()> {
    let columns = columns(&args.columns);
    if columns.is_empty() {
        anyhow::bail!("No columns given");
    }
    run(&args.yamlpath, Verb::Table(columns), &args.io, global)
}

/// Load the input, apply `verb` and write the result.
pub(super) fn run(pattern: &str, verb: Verb, io: &IoArgs, global: &GlobalArgs) -> Result<()> {
    let backend = global.yaml_library;
    let path = YamlPath::compile(pattern, &global.delimiter)?;
    let document = read_input(&io.input, backend)?;
    let result = operators::apply(document, verb, &path, &global.list_delimiter)?;
    write_output(&result, &io.output, io.json, backend)
}
