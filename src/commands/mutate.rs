//! # Mutation Command Implementations
//!
//! `delete`, `insert` and `replace` write the modified document.
//!
//! Content for `insert` and `replace` is a reference: `@file` loads a file
//! (format by extension), anything else is parsed inline as JSON, `key=value`
//! properties or YAML, falling back to a plain string.
//!
//! ```bash
//! yamlbatch insert -i app.yaml -o app.yaml --yamlpath server.tls '{"enabled": true}'
//! yamlbatch delete -i openapi.yaml --yamlpath 'paths.**.headers'
//! ```

use anyhow::Result;
use clap::Args;

use yamlbatch::context::Context;
use yamlbatch::operators::Verb;

use super::query::run;
use super::IoArgs;
use crate::cli::GlobalArgs;

/// Arguments for `delete`
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Path pattern to match
    #[arg(short = 'p', long, value_name = "PATTERN")]
    pub yamlpath: String,

    #[command(flatten)]
    pub io: IoArgs,
}

/// Arguments for `insert` and `replace`
#[derive(Args, Debug)]
pub struct ContentArgs {
    /// Path pattern to match
    #[arg(short = 'p', long, value_name = "PATTERN")]
    pub yamlpath: String,

    /// Content to write: `@file`, or inline JSON/YAML/properties text
    #[arg(value_name = "CONTENT")]
    pub content: String,

    #[command(flatten)]
    pub io: IoArgs,
}

pub fn delete(args: DeleteArgs, global: &GlobalArgs) -> Result<()> {
    run(&args.yamlpath, Verb::Delete, &args.io, global)
}

pub fn insert(args: ContentArgs, global: &GlobalArgs) -> Result<()> {
    let content = load_content(&args.content, global)?;
    run(&args.yamlpath, Verb::Insert(content), &args.io, global)
}

pub fn replace(args: ContentArgs, global: &GlobalArgs) -> Result<()> {
    let content = load_content(&args.content, global)?;
    run(&args.yamlpath, Verb::Replace(content), &args.io, global)
}

fn load_content(reference: &str, global: &GlobalArgs) -> Result<serde_yaml::Value> {
    let ctx = Context::new(global.batch_options());
    Ok(ctx.load(reference)?)
}
