//! # yamlbatch CLI
//!
//! This is the binary entry point for the `yamlbatch` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Reading the input document and writing the result.
//! - Handling top-level application errors and translating them into a
//!   non-zero exit code.
//!
//! The matching engine, the mutation planner and the batch interpreter live in
//! the `yamlbatch` library crate; the binary is a thin wrapper around them.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
