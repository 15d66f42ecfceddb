//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use yamlbatch::codec::YamlBackend;
use yamlbatch::context::{BatchOptions, DEFAULT_DELIMITER, DEFAULT_LIST_DELIMITER};

use crate::commands;

/// yamlbatch - Query and transform YAML/JSON documents with path patterns
#[derive(Parser, Debug)]
#[command(name = "yamlbatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Separator between path pattern segments (any string)
    #[arg(
        long,
        global = true,
        value_name = "DELIM",
        env = "YAMLBATCH_DELIMITER",
        default_value = DEFAULT_DELIMITER
    )]
    pub delimiter: String,

    /// Separator between the steps of a `list` label
    #[arg(long, global = true, value_name = "DELIM", default_value = DEFAULT_LIST_DELIMITER)]
    pub list_delimiter: String,

    /// YAML library used to read and write documents (serde_yaml, yaml-rust2)
    #[arg(long, global = true, value_name = "LIBRARY", default_value = "serde_yaml")]
    pub yaml_library: YamlBackend,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        env = "YAMLBATCH_LOG",
        default_value = "warn"
    )]
    pub log_level: LevelFilter,
}

impl GlobalArgs {
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            delimiter: self.delimiter.clone(),
            list_delimiter: self.list_delimiter.clone(),
            backend: self.yaml_library,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every subtree matching a path pattern
    Read(commands::query::QueryArgs),

    /// Print the location of every match
    List(commands::query::QueryArgs),

    /// Project matched mappings onto a list of columns
    Table(commands::query::TableArgs),

    /// Remove every match
    Delete(commands::mutate::DeleteArgs),

    /// Insert content at every match, creating missing structure
    Insert(commands::mutate::ContentArgs),

    /// Replace every match with new content
    Replace(commands::mutate::ContentArgs),

    /// Run a batch script
    Batch(commands::batch::BatchArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.global.log_level);

        let global = &self.global;
        match self.command {
            Commands::Read(args) => commands::query::read(args, global),
            Commands::List(args) => commands::query::list(args, global),
            Commands::Table(args) => commands::query::table(args, global),
            Commands::Delete(args) => commands::mutate::delete(args, global),
            Commands::Insert(args) => commands::mutate::insert(args, global),
            Commands::Replace(args) => commands::mutate::replace(args, global),
            Commands::Batch(args) => commands::batch::execute(args, global),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Install the logger. Records are written to stderr; the level can be raised
/// later by the batch `verbose` command, so the logger itself lets everything
/// through and `log::set_max_level` does the filtering.
fn init_logging(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
    log::set_max_level(level);
}
