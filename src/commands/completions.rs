//! # Completions Command Implementation
//!
//! Writes a shell completion script for `yamlbatch` to standard output.
//!
//! ```bash
//! yamlbatch completions bash > ~/.local/share/bash-completion/completions/yamlbatch
//! yamlbatch completions zsh > ~/.zfunc/_yamlbatch
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Arguments for `completions`
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
