//! Command-line interface.
//!
//! One subcommand per resource step. Each step reads its request from
//! stdin and writes its response to stdout.

pub mod check;
pub mod get;
pub mod output;
pub mod put;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// Vault resource for CI pipelines.
#[derive(Parser)]
#[command(
    name = "vault-resource",
    about = "Check, read and write HashiCorp Vault secrets from a CI pipeline",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Resource steps.
#[derive(Subcommand)]
pub enum Command {
    /// Report secret versions newer than the last seen version
    Check,

    /// Read secrets into a destination directory
    In {
        /// Directory that receives vault.json
        destination: PathBuf,
    },

    /// Write secrets from step parameters
    Out {
        /// Build source directory
        source: PathBuf,
    },
}

const STEP_NAMES: [&str; 3] = ["check", "in", "out"];

/// Arguments with the step inserted when invoked through a link named
/// `check`, `in` or `out`.
pub fn args_from_program_name<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().collect();
    let step = args
        .first()
        .and_then(|argv0| Path::new(argv0).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| STEP_NAMES.contains(name))
        .map(OsString::from);

    if let Some(step) = step {
        args.insert(1, step);
    }
    args
}

/// Execute a command.
pub fn execute(command: Command) -> crate::error::Result<()> {
    use Command::*;

    match command {
        Check => check::execute(),
        In { destination } => get::execute(&destination),
        Out { source } => put::execute(&source),
    }
}
