//! vault-resource - HashiCorp Vault secrets for CI pipelines.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vault_resource::cli::output;
use vault_resource::cli::{args_from_program_name, execute, Cli};
use vault_resource::core::constants;

fn main() {
    let cli = Cli::parse_from(args_from_program_name(std::env::args_os()));

    // stdout carries the protocol response, so logs go to stderr
    let filter = EnvFilter::try_from_env(constants::LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("vault_resource=debug")
        } else {
            EnvFilter::new("vault_resource=info")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    if let Err(e) = execute(cli.command) {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
