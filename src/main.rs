//! Bach.rs CLI - Java build orchestration
//!
//! Entry point for the bach command-line application.

use clap::Parser;

use bach::cli::output::{failure_message, level_filter};
use bach::cli::Cli;

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level_filter(cli.verbose, cli.quiet).into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = cli.run();
    if code != 0 {
        eprintln!("{}", failure_message(code));
    }
    std::process::exit(code);
}
