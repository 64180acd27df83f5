//! Command-line interface module
//!
//! Parses the global flags with clap and dispatches the remaining arguments
//! to a pipeline. The build logic itself lives in [`crate::core`].
//!
//! ```text
//! bach                       banner, check, build
//! bach tool <name> [args]    banner, check, run <name> with args
//! ```

pub mod output;

use std::path::PathBuf;

use clap::Parser;
use tracing::error;

use crate::core::action::Pipeline;
use crate::core::command::Command;
use crate::core::context::BuildContext;
use crate::infra::platform;
use crate::infra::tool::sink;

/// Bach.rs - Java build orchestration
///
/// Builds the modular Java project found in the base directory.
#[derive(Parser, Debug)]
#[command(name = "bach")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Base directory of the project
    #[arg(long, env = "BACH_BASE")]
    pub base: Option<PathBuf>,

    /// Operation and its arguments, e.g. `tool javac --version`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub arguments: Vec<String>,
}

impl Cli {
    /// Load the context and run the requested operation, returning the exit code
    pub fn run(self) -> i32 {
        let base = match base_directory(self.base) {
            Ok(base) => base,
            Err(e) => {
                error!("Resolving base directory failed: {e}");
                return 1;
            }
        };
        let mut ctx = match BuildContext::load(&base, &platform::system_module_names()) {
            Ok(ctx) => ctx,
            Err(e) => {
                error!("{e}");
                return 1;
            }
        };
        dispatch(&mut ctx, &self.arguments)
    }
}

/// Absolute base directory, defaulting to the current directory
///
/// The path is made absolute without touching the filesystem, so `.` turns
/// into the current directory and the project name follows its last element.
pub fn base_directory(base: Option<PathBuf>) -> std::io::Result<PathBuf> {
    match base {
        Some(base) => std::path::absolute(base),
        None => std::env::current_dir(),
    }
}

/// Select and run the pipeline for the operation arguments
///
/// No arguments runs the default build. `tool <name> [args...]` (operation
/// name matched case-insensitively) runs a single tool with its output going
/// to the standard streams. Anything else is rejected with exit code 1.
pub fn dispatch(ctx: &mut BuildContext, arguments: &[String]) -> i32 {
    let Some((operation, rest)) = arguments.split_first() else {
        return Pipeline::default_build().run(ctx);
    };
    if !operation.eq_ignore_ascii_case("tool") {
        error!("Unsupported operation: {operation}");
        return 1;
    }
    let Some((name, tool_arguments)) = rest.split_first() else {
        error!("No name supplied for tool operation!");
        return 1;
    };
    let mut command = Command::new(name.as_str());
    command.add_all(tool_arguments);
    ctx.out = sink(|line| println!("{line}"));
    ctx.err = sink(|line| eprintln!("{line}"));
    Pipeline::tool(command).run(ctx)
}
