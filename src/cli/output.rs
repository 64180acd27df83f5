//! Log level selection and failure reporting

use tracing::level_filters::LevelFilter;

/// Log level for the given verbosity flags
///
/// Without flags bach logs at info, so the banner and tool lines are shown.
/// `-q` keeps errors only, `-v` adds debug, `-vv` adds trace.
pub fn level_filter(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Message printed to standard error when the pipeline fails
pub fn failure_message(code: i32) -> String {
    format!("bach failed with error code: {code}")
}
