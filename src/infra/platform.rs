//! Platform-provided module names
//!
//! The host Java runtime is asked for its modules via `java --list-modules`.
//! Without a runtime on the `PATH` the Java SE module names are assumed.

use std::collections::BTreeSet;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::defaults;

/// Modules of the Java SE platform specification
pub const JAVA_SE_MODULES: &[&str] = &[
    "java.base",
    "java.compiler",
    "java.datatransfer",
    "java.desktop",
    "java.instrument",
    "java.logging",
    "java.management",
    "java.management.rmi",
    "java.naming",
    "java.net.http",
    "java.prefs",
    "java.rmi",
    "java.scripting",
    "java.se",
    "java.security.jgss",
    "java.security.sasl",
    "java.smartcardio",
    "java.sql",
    "java.sql.rowset",
    "java.transaction.xa",
    "java.xml",
    "java.xml.crypto",
];

/// Enumerate all system module names
pub fn system_module_names() -> BTreeSet<String> {
    match list_runtime_modules() {
        Some(names) if !names.is_empty() => names,
        _ => {
            debug!("No Java runtime found, assuming Java SE module names");
            JAVA_SE_MODULES.iter().map(|s| (*s).to_string()).collect()
        }
    }
}

fn list_runtime_modules() -> Option<BTreeSet<String>> {
    let launcher = which::which(defaults::LAUNCHER).ok()?;
    debug!("Listing modules of {}", launcher.display());
    let output = Command::new(launcher)
        .arg("--list-modules")
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(parse_module_listing(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `java --list-modules` output: one `name@version` entry per line
pub fn parse_module_listing(listing: &str) -> BTreeSet<String> {
    listing
        .lines()
        .filter_map(|line| line.split('@').next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
