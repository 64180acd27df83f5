//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a module descriptor `<root>/<module>/module-info.java`
    #[allow(dead_code)]
    pub fn create_module(&self, root: &str, module: &str, requires: &[&str]) {
        let clauses: String = requires.iter().map(|r| format!("  requires {r};\n")).collect();
        self.create_file(
            &format!("{root}/{module}/module-info.java"),
            &format!("module {module} {{\n{clauses}}}\n"),
        );
    }

    /// Check if a file exists in the test project
    #[allow(dead_code)]
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Run the bach binary in the project directory
    pub fn run_bach(&self, args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bach"));
        cmd.current_dir(self.path());
        cmd.env_remove("BACH_BASE");
        cmd.env_remove("RUST_LOG");
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.args(args);
        cmd.output().expect("Failed to execute bach")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
