//! Error types for bach
//!
//! Domain-specific error types using thiserror. Every action converts these
//! into a logged, non-zero exit code before they reach the pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Module descriptor errors
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// Text does not contain a `module <name> { ... }` declaration
    #[error("Expected module descriptor unit, but got: {source_text}")]
    Format { source_text: String },

    /// Descriptor file could not be read
    #[error("Reading '{path}' failed: {error}")]
    Read { path: PathBuf, error: String },

    /// Walking a root directory failed
    #[error("Walking path failed for '{path}': {error}")]
    Walk { path: PathBuf, error: String },
}

/// Tool dispatch errors
#[derive(Error, Debug)]
pub enum ToolError {
    /// External process could not be started
    #[error("Starting '{tool}' failed: {error}")]
    Spawn { tool: String, error: String },

    /// External process could not be awaited
    #[error("Waiting for '{tool}' failed: {error}")]
    Wait { tool: String, error: String },

    /// In-process provider reported a failure
    #[error("Tool provider '{tool}' failed: {error}")]
    Provider { tool: String, error: String },

    /// Output stream of a spawned process was not captured
    #[error("Output stream of '{tool}' was not piped")]
    MissingPipe { tool: String },
}

/// Build errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// Structurally invalid base path
    #[error("Base path has zero elements: '{path}'")]
    InvalidBase { path: PathBuf },

    /// Scanning the realm sources failed
    #[error("Scanning sources of realm '{realm}' failed: {error}")]
    Scan { realm: String, error: String },

    /// Compiler tool returned a non-zero exit code
    #[error("Compiling realm '{realm}' failed with exit code {code}")]
    CompileFailed { realm: String, code: i32 },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read config file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Configuration file is not valid TOML
    #[error("Failed to parse config file '{path}': {error}")]
    Parse { path: PathBuf, error: String },
}

/// Download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// URI could not be parsed or has no file name
    #[error("Invalid URI '{uri}': {error}")]
    InvalidUri { uri: String, error: String },

    /// Network error
    #[error("Network error downloading '{uri}': {error}")]
    Network { uri: String, error: String },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },

    /// HTTP client could not be initialized
    #[error("Failed to create HTTP client: {error}")]
    Client { error: String },

    /// Target is missing while offline mode is active
    #[error("Target is missing and being offline: {path}")]
    OfflineMissing { path: PathBuf },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to walk a directory tree
    #[error("Failed to walk '{path}': {error}")]
    Walk { path: PathBuf, error: String },

    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to delete file or directory
    #[error("Failed to delete '{path}': {error}")]
    Delete { path: PathBuf, error: String },
}

/// Top-level bach error type
#[derive(Error, Debug)]
pub enum BachError {
    /// Descriptor error
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// Tool error
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Build error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Download error
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
}
