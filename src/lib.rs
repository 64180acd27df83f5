//! Bach.rs - Java build orchestration
//!
//! Derives a build model for a modular Java project from its directory
//! layout and `module-info.java` descriptors, then drives the compiler and
//! other tools through a fail-fast pipeline of actions.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line parsing and dispatch
//! - [`core`] - Project model, actions, and the pipeline
//! - [`infra`] - Processes, downloads, and directory trees
//! - [`config`] - Configuration properties and constants
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
