//! Core build model
//!
//! # Submodules
//!
//! - [`action`] - Actions and the fail-fast pipeline
//! - [`command`] - Tool command lines
//! - [`context`] - Per-invocation build context
//! - [`descriptor`] - Module descriptor parsing and scanning
//! - [`project`] - Project and realm model

pub mod action;
pub mod command;
pub mod context;
pub mod descriptor;
pub mod project;
