//! Infrastructure layer
//!
//! Handles I/O: network, filesystem, and external processes.

pub mod download;
pub mod platform;
pub mod tool;
pub mod tree;
