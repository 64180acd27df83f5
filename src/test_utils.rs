//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    const RESERVED: &[&str] = &["module", "requires", "transitive", "static", "open"];

    /// Generate a lowercase Java identifier that is not a descriptor keyword
    pub fn identifier() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,6}".prop_filter("Identifier must not be a keyword", |s| {
            !RESERVED.contains(&s.as_str())
        })
    }

    /// Generate a dotted module name with up to `max_segments` segments
    pub fn module_name(max_segments: usize) -> impl Strategy<Value = String> {
        proptest::collection::vec(identifier(), 1..=max_segments).prop_map(|parts| parts.join("."))
    }

    /// Generate a Java source file stem
    pub fn source_stem() -> impl Strategy<Value = String> {
        "[A-Za-z_][A-Za-z0-9_]{0,12}"
    }
}
