//! Default configuration values

/// Version reported by the banner action
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the project configuration file, resolved against the base directory
pub const CONFIG_FILE: &str = "bach.toml";

/// Prefix shared by all property keys
pub const KEY_PREFIX: &str = "bach.";

/// Fallback project name when the base directory has no final element
pub const PROJECT_NAME: &str = "project";

/// Source unit extension recognized by the source scan
pub const SOURCE_EXTENSION: &str = ".java";

/// File name of a module descriptor
pub const DESCRIPTOR_FILE: &str = "module-info.java";

/// Compiler tool name
pub const COMPILER: &str = "javac";

/// Runtime launcher used to enumerate platform modules
pub const LAUNCHER: &str = "java";

/// Directory holding compiled classes, one subdirectory per realm
pub const COMPILED_DIR: &str = "bin/compiled";

/// Name of the primary realm
pub const MAIN_REALM: &str = "main";

/// Name of the test realm
pub const TEST_REALM: &str = "test";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
