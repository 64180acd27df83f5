//! Remote artifact URLs

/// JUnit Platform Console Standalone jar, used as the test-tooling default
pub const JUNIT_CONSOLE_STANDALONE: &str = "http://central.maven.org/maven2/org/junit/platform/junit-platform-console-standalone/1.4.0/junit-platform-console-standalone-1.4.0.jar";
