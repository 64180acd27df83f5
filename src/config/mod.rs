//! Configuration and constants
//!
//! Properties are resolved in layers, first hit wins:
//!
//! 1. Environment variable, e.g. `BACH_PROJECT_NAME` for `bach.project.name`
//! 2. Project file `<base>/bach.toml`, e.g. `[project] name = "demo"`
//! 3. Built-in default of the [`Property`]
//!
//! The environment is captured once by [`Config::load`]; every lookup
//! afterwards is a pure function of that snapshot and the parsed file.

pub mod defaults;
pub mod urls;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;

/// Recognized configuration properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    /// Offline mode
    Offline,
    /// Cache of binary tools
    PathCacheTools,
    /// Cache of resolved modules
    PathCacheModules,
    /// Prevent project being built
    ProjectDormant,
    /// Name of the project
    ProjectName,
    /// Version of the project
    ProjectVersion,
    /// JUnit Platform Console Standalone URI
    ToolJunitUri,
}

impl Property {
    /// All recognized properties
    pub const ALL: [Property; 7] = [
        Property::Offline,
        Property::PathCacheTools,
        Property::PathCacheModules,
        Property::ProjectDormant,
        Property::ProjectName,
        Property::ProjectVersion,
        Property::ToolJunitUri,
    ];

    /// Dotted key, e.g. `bach.project.name`
    pub fn key(self) -> &'static str {
        match self {
            Self::Offline => "bach.offline",
            Self::PathCacheTools => "bach.path.cache.tools",
            Self::PathCacheModules => "bach.path.cache.modules",
            Self::ProjectDormant => "bach.project.dormant",
            Self::ProjectName => "bach.project.name",
            Self::ProjectVersion => "bach.project.version",
            Self::ToolJunitUri => "bach.tool.junit.uri",
        }
    }

    /// Built-in default value
    pub fn default_value(self) -> &'static str {
        match self {
            Self::Offline | Self::ProjectDormant => "false",
            Self::PathCacheTools => ".bach/tools",
            Self::PathCacheModules => ".bach/modules",
            Self::ProjectName => defaults::PROJECT_NAME,
            Self::ProjectVersion => "1.0.0-SNAPSHOT",
            Self::ToolJunitUri => urls::JUNIT_CONSOLE_STANDALONE,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Environment variable overriding a dotted key: `bach.path.cache.tools` -> `BACH_PATH_CACHE_TOOLS`
pub fn env_var_name(key: &str) -> String {
    key.replace('.', "_").to_ascii_uppercase()
}

/// Snapshot of the layered configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Captured environment overrides, keyed by variable name
    env: BTreeMap<String, String>,
    /// Parsed project file
    file: toml::Table,
}

impl Config {
    /// Create a configuration from explicit layers
    pub fn new(env: BTreeMap<String, String>, file: toml::Table) -> Self {
        Self { env, file }
    }

    /// Load `bach.toml` from `base` and capture `BACH_*` environment variables
    ///
    /// A missing file is not an error, an unreadable or invalid one is.
    pub fn load(base: &Path) -> Result<Self, ConfigError> {
        let env = std::env::vars()
            .filter(|(name, _)| name.starts_with("BACH_"))
            .collect();
        let file = load_file(&base.join(defaults::CONFIG_FILE))?;
        Ok(Self::new(env, file))
    }

    /// Resolved value of a recognized property
    pub fn get(&self, property: Property) -> String {
        self.get_or(property.key(), property.default_value())
    }

    /// Resolved value of an arbitrary dotted key with a caller-supplied default
    pub fn get_or(&self, key: &str, default_value: &str) -> String {
        if let Some(value) = self.env.get(&env_var_name(key)) {
            return value.clone();
        }
        lookup(&self.file, key).unwrap_or_else(|| default_value.to_string())
    }

    /// Resolved value parsed as a boolean, `true` ignoring ASCII case
    pub fn get_bool(&self, property: Property) -> bool {
        self.get(property).trim().eq_ignore_ascii_case("true")
    }
}

fn load_file(path: &Path) -> Result<toml::Table, ConfigError> {
    if !path.exists() {
        return Ok(toml::Table::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    content.parse::<toml::Table>().map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Walk the table along the key's segments, ignoring the `bach.` prefix
fn lookup(table: &toml::Table, key: &str) -> Option<String> {
    let key = key.strip_prefix(defaults::KEY_PREFIX).unwrap_or(key);
    let mut segments = key.split('.');
    let mut value = table.get(segments.next()?)?;
    for segment in segments {
        value = value.as_table()?.get(segment)?;
    }
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}
