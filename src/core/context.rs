//! Build context
//!
//! One [`BuildContext`] is created per invocation and passed explicitly to
//! every action. It bundles the base directory, the configuration snapshot,
//! the project model, the tool runner, and the two line sinks tools write to.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::config::Config;
use crate::core::project::Project;
use crate::error::BachError;
use crate::infra::tool::{sink, LineSink, ToolRegistry, ToolRunner};

/// Shared, read-mostly state of one pipeline run
pub struct BuildContext {
    /// Base directory all relative paths are resolved against
    pub base: PathBuf,
    /// Configuration snapshot
    pub config: Config,
    /// Project model
    pub project: Project,
    /// Tool dispatcher
    pub tools: ToolRunner,
    /// Standard output line consumer
    pub out: LineSink,
    /// Standard error line consumer
    pub err: LineSink,
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("base", &self.base)
            .field("project", &self.project)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

impl BuildContext {
    /// Load configuration from `base` and derive the project model
    pub fn load(base: &Path, platform: &BTreeSet<String>) -> Result<Self, BachError> {
        let config = Config::load(base)?;
        Self::new(base, config, platform)
    }

    /// Create a context from an explicit configuration
    ///
    /// Tool output defaults to the log: standard output at debug level,
    /// standard error at error level.
    pub fn new(base: &Path, config: Config, platform: &BTreeSet<String>) -> Result<Self, BachError> {
        let project = Project::new(base, &config, platform)?;
        Ok(Self {
            base: base.to_path_buf(),
            config,
            project,
            tools: ToolRunner::new(ToolRegistry::with_builtins()),
            out: sink(|line| debug!("{line}")),
            err: sink(|line| error!("{line}")),
        })
    }

    /// Replace both output sinks
    #[must_use]
    pub fn with_output(mut self, out: LineSink, err: LineSink) -> Self {
        self.out = out;
        self.err = err;
        self
    }

    /// Resolve `path` against the base directory; absolute paths pass through
    pub fn based(&self, path: impl AsRef<Path>) -> PathBuf {
        self.base.join(path)
    }
}
