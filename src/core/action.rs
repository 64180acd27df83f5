//! Build actions and the action pipeline
//!
//! An [`Action`] runs against the [`BuildContext`] and returns an exit code,
//! zero meaning success. A [`Pipeline`] runs its actions strictly in order
//! and stops at the first non-zero code.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{defaults, Property};
use crate::core::command::Command;
use crate::core::context::BuildContext;
use crate::error::BuildError;
use crate::infra::download::Downloader;
use crate::infra::tool::LineSink;
use crate::infra::tree::{self, CopyOutcome};

/// Path predicate used by the tree actions
pub type PathFilter = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Single build step
pub trait Action {
    /// Human-readable name of this action
    fn name(&self) -> &str;

    /// Run this action and return zero on success
    fn run(&self, ctx: &BuildContext) -> i32;
}

/// Log banner action
#[derive(Debug, Clone, Copy, Default)]
pub struct Banner;

impl Action for Banner {
    fn name(&self) -> &str {
        "Banner"
    }

    fn run(&self, ctx: &BuildContext) -> i32 {
        match option_env!("VERGEN_GIT_SHA") {
            Some(sha) => info!("Bach.rs - {} ({sha})", defaults::VERSION),
            None => info!("Bach.rs - {}", defaults::VERSION),
        }
        debug!(
            "Project {} {} in {}",
            ctx.project.name(),
            ctx.project.version(),
            ctx.base.display()
        );
        0
    }
}

/// Check preconditions action
#[derive(Debug, Clone, Copy, Default)]
pub struct Check;

impl Check {
    /// Fails for a base path that is only a root, like `/` or `C:\`
    ///
    /// Relative bases such as `.` or `..` name a directory and pass.
    pub fn check_base(base: &Path) -> Result<(), BuildError> {
        let root_only = base.has_root()
            && base
                .components()
                .all(|c| matches!(c, Component::RootDir | Component::Prefix(_)));
        if root_only {
            Err(BuildError::InvalidBase {
                path: base.to_path_buf(),
            })
        } else {
            Ok(())
        }
    }
}

impl Action for Check {
    fn name(&self) -> &str {
        "Check"
    }

    fn run(&self, ctx: &BuildContext) -> i32 {
        match Self::check_base(&ctx.base) {
            Ok(()) => 0,
            Err(e) => {
                error!("{e}");
                1
            }
        }
    }
}

/// Build the project
#[derive(Debug, Clone, Copy, Default)]
pub struct Build;

impl Action for Build {
    fn name(&self) -> &str {
        "Build"
    }

    fn run(&self, ctx: &BuildContext) -> i32 {
        ctx.project.build(ctx)
    }
}

/// Tool runner action
#[derive(Debug, Clone)]
pub struct Tool {
    command: Command,
}

impl Tool {
    /// Run the given command
    pub fn new(command: Command) -> Self {
        Self { command }
    }

    /// Command to run
    pub fn command(&self) -> &Command {
        &self.command
    }
}

impl Action for Tool {
    fn name(&self) -> &str {
        "Tool"
    }

    fn run(&self, ctx: &BuildContext) -> i32 {
        ctx.tools.execute(&self.command, &ctx.out, &ctx.err)
    }
}

/// Download files from the URIs into the destination directory
#[derive(Debug, Clone)]
pub struct Download {
    destination: PathBuf,
    uris: Vec<String>,
}

impl Download {
    /// Download every URI into `destination`
    pub fn new(destination: impl Into<PathBuf>, uris: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            destination: destination.into(),
            uris: uris.into_iter().map(Into::into).collect(),
        }
    }

    async fn download_all(&self, downloader: &Downloader) -> Result<(), crate::error::DownloadError> {
        for uri in &self.uris {
            downloader.download(uri, &self.destination).await?;
        }
        Ok(())
    }
}

impl Action for Download {
    fn name(&self) -> &str {
        "Download"
    }

    fn run(&self, ctx: &BuildContext) -> i32 {
        debug!(
            "Downloading {} file(s) to {}...",
            self.uris.len(),
            self.destination.display()
        );
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Download failed: {e}");
                return 1;
            }
        };
        let downloader = match Downloader::new(ctx.config.get_bool(Property::Offline)) {
            Ok(downloader) => downloader,
            Err(e) => {
                error!("Download failed: {e}");
                return 1;
            }
        };
        match runtime.block_on(self.download_all(&downloader)) {
            Ok(()) => 0,
            Err(e) => {
                error!("Download failed: {e}");
                1
            }
        }
    }
}

/// Copy selected files from one directory tree to another
#[derive(Clone)]
pub struct TreeCopy {
    source: PathBuf,
    target: PathBuf,
    filter: PathFilter,
}

impl TreeCopy {
    /// Copy every file
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self::filtered(source, target, Arc::new(|_: &Path| true))
    }

    /// Copy files accepted by `filter`
    pub fn filtered(source: impl Into<PathBuf>, target: impl Into<PathBuf>, filter: PathFilter) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            filter,
        }
    }
}

impl fmt::Debug for TreeCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeCopy")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Action for TreeCopy {
    fn name(&self) -> &str {
        "TreeCopy"
    }

    fn run(&self, _: &BuildContext) -> i32 {
        match tree::copy(&self.source, &self.target, self.filter.as_ref()) {
            Ok(CopyOutcome::Copied { files, entries }) => {
                debug!("Copied {files} file(s) of {entries} elements.");
                0
            }
            Ok(CopyOutcome::Skipped) => 0,
            Ok(CopyOutcome::SourceNotDirectory) => 1,
            Ok(CopyOutcome::TargetNotDirectory) => 2,
            Ok(CopyOutcome::TargetInsideSource) => 3,
            Err(e) => {
                debug!("{e}");
                4
            }
        }
    }
}

/// Delete selected files and directories below and including a root
#[derive(Clone)]
pub struct TreeDelete {
    root: PathBuf,
    filter: PathFilter,
}

impl TreeDelete {
    /// Delete the whole tree
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::filtered(root, Arc::new(|_: &Path| true))
    }

    /// Delete entries accepted by `filter`
    pub fn filtered(root: impl Into<PathBuf>, filter: PathFilter) -> Self {
        Self {
            root: root.into(),
            filter,
        }
    }
}

impl fmt::Debug for TreeDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeDelete")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Action for TreeDelete {
    fn name(&self) -> &str {
        "TreeDelete"
    }

    fn run(&self, _: &BuildContext) -> i32 {
        match tree::delete(&self.root, self.filter.as_ref()) {
            Ok(()) => 0,
            Err(e) => {
                error!("Deleting tree failed: {e}");
                1
            }
        }
    }
}

/// Walk a directory tree, emitting one line per entry
#[derive(Clone)]
pub struct TreeWalk {
    root: PathBuf,
    out: LineSink,
}

impl TreeWalk {
    /// Walk `root`, sending lines to `out`
    pub fn new(root: impl Into<PathBuf>, out: LineSink) -> Self {
        Self {
            root: root.into(),
            out,
        }
    }
}

impl fmt::Debug for TreeWalk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeWalk")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Action for TreeWalk {
    fn name(&self) -> &str {
        "TreeWalk"
    }

    fn run(&self, _: &BuildContext) -> i32 {
        match tree::walk(&self.root, |line| (self.out)(line)) {
            Ok(()) => 0,
            Err(e) => {
                debug!("{e}");
                1
            }
        }
    }
}

/// Ordered, fail-fast sequence of actions
#[derive(Default)]
pub struct Pipeline {
    actions: Vec<Box<dyn Action>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.actions.iter().map(|a| a.name()))
            .finish()
    }
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Banner, check, build
    pub fn default_build() -> Self {
        Self::new().then(Banner).then(Check).then(Build)
    }

    /// Banner, check, then run the command
    pub fn tool(command: Command) -> Self {
        Self::new().then(Banner).then(Check).then(Tool::new(command))
    }

    /// Append an action
    #[must_use]
    pub fn then(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    /// Append a boxed action
    pub fn push(&mut self, action: Box<dyn Action>) {
        self.actions.push(action);
    }

    /// Names of the actions in order
    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    /// Run the actions in order, returning the first non-zero code or zero
    pub fn run(&self, ctx: &BuildContext) -> i32 {
        if self.actions.is_empty() {
            warn!("No actions to run...");
        }
        for action in &self.actions {
            debug!("Running action {}...", action.name());
            let code = action.run(ctx);
            if code != 0 {
                error!("Action {} failed with error code: {code}", action.name());
                return code;
            }
            debug!("Action {} succeeded.", action.name());
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::infra::tool::sink;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    struct Counted {
        code: i32,
        calls: Arc<AtomicUsize>,
    }

    impl Action for Counted {
        fn name(&self) -> &str {
            "Counted"
        }

        fn run(&self, _: &BuildContext) -> i32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.code
        }
    }

    fn context(base: &Path) -> BuildContext {
        BuildContext::new(base, Config::default(), &BTreeSet::new()).unwrap()
    }

    #[test]
    fn test_pipeline_stops_at_first_failure() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pipeline = Pipeline::new();
        for code in [0, 0, 5, 0] {
            pipeline.push(Box::new(Counted {
                code,
                calls: Arc::clone(&calls),
            }));
        }
        assert_eq!(pipeline.run(&ctx), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_pipeline_all_success() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path());
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .then(Counted { code: 0, calls: Arc::clone(&calls) })
            .then(Counted { code: 0, calls: Arc::clone(&calls) });
        assert_eq!(pipeline.run(&ctx), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[traced_test]
    fn test_empty_pipeline_succeeds_with_warning() {
        let temp = TempDir::new().unwrap();
        assert_eq!(Pipeline::new().run(&context(temp.path())), 0);
        assert!(logs_contain("No actions to run"));
    }

    #[test]
    fn test_default_sequences() {
        assert_eq!(Pipeline::default_build().names(), ["Banner", "Check", "Build"]);
        assert_eq!(Pipeline::tool(Command::new("javac")).names(), ["Banner", "Check", "Tool"]);
    }

    #[test]
    fn test_check_base() {
        assert!(Check::check_base(Path::new("/")).is_err());
        assert!(Check::check_base(Path::new("project")).is_ok());
        assert!(Check::check_base(Path::new(".")).is_ok());
        assert!(Check::check_base(Path::new("..")).is_ok());
        assert!(Check::check_base(Path::new("")).is_ok());
        assert!(Check::check_base(Path::new("/home/user/project")).is_ok());
    }

    #[test]
    fn test_check_action_codes() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(temp.path());
        assert_eq!(Check.run(&ctx), 0);
        ctx.base = PathBuf::from(".");
        assert_eq!(Check.run(&ctx), 0);
        ctx.base = PathBuf::from("/");
        assert_eq!(Check.run(&ctx), 1);
        assert_eq!(Pipeline::default_build().run(&ctx), 1);
    }

    #[test]
    fn test_banner_succeeds() {
        let temp = TempDir::new().unwrap();
        assert_eq!(Banner.run(&context(temp.path())), 0);
    }

    #[test]
    fn test_tool_action_uses_context_sinks() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("x.txt"), "").unwrap();
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&lines);
        let ctx = context(temp.path()).with_output(
            sink(move |line| captured.lock().unwrap().push(line.to_string())),
            sink(|_| {}),
        );
        let mut command = Command::new("tree");
        command.add(temp.path());
        assert_eq!(Tool::new(command).run(&ctx), 0);
        assert_eq!(lines.lock().unwrap().last().map(String::as_str), Some("./x.txt"));
    }

    #[test]
    fn test_tree_actions() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path());
        let source = temp.path().join("a");
        std::fs::create_dir_all(source.join("b")).unwrap();
        std::fs::write(source.join("b/keep.txt"), "").unwrap();
        std::fs::write(source.join("drop.txt"), "").unwrap();

        let copy = TreeCopy::filtered(
            &source,
            temp.path().join("c"),
            Arc::new(|p: &Path| p.ends_with("keep.txt")),
        );
        assert_eq!(copy.run(&ctx), 0);
        assert!(temp.path().join("c/b/keep.txt").is_file());
        assert!(!temp.path().join("c/drop.txt").exists());
        assert_eq!(TreeCopy::new(&source, source.join("b")).run(&ctx), 3);

        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&lines);
        let walk = TreeWalk::new(
            temp.path().join("c"),
            sink(move |line| captured.lock().unwrap().push(line.to_string())),
        );
        assert_eq!(walk.run(&ctx), 0);
        assert_eq!(lines.lock().unwrap().len(), 4);

        assert_eq!(TreeDelete::new(temp.path().join("c")).run(&ctx), 0);
        assert!(!temp.path().join("c").exists());
        assert_eq!(TreeWalk::new(temp.path().join("c"), sink(|_| {})).run(&ctx), 1);
    }

    #[test]
    fn test_download_offline_missing_fails() {
        let temp = TempDir::new().unwrap();
        let env = BTreeMap::from([("BACH_OFFLINE".to_string(), "true".to_string())]);
        let ctx = BuildContext::new(temp.path(), Config::new(env, toml::Table::new()), &BTreeSet::new())
            .unwrap();
        let download = Download::new(temp.path().join("lib"), ["https://host/x.jar"]);
        assert_eq!(download.run(&ctx), 1);

        std::fs::create_dir_all(temp.path().join("lib")).unwrap();
        std::fs::write(temp.path().join("lib/x.jar"), "").unwrap();
        assert_eq!(download.run(&ctx), 0);
    }
}
