//! Command line builder
//!
//! A [`Command`] is a tool name plus an ordered argument list. Arguments are
//! kept exactly in call order: nothing is reordered or deduplicated.

use std::ffi::OsStr;
use std::path::Path;

use walkdir::WalkDir;

use crate::config::defaults;
use crate::error::FilesystemError;

/// Separator used when joining paths into a single argument
#[cfg(windows)]
pub const PATH_SEPARATOR: &str = ";";
/// Separator used when joining paths into a single argument
#[cfg(not(windows))]
pub const PATH_SEPARATOR: &str = ":";

/// Test supplied path for pointing to a buildable source unit file
///
/// True for a regular file whose name ends with `.java` and contains exactly
/// one dot, so `a.java` qualifies while `a.b.java` and `a.java.bak` do not.
pub fn is_buildable_source(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(is_source_name)
}

fn is_source_name(name: &str) -> bool {
    name.ends_with(defaults::SOURCE_EXTENSION) && name.matches('.').count() == 1
}

/// Tool invocation under construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    arguments: Vec<String>,
}

impl Command {
    /// Create a command for the named tool with no arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    /// Tool name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments in call order
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Add a single argument
    pub fn add(&mut self, argument: impl AsRef<OsStr>) -> &mut Self {
        self.arguments
            .push(argument.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add a single argument composed of the paths joined by [`PATH_SEPARATOR`]
    pub fn add_paths<I, P>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let joined = paths
            .into_iter()
            .map(|p| p.as_ref().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR);
        self.add(joined)
    }

    /// Add every element as its own argument
    pub fn add_all<I, A>(&mut self, arguments: I) -> &mut Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        for argument in arguments {
            self.add(argument);
        }
        self
    }

    /// Add all files below the roots accepted by `predicate`
    ///
    /// Roots that do not exist are skipped silently.
    pub fn add_all_files<I, P, F>(&mut self, roots: I, predicate: F) -> Result<&mut Self, FilesystemError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
        F: Fn(&Path) -> bool,
    {
        for root in roots {
            let root = root.as_ref();
            if !root.exists() {
                continue;
            }
            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = entry.map_err(|e| FilesystemError::Walk {
                    path: root.to_path_buf(),
                    error: e.to_string(),
                })?;
                if predicate(entry.path()) {
                    self.add(entry.path());
                }
            }
        }
        Ok(self)
    }

    /// Add all buildable source files below the roots
    pub fn add_all_source_files<I, P>(&mut self, roots: I) -> Result<&mut Self, FilesystemError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.add_all_files(roots, is_buildable_source)
    }

    /// Emit the tool name and each argument, one per line
    ///
    /// Non-flag arguments are indented by two spaces.
    pub fn dump(&self, mut sink: impl FnMut(&str)) -> &Self {
        sink(&self.name);
        for argument in &self.arguments {
            if argument.starts_with('-') {
                sink(argument);
            } else {
                sink(&format!("  {argument}"));
            }
        }
        self
    }
}
