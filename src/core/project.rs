//! Project object model
//!
//! A [`Project`] owns an ordered list of [`Realm`]s. Each realm derives its
//! source directory from the directory layout and its target directory from
//! its name, and knows the modules it declares and the external modules it
//! requires.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::config::{defaults, Config, Property};
use crate::core::command::Command;
use crate::core::context::BuildContext;
use crate::core::descriptor::ModuleScan;
use crate::error::{BuildError, DescriptorError};

/// Building block, source set, scope, directory, named context: `main`, `test`
#[derive(Debug, Clone)]
pub struct Realm {
    name: String,
    source: PathBuf,
    resolved: bool,
    target: PathBuf,
    parent: Option<String>,
    parent_target: Option<PathBuf>,
    declared_modules: BTreeMap<String, PathBuf>,
    external_modules: BTreeSet<String>,
}

impl Realm {
    /// Layout candidates in priority order
    ///
    /// The bare `src` directory only belongs to a realm without a parent.
    pub fn source_candidates(base: &Path, name: &str, has_parent: bool) -> Vec<PathBuf> {
        let mut candidates = vec![
            base.join("src").join(name).join("java"),
            base.join("src").join(name),
        ];
        if !has_parent {
            candidates.push(base.join("src"));
        }
        candidates
    }

    /// Create a realm, resolving its directories and module sets
    ///
    /// Fails only when a module descriptor below the scanned sources cannot
    /// be read or parsed.
    pub fn new(
        name: &str,
        base: &Path,
        parent: Option<&Realm>,
        platform: &BTreeSet<String>,
    ) -> Result<Self, DescriptorError> {
        let candidate = Self::source_candidates(base, name, parent.is_some())
            .into_iter()
            .find(|p| p.is_dir());
        let resolved = candidate.is_some();
        let source = candidate.unwrap_or_else(|| base.to_path_buf());
        let target = base.join(defaults::COMPILED_DIR).join(name);

        let mut roots = Vec::new();
        if resolved {
            roots.push(source.clone());
        }
        if let Some(parent) = parent.filter(|p| p.resolved) {
            roots.push(parent.source.clone());
        }
        let scan = ModuleScan::of(&roots)?;
        let external_modules = scan.external(platform);
        debug!(
            "Realm {name}: source {}, {} declared, {} external module(s)",
            source.display(),
            scan.declared.len(),
            external_modules.len()
        );

        Ok(Self {
            name: name.to_string(),
            source,
            resolved,
            target,
            parent: parent.map(|p| p.name.clone()),
            parent_target: parent.map(|p| p.target.clone()),
            declared_modules: scan.declared,
            external_modules,
        })
    }

    /// Realm name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved source directory, or the base directory when no layout matched
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Whether a layout candidate existed
    pub fn has_source(&self) -> bool {
        self.resolved && self.source.is_dir()
    }

    /// Target directory for compiled classes
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Name of the parent realm
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Declared module names mapped to their descriptor files, including the parent's
    pub fn declared_modules(&self) -> &BTreeMap<String, PathBuf> {
        &self.declared_modules
    }

    /// Required modules neither declared nor provided by the platform
    pub fn external_modules(&self) -> &BTreeSet<String> {
        &self.external_modules
    }

    /// Build the compiler invocation for this realm
    ///
    /// `module_cache` goes on the module path when it exists, as does the
    /// parent realm's target directory.
    pub fn compile_command(&self, module_cache: &Path) -> Result<Command, BuildError> {
        let mut javac = Command::new(defaults::COMPILER);
        javac.add("-d").add(&self.target);

        let module_path: Vec<&Path> = self
            .parent_target
            .as_deref()
            .into_iter()
            .chain(Some(module_cache))
            .filter(|p| p.exists())
            .collect();
        if !module_path.is_empty() {
            javac.add("--module-path").add_paths(module_path);
        }

        javac.add("--module-source-path").add(&self.source);

        javac
            .add_all_source_files([&self.source])
            .map_err(|e| BuildError::Scan {
                realm: self.name.clone(),
                error: e.to_string(),
            })?;
        Ok(javac)
    }

    /// Compile all sources of this realm
    ///
    /// Without a source directory this is a no-op.
    pub fn compile(&self, ctx: &BuildContext) -> Result<(), BuildError> {
        debug!("Compiling {}", self.name);
        if !self.has_source() {
            info!(
                "Skip compile for {}! No source path exists: {}",
                self.name,
                self.source.display()
            );
            return Ok(());
        }
        let module_cache = ctx.based(ctx.config.get(Property::PathCacheModules));
        let javac = self.compile_command(&module_cache)?;
        javac.dump(|line| debug!("{line}"));
        let code = ctx.tools.execute(&javac, &ctx.out, &ctx.err);
        if code != 0 {
            return Err(BuildError::CompileFailed {
                realm: self.name.clone(),
                code,
            });
        }
        Ok(())
    }
}

/// Bach's project object model
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    version: String,
    dormant: bool,
    realms: Vec<Realm>,
}

impl Project {
    /// Derive the project from configuration and the layout below `base`
    pub fn new(base: &Path, config: &Config, platform: &BTreeSet<String>) -> Result<Self, DescriptorError> {
        let default_name = base
            .file_name()
            .map_or_else(|| defaults::PROJECT_NAME.to_string(), |n| n.to_string_lossy().into_owned());
        let main = Realm::new(defaults::MAIN_REALM, base, None, platform)?;
        let test = Realm::new(defaults::TEST_REALM, base, Some(&main), platform)?;
        Ok(Self {
            name: config.get_or(Property::ProjectName.key(), &default_name),
            version: config.get(Property::ProjectVersion),
            dormant: config.get_bool(Property::ProjectDormant),
            realms: vec![main, test],
        })
    }

    /// Project name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Project version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether building is suppressed
    pub fn is_dormant(&self) -> bool {
        self.dormant
    }

    /// Suppress or enable building
    pub fn set_dormant(&mut self, dormant: bool) {
        self.dormant = dormant;
    }

    /// Realms in declaration order
    pub fn realms(&self) -> &[Realm] {
        &self.realms
    }

    /// Realm with the given name
    pub fn realm(&self, name: &str) -> Option<&Realm> {
        self.realms.iter().find(|r| r.name == name)
    }

    /// Compile every realm in order, stopping at the first failure
    pub fn build(&self, ctx: &BuildContext) -> i32 {
        if self.dormant {
            info!("Dormant mode is enabled, not building {}.", self.name);
            return 0;
        }
        for realm in &self.realms {
            if let Err(e) = realm.compile(ctx) {
                error!("Building project failed: {e}");
                return 1;
            }
        }
        0
    }
}
