//! Module descriptor parsing and external module resolution
//!
//! A descriptor is the text of a `module-info.java` unit:
//!
//! ```text
//! module foo.bar {
//!   requires baz;
//!   requires transitive qux;
//! }
//! ```
//!
//! Only the module name and the names of required modules are extracted.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::config::defaults;
use crate::error::DescriptorError;

fn comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)/\*.*?\*/|//[^\n]*").expect("comment pattern is valid")
    })
}

fn module_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\bmodule\s+([A-Za-z_$][\w$]*(?:\s*\.\s*[A-Za-z_$][\w$]*)*)\s*\{(.*)\}")
            .expect("module pattern is valid")
    })
}

fn requires_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\brequires\s+([^;]+);").expect("requires pattern is valid"))
}

/// Name and required modules of a single module descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    name: String,
    requires: BTreeSet<String>,
}

impl ModuleDescriptor {
    /// Parse descriptor text
    ///
    /// Modifiers in front of a required name (`transitive`, `static`) are
    /// dropped: the last token before the semicolon is the module name.
    pub fn parse(source: &str) -> Result<Self, DescriptorError> {
        let text = comment_pattern().replace_all(source, " ");
        let captures = module_pattern()
            .captures(&text)
            .ok_or_else(|| DescriptorError::Format {
                source_text: source.to_string(),
            })?;
        let name: String = captures[1].split_whitespace().collect();
        let requires = requires_pattern()
            .captures_iter(&captures[2])
            .filter_map(|c| c[1].split_whitespace().last().map(str::to_string))
            .collect();
        Ok(Self { name, requires })
    }

    /// Read and parse a descriptor file, or `module-info.java` inside a directory
    pub fn read(path: &Path) -> Result<Self, DescriptorError> {
        let file = if path.is_dir() {
            path.join(defaults::DESCRIPTOR_FILE)
        } else {
            path.to_path_buf()
        };
        let source = std::fs::read_to_string(&file).map_err(|e| DescriptorError::Read {
            path: file.clone(),
            error: e.to_string(),
        })?;
        Self::parse(&source)
    }

    /// Declared module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of required modules
    pub fn requires(&self) -> &BTreeSet<String> {
        &self.requires
    }
}

/// Find all descriptor files below the roots, in sorted order
///
/// Roots that do not exist contribute nothing.
pub fn find_descriptors<I, P>(roots: I) -> Result<Vec<PathBuf>, DescriptorError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut paths = Vec::new();
    for root in roots {
        let root = root.as_ref();
        if !root.exists() {
            continue;
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| DescriptorError::Walk {
                path: root.to_path_buf(),
                error: e.to_string(),
            })?;
            if entry.file_type().is_file() && entry.file_name() == defaults::DESCRIPTOR_FILE {
                paths.push(entry.into_path());
            }
        }
    }
    Ok(paths)
}

/// Declared and required module names found below a set of roots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleScan {
    /// Declared module name to descriptor path
    ///
    /// The same name declared under several roots collapses into one entry;
    /// the first descriptor in scan order wins.
    pub declared: BTreeMap<String, PathBuf>,
    /// Union of all required module names
    pub required: BTreeSet<String>,
}

impl ModuleScan {
    /// Scan and parse every descriptor below the roots
    pub fn of<I, P>(roots: I) -> Result<Self, DescriptorError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut scan = Self::default();
        for path in find_descriptors(roots)? {
            let descriptor = ModuleDescriptor::read(&path)?;
            scan.required.extend(descriptor.requires.iter().cloned());
            scan.declared.entry(descriptor.name).or_insert(path);
        }
        Ok(scan)
    }

    /// Required modules that are neither declared here nor provided by the platform
    pub fn external(&self, platform: &BTreeSet<String>) -> BTreeSet<String> {
        self.required
            .iter()
            .filter(|name| !self.declared.contains_key(*name) && !platform.contains(*name))
            .cloned()
            .collect()
    }
}

/// Calculate external module names of the roots
pub fn external_modules<I, P>(
    roots: I,
    platform: &BTreeSet<String>,
) -> Result<BTreeSet<String>, DescriptorError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    Ok(ModuleScan::of(roots)?.external(platform))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::MIN_PROPTEST_ITERATIONS;
    use crate::test_utils::generators;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn write_descriptor(root: &Path, module: &str, text: &str) {
        let dir = root.join(module);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("module-info.java"), text).unwrap();
    }

    #[test]
    fn test_parse_drops_modifiers() {
        let d = ModuleDescriptor::parse("module foo.bar { requires baz; requires transitive qux; }")
            .unwrap();
        assert_eq!(d.name(), "foo.bar");
        assert_eq!(d.requires(), &set(&["baz", "qux"]));
    }

    #[test]
    fn test_parse_without_requires() {
        let d = ModuleDescriptor::parse("module a {}").unwrap();
        assert_eq!(d.name(), "a");
        assert!(d.requires().is_empty());
    }

    #[test]
    fn test_parse_multiline_with_comments() {
        let source = r"
            /** The module foo.
             *  requires commented.out;
             */
            open module de.sormuras.demo
            {
              // requires also.commented;
              requires static
                  java.compiler;
              requires org.junit.jupiter.api; // trailing
              exports de.sormuras.demo;
            }
        ";
        let d = ModuleDescriptor::parse(source).unwrap();
        assert_eq!(d.name(), "de.sormuras.demo");
        assert_eq!(d.requires(), &set(&["java.compiler", "org.junit.jupiter.api"]));
    }

    #[test]
    fn test_parse_duplicates_collapse() {
        let d = ModuleDescriptor::parse("module a { requires b; requires transitive b; }").unwrap();
        assert_eq!(d.requires(), &set(&["b"]));
    }

    #[test]
    fn test_parse_rejects_missing_declaration() {
        let result = ModuleDescriptor::parse("class Foo {}");
        assert!(matches!(result, Err(DescriptorError::Format { .. })));
    }

    #[test]
    fn test_parse_rejects_missing_body() {
        assert!(ModuleDescriptor::parse("module a;").is_err());
    }

    #[test]
    fn test_read_directory_resolves_descriptor() {
        let temp = TempDir::new().unwrap();
        write_descriptor(temp.path(), "a", "module a { requires b; }");
        let d = ModuleDescriptor::read(&temp.path().join("a")).unwrap();
        assert_eq!(d.name(), "a");
    }

    #[test]
    fn test_read_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let result = ModuleDescriptor::read(&temp.path().join("nope.java"));
        assert!(matches!(result, Err(DescriptorError::Read { .. })));
    }

    #[test]
    fn test_external_modules_empty_when_all_declared() {
        let temp = TempDir::new().unwrap();
        write_descriptor(temp.path(), "A", "module A { requires B; }");
        write_descriptor(temp.path(), "B", "module B {}");
        let external = external_modules([temp.path()], &BTreeSet::new()).unwrap();
        assert!(external.is_empty());
    }

    #[test]
    fn test_external_modules_reports_undeclared() {
        let temp = TempDir::new().unwrap();
        write_descriptor(temp.path(), "A", "module A { requires C; requires java.base; }");
        let external = external_modules([temp.path()], &set(&["java.base"])).unwrap();
        assert_eq!(external, set(&["C"]));
    }

    #[test]
    fn test_external_modules_across_roots() {
        let main = TempDir::new().unwrap();
        let test = TempDir::new().unwrap();
        write_descriptor(main.path(), "app", "module app { requires lib; }");
        write_descriptor(test.path(), "it", "module it { requires app; requires junit; }");

        let scan = ModuleScan::of([main.path(), test.path()]).unwrap();
        assert_eq!(scan.declared.len(), 2);
        assert_eq!(scan.external(&BTreeSet::new()), set(&["junit", "lib"]));
    }

    #[test]
    fn test_duplicate_declarations_collapse() {
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();
        write_descriptor(one.path(), "a", "module a { requires x; }");
        write_descriptor(two.path(), "a", "module a { requires y; }");

        let scan = ModuleScan::of([one.path(), two.path()]).unwrap();
        assert_eq!(scan.declared.len(), 1);
        assert!(scan.declared["a"].starts_with(one.path()));
        assert_eq!(scan.required, set(&["x", "y"]));
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let temp = TempDir::new().unwrap();
        let scan = ModuleScan::of([temp.path().join("missing")]).unwrap();
        assert_eq!(scan, ModuleScan::default());
    }

    #[test]
    fn test_broken_descriptor_fails_scan() {
        let temp = TempDir::new().unwrap();
        write_descriptor(temp.path(), "bad", "this is not a module");
        assert!(ModuleScan::of([temp.path()]).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(MIN_PROPTEST_ITERATIONS))]

        #[test]
        fn test_parse_recovers_names(
            name in generators::module_name(4),
            required in proptest::collection::btree_set(generators::module_name(3), 0..6),
            transitive in any::<bool>(),
        ) {
            let modifier = if transitive { "transitive " } else { "" };
            let clauses: String = required
                .iter()
                .map(|r| format!("\n  requires {modifier}{r};"))
                .collect();
            let source = format!("module {name} {{{clauses}\n}}\n");
            let d = ModuleDescriptor::parse(&source).unwrap();
            prop_assert_eq!(d.name(), name.as_str());
            prop_assert_eq!(d.requires(), &required);
        }
    }
}
