//! Multi-file configuration loading.
//!
//! The main file may name further files or directories under
//! [`CONFIGS_KEY`]. Each target is merged into the shared document in the
//! declared order, later files replacing whole top-level keys of earlier ones.
//!
//! ## Rules
//! - Relative targets are resolved against the working directory, never
//!   against the directory of the main file.
//! - Missing or unclassifiable targets are skipped.
//! - A directory contributes its immediate regular files in lexicographic
//!   order; subdirectories are ignored.
//! - Included files cannot declare [`CONFIGS_KEY`] themselves.
//! - The main file cannot include itself.

use crate::document::{Document, Node};
use crate::error::{ConfigError, ConfigResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Top-level key listing the files and directories to include.
pub const CONFIGS_KEY: &str = "config_files";

/// Split a `dotted.path=value` command-line option.
pub fn parse_override(option: &str) -> ConfigResult<(&str, &str)> {
    match option.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(ConfigError::InvalidOverride {
            option: option.to_string(),
        }),
    }
}

/// Write each `key=value` option into `doc` as a scalar.
pub fn apply_overrides(doc: &mut Document, overrides: &[String]) -> ConfigResult<()> {
    for option in overrides {
        let (key, value) = parse_override(option)?;
        doc.set_scalar(key, value)?;
        debug!(key, value, "Applied command-line option");
    }
    Ok(())
}

/// Resolves the include graph of a main configuration file.
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    working_dir: PathBuf,
}

impl IncludeResolver {
    /// Resolver for relative paths under `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    /// Resolver bound to the process's current directory.
    pub fn from_current_dir() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::io(".", e))?;
        Ok(Self::new(cwd))
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Absolute form of `path`, relative paths joined to the working directory.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// Load `main_path`, apply `overrides` and merge every include into `doc`.
    ///
    /// Returns the files that were loaded, main file first.
    pub fn load(
        &self,
        doc: &mut Document,
        main_path: &Path,
        overrides: &[String],
    ) -> ConfigResult<Vec<PathBuf>> {
        let main_resolved = self.resolve_path(main_path);
        let main_doc = self.parse_document(doc.env(), &main_resolved)?;

        let entries: Vec<String> = main_doc.get_sequence(CONFIGS_KEY);
        for entry in &entries {
            if Path::new(entry) == main_path
                || same_file(&self.resolve_path(entry), &main_resolved)
            {
                return Err(ConfigError::CyclicInclude {
                    path: main_resolved,
                });
            }
        }

        doc.merge_top_level(main_doc.into_root());
        debug!(path = %main_resolved.display(), "Loaded main config file");
        let mut loaded = vec![main_resolved.clone()];

        apply_overrides(doc, overrides)?;
        self.merge_includes(doc, Some(&main_resolved), &mut loaded)?;
        // Command-line options keep priority over included files.
        apply_overrides(doc, overrides)?;

        Ok(loaded)
    }

    /// Build `doc` from command-line options alone.
    ///
    /// Files named by a command-line include directive are still merged.
    pub fn load_overrides(
        &self,
        doc: &mut Document,
        overrides: &[String],
    ) -> ConfigResult<Vec<PathBuf>> {
        let mut loaded = Vec::new();
        apply_overrides(doc, overrides)?;
        self.merge_includes(doc, None, &mut loaded)?;
        apply_overrides(doc, overrides)?;
        Ok(loaded)
    }

    fn merge_includes(
        &self,
        doc: &mut Document,
        main: Option<&Path>,
        loaded: &mut Vec<PathBuf>,
    ) -> ConfigResult<()> {
        let entries: Vec<String> = doc.get_sequence(CONFIGS_KEY);

        for entry in entries.iter().filter(|e| !e.is_empty()) {
            let target = self.resolve_path(entry);
            let metadata = match fs::metadata(&target) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %target.display(), error = %e, "Skipping config include");
                    continue;
                }
            };

            if metadata.is_dir() {
                for file in directory_files(&target) {
                    self.merge_file(doc, &file, main, loaded)?;
                }
            } else if metadata.is_file() {
                self.merge_file(doc, &target, main, loaded)?;
            } else {
                warn!(path = %target.display(), "Skipping config include that is not a file or directory");
            }
        }

        Ok(())
    }

    fn merge_file(
        &self,
        doc: &mut Document,
        path: &Path,
        main: Option<&Path>,
        loaded: &mut Vec<PathBuf>,
    ) -> ConfigResult<()> {
        if let Some(main) = main
            && same_file(path, main)
        {
            return Err(ConfigError::CyclicInclude {
                path: main.to_path_buf(),
            });
        }

        let included = self.parse_document(doc.env(), path)?;
        if included.is_defined(CONFIGS_KEY) {
            return Err(ConfigError::IllegalNestedInclude {
                path: path.to_path_buf(),
                key: CONFIGS_KEY.to_string(),
            });
        }

        doc.merge_top_level(included.into_root());
        debug!(path = %path.display(), "Merged included config file");
        loaded.push(path.to_path_buf());
        Ok(())
    }

    fn parse_document(
        &self,
        env: &Arc<dyn crate::env::EnvLookup>,
        path: &Path,
    ) -> ConfigResult<Document> {
        let mut document = Document::with_env(Arc::clone(env));
        document.load_from_file(path)?;
        if !matches!(document.root(), Node::Mapping(_)) {
            return Err(ConfigError::parse(
                path.display().to_string(),
                "top-level value must be a mapping",
            ));
        }
        Ok(document)
    }
}

/// Immediate regular files of `dir`, sorted by file name.
fn directory_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Skipping unreadable config directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

/// Whether two paths name the same file, falling back to a lexical comparison
/// when either cannot be canonicalized.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use tempfile::TempDir;

    fn doc() -> Document {
        Document::with_env(Arc::new(MapEnv::new()))
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override("a.b=c").unwrap(), ("a.b", "c"));
        assert_eq!(parse_override("a=b=c").unwrap(), ("a", "b=c"));
        assert_eq!(parse_override("a=").unwrap(), ("a", ""));
        assert!(parse_override("novalue").is_err());
        assert!(parse_override("=value").is_err());
    }

    #[test]
    fn test_resolve_path_uses_working_dir() {
        let resolver = IncludeResolver::new("/work");
        assert_eq!(resolver.resolve_path("a.yaml"), PathBuf::from("/work/a.yaml"));
        assert_eq!(resolver.resolve_path("/etc/a.yaml"), PathBuf::from("/etc/a.yaml"));
    }

    #[test]
    fn test_directory_files_sorted_and_flat() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.yaml"), "b: 1\n").unwrap();
        fs::write(temp.path().join("a.yaml"), "a: 1\n").unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested/c.yaml"), "c: 1\n").unwrap();

        let names: Vec<_> = directory_files(temp.path())
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.yaml", "b.yaml"]);
    }

    #[test]
    fn test_non_mapping_include_is_parse_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("main.yaml"), "config_files: list.yaml\n").unwrap();
        fs::write(temp.path().join("list.yaml"), "- a\n- b\n").unwrap();

        let resolver = IncludeResolver::new(temp.path());
        let err = resolver
            .load(&mut doc(), Path::new("main.yaml"), &[])
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ParseError);
    }

    #[test]
    fn test_overrides_win_over_includes() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("main.yaml"), "config_files: extra.yaml\nlevel: info\n")
            .unwrap();
        fs::write(temp.path().join("extra.yaml"), "level: debug\n").unwrap();

        let resolver = IncludeResolver::new(temp.path());
        let mut document = doc();
        resolver
            .load(&mut document, Path::new("main.yaml"), &["level=warning".to_string()])
            .unwrap();
        assert_eq!(document.get_scalar("level", String::new()), "warning");
    }
}
