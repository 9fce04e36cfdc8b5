//! Agent configuration facade.
//!
//! [`AgentConfig`] owns the merged [`Document`] and the typed sections
//! derived from it. It is filled by one of two entry points:
//! - [`AgentConfig::init_from_file`]: main file, its includes, then
//!   command-line options
//! - [`AgentConfig::init`]: command-line options only
//!
//! Either call starts from an empty document, so calling it again reloads the
//! configuration from scratch. On error the configuration must not be used.

mod types;

pub use types::*;

use crate::address::validate_listen_address;
use crate::document::{Document, FromNode, FromScalar, ToScalar};
use crate::env::{EnvLookup, ProcessEnv};
use crate::error::ConfigResult;
use crate::include::IncludeResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Path of the validated web server listen address.
pub const LISTEN_ADDRESS_KEY: &str = "webserver.listen_address";

/// Merged agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// The merged document.
    pub config: Document,
    /// Web server section, validated during init.
    pub webserver: WebserverConfig,
    /// Plugins declared under `plugins`.
    pub plugins: Vec<PluginConfig>,
    /// Plugin names listed under `load_plugins`.
    pub load_plugins: Vec<String>,
    loaded_files: Vec<PathBuf>,
    working_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentConfig {
    /// Empty configuration reading the process environment.
    pub fn new() -> Self {
        Self::with_env(Arc::new(ProcessEnv))
    }

    /// Empty configuration expanding values against `env`.
    pub fn with_env(env: Arc<dyn EnvLookup>) -> Self {
        Self {
            config: Document::with_env(env),
            webserver: WebserverConfig::default(),
            plugins: Vec::new(),
            load_plugins: Vec::new(),
            loaded_files: Vec::new(),
            working_dir: None,
        }
    }

    /// Resolve relative paths under `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn resolver(&self) -> ConfigResult<IncludeResolver> {
        match &self.working_dir {
            Some(dir) => Ok(IncludeResolver::new(dir.clone())),
            None => IncludeResolver::from_current_dir(),
        }
    }

    /// Load `main_path` with its includes and `overrides`.
    ///
    /// Returns the files that were loaded, main file first.
    pub fn init_from_file(
        &mut self,
        main_path: impl AsRef<Path>,
        overrides: &[String],
    ) -> ConfigResult<Vec<PathBuf>> {
        let resolver = self.resolver()?;
        self.reset();
        let loaded = resolver.load(&mut self.config, main_path.as_ref(), overrides)?;
        self.finish(loaded)
    }

    /// Build the configuration from command-line options alone.
    pub fn init(&mut self, overrides: &[String]) -> ConfigResult<()> {
        let resolver = self.resolver()?;
        self.reset();
        let loaded = resolver.load_overrides(&mut self.config, overrides)?;
        self.finish(loaded)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.config.clear();
        self.webserver = WebserverConfig::default();
        self.plugins.clear();
        self.load_plugins.clear();
        self.loaded_files.clear();
    }

    fn finish(&mut self, loaded: Vec<PathBuf>) -> ConfigResult<Vec<PathBuf>> {
        let webserver = WebserverConfig::from_document(&self.config);
        validate_listen_address(LISTEN_ADDRESS_KEY, &webserver.listen_address)?;

        self.webserver = webserver;
        self.plugins = self.config.get_sequence("plugins");
        self.load_plugins = self.config.get_sequence("load_plugins");
        self.loaded_files = loaded.clone();

        info!(
            files = loaded.len(),
            plugins = self.plugins.len(),
            "Configuration loaded"
        );
        Ok(loaded)
    }

    /// Files merged by the last successful init, main file first.
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded_files
    }

    pub fn is_defined(&self, path: &str) -> bool {
        self.config.is_defined(path)
    }

    pub fn get_scalar<T: FromScalar>(&self, path: &str, default: T) -> T {
        self.config.get_scalar(path, default)
    }

    pub fn set_scalar<T: ToScalar + ?Sized>(&mut self, path: &str, value: &T) -> ConfigResult<()> {
        self.config.set_scalar(path, value)
    }

    pub fn get_sequence<T: FromNode, C: FromIterator<T>>(&self, path: &str) -> C {
        self.config.get_sequence(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_init_without_file_uses_defaults() {
        let mut config = AgentConfig::with_env(Arc::new(MapEnv::new())).with_working_dir("/");
        config.init(&[]).unwrap();

        assert_eq!(config.webserver.listen_address, DEFAULT_LISTEN_ADDRESS);
        assert!(config.loaded_files().is_empty());
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn test_init_reads_options() {
        let mut config = AgentConfig::with_env(Arc::new(MapEnv::new())).with_working_dir("/");
        config
            .init(&options(&[
                "webserver.enabled=true",
                "webserver.listen_port=9000",
                "load_plugins[0]=k8saudit",
            ]))
            .unwrap();

        assert!(config.webserver.enabled);
        assert_eq!(config.webserver.listen_port, 9000);
        assert_eq!(config.load_plugins, vec!["k8saudit".to_string()]);
    }

    #[test]
    fn test_reinit_starts_from_scratch() {
        let mut config = AgentConfig::with_env(Arc::new(MapEnv::new())).with_working_dir("/");
        config.init(&options(&["foo=bar"])).unwrap();
        assert!(config.is_defined("foo"));

        config.init(&options(&["other=1"])).unwrap();
        assert!(!config.is_defined("foo"));
        assert_eq!(config.get_scalar("other", 0), 1);
    }

    #[test]
    fn test_listen_address_from_environment_is_validated() {
        let env = MapEnv::new().with("LISTEN", "327.0.0.1");
        let mut config = AgentConfig::with_env(Arc::new(env)).with_working_dir("/");
        let err = config
            .init(&options(&["webserver.listen_address=${LISTEN}"]))
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ValidationError);
    }

    #[test]
    fn test_option_index_past_end_is_rejected() {
        let mut config = AgentConfig::with_env(Arc::new(MapEnv::new())).with_working_dir("/");
        for option in ["list[18446744073709551615]=x", "list[1]=x", "[0]=x"] {
            let err = config.init(&options(&[option])).unwrap_err();
            assert_eq!(err.code(), crate::error::ErrorCode::InvalidPath, "{option}");
        }

        config.init(&options(&["list[0]=a", "list[1]=b"])).unwrap();
        let list: Vec<String> = config.get_sequence("list");
        assert_eq!(list, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_invalid_option_is_rejected() {
        let mut config = AgentConfig::with_env(Arc::new(MapEnv::new())).with_working_dir("/");
        let err = config.init(&options(&["no_equals_sign"])).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidOverride);
    }
}
