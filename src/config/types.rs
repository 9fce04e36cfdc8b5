//! Typed sections read out of the merged configuration.

use crate::document::{Document, FromNode, Node, coerce};
use crate::env::EnvLookup;
use serde::Serialize;

/// Default port for the embedded web server.
pub const DEFAULT_WEBSERVER_PORT: u16 = 8765;

/// Default listen address for the embedded web server.
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0";

/// Embedded web server settings (`webserver.*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebserverConfig {
    /// Whether the web server should be started.
    pub enabled: bool,

    /// Validated IPv4 or IPv6 listen address.
    pub listen_address: String,

    /// TCP port to listen on.
    pub listen_port: u16,

    /// Serve over TLS.
    pub ssl_enabled: bool,
}

impl Default for WebserverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            listen_port: DEFAULT_WEBSERVER_PORT,
            ssl_enabled: false,
        }
    }
}

impl WebserverConfig {
    /// Read the section from `doc`, falling back to defaults per field.
    ///
    /// The listen address is not validated here.
    pub fn from_document(doc: &Document) -> Self {
        let defaults = Self::default();
        Self {
            enabled: doc.get_scalar("webserver.enabled", defaults.enabled),
            listen_address: doc.get_scalar("webserver.listen_address", defaults.listen_address),
            listen_port: doc.get_scalar("webserver.listen_port", defaults.listen_port),
            ssl_enabled: doc.get_scalar("webserver.ssl_enabled", defaults.ssl_enabled),
        }
    }
}

/// One entry of the `plugins` sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginConfig {
    pub name: String,
    pub library_path: String,
    /// Init configuration; a mapping is rendered back to YAML text.
    pub init_config: String,
    pub open_params: String,
}

impl FromNode for PluginConfig {
    fn from_node(node: &Node, env: &dyn EnvLookup) -> Self {
        let field = |key: &str| coerce(node.get(key), env, String::new());

        let init_config = match node.get("init_config") {
            Some(structured @ (Node::Mapping(_) | Node::Sequence(_))) => {
                serde_yaml::to_string(&structured.to_yaml(Some(env))).unwrap_or_default()
            }
            other => coerce(other, env, String::new()),
        };

        Self {
            name: field("name"),
            library_path: field("library_path"),
            init_config,
            open_params: field("open_params"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use std::sync::Arc;

    #[test]
    fn test_webserver_defaults() {
        let doc = Document::with_env(Arc::new(MapEnv::new()));
        let webserver = WebserverConfig::from_document(&doc);
        assert_eq!(webserver, WebserverConfig::default());
        assert_eq!(webserver.listen_port, DEFAULT_WEBSERVER_PORT);
    }

    #[test]
    fn test_webserver_reads_expanded_values() {
        let env = MapEnv::new().with("WEB_PORT", "9090");
        let mut doc = Document::with_env(Arc::new(env));
        doc.load_from_string(
            "webserver:\n  enabled: true\n  listen_address: '::1'\n  listen_port: ${WEB_PORT}\n",
        )
        .unwrap();

        let webserver = WebserverConfig::from_document(&doc);
        assert!(webserver.enabled);
        assert_eq!(webserver.listen_address, "::1");
        assert_eq!(webserver.listen_port, 9090);
        assert!(!webserver.ssl_enabled);
    }

    #[test]
    fn test_plugin_from_node() {
        let env = MapEnv::new()
            .with("ENV_VAR", "envVarValue")
            .with("ENV_VAR_INT", "12");
        let mut doc = Document::with_env(Arc::new(env));
        doc.load_from_string(
            "plugins:\n\
             \x20 - name: k8saudit\n\
             \x20   library_path: /foo/${ENV_VAR}/libk8saudit.so\n\
             \x20   open_params: ${ENV_VAR_INT}\n\
             \x20 - name: json\n\
             \x20   init_config:\n\
             \x20     sslCertificate: /etc/${ENV_VAR}.pem\n",
        )
        .unwrap();

        let plugins: Vec<PluginConfig> = doc.get_sequence("plugins");
        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0].name, "k8saudit");
        assert_eq!(plugins[0].library_path, "/foo/envVarValue/libk8saudit.so");
        assert_eq!(plugins[0].open_params, "12");
        assert_eq!(plugins[0].init_config, "");
        assert_eq!(plugins[1].name, "json");
        assert_eq!(
            plugins[1].init_config.trim(),
            "sslCertificate: /etc/envVarValue.pem"
        );
    }
}
