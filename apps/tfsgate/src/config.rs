//! Service configuration.
//!
//! Stored as TOML. Every field has a default, so an empty file (or no
//! file at all) yields a working local setup:
//!
//! ```toml
//! listen = "0.0.0.0:8080"
//!
//! [gateway]
//! ns_addr = "10.0.0.1:8108"
//! chunk_size = 2097152
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tfsgate_gateway::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listen address.
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Settings for the built-in in-memory cluster.
    #[serde(default)]
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Caps each read/write call (0 = no cap).
    #[serde(default)]
    pub max_io: usize,
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            gateway: GatewayConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl Config {
    /// Loads `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            tracing::debug!("no configuration file given, using defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        config.gateway.validate()?;

        tracing::debug!(path = %path.display(), "configuration file loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.gateway, GatewayConfig::default());
        assert_eq!(config.memory.max_io, 0);
    }

    #[test]
    fn partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [gateway]
            ns_addr = "10.0.0.1:8108"
            "#,
        )
        .unwrap();
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.gateway.ns_addr, "10.0.0.1:8108");
        assert_eq!(config.gateway.chunk_size, 2 * 1024 * 1024);
        assert_eq!(config.gateway.put_path, "/tfs");
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tfsgate.toml");
        std::fs::write(
            &path,
            r#"
            listen = "127.0.0.1:9000"

            [gateway]
            chunk_size = 65536
            put_path = "/upload"
            get_path = "/download"
            write_policy = "lenient"

            [memory]
            max_io = 4096
            "#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.listen, "127.0.0.1:9000");
        assert_eq!(config.gateway.chunk_size, 65536);
        assert_eq!(config.gateway.put_path, "/upload");
        assert_eq!(config.gateway.get_path, "/download");
        assert_eq!(config.memory.max_io, 4096);
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&tmp.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tfsgate.toml");
        std::fs::write(&path, "[gateway]\nchunk_size = 0\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn toml_roundtrip() {
        let config = Config {
            listen: "127.0.0.1:1".into(),
            ..Config::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
