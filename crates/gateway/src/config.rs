//! Gateway settings.

use serde::{Deserialize, Serialize};
use tfsgate_transfer::{DEFAULT_CHUNK_SIZE, WritePolicy};

/// Invalid gateway configuration.
#[derive(Debug, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

/// Settings for the put/get locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Name server address (`ip:port`).
    #[serde(default = "default_ns_addr")]
    pub ns_addr: String,

    /// Bytes per read/write call against the cluster.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Largest accepted upload body in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Location accepting `POST` uploads.
    #[serde(default = "default_files_path")]
    pub put_path: String,

    /// Location serving `GET`/`HEAD` downloads.
    #[serde(default = "default_files_path")]
    pub get_path: String,

    /// Treatment of write calls that report more than they were offered.
    #[serde(default)]
    pub write_policy: WritePolicy,
}

fn default_ns_addr() -> String {
    "127.0.0.1:10000".into()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_body_size() -> usize {
    64 * 1024 * 1024
}

fn default_files_path() -> String {
    "/tfs".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ns_addr: default_ns_addr(),
            chunk_size: default_chunk_size(),
            max_body_size: default_max_body_size(),
            put_path: default_files_path(),
            get_path: default_files_path(),
            write_policy: WritePolicy::default(),
        }
    }
}

impl GatewayConfig {
    /// Checks values that would otherwise fail at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ns_addr.trim().is_empty() {
            return Err(ConfigError {
                field: "ns_addr",
                reason: "must not be empty".into(),
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError {
                field: "chunk_size",
                reason: "must be positive".into(),
            });
        }
        if self.max_body_size == 0 {
            return Err(ConfigError {
                field: "max_body_size",
                reason: "must be positive".into(),
            });
        }
        for (field, path) in [("put_path", &self.put_path), ("get_path", &self.get_path)] {
            if !path.starts_with('/') {
                return Err(ConfigError {
                    field,
                    reason: format!("{path:?} must start with '/'"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.ns_addr, "127.0.0.1:10000");
        assert_eq!(config.chunk_size, 2 * 1024 * 1024);
        assert_eq!(config.put_path, "/tfs");
        assert_eq!(config.get_path, "/tfs");
        assert_eq!(config.write_policy, WritePolicy::Strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"ns_addr": "10.0.0.1:8108", "write_policy": "lenient"}"#)
                .unwrap();
        assert_eq!(config.ns_addr, "10.0.0.1:8108");
        assert_eq!(config.write_policy, WritePolicy::Lenient);
        assert_eq!(config.max_body_size, 64 * 1024 * 1024);
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let config = GatewayConfig {
            chunk_size: 0,
            ..GatewayConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "chunk_size");
    }

    #[test]
    fn rejects_relative_location() {
        let config = GatewayConfig {
            get_path: "download".into(),
            ..GatewayConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "get_path");
    }
}
