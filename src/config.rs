use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::Severity;

/// Member names that make up the Result-like wrapper protocol: two boolean
/// flags and a value accessor that is only valid on the success path.
///
/// Both field reads (`r.is_success`) and zero-argument method calls
/// (`r.is_success()`) are matched against these names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultProtocol {
    #[serde(default = "default_success_flag")]
    pub success_flag: String,
    #[serde(default = "default_failure_flag")]
    pub failure_flag: String,
    #[serde(default = "default_value_accessor")]
    pub value_accessor: String,

    /// Type-name hints for the receiver heuristic: an identifier declared
    /// with one of these types counts as a wrapper value even before its
    /// first flag check.
    #[serde(default)]
    pub wrapper_types: Vec<String>,
}

impl Default for ResultProtocol {
    fn default() -> Self {
        Self {
            success_flag: default_success_flag(),
            failure_flag: default_failure_flag(),
            value_accessor: default_value_accessor(),
            wrapper_types: Vec::new(),
        }
    }
}

fn default_success_flag() -> String {
    "is_success".to_string()
}

fn default_failure_flag() -> String {
    "is_failure".to_string()
}

fn default_value_accessor() -> String {
    "value".to_string()
}

/// Tool configuration, loaded from `resultguard.toml` when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultguardConfig {
    #[serde(default)]
    pub protocol: ResultProtocol,

    /// Optional substring filter on the receiver expression of a value
    /// access. When set it replaces the default wrapper-receiver heuristic
    /// (flag co-occurrence and `wrapper_types` hints).
    #[serde(default)]
    pub receiver_contains: Option<String>,

    /// Severity attached to every finding. `error` makes CI output stand
    /// out; the exit code is 1 on findings either way.
    #[serde(default)]
    pub severity: Severity,
}

pub const CONFIG_FILE_NAME: &str = "resultguard.toml";

impl ResultguardConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Looks for `resultguard.toml` next to the analyzed root, falling back
    /// to defaults when absent.
    pub fn discover(root: &Path) -> Self {
        let dir = if root.is_dir() {
            root
        } else {
            root.parent().unwrap_or(Path::new("."))
        };
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            match Self::load(&candidate) {
                Ok(config) => {
                    log::debug!("loaded configuration from {}", candidate.display());
                    return config;
                }
                Err(err) => {
                    log::warn!("ignoring invalid configuration: {err:#}");
                }
            }
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_protocol_names() {
        let protocol = ResultProtocol::default();
        assert_eq!(protocol.success_flag, "is_success");
        assert_eq!(protocol.failure_flag, "is_failure");
        assert_eq!(protocol.value_accessor, "value");
        assert!(protocol.wrapper_types.is_empty());
    }

    #[test]
    fn wrapper_type_hints_parse_from_toml() {
        let config: ResultguardConfig = toml::from_str(
            r#"
            [protocol]
            wrapper_types = ["Outcome", "ApiResult"]
            "#,
        )
        .unwrap();
        assert_eq!(config.protocol.wrapper_types, vec!["Outcome", "ApiResult"]);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: ResultguardConfig = toml::from_str(
            r#"
            [protocol]
            value_accessor = "unwrapped"
            "#,
        )
        .unwrap();
        assert_eq!(config.protocol.value_accessor, "unwrapped");
        assert_eq!(config.protocol.success_flag, "is_success");
        assert!(config.receiver_contains.is_none());
    }

    #[test]
    fn severity_parses_from_toml() {
        let config: ResultguardConfig = toml::from_str(r#"severity = "error""#).unwrap();
        assert_eq!(config.severity, Severity::Error);
        let config: ResultguardConfig = toml::from_str("").unwrap();
        assert_eq!(config.severity, Severity::Warning);
    }

    #[test]
    fn empty_config_is_default() {
        let config: ResultguardConfig = toml::from_str("").unwrap();
        assert_eq!(config, ResultguardConfig::default());
    }
}
