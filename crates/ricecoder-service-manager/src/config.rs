//! Service manager configuration
//!
//! Recognized keys:
//!
//! ```toml
//! allow_override = true
//! strategy = "manual"          # or "auto_wiring" (default)
//!
//! [dependencies]
//! Clock = "Clock"              # identifier equals class: invokable
//! logger = "FileLogger"        # otherwise: alias to the class
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::strategy::StrategyKind;
use crate::{DIError, DIResult, DependenciesRepository};

/// Configuration consumed by [`ServiceManager::from_config`](crate::ServiceManager::from_config)
/// and [`ConfigServiceProvider`](crate::ConfigServiceProvider)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceManagerConfig {
    /// Whether binding may replace existing identifiers
    pub allow_override: bool,
    /// Resolution strategy for managers built from this config
    pub strategy: StrategyKind,
    /// Identifier to class name
    pub dependencies: BTreeMap<String, String>,
}

impl ServiceManagerConfig {
    /// Load from a `.json`, `.toml`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> DIResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Err(DIError::Config(format!(
                "Unsupported config format: {}",
                path.display()
            ))),
        }?;

        debug!(
            "Loaded service manager config from {} ({} dependencies)",
            path.display(),
            config.dependencies.len()
        );
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> DIResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| DIError::Config(format!("Failed to parse JSON config: {}", e)))
    }

    pub fn from_toml_str(content: &str) -> DIResult<Self> {
        toml::from_str(content)
            .map_err(|e| DIError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    pub fn from_yaml_str(content: &str) -> DIResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| DIError::Config(format!("Failed to parse YAML config: {}", e)))
    }

    /// Repository holding the configured dependencies.
    ///
    /// A dependency whose class equals its identifier becomes an invokable,
    /// any other becomes an alias from the identifier to the class.
    pub fn to_repository(&self) -> DIResult<DependenciesRepository> {
        let repository = DependenciesRepository::new();
        for (id, class) in &self.dependencies {
            if id == class {
                repository.set_invokable(id)?;
            } else {
                repository.set_alias(id, class)?;
            }
        }
        Ok(repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DependencyKind;

    #[test]
    fn test_defaults_when_keys_missing() {
        let config = ServiceManagerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ServiceManagerConfig::default());
        assert_eq!(config.strategy, StrategyKind::AutoWiring);
    }

    #[test]
    fn test_parse_toml() {
        let config = ServiceManagerConfig::from_toml_str(
            r#"
allow_override = true
strategy = "manual"

[dependencies]
Clock = "Clock"
logger = "FileLogger"
"#,
        )
        .unwrap();

        assert!(config.allow_override);
        assert_eq!(config.strategy, StrategyKind::Manual);
        assert_eq!(config.dependencies.len(), 2);
    }

    #[test]
    fn test_parse_yaml() {
        let config = ServiceManagerConfig::from_yaml_str(
            "allow_override: false\ndependencies:\n  logger: FileLogger\n",
        )
        .unwrap();
        assert_eq!(config.dependencies["logger"], "FileLogger");
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        assert!(matches!(
            ServiceManagerConfig::from_json_str("{"),
            Err(DIError::Config(_))
        ));
    }

    #[test]
    fn test_repository_classification() {
        let mut config = ServiceManagerConfig::default();
        config.dependencies.insert("Clock".into(), "Clock".into());
        config.dependencies.insert("logger".into(), "FileLogger".into());

        let repository = config.to_repository().unwrap();
        assert_eq!(repository.get_type("Clock").unwrap(), DependencyKind::Invokable);
        assert_eq!(repository.get_type("logger").unwrap(), DependencyKind::Alias);
    }
}
