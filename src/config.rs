use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::resolver::{ComponentResolution, ModuleReference};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read resolver config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid resolver config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown transform entry point `{0}`")]
    UnknownEntryPoint(String),
}

/// Constructor parameters of `StaticResolver`.
///
/// Registry names are the dasherized, `/`-separated names the runtime used
/// to look things up by (`my-button`, `ui/card`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    pub components: HashMap<String, ComponentResolution>,
    pub helpers: HashMap<String, ModuleReference>,
    pub modifiers: HashMap<String, ModuleReference>,
    /// Missing components (and dynamic component arguments that cannot be
    /// analyzed) are errors instead of runtime lookups.
    pub static_components: bool,
    pub static_helpers: bool,
    pub static_modifiers: bool,
}

impl ResolverConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&data)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_fields_default() {
        let config = ResolverConfig::from_json(r#"{ "staticHelpers": true }"#).unwrap();
        assert!(config.static_helpers);
        assert!(!config.static_components);
        assert!(config.components.is_empty());
    }

    #[test]
    fn test_component_rules_parse() {
        let config = ResolverConfig::from_json(
            r#"{
                "components": {
                    "my-menu": {
                        "modules": [{ "path": "./components/my-menu.js", "runtimeName": "app/components/my-menu" }],
                        "yieldsComponents": [true]
                    }
                }
            }"#,
        )
        .unwrap();
        let menu = &config.components["my-menu"];
        assert_eq!(menu.modules[0].runtime_name, "app/components/my-menu");
        assert!(menu.yields_component_at(0));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let err = ResolverConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().starts_with("invalid resolver config"));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = ResolverConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
