//! The library's own `package.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, ConfigError};

/// Package name to version range.
pub type DependencyMap = BTreeMap<String, String>;

/// Package manifest read from the project root.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Published package name, if it differs from the module id
    #[serde(default)]
    pub name: Option<String>,

    /// Module identifier used for output file names
    pub module_id: String,

    pub version: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub dependencies: DependencyMap,

    #[serde(default)]
    pub peer_dependencies: DependencyMap,

    #[serde(default)]
    pub dev_dependencies: DependencyMap,
}

impl Manifest {
    /// Parse a manifest from JSON text.
    pub fn parse(source: &str, origin: &Path) -> Result<Self, ConfigError> {
        let manifest: Manifest =
            serde_json::from_str(source).map_err(|e| ConfigError::MalformedManifest {
                path: origin.display().to_string(),
                message: e.to_string(),
            })?;

        if manifest.module_id.trim().is_empty() {
            return Err(ConfigError::MalformedManifest {
                path: origin.display().to_string(),
                message: "moduleId must not be empty".to_string(),
            });
        }

        Ok(manifest)
    }

    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let content = fs::read_to_string(path).map_err(|e| BuildError::fs(path, e))?;
        Ok(Self::parse(&content, path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_camel_case_fields() {
        let json = r#"{
            "name": "@cloukit/toggle",
            "moduleId": "toggle",
            "version": "1.2.0",
            "description": "A toggle",
            "dependencies": { "tslib": "^1.7.0" },
            "peerDependencies": { "@angular/core": "^4.0.0" }
        }"#;

        let manifest = Manifest::parse(json, Path::new("package.json")).unwrap();

        assert_eq!(manifest.module_id, "toggle");
        assert_eq!(manifest.name.as_deref(), Some("@cloukit/toggle"));
        assert_eq!(manifest.dependencies.get("tslib").unwrap(), "^1.7.0");
        assert_eq!(manifest.peer_dependencies.len(), 1);
        assert!(manifest.dev_dependencies.is_empty());
    }

    #[test]
    fn rejects_missing_module_id() {
        let err = Manifest::parse(r#"{"version": "1.0.0"}"#, Path::new("package.json"));
        assert!(matches!(err, Err(ConfigError::MalformedManifest { .. })));
    }

    #[test]
    fn rejects_blank_module_id() {
        let err = Manifest::parse(
            r#"{"moduleId": " ", "version": "1.0.0"}"#,
            Path::new("package.json"),
        );
        assert!(err.is_err());
    }
}
