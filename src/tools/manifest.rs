// src/tools/manifest.rs

//! JSON documents written by `conan create --json` and `conan search -j`
//!
//! The schemas belong to Conan; only the fields the harness reads are modeled
//! and everything else is ignored.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Output of `conan create`/`conan install` with `--json`
#[derive(Debug, Clone, Deserialize)]
pub struct BuildManifest {
    #[serde(default)]
    pub installed: Vec<InstalledItem>,
}

/// One recipe that took part in the build
#[derive(Debug, Clone, Deserialize)]
pub struct InstalledItem {
    pub recipe: RecipeInfo,
    #[serde(default)]
    pub packages: Vec<BinaryRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeInfo {
    /// `name/version#revision` (possibly with `@user/channel`)
    pub id: String,
}

/// A binary package record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BinaryRecord {
    #[serde(default)]
    pub built: bool,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl BuildManifest {
    /// Load a manifest written by Conan
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::ManifestError(format!("Invalid build manifest {}: {}", path.display(), e)))
    }
}

impl InstalledItem {
    /// The reference without its revision: `zlib/1.2.11`
    pub fn reference(&self) -> &str {
        self.recipe.id.split('#').next().unwrap_or_default()
    }

    /// The bare package name: `zlib`
    pub fn package_name(&self) -> &str {
        self.reference().split('/').next().unwrap_or_default()
    }

    /// Whether any binary of this recipe was built rather than reused
    pub fn any_built(&self) -> bool {
        self.packages.iter().any(|p| p.built)
    }
}

impl BinaryRecord {
    /// OS-specific binaries carry an `os` setting
    pub fn is_os_specific(&self) -> bool {
        self.settings.contains_key("os")
    }
}

/// Extract the binary records from `conan search <ref>@ -j` output
///
/// The document must contain at least one result with at least one item, and
/// that item must have a `packages` list. The list itself may be empty.
pub fn parse_search_packages(content: &str) -> Result<Vec<BinaryRecord>> {
    let data: Value = serde_json::from_str(content)
        .map_err(|e| Error::ManifestError(format!("Invalid search output: {}", e)))?;

    let results = data
        .get("results")
        .and_then(Value::as_array)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| Error::ManifestError("there should have been results".to_string()))?;

    let item = results[0]
        .get("items")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .ok_or_else(|| {
            Error::ManifestError("there should have been an item in the results".to_string())
        })?;

    let item = item.as_object().ok_or_else(|| {
        Error::ManifestError("the first search item should have been a mapping".to_string())
    })?;

    let packages = item.get("packages").ok_or_else(|| {
        Error::ManifestError(
            "there should have been a package list in the first item".to_string(),
        )
    })?;

    serde_json::from_value(packages.clone())
        .map_err(|e| Error::ManifestError(format!("Invalid package list: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_manifest_references() {
        let manifest: BuildManifest = serde_json::from_str(
            r#"{
                "error": false,
                "installed": [
                    {"recipe": {"id": "zlib/1.2.11#abc123", "dependency": true},
                     "packages": [{"id": "p1", "built": true, "settings": {"os": "Linux"}}]},
                    {"recipe": {"id": "cmake/3.22.0#def"}, "packages": [{"built": false}]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.installed.len(), 2);
        let zlib = &manifest.installed[0];
        assert_eq!(zlib.reference(), "zlib/1.2.11");
        assert_eq!(zlib.package_name(), "zlib");
        assert!(zlib.any_built());
        assert!(zlib.packages[0].is_os_specific());

        let cmake = &manifest.installed[1];
        assert_eq!(cmake.reference(), "cmake/3.22.0");
        assert!(!cmake.any_built());
        assert!(!cmake.packages[0].is_os_specific());
    }

    #[test]
    fn test_reference_without_revision() {
        let item = InstalledItem {
            recipe: RecipeInfo { id: "b2/4.9.2".to_string() },
            packages: Vec::new(),
        };
        assert_eq!(item.reference(), "b2/4.9.2");
        assert_eq!(item.package_name(), "b2");
    }

    #[test]
    fn test_parse_search_packages() {
        let packages = parse_search_packages(
            r#"{"error": false, "results": [{"remote": null, "items": [
                {"recipe": {"id": "zlib/1.2.11"}, "packages": [
                    {"id": "abc", "settings": {"os": "Windows", "arch": "x86_64"}}
                ]}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(packages.len(), 1);
        assert!(packages[0].is_os_specific());
    }

    #[test]
    fn test_parse_search_empty_package_list_is_ok() {
        let packages =
            parse_search_packages(r#"{"results": [{"items": [{"packages": []}]}]}"#).unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn test_parse_search_structural_errors() {
        assert!(parse_search_packages(r#"{"results": []}"#).is_err());
        assert!(parse_search_packages(r#"{"results": [{"items": []}]}"#).is_err());
        assert!(parse_search_packages(r#"{"results": [{"items": [{"recipe": {}}]}]}"#).is_err());
        assert!(parse_search_packages(r#"{"results": [{"items": [[1, 2]]}]}"#).is_err());
        assert!(parse_search_packages("not json").is_err());
    }
}
