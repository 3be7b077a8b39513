// src/recipe/index.rs

//! Version discovery over the `recipes/` tree
//!
//! A package directory either carries a `config.yml` that maps versions to
//! recipe folders:
//!
//! ```yaml
//! versions:
//!   "1.2.11":
//!     folder: all
//!   "1.2.8":
//!     folder: old
//! ```
//!
//! or holds one folder per version (`recipes/zlib/1.2.11/`). Each recipe
//! folder may also carry a `conandata.yml` whose `sources` keys name the
//! versions it can fetch.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-package version manifest
pub const CONFIG_YML: &str = "config.yml";

/// Name of the per-recipe sources manifest
pub const CONANDATA_YML: &str = "conandata.yml";

/// Version string → recipe folder
pub type VersionCatalog = BTreeMap<String, PathBuf>;

#[derive(Debug, Deserialize)]
struct ConfigYml {
    #[serde(default)]
    versions: Mapping,
}

#[derive(Debug, Deserialize)]
struct VersionEntry {
    folder: String,
}

#[derive(Debug, Deserialize)]
struct ConanData {
    #[serde(default)]
    sources: Option<Mapping>,
}

/// Read-only view of a recipe index rooted at a directory containing `recipes/`
#[derive(Debug, Clone)]
pub struct RecipeIndex {
    root: PathBuf,
}

impl RecipeIndex {
    /// Create an index for the checkout at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The checkout root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all package directories
    pub fn recipes_dir(&self) -> PathBuf {
        self.root.join("recipes")
    }

    /// Directory for one package
    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.recipes_dir().join(package)
    }

    /// Map every known version of `package` to its recipe folder
    ///
    /// `config.yml` wins when present; the directory scan only runs without it.
    /// A missing package directory is an error.
    pub fn versions_to_folders(&self, package: &str) -> Result<VersionCatalog> {
        let recipe_dir = self.package_dir(package);
        let config_file = recipe_dir.join(CONFIG_YML);

        if config_file.exists() {
            debug!("Reading versions for {} from {}", package, config_file.display());
            let content = fs::read_to_string(&config_file).map_err(|e| {
                Error::IoError(format!("Failed to read {}: {}", config_file.display(), e))
            })?;
            let config: ConfigYml = serde_yaml::from_str(&content).map_err(|e| {
                Error::ParseError(format!("Invalid {}: {}", config_file.display(), e))
            })?;

            let mut catalog = VersionCatalog::new();
            for (key, entry) in config.versions {
                let version = yaml_key(&key).ok_or_else(|| {
                    Error::ParseError(format!(
                        "Unsupported version key {:?} in {}",
                        key,
                        config_file.display()
                    ))
                })?;
                let entry: VersionEntry = serde_yaml::from_value(entry).map_err(|e| {
                    Error::ParseError(format!(
                        "Invalid entry for version {} in {}: {}",
                        version,
                        config_file.display(),
                        e
                    ))
                })?;
                catalog.insert(version, recipe_dir.join(entry.folder));
            }
            return Ok(catalog);
        }

        debug!("Scanning {} for version folders", recipe_dir.display());
        let entries = fs::read_dir(&recipe_dir).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", recipe_dir.display(), e))
        })?;

        let mut catalog = VersionCatalog::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !entry.file_type()?.is_dir() {
                continue;
            }
            catalog.insert(name.clone(), recipe_dir.join(name));
        }
        Ok(catalog)
    }

    /// Versions declared in the `sources` section of a recipe folder's `conandata.yml`
    ///
    /// A folder without the file, or a file without `sources`, yields nothing.
    pub fn conandata_versions(&self, recipe_folder: &Path) -> Result<Vec<String>> {
        conandata_versions(recipe_folder)
    }

    /// Every package directory under `recipes/`, sorted
    pub fn packages(&self) -> Result<Vec<String>> {
        let dir = self.recipes_dir();
        let entries = fs::read_dir(&dir)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", dir.display(), e)))?;

        let mut packages = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                packages.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        packages.sort();
        Ok(packages)
    }
}

/// Versions declared in `<recipe_folder>/conandata.yml`
pub fn conandata_versions(recipe_folder: &Path) -> Result<Vec<String>> {
    let conandata_file = recipe_folder.join(CONANDATA_YML);
    if !conandata_file.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&conandata_file).map_err(|e| {
        Error::IoError(format!("Failed to read {}: {}", conandata_file.display(), e))
    })?;
    let data: Option<ConanData> = serde_yaml::from_str(&content).map_err(|e| {
        Error::ParseError(format!("Invalid {}: {}", conandata_file.display(), e))
    })?;

    Ok(data
        .and_then(|d| d.sources)
        .map(|sources| sources.keys().filter_map(yaml_key).collect())
        .unwrap_or_default())
}

/// Version keys written without quotes come back as numbers (`1.2:`)
fn yaml_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
