// src/config/mod.rs

//! Harness configuration
//!
//! Everything the harness needs to know about a checkout lives in
//! `dlproject.yaml` at its root:
//!
//! ```yaml
//! prebuilt_tools:
//!   - cmake/[>=3.21 <4]
//!   - b2/4.9.2
//!   - package: ninja/1.11.1
//!     configs: [ReleaseTool]
//!   - package: autoconf/2.71
//!     options: [autoconf:shared=False]
//!     recipe_from: recipes/autoconf/all
//!
//! prebuilt_tools_configs:
//!   - ReleaseTool
//!   - ReleaseTool-Cross
//!
//! config:
//!   ReleaseTool:
//!     profile_host: [default]
//!     build: [missing]
//! ```
//!
//! An optional `dlproject_local.yaml` next to it replaces top-level keys, for
//! machine-specific tweaks that should not be committed.
//!
//! The configuration is loaded once at startup and passed down explicitly.

pub mod profile;

pub use profile::{BuildConfiguration, ProfileStore, RawConfiguration, BUILD_MISSING};

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project configuration file name
pub const PROJECT_FILE: &str = "dlproject.yaml";

/// Local override file name
pub const LOCAL_PROJECT_FILE: &str = "dlproject_local.yaml";

/// A tool package entry: either `name/version` or a full record
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RequirementEntry {
    Reference(String),
    Detailed {
        package: String,
        #[serde(default)]
        options: Vec<String>,
        #[serde(default)]
        configs: Vec<String>,
        #[serde(default)]
        recipe_from: Option<PathBuf>,
    },
}

/// Contents of `dlproject.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    /// Tool packages to prebuild
    #[serde(default)]
    pub prebuilt_tools: Vec<RequirementEntry>,

    /// Configurations to build each tool with
    #[serde(default)]
    pub prebuilt_tools_configs: Vec<String>,

    /// Named build configurations
    #[serde(default)]
    pub config: BTreeMap<String, RawConfiguration>,
}

impl ProjectConfig {
    /// Load the project configuration from a checkout root
    pub fn load(root: &Path) -> Result<Self> {
        let project_file = root.join(PROJECT_FILE);
        if !project_file.exists() {
            return Err(Error::NotFound(format!(
                "{} (is {} a recipe index checkout?)",
                project_file.display(),
                root.display()
            )));
        }

        let mut document = read_mapping(&project_file)?;

        let local_file = root.join(LOCAL_PROJECT_FILE);
        if local_file.exists() {
            debug!("Applying overrides from {}", local_file.display());
            for (key, value) in read_mapping(&local_file)? {
                document.insert(key, value);
            }
        }

        Self::from_mapping(document)
            .map_err(|e| Error::ConfigError(format!("{}: {}", project_file.display(), e)))
    }

    /// Parse a configuration from YAML text (no local overrides)
    pub fn from_yaml(content: &str) -> Result<Self> {
        let value: Option<Mapping> = serde_yaml::from_str(content)?;
        Self::from_mapping(value.unwrap_or_default())
    }

    fn from_mapping(document: Mapping) -> Result<Self> {
        Ok(serde_yaml::from_value(Value::Mapping(document))?)
    }

    /// Access to the named build configurations
    pub fn profiles(&self) -> ProfileStore<'_> {
        ProfileStore::new(&self.config)
    }
}

fn read_mapping(path: &Path) -> Result<Mapping> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
    let value: Option<Mapping> = serde_yaml::from_str(&content)
        .map_err(|e| Error::ParseError(format!("Invalid {}: {}", path.display(), e)))?;
    Ok(value.unwrap_or_default())
}
