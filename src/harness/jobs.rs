// src/harness/jobs.rs

//! Enumerating (tool package × configuration) build jobs

use crate::config::{BuildConfiguration, ProjectConfig};
use crate::error::{Error, Result};
use crate::harness::requirement::PackageRequirement;
use crate::platform::HostPlatform;
use crate::recipe::RecipeIndex;
use std::fmt;
use std::path::PathBuf;

/// One concrete build job: a resolved package with a prepared configuration
#[derive(Debug, Clone)]
pub struct ConfiguredPackage {
    pub package: PackageRequirement,
    pub config_name: String,
    pub config: BuildConfiguration,
}

impl ConfiguredPackage {
    /// Stable identifier, used for job selection and log output
    pub fn id(&self) -> String {
        self.to_string()
    }

    /// The recipe folder this job builds from
    ///
    /// `recipe_from` wins; otherwise the folder registered for the resolved
    /// version in the package's catalog.
    pub fn recipe_folder(&self, index: &RecipeIndex) -> Result<PathBuf> {
        if let Some(folder) = self.package.recipe_override(index) {
            return Ok(folder);
        }
        let (name, version) = self.package.split()?;
        index
            .versions_to_folders(name)?
            .remove(version)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "the recipe folder for {} must be found",
                    self.package.reference
                ))
            })
    }
}

impl fmt::Display for ConfiguredPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.package, self.config_name)
    }
}

/// Build the job list from the project configuration
///
/// Tools are resolved and configurations prepared up front; an invalid
/// configuration fails the whole enumeration. A tool restricted to certain
/// configurations only pairs with those.
pub fn enumerate_jobs(
    project: &ProjectConfig,
    index: &RecipeIndex,
    machine: &HostPlatform,
) -> Result<Vec<ConfiguredPackage>> {
    let tools = project
        .prebuilt_tools
        .iter()
        .cloned()
        .map(|entry| PackageRequirement::from(entry).resolve_ranges(index))
        .collect::<Result<Vec<_>>>()?;

    let store = project.profiles();
    let configs = project
        .prebuilt_tools_configs
        .iter()
        .map(|name| Ok((name.clone(), store.config_from_name(name, machine)?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(cartesian(&tools, &configs))
}

/// Pair every tool with every configuration it applies to
pub fn cartesian(
    tools: &[PackageRequirement],
    configs: &[(String, BuildConfiguration)],
) -> Vec<ConfiguredPackage> {
    tools
        .iter()
        .flat_map(|tool| {
            configs
                .iter()
                .filter(move |(name, _)| tool.applies_to(name))
                .map(move |(name, config)| ConfiguredPackage {
                    package: tool.clone(),
                    config_name: name.clone(),
                    config: config.clone(),
                })
        })
        .collect()
}
