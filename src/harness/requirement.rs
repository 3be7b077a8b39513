// src/harness/requirement.rs

//! Tool package requirements and range resolution

use crate::config::RequirementEntry;
use crate::error::{Error, Result};
use crate::recipe::RecipeIndex;
use crate::version::VersionRange;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A tool package to build, as listed in `prebuilt_tools`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequirement {
    /// `name/version` or `name/[range]`
    pub reference: String,
    /// `key=value` options passed as `--options:host`
    pub options: Vec<String>,
    /// Configurations this package is limited to; empty means all
    pub configs: Vec<String>,
    /// Explicit recipe folder, bypassing version discovery
    pub recipe_from: Option<PathBuf>,
}

impl PackageRequirement {
    /// A requirement with no options or restrictions
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            options: Vec::new(),
            configs: Vec::new(),
            recipe_from: None,
        }
    }

    /// Split the reference into package name and version expression
    pub fn split(&self) -> Result<(&str, &str)> {
        self.reference.split_once('/').ok_or_else(|| {
            Error::ParseError(format!(
                "package reference '{}' should be of the form name/version",
                self.reference
            ))
        })
    }

    /// Package name
    pub fn name(&self) -> &str {
        self.reference
            .split_once('/')
            .map(|(name, _)| name)
            .unwrap_or(&self.reference)
    }

    /// Bracketed range expression, without the brackets, if the version is one
    pub fn range_expression(&self) -> Option<&str> {
        let (_, version) = self.reference.split_once('/')?;
        version.strip_prefix('[')?.strip_suffix(']')
    }

    /// Whether this package should be built with the named configuration
    pub fn applies_to(&self, config_name: &str) -> bool {
        self.configs.is_empty() || self.configs.iter().any(|c| c == config_name)
    }

    /// Resolve `recipe_from` against the index root when it is relative
    pub fn recipe_override(&self, index: &RecipeIndex) -> Option<PathBuf> {
        self.recipe_from.as_deref().map(|path| absolutize(index.root(), path))
    }

    /// Replace a version range by the highest matching known version
    ///
    /// Candidates come from the `conandata.yml` of `recipe_from` when set, and
    /// from the package's version catalog otherwise. When nothing matches, or
    /// the range cannot be parsed, the requirement comes back unchanged so the
    /// build step reports it.
    pub fn resolve_ranges(&self, index: &RecipeIndex) -> Result<Self> {
        let (package, _) = self.split()?;
        let Some(expression) = self.range_expression() else {
            return Ok(self.clone());
        };

        let candidates: Vec<String> = match self.recipe_override(index) {
            Some(folder) => index.conandata_versions(&folder)?,
            None => index.versions_to_folders(package)?.into_keys().collect(),
        };

        let range = match VersionRange::parse(expression) {
            Ok(range) => range,
            Err(e) => {
                warn!("*** No range resolution for {}: {}", self.reference, e);
                return Ok(self.clone());
            }
        };
        let Some(version) = range.max_satisfying(candidates.iter().map(String::as_str)) else {
            warn!("*** No range resolution for {}", self.reference);
            return Ok(self.clone());
        };

        let resolved = format!("{}/{}", package, version);
        info!("Resolved {} to {}", self.reference, resolved);
        Ok(Self {
            reference: resolved,
            ..self.clone()
        })
    }
}

impl From<RequirementEntry> for PackageRequirement {
    fn from(entry: RequirementEntry) -> Self {
        match entry {
            RequirementEntry::Reference(reference) => Self::new(reference),
            RequirementEntry::Detailed {
                package,
                options,
                configs,
                recipe_from,
            } => Self {
                reference: package,
                options,
                configs,
                recipe_from,
            },
        }
    }
}

impl fmt::Display for PackageRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference)?;
        if !self.options.is_empty() {
            write!(f, "_{}", self.options.join("_"))?;
        }
        Ok(())
    }
}

fn absolutize(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn index_with_versions(package: &str, versions: &[&str]) -> (TempDir, RecipeIndex) {
        let temp = TempDir::new().unwrap();
        for version in versions {
            fs::create_dir_all(temp.path().join("recipes").join(package).join(version)).unwrap();
        }
        let index = RecipeIndex::new(temp.path());
        (temp, index)
    }

    #[test]
    fn test_display() {
        assert_eq!(PackageRequirement::new("zlib/1.2.11").to_string(), "zlib/1.2.11");

        let mut req = PackageRequirement::new("b2/4.9.2");
        req.options = vec!["b2:toolset=gcc".to_string(), "shared=True".to_string()];
        assert_eq!(req.to_string(), "b2/4.9.2_b2:toolset=gcc_shared=True");
    }

    #[test]
    fn test_name_and_range_expression() {
        let req = PackageRequirement::new("cmake/[>=3.21 <4]");
        assert_eq!(req.name(), "cmake");
        assert_eq!(req.range_expression(), Some(">=3.21 <4"));
        assert_eq!(PackageRequirement::new("cmake/3.22.0").range_expression(), None);
    }

    #[test]
    fn test_applies_to() {
        let mut req = PackageRequirement::new("ninja/1.11.1");
        assert!(req.applies_to("A"));
        req.configs = vec!["A".to_string()];
        assert!(req.applies_to("A"));
        assert!(!req.applies_to("B"));
    }

    #[test]
    fn test_from_entry() {
        let req: PackageRequirement = RequirementEntry::Reference("zlib/1.2.11".to_string()).into();
        assert_eq!(req, PackageRequirement::new("zlib/1.2.11"));

        let req: PackageRequirement = RequirementEntry::Detailed {
            package: "ninja/1.11.1".to_string(),
            options: vec!["a=b".to_string()],
            configs: vec!["A".to_string()],
            recipe_from: Some(PathBuf::from("recipes/ninja/all")),
        }
        .into();
        assert_eq!(req.reference, "ninja/1.11.1");
        assert_eq!(req.options, vec!["a=b"]);
        assert_eq!(req.configs, vec!["A"]);
        assert_eq!(req.recipe_from, Some(PathBuf::from("recipes/ninja/all")));
    }

    #[test]
    fn test_resolve_picks_highest_release() {
        let (_temp, index) =
            index_with_versions("zlib", &["1.2.11", "1.2.12", "1.3.0", "2.0.0-beta"]);
        let req = PackageRequirement::new("zlib/[>=1.2 <2]");
        let resolved = req.resolve_ranges(&index).unwrap();
        assert_eq!(resolved.reference, "zlib/1.3.0");
    }

    #[test]
    fn test_resolve_without_match_returns_original() {
        let (_temp, index) = index_with_versions("zlib", &["0.9.0"]);
        let req = PackageRequirement::new("zlib/[>=1.0 <2]");
        let resolved = req.resolve_ranges(&index).unwrap();
        assert_eq!(resolved, req);
    }

    #[test]
    fn test_resolve_unparseable_range_returns_original() {
        let (_temp, index) = index_with_versions("zlib", &["1.2.11"]);
        let req = PackageRequirement::new("zlib/[>=banana]");
        assert_eq!(req.resolve_ranges(&index).unwrap(), req);
    }

    #[test]
    fn test_resolve_literal_is_untouched() {
        let temp = TempDir::new().unwrap();
        let index = RecipeIndex::new(temp.path());
        let req = PackageRequirement::new("zlib/1.2.11");
        assert_eq!(req.resolve_ranges(&index).unwrap(), req);
    }

    #[test]
    fn test_resolve_preserves_fields() {
        let (_temp, index) = index_with_versions("b2", &["4.8.0", "4.9.2"]);
        let req = PackageRequirement {
            reference: "b2/[~4]".to_string(),
            options: vec!["x=y".to_string()],
            configs: vec!["A".to_string()],
            recipe_from: None,
        };
        let resolved = req.resolve_ranges(&index).unwrap();
        assert_eq!(resolved.reference, "b2/4.9.2");
        assert_eq!(resolved.options, req.options);
        assert_eq!(resolved.configs, req.configs);
    }

    #[test]
    fn test_resolve_uses_recipe_override() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("recipes").join("autoconf").join("all");
        fs::create_dir_all(&folder).unwrap();
        fs::write(
            folder.join("conandata.yml"),
            "sources:\n  \"2.69\": {}\n  \"2.71\": {}\n",
        )
        .unwrap();
        let index = RecipeIndex::new(temp.path());

        let req = PackageRequirement {
            recipe_from: Some(PathBuf::from("recipes/autoconf/all")),
            ..PackageRequirement::new("autoconf/[>=2.69]")
        };
        let resolved = req.resolve_ranges(&index).unwrap();
        assert_eq!(resolved.reference, "autoconf/2.71");
        assert_eq!(resolved.recipe_from, req.recipe_from);
    }

    #[test]
    fn test_resolve_without_slash_is_error() {
        let temp = TempDir::new().unwrap();
        let index = RecipeIndex::new(temp.path());
        assert!(PackageRequirement::new("zlib").resolve_ranges(&index).is_err());
    }
}
