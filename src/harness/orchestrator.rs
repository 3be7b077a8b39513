// src/harness/orchestrator.rs

//! Building one job and publishing what it produced
//!
//! A job runs four strictly ordered steps, each fatal on failure:
//!
//! 1. `git clean -fdx` the recipe folder so no earlier build leaks in
//! 2. `conan create` with the configuration's flags and the force-build policy
//! 3. `conan search` each package listed in the build manifest
//! 4. `conan upload` the ones that pass the upload policy

use crate::error::{Error, Result};
use crate::harness::jobs::ConfiguredPackage;
use crate::platform::HostPlatform;
use crate::recipe::RecipeIndex;
use crate::tools::{BinaryRecord, BuildManifest, CommandRunner, Conan, Environment, Git, InstalledItem};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tempfile::TempDir;
use tracing::{error, info};

/// Build tool shared by nearly every job; not rebuilt for each of them
pub const SHARED_BUILD_TOOL: &str = "cmake";

/// Package that rewrites its own files while in use, so its binaries are never shared
pub const SELF_MODIFYING_TOOL: &str = "msys2";

/// Which packages a job rebuilds from source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ForceBuild {
    /// Build only what is missing from the binary cache
    #[default]
    Missing,
    /// Rebuild the package under test, and whatever else is missing
    Package,
    /// Rebuild everything except the shared build tool
    WithRequirements,
}

impl ForceBuild {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForceBuild::Missing => "missing",
            ForceBuild::Package => "package",
            ForceBuild::WithRequirements => "with-requirements",
        }
    }

    /// `--build` flags for building `package_name` in this mode
    pub fn build_flags(&self, package_name: &str) -> Vec<String> {
        let patterns: Vec<String> = match self {
            ForceBuild::Package => vec![package_name.to_string(), "missing".to_string()],
            ForceBuild::WithRequirements => {
                let mut patterns = vec!["*".to_string()];
                if package_name != SHARED_BUILD_TOOL {
                    patterns.push(format!("!{}", SHARED_BUILD_TOOL));
                }
                patterns
            }
            ForceBuild::Missing => vec!["missing".to_string()],
        };

        patterns
            .into_iter()
            .flat_map(|pattern| ["--build".to_string(), pattern])
            .collect()
    }
}

impl FromStr for ForceBuild {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "missing" => Ok(ForceBuild::Missing),
            "package" => Ok(ForceBuild::Package),
            "with-requirements" => Ok(ForceBuild::WithRequirements),
            other => Err(Error::ParseError(format!(
                "unknown force-build mode '{}' (expected package, with-requirements or missing)",
                other
            ))),
        }
    }
}

impl fmt::Display for ForceBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a package from the build manifest was not uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    SelfModifying,
    NoLocalPackages,
    NotOsSpecific,
}

/// What to do with one installed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadDecision {
    Upload,
    Skip(SkipReason),
}

/// Outcome of a job
#[derive(Debug, Clone, Default)]
pub struct JobReport {
    pub id: String,
    pub uploaded: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
}

/// Outcome of a build session
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub reports: Vec<JobReport>,
    /// Job identifier and the error that stopped it
    pub failures: Vec<(String, Error)>,
}

impl BuildSummary {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Settings for a build session
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Conan executable
    pub conan_program: String,
    /// Remote to upload to; no uploads when unset
    pub upload_to: Option<String>,
    pub force_build: ForceBuild,
    pub host: HostPlatform,
}

/// Runs build jobs one after another
pub struct BuildOrchestrator<'a> {
    index: &'a RecipeIndex,
    runner: &'a dyn CommandRunner,
    env: &'a Environment,
    options: OrchestratorOptions,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(
        index: &'a RecipeIndex,
        runner: &'a dyn CommandRunner,
        env: &'a Environment,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            index,
            runner,
            env,
            options,
        }
    }

    fn conan(&self) -> Conan<'_> {
        Conan::new(self.runner, &self.options.conan_program, self.env)
    }

    /// Run jobs in order
    ///
    /// A failed job is recorded and the next one starts; with `fail_fast`
    /// the first failure is returned instead.
    pub fn run_jobs(&self, jobs: &[ConfiguredPackage], fail_fast: bool) -> Result<BuildSummary> {
        let mut summary = BuildSummary::default();
        for job in jobs {
            info!("=== Building {}", job);
            match self.run_job(job) {
                Ok(report) => summary.reports.push(report),
                Err(e) if fail_fast => return Err(e),
                Err(e) => {
                    error!("Job {} failed: {}", job, e);
                    summary.failures.push((job.id(), e));
                }
            }
        }
        Ok(summary)
    }

    /// Clean, build and (optionally) upload one job
    pub fn run_job(&self, job: &ConfiguredPackage) -> Result<JobReport> {
        let (package_name, version) = job.package.split()?;
        if version.starts_with('[') || version.ends_with(']') {
            return Err(Error::UnresolvedRange(job.package.reference.clone()));
        }
        let recipe_folder = job.recipe_folder(self.index)?;

        let workdir = TempDir::new()
            .map_err(|e| Error::IoError(format!("Failed to create temporary directory: {}", e)))?;

        Git::new(self.runner, self.index.root(), self.env).clean(&recipe_folder)?;

        let create_json = workdir.path().join("create.json");
        let args = self.create_arguments(job, package_name);
        self.conan()
            .create(&recipe_folder, &job.package.reference, &create_json, &args)?;

        let mut report = JobReport {
            id: job.id(),
            ..Default::default()
        };

        let Some(remote) = self.options.upload_to.as_deref() else {
            return Ok(report);
        };

        // The manifest lists the package and every requirement used to build it
        let manifest = BuildManifest::load(&create_json)?;
        for item in &manifest.installed {
            let reference = item.reference().to_string();
            match self.upload_decision(item, workdir.path())? {
                UploadDecision::Upload => {
                    self.conan().upload_binaries(remote, &reference)?;
                    report.uploaded.push(reference);
                }
                UploadDecision::Skip(reason) => {
                    info!("{}", skip_message(&reference, &reason));
                    report.skipped.push((reference, reason));
                }
            }
        }

        Ok(report)
    }

    /// Everything after `conan create <folder> <ref>@ --update --json <file>`
    ///
    /// The configuration's own `missing` entry is dropped: the force-build
    /// mode alone decides that policy.
    pub fn create_arguments(&self, job: &ConfiguredPackage, package_name: &str) -> Vec<String> {
        let mut args = job.config.without_build_missing().install_options();
        for option in &job.package.options {
            args.push("--options:host".to_string());
            args.push(option.clone());
        }
        args.extend(self.options.force_build.build_flags(package_name));
        args
    }

    /// Binaries of `reference` in the local cache
    pub fn search_local_packages(&self, reference: &str, workdir: &Path) -> Result<Vec<BinaryRecord>> {
        self.conan()
            .search_local_packages(reference, &workdir.join("search.json"))
    }

    /// Apply the upload policy to one installed package
    pub fn upload_decision(&self, item: &InstalledItem, workdir: &Path) -> Result<UploadDecision> {
        if item.package_name() == SELF_MODIFYING_TOOL {
            return Ok(UploadDecision::Skip(SkipReason::SelfModifying));
        }

        let packages = self.search_local_packages(item.reference(), workdir)?;
        let Some(first) = packages.first() else {
            return Ok(UploadDecision::Skip(SkipReason::NoLocalPackages));
        };

        // OS-universal packages (script-only tools) are published from other
        // platforms, where file modes survive packaging
        if self.options.host.is_windows() && !first.is_os_specific() {
            return Ok(UploadDecision::Skip(SkipReason::NotOsSpecific));
        }

        Ok(UploadDecision::Upload)
    }
}

/// Log line for a skipped upload
pub fn skip_message(reference: &str, reason: &SkipReason) -> String {
    match reason {
        SkipReason::SelfModifying => format!(
            "Not uploading {}, because it tends to modify itself during use.",
            reference
        ),
        SkipReason::NoLocalPackages => {
            format!("Not uploading {} because there are no local packages", reference)
        }
        SkipReason::NotOsSpecific => format!(
            "Not uploading {} on Windows, because it is not os-specific.",
            reference
        ),
    }
}
