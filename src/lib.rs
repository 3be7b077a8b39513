// src/lib.rs

//! Pantry: a build harness for a Conan recipe index
//!
//! Pantry prebuilds the tool packages a recipe index depends on (cmake,
//! ninja, autotools and friends) for a set of named build configurations,
//! and publishes the resulting binaries to a remote.
//!
//! # Architecture
//!
//! - `recipe`: version discovery over `recipes/<package>/`
//! - `version`: loose semantic versions and Conan-style ranges
//! - `config`: `dlproject.yaml` and its named build configurations
//! - `harness`: job enumeration and the clean/build/upload sequence
//! - `tools`: the `conan` and `git` command lines, behind a runner seam

pub mod config;
mod error;
pub mod harness;
pub mod platform;
pub mod recipe;
pub mod tools;
pub mod version;

pub use config::{BuildConfiguration, ProjectConfig, RawConfiguration};
pub use error::{Error, Result};
pub use harness::{
    enumerate_jobs, BuildOrchestrator, ConfiguredPackage, ForceBuild, JobReport,
    OrchestratorOptions, PackageRequirement, ShellEnvironment,
};
pub use platform::HostPlatform;
pub use recipe::RecipeIndex;
pub use tools::{CommandRunner, Environment, SystemRunner};
pub use version::{max_satisfying, LooseVersion, VersionRange};
