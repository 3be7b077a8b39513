// src/harness/mod.rs

//! The tool-package build harness
//!
//! Turns `dlproject.yaml` into a list of jobs (one per tool package and
//! configuration) and runs them: clean, build, upload.

pub mod environment;
pub mod jobs;
pub mod orchestrator;
pub mod requirement;

pub use environment::{ShellEnvironment, MSYS2_CONFIG, MSYS2_REFERENCE};
pub use jobs::{cartesian, enumerate_jobs, ConfiguredPackage};
pub use orchestrator::{
    skip_message, BuildOrchestrator, BuildSummary, ForceBuild, JobReport, OrchestratorOptions, SkipReason,
    UploadDecision, SELF_MODIFYING_TOOL, SHARED_BUILD_TOOL,
};
pub use requirement::PackageRequirement;
