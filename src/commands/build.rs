// src/commands/build.rs

//! Building tool packages

use super::open_project;
use anyhow::{bail, Context, Result};
use pantry::harness::{skip_message, MSYS2_CONFIG};
use pantry::{
    enumerate_jobs, BuildOrchestrator, ForceBuild, HostPlatform, OrchestratorOptions,
    ShellEnvironment, SystemRunner,
};
use tracing::info;

/// Build every job (or those matching `filter`), uploading when a remote is given
pub fn cmd_build(
    root: &str,
    conan_program: &str,
    filter: Option<&str>,
    upload_to: Option<String>,
    force_build: &str,
    fail_fast: bool,
) -> Result<()> {
    let force_build: ForceBuild = force_build.parse()?;
    let (index, project) = open_project(root)?;
    let host = HostPlatform::current();

    let mut jobs = enumerate_jobs(&project, &index, &host)?;
    if let Some(filter) = filter {
        jobs.retain(|job| job.id().contains(filter));
    }
    if jobs.is_empty() {
        println!("No jobs to run.");
        return Ok(());
    }
    info!("Running {} job(s) on {} (force build: {})", jobs.len(), host, force_build);

    let runner = SystemRunner;
    let shell = if ShellEnvironment::required_on(&host) {
        let release_tool = project
            .profiles()
            .config_from_name(MSYS2_CONFIG, &host)
            .with_context(|| format!("The {} configuration is needed on Windows", MSYS2_CONFIG))?;
        ShellEnvironment::prepare(
            &runner,
            conan_program,
            &host,
            &release_tool,
            upload_to.as_deref(),
        )?
    } else {
        ShellEnvironment::default()
    };

    let orchestrator = BuildOrchestrator::new(
        &index,
        &runner,
        &shell.env,
        OrchestratorOptions {
            conan_program: conan_program.to_string(),
            upload_to,
            force_build,
            host,
        },
    );
    let summary = orchestrator.run_jobs(&jobs, fail_fast)?;

    for report in &summary.reports {
        println!("ok      {}", report.id);
        for reference in &report.uploaded {
            println!("          uploaded {}", reference);
        }
        for (reference, reason) in &report.skipped {
            println!("          {}", skip_message(reference, reason));
        }
    }
    for (id, err) in &summary.failures {
        println!("FAILED  {}: {}", id, err);
    }

    if !summary.succeeded() {
        bail!("{} of {} job(s) failed", summary.failures.len(), jobs.len());
    }
    Ok(())
}
