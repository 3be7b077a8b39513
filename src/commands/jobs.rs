// src/commands/jobs.rs

//! Listing build jobs

use super::open_project;
use anyhow::Result;
use pantry::{enumerate_jobs, HostPlatform};

/// Print the identifier of every job `build` would run
pub fn cmd_jobs(root: &str) -> Result<()> {
    let (index, project) = open_project(root)?;
    let jobs = enumerate_jobs(&project, &index, &HostPlatform::current())?;

    if jobs.is_empty() {
        println!("No jobs. Add prebuilt_tools and prebuilt_tools_configs to dlproject.yaml.");
        return Ok(());
    }

    for job in &jobs {
        println!("{}", job);
    }
    Ok(())
}
