// src/commands/mod.rs
//! Command handlers for the pantry CLI

mod build;
mod completions;
mod jobs;
mod resolve;
mod upload_recipes;
mod versions;

// Re-export all command handlers
pub use build::cmd_build;
pub use completions::cmd_completions;
pub use jobs::cmd_jobs;
pub use resolve::cmd_resolve;
pub use upload_recipes::cmd_upload_recipes;
pub use versions::cmd_versions;

use anyhow::{Context, Result};
use pantry::{ProjectConfig, RecipeIndex};

/// Open the index at `root` together with its `dlproject.yaml`
fn open_project(root: &str) -> Result<(RecipeIndex, ProjectConfig)> {
    let index = RecipeIndex::new(root);
    let project = ProjectConfig::load(index.root())
        .with_context(|| format!("Failed to load project configuration from {}", root))?;
    Ok((index, project))
}
