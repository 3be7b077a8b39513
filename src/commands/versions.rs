// src/commands/versions.rs

//! Showing the versions a package offers

use anyhow::{Context, Result};
use pantry::RecipeIndex;

/// Print each version of `package` with its recipe folder
pub fn cmd_versions(root: &str, package: &str) -> Result<()> {
    let index = RecipeIndex::new(root);
    let catalog = index
        .versions_to_folders(package)
        .with_context(|| format!("Failed to list versions of {}", package))?;

    if catalog.is_empty() {
        println!("No versions found for {}", package);
        return Ok(());
    }

    for (version, folder) in &catalog {
        let folder = folder.strip_prefix(index.root()).unwrap_or(folder);
        println!("{:<20} {}", version, folder.display());
    }
    Ok(())
}
