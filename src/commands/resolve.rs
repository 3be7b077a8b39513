// src/commands/resolve.rs

//! Resolving a single reference

use anyhow::Result;
use pantry::{PackageRequirement, RecipeIndex};

/// Print the reference a range resolves to, or the input when nothing matches
pub fn cmd_resolve(root: &str, reference: &str) -> Result<()> {
    let index = RecipeIndex::new(root);
    let resolved = PackageRequirement::new(reference).resolve_ranges(&index)?;
    println!("{}", resolved.reference);
    Ok(())
}
