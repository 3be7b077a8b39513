// src/commands/upload_recipes.rs

//! Exporting and uploading recipes

use anyhow::{bail, Context, Result};
use pantry::recipe::{export_packages, RecipeSelection};
use pantry::tools::{Conan, Git};
use pantry::{Environment, RecipeIndex, SystemRunner};

/// Export the selected recipes and upload them to `remote`
pub fn cmd_upload_recipes(
    root: &str,
    conan_program: &str,
    selection: RecipeSelection,
    remote: &str,
    no_upload: bool,
    parallel: bool,
) -> Result<()> {
    let index = RecipeIndex::new(root);
    let runner = SystemRunner;
    let env: Environment = None;

    let git = Git::new(&runner, index.root(), &env);
    let packages = selection
        .packages(&index, &git)
        .with_context(|| format!("Failed to select recipes in {}", root))?;
    if packages.is_empty() {
        bail!(
            "No packages selected; use --package, --all, --since-commit, \
             --since-before-last-merge or --since-merge-from-branch"
        );
    }

    let conan = Conan::new(&runner, conan_program, &env);
    let remote = (!no_upload).then_some(remote);
    export_packages(&index, &conan, &packages, remote, parallel)
        .with_context(|| format!("Failed to export recipes from {}", root))?;

    println!("Exported {} package(s)", packages.len());
    Ok(())
}
