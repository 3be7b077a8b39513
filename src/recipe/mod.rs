// src/recipe/mod.rs

//! The recipe index
//!
//! A checkout keeps one directory per package under `recipes/`. This module
//! discovers which versions each package offers and where their recipes
//! live, and exports those recipes to the Conan cache.

pub mod export;
pub mod index;

pub use export::{
    export_package, export_packages, RecipeSelection, DEFAULT_MERGES, DEFAULT_RECIPE_REMOTE,
};
pub use index::{conandata_versions, RecipeIndex, VersionCatalog, CONANDATA_YML, CONFIG_YML};
