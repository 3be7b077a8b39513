// src/cli/mod.rs
//! CLI definitions for pantry
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations are in the `commands` module.
//!
//! - `build` - Build (and optionally upload) every tool package job
//! - `jobs` - List the jobs `build` would run
//! - `versions` - Show the versions a package offers
//! - `resolve` - Resolve a version range against the index
//! - `upload-recipes` - Export recipes and upload them to a remote
//! - `completions` - Generate shell completion scripts

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use pantry::recipe::{DEFAULT_MERGES, DEFAULT_RECIPE_REMOTE};
use pantry::tools::DEFAULT_CONAN;

#[derive(Parser)]
#[command(name = "pantry")]
#[command(author = "Pantry Contributors")]
#[command(version)]
#[command(about = "Build and publish tool packages for a Conan recipe index", long_about = None)]
pub struct Cli {
    /// Root of the recipe index checkout
    #[arg(short, long, global = true, default_value = ".")]
    pub root: String,

    /// Conan executable
    #[arg(long, global = true, default_value = DEFAULT_CONAN)]
    pub conan: String,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every tool package in every configuration it applies to
    Build {
        /// Only run jobs whose identifier contains this text
        filter: Option<String>,

        /// Remote to upload built binaries to
        #[arg(long, env = "PANTRY_UPLOAD_TO")]
        upload_to: Option<String>,

        /// Rebuild policy: package, with-requirements or missing (other values are rejected)
        #[arg(long, env = "PANTRY_FORCE_BUILD", default_value = "missing")]
        force_build: String,

        /// Stop at the first failing job
        #[arg(long)]
        fail_fast: bool,
    },

    /// List build job identifiers
    Jobs,

    /// Show the versions of a package and their recipe folders
    Versions {
        /// Package name
        package: String,
    },

    /// Resolve a package reference, e.g. "cmake/[>=3.21 <4]"
    Resolve {
        /// Package reference, with a version or a bracketed range
        reference: String,
    },

    /// Export recipes to the local cache and upload them
    UploadRecipes {
        /// Package to upload (repeatable)
        #[arg(short, long = "package")]
        packages: Vec<String>,

        /// Upload every package in the index
        #[arg(long)]
        all: bool,

        /// Upload packages changed since this commit
        #[arg(long)]
        since_commit: Option<String>,

        /// Upload packages changed since just before the most recent merge
        #[arg(long)]
        since_before_last_merge: bool,

        /// Upload packages changed since a merge from this branch
        #[arg(long)]
        since_merge_from_branch: Option<String>,

        /// Which merge from the branch to diff against, 1 being the latest
        #[arg(long, default_value_t = DEFAULT_MERGES)]
        merges: usize,

        /// Export only, do not upload
        #[arg(long)]
        no_upload: bool,

        /// Export one package at a time
        #[arg(long)]
        no_parallel: bool,

        /// Remote to upload to
        #[arg(long, default_value = DEFAULT_RECIPE_REMOTE)]
        remote: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}
