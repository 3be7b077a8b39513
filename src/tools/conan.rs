// src/tools/conan.rs

//! Thin wrapper around the `conan` command line (Conan 1.x syntax)

use crate::error::{Error, Result};
use crate::tools::manifest::{parse_search_packages, BinaryRecord};
use crate::tools::runner::{command_line, CommandRunner, Environment};
use std::fs;
use std::path::Path;
use tracing::info;

/// Default executable name
pub const DEFAULT_CONAN: &str = "conan";

/// Issues Conan commands through a [`CommandRunner`]
pub struct Conan<'a> {
    runner: &'a dyn CommandRunner,
    program: &'a str,
    env: &'a Environment,
}

impl<'a> Conan<'a> {
    pub fn new(runner: &'a dyn CommandRunner, program: &'a str, env: &'a Environment) -> Self {
        Self {
            runner,
            program,
            env,
        }
    }

    fn run(&self, args: Vec<String>) -> Result<()> {
        self.runner.run(self.program, &args, self.env)
    }

    /// `conan create <folder> <ref>@ --update --json <manifest> [extra...]`
    pub fn create(
        &self,
        recipe_folder: &Path,
        reference: &str,
        manifest: &Path,
        extra: &[String],
    ) -> Result<()> {
        let mut args = vec![
            "create".to_string(),
            recipe_folder.display().to_string(),
            format!("{}@", reference),
            "--update".to_string(),
            "--json".to_string(),
            manifest.display().to_string(),
        ];
        args.extend(extra.iter().cloned());
        info!("Creating package {}: {}", reference, command_line(self.program, &args));
        self.run(args)
    }

    /// `conan install --update <ref>@ -if <folder> -g json --build missing -j <manifest> [extra...]`
    pub fn install(
        &self,
        reference: &str,
        install_folder: &Path,
        manifest: &Path,
        extra: &[String],
    ) -> Result<()> {
        let mut args = vec![
            "install".to_string(),
            "--update".to_string(),
            format!("{}@", reference),
            "-if".to_string(),
            install_folder.display().to_string(),
            "-g".to_string(),
            "json".to_string(),
            "--build".to_string(),
            "missing".to_string(),
            "-j".to_string(),
            manifest.display().to_string(),
        ];
        args.extend(extra.iter().cloned());
        info!("Installing {}: {}", reference, command_line(self.program, &args));
        self.run(args)
    }

    /// Query the local cache for the binaries of `reference`
    ///
    /// Runs `conan search <ref>@ -j <output>` and parses the result.
    pub fn search_local_packages(&self, reference: &str, output: &Path) -> Result<Vec<BinaryRecord>> {
        let args = vec![
            "search".to_string(),
            format!("{}@", reference),
            "-j".to_string(),
            output.display().to_string(),
        ];
        info!(
            "Getting package information for {}: {}",
            reference,
            command_line(self.program, &args)
        );
        self.run(args)?;

        let content = fs::read_to_string(output).map_err(|e| {
            Error::IoError(format!("Failed to read {}: {}", output.display(), e))
        })?;
        parse_search_packages(&content)
    }

    /// `conan upload -r <remote> <ref>@ --all --check`
    pub fn upload_binaries(&self, remote: &str, reference: &str) -> Result<()> {
        let args = vec![
            "upload".to_string(),
            "-r".to_string(),
            remote.to_string(),
            format!("{}@", reference),
            "--all".to_string(),
            "--check".to_string(),
        ];
        info!("Uploading {}: {}", reference, command_line(self.program, &args));
        self.run(args)
    }

    /// `conan remove <package> --force`
    pub fn remove(&self, package: &str) -> Result<()> {
        self.run(vec![
            "remove".to_string(),
            package.to_string(),
            "--force".to_string(),
        ])
    }

    /// `conan export <folder> <ref>@`
    pub fn export(&self, recipe_folder: &Path, reference: &str) -> Result<()> {
        let args = vec![
            "export".to_string(),
            recipe_folder.display().to_string(),
            format!("{}@", reference),
        ];
        info!("Exporting {}: {}", reference, command_line(self.program, &args));
        self.run(args)
    }

    /// `conan upload -r <remote> <package> --force --confirm`
    ///
    /// Forcing puts the current recipe revision on top even when an identical
    /// one was uploaded earlier.
    pub fn upload_recipes(&self, remote: &str, package: &str) -> Result<()> {
        let args = vec![
            "upload".to_string(),
            "-r".to_string(),
            remote.to_string(),
            package.to_string(),
            "--force".to_string(),
            "--confirm".to_string(),
        ];
        info!("Uploading recipes for {}: {}", package, command_line(self.program, &args));
        self.run(args)
    }
}
