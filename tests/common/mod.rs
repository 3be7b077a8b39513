// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use pantry::{CommandRunner, Environment, Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a recipe index with one folder per version for each package.
///
/// Returns the TempDir - keep it alive to prevent cleanup.
pub fn setup_index(packages: &[(&str, &[&str])], project_yaml: &str) -> TempDir {
    let temp_dir = tempfile::tempdir().unwrap();
    for (package, versions) in packages {
        for version in *versions {
            let folder = temp_dir.path().join("recipes").join(package).join(version);
            fs::create_dir_all(&folder).unwrap();
            fs::write(folder.join("conanfile.py"), "").unwrap();
        }
    }
    fs::write(temp_dir.path().join("dlproject.yaml"), project_yaml).unwrap();
    temp_dir
}

/// Build manifest as written by `conan create --json`, one entry per reference
pub fn create_manifest(references: &[&str]) -> String {
    let installed: Vec<String> = references
        .iter()
        .map(|r| {
            format!(
                r#"{{"recipe": {{"id": "{}#0123abcd"}}, "packages": [{{"id": "p", "built": true}}]}}"#,
                r
            )
        })
        .collect();
    format!(r#"{{"error": false, "installed": [{}]}}"#, installed.join(", "))
}

/// Output of `conan search <ref>@ -j` with the given binaries' settings
pub fn search_output(reference: &str, settings: &[&str]) -> String {
    let packages: Vec<String> = settings
        .iter()
        .map(|s| format!(r#"{{"id": "p", "settings": {}}}"#, s))
        .collect();
    format!(
        r#"{{"error": false, "results": [{{"remote": null, "items": [{{"recipe": {{"id": "{}"}}, "packages": [{}]}}]}}]}}"#,
        reference,
        packages.join(", ")
    )
}

/// Records every command instead of running it.
///
/// `conan create` gets `create_json` written to its `--json` path, and
/// `conan search` gets the output registered for its reference written to
/// its `-j` path. A command whose line contains `fail_on` fails.
#[derive(Default)]
pub struct RecordingRunner {
    pub commands: Mutex<Vec<String>>,
    pub create_json: String,
    pub search: HashMap<String, String>,
    pub fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn new(create_json: String) -> Self {
        Self {
            create_json,
            ..Default::default()
        }
    }

    pub fn with_search(mut self, reference: &str, output: String) -> Self {
        self.search.insert(reference.to_string(), output);
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on = Some(text.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Commands starting with `prefix`
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[String], _env: &Environment) -> Result<()> {
        let line = format!("{} {}", program, args.join(" "));
        self.commands.lock().unwrap().push(line.clone());

        if let Some(text) = &self.fail_on {
            if line.contains(text.as_str()) {
                return Err(Error::CommandFailed {
                    command: line,
                    code: Some(1),
                });
            }
        }

        match args.first().map(String::as_str) {
            Some("create") => {
                if let Some(path) = value_after(args, "--json") {
                    fs::write(Path::new(path), &self.create_json)?;
                }
            }
            Some("search") => {
                let reference = args[1].trim_end_matches('@');
                if let (Some(path), Some(output)) = (value_after(args, "-j"), self.search.get(reference)) {
                    fs::write(Path::new(path), output)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn capture(&self, program: &str, args: &[String], env: &Environment) -> Result<String> {
        self.run(program, args, env)?;
        Ok(String::new())
    }
}
