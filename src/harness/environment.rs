// src/harness/environment.rs

//! Shell environment for builds on Windows
//!
//! Recipes that run autotools need a POSIX shell. On Windows the harness
//! installs the `msys2` tool package first and makes sure Conan will not pick
//! up the WSL launcher instead.

use crate::config::BuildConfiguration;
use crate::error::{Error, Result};
use crate::harness::orchestrator::SELF_MODIFYING_TOOL;
use crate::platform::HostPlatform;
use crate::tools::{BuildManifest, CommandRunner, Conan, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Reference installed to provide a shell on Windows
pub const MSYS2_REFERENCE: &str = "msys2/cci.latest";

/// Configuration the shell package is installed with
pub const MSYS2_CONFIG: &str = "ReleaseTool";

/// Location of the WSL launcher, which cannot run recipe scripts
const WSL_BASH: &str = r"c:\windows\system32\bash.exe";

#[derive(Debug, Deserialize)]
struct BuildInfo {
    #[serde(default)]
    deps_env_info: HashMap<String, serde_json::Value>,
}

/// Environment handed to every build subprocess
#[derive(Debug, Clone, Default)]
pub struct ShellEnvironment {
    /// `MSYS_BIN` of the installed shell package
    pub msys_bin: Option<PathBuf>,
    /// Child process environment; `None` inherits this process's
    pub env: Environment,
}

impl ShellEnvironment {
    /// Whether this host needs the shell package at all
    pub fn required_on(host: &HostPlatform) -> bool {
        host.is_windows() && !host.is_arm64()
    }

    /// Prepare the environment, installing the shell package where required
    pub fn prepare(
        runner: &dyn CommandRunner,
        conan_program: &str,
        host: &HostPlatform,
        release_tool: &BuildConfiguration,
        upload_to: Option<&str>,
    ) -> Result<Self> {
        if !Self::required_on(host) {
            return Ok(Self::default());
        }

        let msys_bin = install_msys2(runner, conan_program, release_tool, upload_to)?;
        if msys_bin.is_some() {
            check_bash(which::which("bash").ok().as_deref())?;
        }

        Ok(Self {
            msys_bin,
            env: None,
        })
    }
}

/// Install the shell package and return its `MSYS_BIN`
///
/// The package is uploaded when it was built here, while it is still clean.
pub fn install_msys2(
    runner: &dyn CommandRunner,
    conan_program: &str,
    release_tool: &BuildConfiguration,
    upload_to: Option<&str>,
) -> Result<Option<PathBuf>> {
    let install_dir = TempDir::new()
        .map_err(|e| Error::IoError(format!("Failed to create temporary directory: {}", e)))?;
    let install_json = install_dir.path().join("install.json");

    let env: Environment = None;
    let conan = Conan::new(runner, conan_program, &env);
    conan.install(
        MSYS2_REFERENCE,
        install_dir.path(),
        &install_json,
        &release_tool.install_options(),
    )?;

    if let Some(remote) = upload_to {
        let manifest = BuildManifest::load(&install_json)?;
        for item in &manifest.installed {
            if item.package_name() == SELF_MODIFYING_TOOL && item.any_built() {
                conan.upload_binaries(remote, item.reference())?;
            }
        }
    }

    let msys_bin = read_msys_bin(&install_dir.path().join("conanbuildinfo.json"))?;
    match &msys_bin {
        Some(bin) => info!("Using MSYS2 from {}", bin.display()),
        None => debug!("{} did not provide MSYS_BIN", MSYS2_REFERENCE),
    }
    Ok(msys_bin)
}

/// `MSYS_BIN` from the `deps_env_info` of a `conanbuildinfo.json`
pub fn read_msys_bin(build_info: &Path) -> Result<Option<PathBuf>> {
    let content = fs::read_to_string(build_info)
        .map_err(|e| Error::IoError(format!("Failed to read {}: {}", build_info.display(), e)))?;
    let info: BuildInfo = serde_json::from_str(&content)?;

    // Conan writes path-like values either as a string or a list of strings
    let value = match info.deps_env_info.get("MSYS_BIN") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Array(items)) => {
            items.first().and_then(|v| v.as_str()).map(String::from)
        }
        _ => None,
    };
    Ok(value.map(PathBuf::from))
}

/// Refuse to build when `bash` on `PATH` is the WSL launcher
pub fn check_bash(bash: Option<&Path>) -> Result<()> {
    let Some(bash) = bash else {
        return Ok(());
    };
    if bash.to_string_lossy().to_lowercase() == WSL_BASH {
        return Err(Error::EnvironmentError(
            "Building on Windows doesn't work with WSL2 installed".to_string(),
        ));
    }
    Ok(())
}
