// src/config/profile.rs

//! Named build configurations
//!
//! A configuration bundles the Conan profiles, settings, options, environment,
//! conf entries and build policy used for one kind of build. They live under
//! the `config` key of `dlproject.yaml`:
//!
//! ```yaml
//! config:
//!   ReleaseTool:
//!     description: Release build of a build tool
//!     profile_host: [default]
//!     settings_host: [build_type=Release]
//!     build: [missing]
//!   ReleaseTool-Cross:
//!     include: [ReleaseTool]
//!     settings_host: [arch=armv8]
//! ```
//!
//! Preparing a configuration for use is a fixed pipeline:
//! [`ProfileStore::from_name`] → [`RawConfiguration::validate`] →
//! [`RawConfiguration::normalize`] → [`BuildConfiguration::infer_additional_configuration`].
//! [`ProfileStore::config_from_name`] runs all of it.

use crate::error::{Error, Result};
use crate::platform::HostPlatform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Build policy entry meaning "build whatever is missing from the cache"
pub const BUILD_MISSING: &str = "missing";

/// A configuration exactly as written in the project file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfiguration {
    #[serde(default)]
    pub description: Option<String>,
    /// Other configurations merged in before this one
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub profile: Option<Vec<String>>,
    #[serde(default)]
    pub profile_host: Option<Vec<String>>,
    #[serde(default)]
    pub profile_build: Option<Vec<String>>,

    #[serde(default)]
    pub settings: Option<Vec<String>>,
    #[serde(default)]
    pub settings_host: Option<Vec<String>>,
    #[serde(default)]
    pub settings_build: Option<Vec<String>>,

    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub options_host: Option<Vec<String>>,
    #[serde(default)]
    pub options_build: Option<Vec<String>>,

    #[serde(default)]
    pub env: Option<Vec<String>>,
    #[serde(default)]
    pub env_host: Option<Vec<String>>,
    #[serde(default)]
    pub env_build: Option<Vec<String>>,

    #[serde(default)]
    pub conf: Option<Vec<String>>,
    #[serde(default)]
    pub conf_host: Option<Vec<String>>,
    #[serde(default)]
    pub conf_build: Option<Vec<String>>,

    #[serde(default)]
    pub build: Option<Vec<String>>,
}

fn merge_lists(base: Option<Vec<String>>, overlay: Option<Vec<String>>) -> Option<Vec<String>> {
    match (base, overlay) {
        (Some(mut base), Some(overlay)) => {
            base.extend(overlay);
            Some(base)
        }
        (base, None) => base,
        (None, overlay) => overlay,
    }
}

fn join_lists(unqualified: Option<Vec<String>>, host: Option<Vec<String>>) -> Vec<String> {
    merge_lists(unqualified, host).unwrap_or_default()
}

impl RawConfiguration {
    /// Layer `overlay` on top of `self`: lists concatenate, the description is replaced
    fn merged_with(self, overlay: RawConfiguration) -> Self {
        Self {
            description: overlay.description.or(self.description),
            include: Vec::new(),
            profile: merge_lists(self.profile, overlay.profile),
            profile_host: merge_lists(self.profile_host, overlay.profile_host),
            profile_build: merge_lists(self.profile_build, overlay.profile_build),
            settings: merge_lists(self.settings, overlay.settings),
            settings_host: merge_lists(self.settings_host, overlay.settings_host),
            settings_build: merge_lists(self.settings_build, overlay.settings_build),
            options: merge_lists(self.options, overlay.options),
            options_host: merge_lists(self.options_host, overlay.options_host),
            options_build: merge_lists(self.options_build, overlay.options_build),
            env: merge_lists(self.env, overlay.env),
            env_host: merge_lists(self.env_host, overlay.env_host),
            env_build: merge_lists(self.env_build, overlay.env_build),
            conf: merge_lists(self.conf, overlay.conf),
            conf_host: merge_lists(self.conf_host, overlay.conf_host),
            conf_build: merge_lists(self.conf_build, overlay.conf_build),
            build: merge_lists(self.build, overlay.build),
        }
    }

    /// Reject configurations Conan would misinterpret
    pub fn validate(&self, name: &str) -> Result<()> {
        let ambiguous = [
            ("profile", self.profile.is_some() && self.profile_host.is_some()),
            ("settings", self.settings.is_some() && self.settings_host.is_some()),
            ("options", self.options.is_some() && self.options_host.is_some()),
            ("env", self.env.is_some() && self.env_host.is_some()),
            ("conf", self.conf.is_some() && self.conf_host.is_some()),
        ];
        for (key, both) in ambiguous {
            if both {
                return Err(Error::ConfigError(format!(
                    "configuration {}: use either '{}' or '{}_host', not both",
                    name, key, key
                )));
            }
        }

        let profiles = [&self.profile, &self.profile_host, &self.profile_build];
        for entry in profiles.into_iter().flatten().flatten() {
            if entry.trim().is_empty() {
                return Err(Error::ConfigError(format!(
                    "configuration {}: empty profile name",
                    name
                )));
            }
        }

        let assignments = [
            ("settings", &self.settings),
            ("settings_host", &self.settings_host),
            ("settings_build", &self.settings_build),
            ("options", &self.options),
            ("options_host", &self.options_host),
            ("options_build", &self.options_build),
            ("env", &self.env),
            ("env_host", &self.env_host),
            ("env_build", &self.env_build),
            ("conf", &self.conf),
            ("conf_host", &self.conf_host),
            ("conf_build", &self.conf_build),
        ];
        for (key, values) in assignments {
            for entry in values.iter().flatten() {
                match entry.split_once('=') {
                    Some((k, _)) if !k.trim().is_empty() => {}
                    _ => {
                        return Err(Error::ConfigError(format!(
                            "configuration {}: '{}' entry '{}' is not of the form key=value",
                            name, key, entry
                        )));
                    }
                }
            }
        }

        for entry in self.build.iter().flatten() {
            if entry.trim().is_empty() || entry.contains(char::is_whitespace) {
                return Err(Error::ConfigError(format!(
                    "configuration {}: invalid build pattern '{}'",
                    name, entry
                )));
            }
        }

        Ok(())
    }

    /// Fold unqualified keys into their host form
    pub fn normalize(self, name: &str) -> BuildConfiguration {
        BuildConfiguration {
            name: name.to_string(),
            description: self.description,
            profile_host: join_lists(self.profile, self.profile_host),
            profile_build: self.profile_build.unwrap_or_default(),
            settings_host: join_lists(self.settings, self.settings_host),
            settings_build: self.settings_build,
            options_host: join_lists(self.options, self.options_host),
            options_build: self.options_build.unwrap_or_default(),
            env_host: join_lists(self.env, self.env_host),
            env_build: self.env_build.unwrap_or_default(),
            conf_host: join_lists(self.conf, self.conf_host),
            conf_build: self.conf_build.unwrap_or_default(),
            build: self.build.unwrap_or_default(),
        }
    }
}

/// A validated, normalized configuration ready to drive Conan
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfiguration {
    pub name: String,
    pub description: Option<String>,
    pub profile_host: Vec<String>,
    pub profile_build: Vec<String>,
    pub settings_host: Vec<String>,
    /// Build-machine settings; `None` means "same as host"
    pub settings_build: Option<Vec<String>>,
    pub options_host: Vec<String>,
    pub options_build: Vec<String>,
    pub env_host: Vec<String>,
    pub env_build: Vec<String>,
    pub conf_host: Vec<String>,
    pub conf_build: Vec<String>,
    /// Build policy: package patterns or [`BUILD_MISSING`]
    pub build: Vec<String>,
}

fn lookup<'a>(entries: &'a [String], key: &str) -> Option<&'a str> {
    entries.iter().rev().find_map(|entry| {
        let (k, v) = entry.split_once('=')?;
        (k.trim() == key).then(|| v.trim())
    })
}

impl BuildConfiguration {
    /// Settings that apply to the build machine
    pub fn effective_settings_build(&self) -> &[String] {
        self.settings_build.as_deref().unwrap_or(&self.settings_host)
    }

    /// Value of a host setting (the last assignment wins)
    pub fn host_setting(&self, key: &str) -> Option<&str> {
        lookup(&self.settings_host, key)
    }

    /// Fill in what the project file leaves implicit
    ///
    /// When the host settings target another `os` or `arch` than the machine
    /// running the build, and nothing says what the build machine is, the
    /// machine's own values become the build settings so Conan cross-builds.
    pub fn infer_additional_configuration(&mut self, machine: &HostPlatform) {
        if !self.profile_build.is_empty() {
            return;
        }

        for (key, machine_value) in [("os", machine.os.as_str()), ("arch", machine.arch.as_str())] {
            let Some(target) = self.host_setting(key) else {
                continue;
            };
            if target == machine_value {
                continue;
            }
            let explicit = self
                .settings_build
                .as_deref()
                .and_then(|entries| lookup(entries, key));
            if explicit.is_some() {
                continue;
            }

            debug!(
                "configuration {}: cross-building {}={} from {}, adding build setting",
                self.name, key, target, machine_value
            );
            self.settings_build
                .get_or_insert_with(Vec::new)
                .push(format!("{}={}", key, machine_value));
        }
    }

    /// Copy of this configuration with the `missing` policy entry removed
    pub fn without_build_missing(&self) -> Self {
        Self {
            build: self
                .build
                .iter()
                .filter(|b| b.as_str() != BUILD_MISSING)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// Command-line flags for `conan install`/`conan create`
    pub fn install_options(&self) -> Vec<String> {
        fn push(args: &mut Vec<String>, flag: &str, values: &[String]) {
            for value in values {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }

        let mut args = Vec::new();
        push(&mut args, "--profile:host", &self.profile_host);
        push(&mut args, "--profile:build", &self.profile_build);
        push(&mut args, "--settings:host", &self.settings_host);
        if let Some(settings_build) = &self.settings_build {
            push(&mut args, "--settings:build", settings_build);
        }
        push(&mut args, "--options:host", &self.options_host);
        push(&mut args, "--options:build", &self.options_build);
        push(&mut args, "--env:host", &self.env_host);
        push(&mut args, "--env:build", &self.env_build);
        push(&mut args, "--conf:host", &self.conf_host);
        push(&mut args, "--conf:build", &self.conf_build);
        push(&mut args, "--build", &self.build);
        args
    }
}

/// Lookup of named configurations
#[derive(Debug, Clone, Copy)]
pub struct ProfileStore<'a> {
    configs: &'a BTreeMap<String, RawConfiguration>,
}

impl<'a> ProfileStore<'a> {
    pub fn new(configs: &'a BTreeMap<String, RawConfiguration>) -> Self {
        Self { configs }
    }

    /// Names of every known configuration
    pub fn names(&self) -> impl Iterator<Item = &'a str> {
        self.configs.keys().map(String::as_str)
    }

    /// Load a configuration by name, with its `include` list resolved
    pub fn from_name(&self, name: &str) -> Result<RawConfiguration> {
        let mut stack = Vec::new();
        self.resolve(name, &mut stack)
    }

    fn resolve(&self, name: &str, stack: &mut Vec<String>) -> Result<RawConfiguration> {
        if stack.iter().any(|n| n == name) {
            stack.push(name.to_string());
            return Err(Error::ConfigError(format!(
                "configuration include cycle: {}",
                stack.join(" -> ")
            )));
        }

        let raw = self
            .configs
            .get(name)
            .ok_or_else(|| {
                Error::ConfigError(format!(
                    "no configuration named '{}' (known: {})",
                    name,
                    self.names().collect::<Vec<_>>().join(", ")
                ))
            })?;

        stack.push(name.to_string());
        let mut merged = RawConfiguration::default();
        for include in &raw.include {
            let included = self.resolve(include, stack)?;
            merged = merged.merged_with(included);
        }
        stack.pop();

        Ok(merged.merged_with(raw.clone()))
    }

    /// Load, validate, normalize and complete a configuration
    pub fn config_from_name(&self, name: &str, machine: &HostPlatform) -> Result<BuildConfiguration> {
        let raw = self.from_name(name)?;
        raw.validate(name)?;
        let mut config = raw.normalize(name);
        config.infer_additional_configuration(machine);
        Ok(config)
    }
}
