// src/tools/mod.rs

//! External tools driven by the harness: `conan` and `git`

pub mod conan;
pub mod git;
pub mod manifest;
pub mod runner;

pub use conan::{Conan, DEFAULT_CONAN};
pub use git::Git;
pub use manifest::{parse_search_packages, BinaryRecord, BuildManifest, InstalledItem};
pub use runner::{command_line, CommandRunner, Environment, SystemRunner};
