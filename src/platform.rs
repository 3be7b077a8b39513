// src/platform.rs

//! The machine the harness runs on, in Conan's setting vocabulary

use std::fmt;

/// Operating system and architecture as Conan spells them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    /// `os` setting value: `Windows`, `Linux`, `Macos`, ...
    pub os: String,
    /// `arch` setting value: `x86_64`, `armv8`, ...
    pub arch: String,
}

impl HostPlatform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Detect the platform this process runs on
    pub fn current() -> Self {
        Self::new(
            conan_os(std::env::consts::OS),
            conan_arch(std::env::consts::ARCH),
        )
    }

    pub fn is_windows(&self) -> bool {
        self.os == "Windows"
    }

    pub fn is_arm64(&self) -> bool {
        self.arch == "armv8"
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Map a Rust target OS name to the Conan `os` setting
pub fn conan_os(os: &str) -> String {
    match os {
        "windows" => "Windows",
        "linux" => "Linux",
        "macos" => "Macos",
        "freebsd" => "FreeBSD",
        "solaris" | "illumos" => "SunOS",
        "aix" => "AIX",
        "android" => "Android",
        other => other,
    }
    .to_string()
}

/// Map a Rust target architecture name to the Conan `arch` setting
pub fn conan_arch(arch: &str) -> String {
    match arch {
        "x86_64" => "x86_64",
        "x86" => "x86",
        "aarch64" => "armv8",
        "arm" => "armv7",
        "powerpc64" => "ppc64",
        "sparc64" => "sparcv9",
        "s390x" => "s390x",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conan_names() {
        assert_eq!(conan_os("windows"), "Windows");
        assert_eq!(conan_os("macos"), "Macos");
        assert_eq!(conan_arch("aarch64"), "armv8");
        assert_eq!(conan_arch("riscv64"), "riscv64");
    }

    #[test]
    fn test_predicates() {
        let win_arm = HostPlatform::new("Windows", "armv8");
        assert!(win_arm.is_windows());
        assert!(win_arm.is_arm64());
        assert!(!HostPlatform::new("Linux", "x86_64").is_windows());
        assert_eq!(HostPlatform::new("Linux", "x86_64").to_string(), "Linux/x86_64");
    }

    #[test]
    fn test_current_is_not_empty() {
        let host = HostPlatform::current();
        assert!(!host.os.is_empty());
        assert!(!host.arch.is_empty());
    }
}
