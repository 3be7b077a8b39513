// src/tools/runner.rs

//! Running external programs
//!
//! Every external step the harness takes (git, conan) goes through a
//! [`CommandRunner`], so the orchestration logic can be exercised without the
//! real tools installed.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::process::{Command, Stdio};
use tracing::debug;

/// Environment handed to child processes
///
/// `None` inherits the harness's own environment unchanged.
pub type Environment = Option<HashMap<String, String>>;

/// Executes external commands, failing on a non-zero exit
///
/// Runners are shared between threads when recipes are exported in parallel.
pub trait CommandRunner: Sync {
    /// Run a command with stdout and stderr going to the harness's own streams
    fn run(&self, program: &str, args: &[String], env: &Environment) -> Result<()>;

    /// Run a command and return its stdout
    fn capture(&self, program: &str, args: &[String], env: &Environment) -> Result<String>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(program: &str, args: &[String], env: &Environment) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(vars) = env {
            cmd.env_clear();
            cmd.envs(vars);
        }
        cmd
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], env: &Environment) -> Result<()> {
        debug!("Running {}", command_line(program, args));
        let status = Self::command(program, args, env)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| Error::SpawnFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(Error::CommandFailed {
                command: command_line(program, args),
                code: status.code(),
            });
        }
        Ok(())
    }

    fn capture(&self, program: &str, args: &[String], env: &Environment) -> Result<String> {
        debug!("Capturing {}", command_line(program, args));
        let output = Self::command(program, args, env)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| Error::SpawnFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: command_line(program, args),
                code: output.status.code(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Render a command for log output
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let args = vec!["clean".to_string(), "-fdx".to_string(), "recipes/zlib/all".to_string()];
        assert_eq!(command_line("git", &args), "git clean -fdx recipes/zlib/all");
        assert_eq!(command_line("conan", &[]), "conan");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_exit_code() {
        let err = SystemRunner
            .run("sh", &["-c".to_string(), "exit 3".to_string()], &None)
            .unwrap_err();
        match err {
            Error::CommandFailed { code, .. } => assert_eq!(code, Some(3)),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_capture() {
        let out = SystemRunner
            .capture("sh", &["-c".to_string(), "echo hello".to_string()], &None)
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_system_runner_missing_program() {
        let err = SystemRunner
            .run("pantry-no-such-program", &[], &None)
            .unwrap_err();
        assert!(matches!(err, Error::SpawnFailed { .. }));
    }
}
