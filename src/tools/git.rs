// src/tools/git.rs

//! The few git operations the harness needs
//!
//! Every command runs with `-C <checkout>` so the harness works from any
//! current directory.

use crate::error::Result;
use crate::tools::runner::{CommandRunner, Environment};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Issues git commands against one checkout through a [`CommandRunner`]
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    checkout: &'a Path,
    env: &'a Environment,
}

impl<'a> Git<'a> {
    pub fn new(runner: &'a dyn CommandRunner, checkout: &'a Path, env: &'a Environment) -> Self {
        Self {
            runner,
            checkout,
            env,
        }
    }

    fn args(&self, args: &[&str]) -> Vec<String> {
        let mut full = vec!["-C".to_string(), self.checkout.display().to_string()];
        full.extend(args.iter().map(|a| a.to_string()));
        full
    }

    fn lines(&self, args: &[&str]) -> Result<Vec<String>> {
        let out = self.runner.capture("git", &self.args(args), self.env)?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    /// Remove untracked and ignored files below `folder`
    ///
    /// Folders inside the checkout are passed relative to it, since `-C`
    /// changes what a relative path means.
    pub fn clean(&self, folder: &Path) -> Result<()> {
        info!("Cleaning recipe directory {}...", folder.display());
        let folder = match folder.strip_prefix(self.checkout) {
            Ok(inner) if inner.as_os_str().is_empty() => ".".to_string(),
            Ok(inner) => inner.display().to_string(),
            Err(_) => folder.display().to_string(),
        };
        self.runner
            .run("git", &self.args(&["clean", "-fdx", &folder]), self.env)
    }

    /// Paths below `pathspec` that changed since `commit`, relative to the checkout
    pub fn changed_files(&self, commit: &str, pathspec: &str) -> Result<Vec<String>> {
        self.lines(&["diff", "--name-only", "--relative", commit, "--", pathspec])
    }

    /// The most recent merge commit reachable from HEAD, if any
    pub fn last_merge_commit(&self) -> Result<Option<String>> {
        let lines = self.lines(&["rev-list", "--min-parents=2", "--max-count=1", "HEAD"])?;
        Ok(lines.into_iter().next())
    }

    /// The `merges`-th most recent merge that brought in commits from `branch`
    pub fn merge_from_branch(&self, branch: &str, merges: usize) -> Result<Option<String>> {
        let branch_revs: HashSet<String> = self.lines(&["rev-list", branch])?.into_iter().collect();

        let mut seen = 0;
        for line in self.lines(&["log", "--min-parents=2", "--pretty=%H %P"])? {
            let mut refs = line.split_whitespace();
            let Some(merge) = refs.next() else {
                continue;
            };
            if refs.any(|parent| branch_revs.contains(parent)) {
                seen += 1;
                debug!("Merge {} from {} ({} of {})", merge, branch, seen, merges);
            }
            if seen == merges {
                return Ok(Some(merge.to_string()));
            }
        }
        Ok(None)
    }
}
