// src/recipe/export.rs

//! Exporting recipes to the local cache and uploading them to a remote

use crate::error::{Error, Result};
use crate::recipe::index::RecipeIndex;
use crate::tools::{Conan, Git};
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{error, info};

/// Remote recipes are uploaded to unless another is named
pub const DEFAULT_RECIPE_REMOTE: &str = "conan-center-dl-staging";

/// How many merges from a branch to look back by default
pub const DEFAULT_MERGES: usize = 2;

/// Which recipes to export
#[derive(Debug, Clone, Default)]
pub struct RecipeSelection {
    /// Packages named explicitly
    pub packages: Vec<String>,
    /// Every package in the index
    pub all: bool,
    /// Packages changed since this commit
    pub since_commit: Option<String>,
    /// Packages changed since just before the latest merge commit
    pub since_before_last_merge: bool,
    /// Packages changed since a merge from this branch
    pub since_merge_from_branch: Option<String>,
    /// Which merge from that branch, counting back from HEAD (1 is the latest)
    pub merges: usize,
}

impl RecipeSelection {
    /// Resolve the selection to a sorted set of package names
    ///
    /// All criteria add up. A changed path only counts when it still exists,
    /// so recipes deleted in the range are not exported.
    pub fn packages(&self, index: &RecipeIndex, git: &Git<'_>) -> Result<BTreeSet<String>> {
        let mut packages: BTreeSet<String> = self.packages.iter().cloned().collect();

        if self.all {
            packages.extend(index.packages()?);
        }

        if let Some(commit) = &self.since_commit {
            packages.extend(changed_packages(index, git, commit)?);
        }

        if self.since_before_last_merge {
            match git.last_merge_commit()? {
                Some(merge) => {
                    // First parent of the merge
                    let commit = format!("{}~1", merge);
                    packages.extend(changed_packages(index, git, &commit)?);
                }
                None => info!("No merge commit found, nothing changed since the last merge"),
            }
        }

        if let Some(branch) = &self.since_merge_from_branch {
            let merge = git.merge_from_branch(branch, self.merges)?.ok_or_else(|| {
                Error::NotFound(format!(
                    "merge number {} from {} in the history of HEAD",
                    self.merges, branch
                ))
            })?;
            info!("Using merge {} from {}", merge, branch);
            packages.extend(changed_packages(index, git, &merge)?);
        }

        Ok(packages)
    }
}

fn changed_packages(index: &RecipeIndex, git: &Git<'_>, commit: &str) -> Result<Vec<String>> {
    let changed = git.changed_files(commit, "recipes")?;
    Ok(changed
        .iter()
        .filter(|path| index.root().join(path).exists())
        .filter_map(|path| path.split('/').nth(1))
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect())
}

/// Replace the cached recipes of `package` with every version in the index,
/// then optionally upload them
pub fn export_package(
    index: &RecipeIndex,
    conan: &Conan<'_>,
    package: &str,
    remote: Option<&str>,
) -> Result<()> {
    conan.remove(package)?;

    for (version, folder) in index.versions_to_folders(package)? {
        conan.export(&folder, &format!("{}/{}", package, version))?;
    }

    if let Some(remote) = remote {
        // Forced so the current revision ends up newest even after back-and-forth changes
        conan.upload_recipes(remote, package)?;
    }
    Ok(())
}

/// Export (and upload) each package, stopping at the first failure
///
/// In parallel mode packages are processed concurrently; once one fails no
/// further packages are started.
pub fn export_packages(
    index: &RecipeIndex,
    conan: &Conan<'_>,
    packages: &BTreeSet<String>,
    remote: Option<&str>,
    parallel: bool,
) -> Result<()> {
    info!("*** Uploading:");
    for package in packages {
        info!("    {}", package);
    }

    let export = |package: &String| {
        export_package(index, conan, package, remote).map_err(|e| {
            error!("error exporting/uploading {}: {}", package, e);
            e
        })
    };

    if parallel {
        packages.par_iter().try_for_each(export)
    } else {
        packages.iter().try_for_each(export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{CommandRunner, Environment};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records commands; `capture` answers with the first output whose key
    /// appears in the git arguments
    #[derive(Default)]
    struct Recorder {
        commands: Mutex<Vec<String>>,
        outputs: Vec<(&'static str, &'static str)>,
        fail_on: Option<&'static str>,
    }

    impl Recorder {
        fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl CommandRunner for Recorder {
        fn run(&self, program: &str, args: &[String], _: &Environment) -> Result<()> {
            let line = format!("{} {}", program, args.join(" "));
            self.commands.lock().unwrap().push(line.clone());
            match self.fail_on {
                Some(text) if line.contains(text) => Err(Error::CommandFailed {
                    command: line,
                    code: Some(1),
                }),
                _ => Ok(()),
            }
        }

        fn capture(&self, program: &str, args: &[String], env: &Environment) -> Result<String> {
            self.run(program, args, env)?;
            // Skip `-C <checkout>`
            let line = args.get(2..).unwrap_or_default().join(" ");
            Ok(self
                .outputs
                .iter()
                .find(|(key, _)| line.contains(key))
                .map(|(_, out)| out.to_string())
                .unwrap_or_default())
        }
    }

    fn index() -> (TempDir, RecipeIndex) {
        let temp = TempDir::new().unwrap();
        for dir in ["recipes/zlib/1.2.11", "recipes/zlib/1.2.12", "recipes/cmake/binary"] {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        fs::write(temp.path().join("recipes/zlib/1.2.11/conanfile.py"), "").unwrap();
        fs::write(temp.path().join("recipes/cmake/binary/conanfile.py"), "").unwrap();
        let index = RecipeIndex::new(temp.path());
        (temp, index)
    }

    fn select(index: &RecipeIndex, runner: &Recorder, selection: RecipeSelection) -> Vec<String> {
        let env: Environment = None;
        let git = Git::new(runner, index.root(), &env);
        selection.packages(index, &git).unwrap().into_iter().collect()
    }

    #[test]
    fn test_select_all_and_explicit() {
        let (_temp, index) = index();
        let selection = RecipeSelection {
            packages: vec!["ninja".to_string()],
            all: true,
            ..Default::default()
        };
        assert_eq!(
            select(&index, &Recorder::default(), selection),
            vec!["cmake", "ninja", "zlib"]
        );
    }

    #[test]
    fn test_select_since_commit_skips_deleted() {
        let (temp, index) = index();
        let runner = Recorder {
            outputs: vec![(
                "diff",
                "recipes/zlib/1.2.11/conanfile.py\nrecipes/gone/all/conanfile.py\n",
            )],
            ..Default::default()
        };
        let selection = RecipeSelection {
            since_commit: Some("abc123".to_string()),
            ..Default::default()
        };

        // The index root is not the current directory
        assert_eq!(select(&index, &runner, selection), vec!["zlib"]);
        assert_eq!(
            runner.commands()[0],
            format!(
                "git -C {} diff --name-only --relative abc123 -- recipes",
                temp.path().display()
            )
        );
    }

    #[test]
    fn test_select_since_before_last_merge_diffs_first_parent() {
        let (_temp, index) = index();
        let runner = Recorder {
            outputs: vec![
                ("rev-list", "f00dcafe\n"),
                ("diff", "recipes/cmake/binary/conanfile.py\n"),
            ],
            ..Default::default()
        };
        let selection = RecipeSelection {
            since_before_last_merge: true,
            ..Default::default()
        };

        assert_eq!(select(&index, &runner, selection), vec!["cmake"]);
        let commands = runner.commands();
        assert!(commands[0].ends_with("rev-list --min-parents=2 --max-count=1 HEAD"));
        assert!(commands[1].ends_with("diff --name-only --relative f00dcafe~1 -- recipes"));
    }

    #[test]
    fn test_select_since_merge_from_branch() {
        let (_temp, index) = index();
        let runner = Recorder {
            outputs: vec![
                ("rev-list upstream", "u1\n"),
                ("log", "m2 h1 x1\nm1 h0 u1\n"),
                ("diff", "recipes/zlib/1.2.11/conanfile.py\n"),
            ],
            ..Default::default()
        };
        let selection = RecipeSelection {
            since_merge_from_branch: Some("upstream".to_string()),
            merges: 1,
            ..Default::default()
        };

        assert_eq!(select(&index, &runner, selection), vec!["zlib"]);
        assert!(runner
            .commands()
            .last()
            .unwrap()
            .ends_with("diff --name-only --relative m1 -- recipes"));
    }

    #[test]
    fn test_select_missing_branch_merge_is_error() {
        let (_temp, index) = index();
        let runner = Recorder::default();
        let env: Environment = None;
        let git = Git::new(&runner, index.root(), &env);
        let selection = RecipeSelection {
            since_merge_from_branch: Some("upstream".to_string()),
            merges: DEFAULT_MERGES,
            ..Default::default()
        };
        assert!(matches!(
            selection.packages(&index, &git),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_export_package_commands() {
        let (temp, index) = index();
        let runner = Recorder::default();
        let env: Environment = None;
        let conan = Conan::new(&runner, "conan", &env);

        export_package(&index, &conan, "zlib", Some("staging")).unwrap();

        let folder = |v: &str| temp.path().join("recipes").join("zlib").join(v);
        assert_eq!(
            runner.commands(),
            vec![
                "conan remove zlib --force".to_string(),
                format!("conan export {} zlib/1.2.11@", folder("1.2.11").display()),
                format!("conan export {} zlib/1.2.12@", folder("1.2.12").display()),
                "conan upload -r staging zlib --force --confirm".to_string(),
            ]
        );
    }

    #[test]
    fn test_export_without_upload() {
        let (_temp, index) = index();
        let runner = Recorder::default();
        let env: Environment = None;
        let conan = Conan::new(&runner, "conan", &env);

        export_package(&index, &conan, "cmake", None).unwrap();
        assert!(!runner.commands().iter().any(|c| c.contains("upload")));
    }

    #[test]
    fn test_export_unknown_package_fails() {
        let (_temp, index) = index();
        let runner = Recorder::default();
        let env: Environment = None;
        let conan = Conan::new(&runner, "conan", &env);
        assert!(matches!(
            export_package(&index, &conan, "missing", None),
            Err(Error::IoError(_))
        ));
    }

    #[test]
    fn test_parallel_export_covers_every_package() {
        let (_temp, index) = index();
        let runner = Recorder::default();
        let env: Environment = None;
        let conan = Conan::new(&runner, "conan", &env);
        let packages: BTreeSet<String> = ["cmake", "zlib"].iter().map(|s| s.to_string()).collect();

        export_packages(&index, &conan, &packages, Some("staging"), true).unwrap();

        let mut uploads: Vec<String> = runner
            .commands()
            .into_iter()
            .filter(|c| c.starts_with("conan upload"))
            .collect();
        uploads.sort();
        assert_eq!(
            uploads,
            vec![
                "conan upload -r staging cmake --force --confirm",
                "conan upload -r staging zlib --force --confirm",
            ]
        );
    }

    #[test]
    fn test_export_stops_at_first_failure() {
        let (_temp, index) = index();
        let runner = Recorder {
            fail_on: Some("remove cmake"),
            ..Default::default()
        };
        let env: Environment = None;
        let conan = Conan::new(&runner, "conan", &env);
        let packages: BTreeSet<String> = ["cmake", "zlib"].iter().map(|s| s.to_string()).collect();

        assert!(export_packages(&index, &conan, &packages, None, false).is_err());
        assert!(!runner.commands().iter().any(|c| c.contains("zlib")));

        assert!(export_packages(&index, &conan, &packages, None, true).is_err());
    }
}
