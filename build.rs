// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: recipe index root
fn root_arg() -> Arg {
    Arg::new("root")
        .short('r')
        .long("root")
        .global(true)
        .default_value(".")
        .help("Root of the recipe index checkout")
}

/// Common argument: conan executable
fn conan_arg() -> Arg {
    Arg::new("conan")
        .long("conan")
        .global(true)
        .default_value("conan")
        .help("Conan executable")
}

fn build_cli() -> Command {
    Command::new("pantry")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Pantry Contributors")
        .about("Build and publish tool packages for a Conan recipe index")
        .subcommand_required(false)
        .arg(root_arg())
        .arg(conan_arg())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug output"),
        )
        .subcommand(
            Command::new("build")
                .about("Build every tool package in every configuration it applies to")
                .arg(Arg::new("filter").help("Only run jobs whose identifier contains this text"))
                .arg(
                    Arg::new("upload_to")
                        .long("upload-to")
                        .env("PANTRY_UPLOAD_TO")
                        .help("Remote to upload built binaries to"),
                )
                .arg(
                    Arg::new("force_build")
                        .long("force-build")
                        .env("PANTRY_FORCE_BUILD")
                        .default_value("missing")
                        .value_parser(["package", "with-requirements", "missing"])
                        .help("Rebuild policy (other values are rejected)"),
                )
                .arg(
                    Arg::new("fail_fast")
                        .long("fail-fast")
                        .action(ArgAction::SetTrue)
                        .help("Stop at the first failing job"),
                ),
        )
        .subcommand(Command::new("jobs").about("List build job identifiers"))
        .subcommand(
            Command::new("versions")
                .about("Show the versions of a package and their recipe folders")
                .arg(Arg::new("package").required(true).help("Package name")),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve a package reference, e.g. \"cmake/[>=3.21 <4]\"")
                .arg(
                    Arg::new("reference")
                        .required(true)
                        .help("Package reference, with a version or a bracketed range"),
                ),
        )
        .subcommand(
            Command::new("upload-recipes")
                .about("Export recipes to the local cache and upload them")
                .arg(
                    Arg::new("package")
                        .short('p')
                        .long("package")
                        .action(ArgAction::Append)
                        .help("Package to upload (repeatable)"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Upload every package in the index"),
                )
                .arg(
                    Arg::new("since_commit")
                        .long("since-commit")
                        .help("Upload packages changed since this commit"),
                )
                .arg(
                    Arg::new("since_before_last_merge")
                        .long("since-before-last-merge")
                        .action(ArgAction::SetTrue)
                        .help("Upload packages changed since just before the most recent merge"),
                )
                .arg(
                    Arg::new("since_merge_from_branch")
                        .long("since-merge-from-branch")
                        .help("Upload packages changed since a merge from this branch"),
                )
                .arg(
                    Arg::new("merges")
                        .long("merges")
                        .default_value("2")
                        .help("Which merge from the branch to diff against, 1 being the latest"),
                )
                .arg(
                    Arg::new("no_upload")
                        .long("no-upload")
                        .action(ArgAction::SetTrue)
                        .help("Export only, do not upload"),
                )
                .arg(
                    Arg::new("no_parallel")
                        .long("no-parallel")
                        .action(ArgAction::SetTrue)
                        .help("Export one package at a time"),
                )
                .arg(
                    Arg::new("remote")
                        .long("remote")
                        .default_value("conan-center-dl-staging")
                        .help("Remote to upload to"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("pantry.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
