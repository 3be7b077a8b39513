// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use pantry::recipe::RecipeSelection;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Some(Commands::Build {
            filter,
            upload_to,
            force_build,
            fail_fast,
        }) => commands::cmd_build(
            &cli.root,
            &cli.conan,
            filter.as_deref(),
            upload_to,
            &force_build,
            fail_fast,
        ),
        Some(Commands::Jobs) => commands::cmd_jobs(&cli.root),
        Some(Commands::Versions { package }) => commands::cmd_versions(&cli.root, &package),
        Some(Commands::Resolve { reference }) => commands::cmd_resolve(&cli.root, &reference),
        Some(Commands::UploadRecipes {
            packages,
            all,
            since_commit,
            since_before_last_merge,
            since_merge_from_branch,
            merges,
            no_upload,
            no_parallel,
            remote,
        }) => commands::cmd_upload_recipes(
            &cli.root,
            &cli.conan,
            RecipeSelection {
                packages,
                all,
                since_commit,
                since_before_last_merge,
                since_merge_from_branch,
                merges,
            },
            &remote,
            no_upload,
            !no_parallel,
        ),
        Some(Commands::Completions { shell }) => commands::cmd_completions(shell),
        None => {
            // No command provided, show help
            println!("pantry v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'pantry --help' for usage information");
            Ok(())
        }
    }
}
