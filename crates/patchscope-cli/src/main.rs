//! Patchscope CLI: the `patchscope` command.

mod cli;
mod commands;
mod config;
mod render;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::init_logging();
    let settings = support::settings_or_exit(&cli.global);

    match cli.command {
        Commands::ListUpdates {
            kinds,
            all,
            repos,
            xml,
        } => commands::list_updates::run(&settings, kinds, all, repos, xml),

        Commands::ListPatches {
            issues,
            filter,
            all,
            repos,
            xml,
        } => commands::list_patches::run(&settings, issues, filter, all, repos, xml),

        Commands::PatchCheck {
            updatestack_only,
            repos,
        } => commands::patch_check::run(&settings, updatestack_only, repos),

        Commands::Patch {
            issues,
            filter,
            force,
            skip_interactive,
            updatestack_only,
            repos,
        } => commands::patch::run(
            &settings,
            commands::patch::Args {
                issues,
                filter,
                force,
                skip_interactive,
                updatestack_only,
                repos,
            },
        ),
    }
}
