//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod filters;
pub mod helpers;
pub mod output;
pub mod viz;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat, WindowArgs};

use miette::Result;

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Pareto(args) => commands::pareto::run(args, &global),
        Commands::Stations(args) => commands::stations::run(args, &global),
        Commands::Pchart(args) => commands::pchart::run(args, &global),
        Commands::Yield(args) => commands::yields::run(args, &global),
        Commands::Rollup(args) => commands::rollup::run(args, &global),
        Commands::Standardize(args) => commands::standardize::run(args, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
