//! Tracksmith CLI
//!
//! Command-line interface for building and rendering projects through
//! tool calls.

use clap::Parser;
use env_logger::Env;
use log::info;

use tracksmith::cli::commands;
use tracksmith::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    info!("Tracksmith v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::render_config(cli.renderer.as_deref(), cli.timeout_ms);
    match cli.command {
        Some(Commands::New {
            path,
            tempo,
            time_signature,
            name,
        }) => commands::new_project(&path, tempo, &time_signature, name.as_deref()),
        Some(Commands::Script { file, keep_going }) => commands::run_script(&file, keep_going, config),
        Some(Commands::Stdio) => commands::serve_stdio(config),
        Some(Commands::Describe { path, json }) => commands::describe(&path, json),
        Some(Commands::Render {
            path,
            output,
            format,
        }) => commands::render(&path, &output, format.as_deref(), config),
        None => {
            println!("Tracksmith v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}
