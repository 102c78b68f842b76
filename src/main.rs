//! tikzpress - TikZ/LaTeX diagrams for static site pages, cached as SVG.

mod cache;
mod cli;
mod config;
mod diagram;
mod logger;
mod tag;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose());

    let config = Config::load(&cli.config)?;

    match &cli.command {
        Commands::Render { args } => cli::render::render_page(&config, args),
        Commands::Build { build_args } => cli::build::build_pages(&config, build_args.clean),
        Commands::Clean { all } => cli::clean::clean(&config, *all),
    }
}
