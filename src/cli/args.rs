//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Render TikZ/LaTeX diagram tags in site pages to cached SVG
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: tikzpress.toml)
    #[arg(short = 'C', long, default_value = "tikzpress.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Expand the diagram tags of a single page
    #[command(visible_alias = "r")]
    Render {
        #[command(flatten)]
        args: RenderArgs,
    },

    /// Expand every page of the content directory into the destination
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Remove intermediate files and the cache index
    #[command(visible_alias = "c")]
    Clean {
        /// Also remove the generated SVG files
        #[arg(short, long)]
        all: bool,
    },
}

/// Render command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct RenderArgs {
    /// Page to expand
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Page URL the diagrams belong to (default: derived from the file path)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Write the expanded page to a file instead of stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Clear intermediate files and the cache index before building
    #[arg(short, long)]
    pub clean: bool,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    pub const fn verbose(&self) -> bool {
        match &self.command {
            Commands::Render { args } => args.verbose,
            Commands::Build { build_args } => build_args.verbose,
            Commands::Clean { .. } => false,
        }
    }
}
