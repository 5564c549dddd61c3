//! megatile CLI - Command-line interface
//!
//! Renders a mega-canvas with an external fractal engine and writes the
//! `mega.yaml` manifest that indexes its tiles.

mod commands;
mod error;
mod interrupt;
mod progress;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use megatile::grid::Point;

use commands::common::FailureMode;
use commands::config::ConfigCommands;
use commands::plan::PlanArgs;
use commands::render::RenderArgs;
use error::CliError;
use progress::ProgressMode;

#[derive(Parser)]
#[command(name = "megatile")]
#[command(version)]
#[command(about = "Render a fractal as a tiled mega-canvas", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every tile of a new canvas and write its manifest
    Render {
        /// Output document name (a new directory)
        name: PathBuf,

        /// Tile size in pixels (must be a power of 2)
        #[arg(long, value_name = "PIXELS")]
        tile: Option<u32>,

        /// Image size in tiles per side (must be a power of 2)
        #[arg(long, value_name = "TILES")]
        size: u32,

        /// Lower bound coordinates
        #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
        lo: Point,

        /// Upper bound coordinates
        #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
        hi: Point,

        /// Maximum number of fractal iterations
        #[arg(long, value_name = "N")]
        iterations: Option<u32>,

        /// Number of concurrent jobs to run (default: number of CPUs)
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<usize>,

        /// Path to the fractal engine
        #[arg(long, alias = "mandelbrot", value_name = "PATH")]
        engine: Option<PathBuf>,

        /// Progress display
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,

        /// What to do when the engine fails on a tile
        #[arg(long, value_enum)]
        failure: Option<FailureMode>,
    },

    /// Write mega.yaml for an existing directory of tiles
    Manifest {
        /// Directory holding the tiles
        dir: PathBuf,

        /// Tile size in pixels (must be a power of 2)
        #[arg(long, value_name = "PIXELS")]
        tile: Option<u32>,

        /// Image size in tiles per side (must be a power of 2)
        #[arg(long, value_name = "TILES")]
        size: u32,
    },

    /// List the tiles a render would produce, without rendering
    Plan {
        /// Tile size in pixels (must be a power of 2)
        #[arg(long, value_name = "PIXELS")]
        tile: Option<u32>,

        /// Image size in tiles per side (must be a power of 2)
        #[arg(long, value_name = "TILES")]
        size: u32,

        /// Lower bound coordinates
        #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
        lo: Point,

        /// Upper bound coordinates
        #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
        hi: Point,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// View or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Render {
            name,
            tile,
            size,
            lo,
            hi,
            iterations,
            jobs,
            engine,
            progress,
            failure,
        } => commands::render::run(
            RenderArgs {
                name,
                tile,
                size,
                lo,
                hi,
                iterations,
                jobs,
                engine,
                progress,
                failure,
            },
            cli.verbose,
        ),
        Commands::Manifest { dir, tile, size } => {
            commands::manifest::run(&dir, tile, size, cli.verbose)
        }
        Commands::Plan {
            tile,
            size,
            lo,
            hi,
            json,
        } => commands::plan::run(
            PlanArgs {
                tile,
                size,
                lo,
                hi,
                json,
            },
            cli.verbose,
        ),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
