//! Render command - render every tile of a new canvas and write its manifest.

use std::path::PathBuf;

use console::style;
use megatile::canvas::{render_canvas_blocking, CanvasConfig, CanvasRun};
use megatile::grid::Point;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::common::{
    resolve_engine, resolve_failure_policy, resolve_iterations, resolve_jobs, resolve_progress,
    resolve_tile_size, FailureMode,
};
use crate::error::CliError;
use crate::interrupt::InterruptSwitch;
use crate::progress::ProgressMode;
use crate::runner::CliRunner;

/// Arguments for the render command.
pub struct RenderArgs {
    pub name: PathBuf,
    pub tile: Option<u32>,
    pub size: u32,
    pub lo: Point,
    pub hi: Point,
    pub iterations: Option<u32>,
    pub jobs: Option<usize>,
    pub engine: Option<PathBuf>,
    pub progress: Option<ProgressMode>,
    pub failure: Option<FailureMode>,
}

/// Run the render command.
pub fn run(args: RenderArgs, verbose: u8) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("render");
    let config = runner.config();

    // Resolve settings: CLI > config > defaults
    let engine = resolve_engine(args.engine, config)?;
    let tile_size = resolve_tile_size(args.tile, config)?;
    let iterations = resolve_iterations(args.iterations, config)?;
    let progress = resolve_progress(args.progress, config);

    let mut builder = CanvasConfig::builder()
        .output_dir(&args.name)
        .lo(args.lo)
        .hi(args.hi)
        .size(args.size)
        .tile_size(tile_size)
        .iterations(iterations)
        .engine(engine)
        .failure_policy(resolve_failure_policy(args.failure, config));
    if let Some(jobs) = resolve_jobs(args.jobs, config) {
        builder = builder.jobs(jobs);
    }
    let canvas = builder.build()?;

    if progress != ProgressMode::None {
        print_banner(&canvas);
    }

    let switch = InterruptSwitch::install()?;
    let cancel = CancellationToken::new();
    let sink = progress.sink(u64::from(canvas.grid().tile_count()));

    let run = {
        let _armed = switch.arm(cancel.clone());
        render_canvas_blocking(&canvas, sink, &cancel)?
    };

    report(&run, progress)
}

fn print_banner(canvas: &CanvasConfig) {
    let grid = canvas.grid();
    let bounds = canvas.bounds();
    println!("megatile v{}", megatile::VERSION);
    println!("=============");
    println!();
    println!("Output:     {}", canvas.output_dir().display());
    println!("Domain:     {} .. {}", bounds.lo, bounds.hi);
    println!(
        "Grid:       {}x{} tiles of {}px ({} tiles)",
        grid.size(),
        grid.size(),
        grid.tile_size(),
        grid.tile_count()
    );
    println!("Iterations: {}", canvas.iterations());
    println!("Engine:     {}", canvas.engine().display());
    println!("Jobs:       {}", canvas.dispatch().jobs());
    println!();
}

fn report(run: &CanvasRun, progress: ProgressMode) -> Result<(), CliError> {
    let report = &run.report;

    for failure in &report.failures {
        warn!(tile = failure.index, error = %failure.error, "Tile failed");
    }

    if progress != ProgressMode::None {
        println!(
            "{} {} of {} tiles in {:.1}s",
            style("Rendered").green().bold(),
            report.rendered,
            report.total,
            report.elapsed.as_secs_f64()
        );
        println!("Manifest:   {}", run.manifest.display());
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(CliError::Incomplete {
            failed: report.failures.len(),
            total: report.total,
        })
    }
}
