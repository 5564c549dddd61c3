//! Canvas render configuration and its builder.

use std::path::{Path, PathBuf};

use crate::dispatch::{DispatchConfig, FailurePolicy};
use crate::engine::WorkerSignals;
use crate::grid::{Bounds, Grid, Point};

use super::CanvasError;

/// Everything needed to render one mega-canvas.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    output_dir: PathBuf,
    bounds: Bounds,
    grid: Grid,
    iterations: u32,
    engine: PathBuf,
    dispatch: DispatchConfig,
}

impl CanvasConfig {
    pub fn builder() -> CanvasConfigBuilder {
        CanvasConfigBuilder::default()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn engine(&self) -> &Path {
        &self.engine
    }

    pub fn dispatch(&self) -> &DispatchConfig {
        &self.dispatch
    }
}

/// Builder for [`CanvasConfig`].
///
/// `build` validates every parameter so a bad configuration is rejected
/// before the output directory is created.
#[derive(Debug, Clone, Default)]
pub struct CanvasConfigBuilder {
    output_dir: Option<PathBuf>,
    lo: Option<Point>,
    hi: Option<Point>,
    size: Option<u32>,
    tile_size: Option<u32>,
    iterations: Option<u32>,
    engine: Option<PathBuf>,
    jobs: Option<usize>,
    failure_policy: FailurePolicy,
    worker_signals: WorkerSignals,
}

impl CanvasConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn lo(mut self, lo: Point) -> Self {
        self.lo = Some(lo);
        self
    }

    pub fn hi(mut self, hi: Point) -> Self {
        self.hi = Some(hi);
        self
    }

    /// Tiles per side.
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Pixels per tile side.
    pub fn tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = Some(tile_size);
        self
    }

    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn engine(mut self, engine: impl Into<PathBuf>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Worker count; defaults to the available parallelism.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn worker_signals(mut self, signals: WorkerSignals) -> Self {
        self.worker_signals = signals;
        self
    }

    pub fn build(self) -> Result<CanvasConfig, CanvasError> {
        let output_dir = self
            .output_dir
            .ok_or(CanvasError::MissingParameter("output directory"))?;
        let lo = self.lo.ok_or(CanvasError::MissingParameter("lower bound"))?;
        let hi = self.hi.ok_or(CanvasError::MissingParameter("upper bound"))?;
        let size = self.size.ok_or(CanvasError::MissingParameter("image size"))?;
        let tile_size = self
            .tile_size
            .ok_or(CanvasError::MissingParameter("tile size"))?;
        let iterations = self
            .iterations
            .ok_or(CanvasError::MissingParameter("iterations"))?;
        let engine = self.engine.ok_or(CanvasError::MissingParameter("engine"))?;

        if iterations == 0 {
            return Err(CanvasError::InvalidIterations);
        }

        let grid = Grid::new(size, tile_size)?;
        let bounds = Bounds::new(lo, hi)?;
        let dispatch = match self.jobs {
            Some(jobs) => DispatchConfig::new(jobs)?,
            None => DispatchConfig::default(),
        }
        .with_failure_policy(self.failure_policy)
        .with_worker_signals(self.worker_signals);

        Ok(CanvasConfig {
            output_dir,
            bounds,
            grid,
            iterations,
            engine,
            dispatch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ConfigError;

    fn complete() -> CanvasConfigBuilder {
        CanvasConfig::builder()
            .output_dir("canvas")
            .lo(Point::new(-2.0, -1.5))
            .hi(Point::new(1.0, 1.5))
            .size(4)
            .tile_size(256)
            .iterations(500)
            .engine("/usr/local/bin/mandelbrot")
    }

    #[test]
    fn test_build_complete_config() {
        let config = complete().jobs(2).build().unwrap();
        assert_eq!(config.grid().tile_count(), 16);
        assert_eq!(config.iterations(), 500);
        assert_eq!(config.dispatch().jobs(), 2);
        assert_eq!(config.output_dir(), Path::new("canvas"));
    }

    #[test]
    fn test_missing_parameter() {
        let err = CanvasConfig::builder().size(4).build().unwrap_err();
        assert!(matches!(err, CanvasError::MissingParameter("output directory")));
    }

    #[test]
    fn test_invalid_grid_rejected() {
        let err = complete().size(1).build().unwrap_err();
        assert!(matches!(
            err,
            CanvasError::Config(ConfigError::GridTooSmall(1))
        ));
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let err = complete().jobs(0).build().unwrap_err();
        assert!(matches!(err, CanvasError::Config(ConfigError::ZeroJobs)));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let err = complete().iterations(0).build().unwrap_err();
        assert!(matches!(err, CanvasError::InvalidIterations));
    }
}
