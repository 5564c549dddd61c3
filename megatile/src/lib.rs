//! megatile - tiled rendering of very large fractal canvases
//!
//! This library splits a rectangular coordinate domain into a power-of-two
//! grid of square tiles, renders each tile with an external engine through
//! a bounded worker pool, and writes a `mega.yaml` manifest that describes
//! the tiles as a quadtree for a tiled-image viewer.
//!
//! The pieces, leaves first:
//!
//! - [`grid`]: partitions the domain into tiles
//! - [`quadtree`]: emits tile indices in quadtree order
//! - [`dispatch`]: runs one render task per tile with cancellation
//! - [`manifest`]: writes `mega.yaml`
//! - [`canvas`]: the end-to-end pipeline

pub mod canvas;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod grid;
pub mod logging;
pub mod manifest;
pub mod quadtree;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
