//! Core grid types: points, bounds, the tile grid and individual tiles.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use super::error::ConfigError;

/// File extension of raw tile images written by the engine.
pub const TILE_EXTENSION: &str = "rgba";

/// Returns `log2(value)` if `value` is an exact power of two.
pub fn log2_exact(value: u32, what: &'static str) -> Result<u32, ConfigError> {
    if value.is_power_of_two() {
        Ok(value.trailing_zeros())
    } else {
        Err(ConfigError::NotPowerOfTwo { what, value })
    }
}

/// A point in the fractal's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Error parsing an `X,Y` pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected an X,Y pair, but got '{0}'")]
pub struct ParsePointError(String);

impl FromStr for Point {
    type Err = ParsePointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| ParsePointError(s.to_string()))?;
        let x = x
            .trim()
            .parse()
            .map_err(|_| ParsePointError(s.to_string()))?;
        let y = y
            .trim()
            .parse()
            .map_err(|_| ParsePointError(s.to_string()))?;
        Ok(Point { x, y })
    }
}

/// The full coordinate domain covered by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub lo: Point,
    pub hi: Point,
}

impl Bounds {
    /// Creates bounds, rejecting non-finite or empty ranges.
    pub fn new(lo: Point, hi: Point) -> Result<Self, ConfigError> {
        for p in [lo, hi] {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(ConfigError::NonFiniteBounds { x: p.x, y: p.y });
            }
        }
        if hi.x <= lo.x {
            return Err(ConfigError::EmptyBounds {
                axis: 'x',
                lo: lo.x,
                hi: hi.x,
            });
        }
        if hi.y <= lo.y {
            return Err(ConfigError::EmptyBounds {
                axis: 'y',
                lo: lo.y,
                hi: hi.y,
            });
        }
        Ok(Self { lo, hi })
    }

    /// Width and height of the domain.
    pub fn extent(&self) -> (f64, f64) {
        (self.hi.x - self.lo.x, self.hi.y - self.lo.y)
    }
}

/// A validated power-of-two grid of square tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grid {
    size: u32,
    tile_size: u32,
}

impl Grid {
    /// Creates a grid of `size`×`size` tiles, each `tile_size` pixels square.
    ///
    /// # Errors
    ///
    /// Both values must be powers of two greater than 1. A one-tile grid has
    /// no quadtree to describe and a one-pixel tile has no room for the
    /// overlap border.
    pub fn new(size: u32, tile_size: u32) -> Result<Self, ConfigError> {
        log2_exact(tile_size, "tile size")?;
        if tile_size <= 1 {
            return Err(ConfigError::TileTooSmall(tile_size));
        }
        log2_exact(size, "image size")?;
        if size <= 1 {
            return Err(ConfigError::GridTooSmall(size));
        }
        if size.checked_mul(size).is_none() {
            return Err(ConfigError::TooManyTiles(size));
        }
        Ok(Self { size, tile_size })
    }

    /// Tiles per side.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Pixels per tile side.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Total number of tiles (`size²`).
    pub fn tile_count(&self) -> u32 {
        self.size * self.size
    }

    /// Quadtree depth, `log2(size)`.
    pub fn depth(&self) -> u32 {
        self.size.trailing_zeros()
    }

    /// `log2(tile_size)`, as recorded in the manifest.
    pub fn tile_log_size(&self) -> u32 {
        self.tile_size.trailing_zeros()
    }

    /// Row-major, 1-based index of the tile at grid position `(x, y)`.
    #[inline]
    pub fn index_of(&self, x: u32, y: u32) -> u32 {
        1 + y * self.size + x
    }

    /// Grid position of a 1-based row-major tile index.
    pub fn position_of(&self, index: u32) -> Option<(u32, u32)> {
        if index == 0 || index > self.tile_count() {
            return None;
        }
        let i = index - 1;
        Some((i % self.size, i / self.size))
    }
}

/// One square tile of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tile {
    /// 1-based row-major index; also the file stem.
    pub index: u32,
    pub x: u32,
    pub y: u32,
    pub lo: Point,
    pub hi: Point,
}

impl Tile {
    /// File name of the tile image, e.g. `17.rgba`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.index, TILE_EXTENSION)
    }

    /// Path of the tile image under the output directory.
    pub fn path(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}
