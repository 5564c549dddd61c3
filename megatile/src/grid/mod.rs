//! Grid partitioning module
//!
//! Splits a rectangular coordinate domain into a power-of-two grid of square
//! tiles and computes the coordinate-space bounding box of each tile.
//!
//! Adjacent tiles deliberately overlap by one pixel's worth of coordinate
//! space: each tile's extent is `span * tile_size / (tile_size - 1)`, so the
//! engine's last column and row of pixels land exactly on the first column
//! and row of the neighbouring tile.

mod error;
pub mod morton;
mod types;

pub use error::ConfigError;
pub use types::{log2_exact, Bounds, Grid, ParsePointError, Point, Tile, TILE_EXTENSION};

use rayon::prelude::*;

/// Per-axis geometry shared by every tile of a partitioned domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partition {
    grid: Grid,
    bounds: Bounds,
    /// Distance between the lower corners of adjacent tiles.
    span: Point,
    /// Side length of one tile, including the overlap border.
    extent: Point,
}

impl Partition {
    /// Computes the tile geometry for `grid` over `bounds`.
    pub fn new(bounds: Bounds, grid: Grid) -> Self {
        let size = f64::from(grid.size());
        let tile = f64::from(grid.tile_size());
        let (width, height) = bounds.extent();

        let span = Point::new(width / size, height / size);
        let extent = Point::new(span.x * tile / (tile - 1.0), span.y * tile / (tile - 1.0));

        Self {
            grid,
            bounds,
            span,
            extent,
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn span(&self) -> Point {
        self.span
    }

    pub fn extent(&self) -> Point {
        self.extent
    }

    /// Computes the tile at grid position `(x, y)`.
    ///
    /// The index is derived from the position alone, so tiles can be built
    /// independently and in any order.
    pub fn tile_at(&self, x: u32, y: u32) -> Tile {
        let lo = Point::new(
            self.bounds.lo.x + self.span.x * f64::from(x),
            self.bounds.lo.y + self.span.y * f64::from(y),
        );
        let hi = Point::new(lo.x + self.extent.x, lo.y + self.extent.y);

        Tile {
            index: self.grid.index_of(x, y),
            x,
            y,
            lo,
            hi,
        }
    }

    /// All tiles in row-major order (`y` outer, `x` inner).
    pub fn tiles(&self) -> Vec<Tile> {
        let size = self.grid.size();
        (0..self.grid.tile_count())
            .into_par_iter()
            .map(|i| self.tile_at(i % size, i / size))
            .collect()
    }
}

/// Partitions `[lo, hi]` into `size`×`size` tiles of `tile_size` pixels.
///
/// Returns exactly `size²` tiles in row-major order, numbered from 1.
///
/// # Errors
///
/// Returns [`ConfigError`] if either size is not a power of two greater
/// than 1, or if the bounds are empty or not finite.
pub fn partition(
    lo: Point,
    hi: Point,
    size: u32,
    tile_size: u32,
) -> Result<Vec<Tile>, ConfigError> {
    let bounds = Bounds::new(lo, hi)?;
    let grid = Grid::new(size, tile_size)?;
    Ok(Partition::new(bounds, grid).tiles())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn mandelbrot_partition(size: u32, tile_size: u32) -> Partition {
        let bounds = Bounds::new(Point::new(-2.0, -1.5), Point::new(1.0, 1.5)).unwrap();
        Partition::new(bounds, Grid::new(size, tile_size).unwrap())
    }

    #[test]
    fn test_partition_tile_count_and_order() {
        let tiles = partition(Point::new(0.0, 0.0), Point::new(4.0, 4.0), 4, 256).unwrap();
        assert_eq!(tiles.len(), 16);

        for (i, tile) in tiles.iter().enumerate() {
            assert_eq!(tile.index, i as u32 + 1);
            assert_eq!(tile.x, i as u32 % 4);
            assert_eq!(tile.y, i as u32 / 4);
        }
    }

    #[test]
    fn test_first_tile_starts_at_lower_bound() {
        let p = mandelbrot_partition(8, 256);
        let first = p.tile_at(0, 0);
        assert_eq!(first.lo, Point::new(-2.0, -1.5));
        assert_eq!(first.index, 1);
    }

    #[test]
    fn test_extent_includes_one_pixel_overlap() {
        let p = mandelbrot_partition(2, 4);
        // span = 3.0 / 2 = 1.5; extent = 1.5 * 4 / 3 = 2.0
        assert!((p.span().x - 1.5).abs() < EPS);
        assert!((p.extent().x - 2.0).abs() < EPS);
        assert!((p.extent().y - 2.0).abs() < EPS);

        let tile = p.tile_at(1, 1);
        assert!((tile.lo.x - (-0.5)).abs() < EPS);
        assert!((tile.hi.x - 1.5).abs() < EPS);
        assert!((tile.lo.y - 0.0).abs() < EPS);
        assert!((tile.hi.y - 2.0).abs() < EPS);
    }

    #[test]
    fn test_adjacent_tiles_overlap_by_one_pixel() {
        let p = mandelbrot_partition(4, 256);
        let left = p.tile_at(1, 2);
        let right = p.tile_at(2, 2);

        // Pixel pitch inside a tile is extent / tile_size == span / (tile_size - 1)
        let pixel = p.extent().x / 256.0;
        assert!((left.hi.x - right.lo.x - pixel).abs() < EPS);
    }

    #[test]
    fn test_last_tile_reaches_upper_bound_plus_overlap() {
        let p = mandelbrot_partition(4, 64);
        let last = p.tile_at(3, 3);
        let overhang = p.extent().x - p.span().x;
        assert!((last.hi.x - (1.0 + overhang)).abs() < EPS);
        assert!((last.hi.y - (1.5 + overhang)).abs() < EPS);
        assert_eq!(last.index, 16);
    }

    #[test]
    fn test_partition_rejects_invalid_grid() {
        let lo = Point::new(0.0, 0.0);
        let hi = Point::new(1.0, 1.0);
        assert_eq!(partition(lo, hi, 1, 256), Err(ConfigError::GridTooSmall(1)));
        assert!(partition(lo, hi, 3, 256).is_err());
        assert_eq!(partition(lo, hi, 4, 1), Err(ConfigError::TileTooSmall(1)));
        assert!(partition(hi, lo, 4, 256).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn tiles_cover_domain(
                size_log in 1u32..6,
                tile_log in 1u32..10,
                lo_x in -10.0f64..10.0,
                lo_y in -10.0f64..10.0,
                w in 0.001f64..20.0,
                h in 0.001f64..20.0,
            ) {
                let size = 1 << size_log;
                let tile_size = 1 << tile_log;
                let lo = Point::new(lo_x, lo_y);
                let hi = Point::new(lo_x + w, lo_y + h);
                let tiles = partition(lo, hi, size, tile_size).unwrap();
                let tol = 1e-9 * (1.0 + w.max(h) + lo_x.abs().max(lo_y.abs()));

                prop_assert_eq!(tiles.len(), (size * size) as usize);
                prop_assert_eq!(tiles[0].lo, lo);

                let overhang = w / f64::from(size) / f64::from(tile_size - 1);
                let last = tiles[tiles.len() - 1];
                prop_assert!((last.hi.x - (hi.x + overhang)).abs() < tol);

                for tile in &tiles {
                    prop_assert!(tile.lo.x >= lo.x - tol && tile.lo.y >= lo.y - tol);
                    prop_assert!(tile.hi.x > tile.lo.x && tile.hi.y > tile.lo.y);
                    if tile.x + 1 < size {
                        // Each tile reaches past the next tile's lower edge.
                        let next = tiles[tile.index as usize];
                        prop_assert!(tile.hi.x > next.lo.x);
                    }
                }
            }
        }
    }
}
