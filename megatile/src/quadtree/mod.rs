//! Quadtree index over a row-major tile grid.
//!
//! Tiles are numbered and written in row-major scan order, but a viewer wants
//! to load spatially close tiles together. This module walks the grid as an
//! implicit quadtree and reports tile indices in quadrant order
//! (top-left, top-right, bottom-left, bottom-right), recursively.
//!
//! No tree is ever built: a node is just the recursion state
//! `(base, stride, width)` where `base` is the row-major index of the node's
//! top-left tile, `stride` the full grid side and `width` the node's side.
//!
//! ```text
//! size = 4, row-major numbering       emitted order
//! ┌────┬────┬────┬────┐
//! │  1 │  2 │  3 │  4 │              1  2  5  6
//! ├────┼────┼────┼────┤              3  4  7  8
//! │  5 │  6 │  7 │  8 │              9 10 13 14
//! ├────┼────┼────┼────┤             11 12 15 16
//! │  9 │ 10 │ 11 │ 12 │
//! ├────┼────┼────┼────┤
//! │ 13 │ 14 │ 15 │ 16 │
//! └────┴────┴────┴────┘
//! ```

use std::io::{self, Write};

/// Indentation of a leaf line inside the manifest's `tiles:` list.
pub const LEAF_INDENT: &str = "      ";

/// Calls `visit` with every tile index of a `size`×`size` grid, in
/// quadtree order.
///
/// `size` must be a power of two; the caller validates this (see
/// [`crate::grid::Grid`]). Recursion depth is `log2(size)`.
pub fn visit_leaves<F>(size: u32, mut visit: F)
where
    F: FnMut(u32),
{
    walk(1, size, size, &mut visit);
}

fn walk<F>(base: u32, stride: u32, width: u32, visit: &mut F)
where
    F: FnMut(u32),
{
    if width == 1 {
        visit(base);
        return;
    }

    let half = width / 2;
    walk(base, stride, half, visit);
    walk(base + half, stride, half, visit);
    walk(base + half * stride, stride, half, visit);
    walk(base + half * stride + half, stride, half, visit);
}

/// Collects the quadtree order into a vector.
pub fn leaf_order(size: u32) -> Vec<u32> {
    let mut order = Vec::with_capacity((size as usize) * (size as usize));
    visit_leaves(size, |index| order.push(index));
    order
}

/// Writes one YAML list item per leaf, in quadtree order.
///
/// Stops at the first write error.
pub fn write_leaves<W: Write>(out: &mut W, size: u32) -> io::Result<()> {
    let mut result = Ok(());
    visit_leaves(size, |index| {
        if result.is_ok() {
            result = writeln!(out, "{}- {}", LEAF_INDENT, index);
        }
    });
    result
}
