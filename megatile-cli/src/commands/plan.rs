//! Plan command - list the tiles a render would produce without running it.

use std::io::{self, Write};

use megatile::grid::{Bounds, Grid, Partition, Point};
use megatile::quadtree;

use super::common::resolve_tile_size;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the plan command.
pub struct PlanArgs {
    pub tile: Option<u32>,
    pub size: u32,
    pub lo: Point,
    pub hi: Point,
    pub json: bool,
}

/// Run the plan command.
pub fn run(args: PlanArgs, verbose: u8) -> Result<(), CliError> {
    let runner = CliRunner::new(verbose)?;
    runner.log_startup("plan");

    let tile_size = resolve_tile_size(args.tile, runner.config())?;
    let grid = Grid::new(args.size, tile_size).map_err(|e| CliError::Config(e.to_string()))?;
    let bounds = Bounds::new(args.lo, args.hi).map_err(|e| CliError::Config(e.to_string()))?;
    let partition = Partition::new(bounds, grid);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = if args.json {
        write_json(&mut out, &partition)
    } else {
        write_table(&mut out, &partition)
    };
    result.map_err(|e| CliError::Output(e.to_string()))
}

/// Writes the plan as one JSON document.
pub fn write_json<W: Write>(out: &mut W, partition: &Partition) -> io::Result<()> {
    let grid = partition.grid();
    let plan = serde_json::json!({
        "size": grid.size(),
        "tile_size": grid.tile_size(),
        "tile_count": grid.tile_count(),
        "depth": grid.depth(),
        "bounds": partition.bounds(),
        "span": partition.span(),
        "extent": partition.extent(),
        "quadtree": quadtree::leaf_order(grid.size()),
        "tiles": partition.tiles(),
    });
    serde_json::to_writer_pretty(&mut *out, &plan)?;
    writeln!(out)
}

/// Writes the plan as a human-readable table.
pub fn write_table<W: Write>(out: &mut W, partition: &Partition) -> io::Result<()> {
    let grid = partition.grid();
    writeln!(
        out,
        "{} tiles ({}x{}, {}px each), quadtree depth {}",
        grid.tile_count(),
        grid.size(),
        grid.size(),
        grid.tile_size(),
        grid.depth()
    )?;
    writeln!(out, "span {}  extent {}", partition.span(), partition.extent())?;
    writeln!(out)?;
    writeln!(out, "{:>8}  {:>11}  {:<40}  {}", "tile", "grid", "lo", "hi")?;
    for tile in partition.tiles() {
        writeln!(
            out,
            "{:>8}  {:>11}  {:<40}  {}",
            tile.file_name(),
            format!("({},{})", tile.x, tile.y),
            tile.lo.to_string(),
            tile.hi
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition() -> Partition {
        let bounds = Bounds::new(Point::new(0.0, 0.0), Point::new(4.0, 2.0)).unwrap();
        Partition::new(bounds, Grid::new(2, 4).unwrap())
    }

    #[test]
    fn test_json_plan_lists_every_tile() {
        let mut out = Vec::new();
        write_json(&mut out, &partition()).unwrap();

        let plan: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(plan["tile_count"], 4);
        assert_eq!(plan["depth"], 1);
        assert_eq!(plan["quadtree"], serde_json::json!([1, 2, 3, 4]));

        let tiles = plan["tiles"].as_array().unwrap();
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[3]["index"], 4);
        assert_eq!(tiles[3]["x"], 1);
        assert_eq!(tiles[3]["y"], 1);
        assert_eq!(tiles[3]["lo"]["x"], 2.0);
        assert_eq!(tiles[3]["lo"]["y"], 1.0);
    }

    #[test]
    fn test_table_has_one_row_per_tile() {
        let mut out = Vec::new();
        write_table(&mut out, &partition()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("4 tiles (2x2, 4px each), quadtree depth 1\n"));
        let rows: Vec<&str> = text.lines().filter(|l| l.contains(".rgba")).collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[1].contains("(1,0)"));
    }
}
