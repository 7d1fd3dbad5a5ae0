//! Text renderings of a grid for terminal output.

use anyhow::{Context, Result};
use cellgrid_space::{query, Grid};

/// Draws the grid as rows of glyphs, one character per cell.
///
/// Empty cells are `.`, occupied cells show their agent count and cells
/// holding ten or more agents are drawn as `#`.
pub(crate) fn ascii(grid: &Grid) -> String {
    let view = query::occupancy_view(grid);
    let (width, _) = view.dimensions();
    let mut output = String::new();

    for (index, count) in view.iter().enumerate() {
        if index > 0 && index % width as usize == 0 {
            output.push('\n');
        }
        output.push(glyph(count));
    }

    output
}

/// Serializes the grid snapshot as pretty-printed JSON.
pub(crate) fn json(grid: &Grid) -> Result<String> {
    serde_json::to_string_pretty(&query::snapshot(grid))
        .context("failed to serialize grid snapshot")
}

fn glyph(count: usize) -> char {
    match count {
        0 => '.',
        1..=9 => char::from_digit(count as u32, 10).unwrap_or('#'),
        _ => '#',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgrid_core::{AgentId, CellCoord, GridConfig, OccupancyPolicy};

    fn sample_grid() -> Grid {
        let mut grid =
            Grid::new(GridConfig::new(3, 2, false, OccupancyPolicy::Multi)).expect("valid grid");
        for (id, cell) in [
            (1, CellCoord::new(0, 0)),
            (2, CellCoord::new(2, 1)),
            (3, CellCoord::new(2, 1)),
        ] {
            let _ = grid
                .place_agent(AgentId::new(id), cell)
                .expect("place agent");
        }
        grid
    }

    #[test]
    fn ascii_draws_rows_top_to_bottom() {
        assert_eq!(ascii(&sample_grid()), "1..\n..2");
    }

    #[test]
    fn glyph_saturates_for_crowded_cells() {
        assert_eq!(glyph(0), '.');
        assert_eq!(glyph(7), '7');
        assert_eq!(glyph(12), '#');
    }

    #[test]
    fn json_lists_agents_with_their_cells() {
        let rendered = json(&sample_grid()).expect("serialize snapshot");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");

        assert_eq!(value["width"], 3);
        assert_eq!(value["policy"], "multi");
        assert_eq!(value["agents"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["agents"][1]["cell"]["x"], 2);
    }
}
