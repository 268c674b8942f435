//! Fixed-column grid, filled row-major in graph order.

use crate::algo::GridOptions;
use crate::error::{Error, Result};
use crate::graph::{Graph, LayoutResult, Point, straight_edge_paths};
use indexmap::IndexMap;

pub fn layout(graph: &Graph, opts: &GridOptions) -> Result<LayoutResult> {
    if opts.cols == 0 {
        return Err(Error::InvalidOption {
            option: "cols",
            message: "grid needs at least one column".to_string(),
        });
    }
    if !(opts.cell_width.is_finite() && opts.cell_height.is_finite()) {
        return Err(Error::InvalidOption {
            option: "cell_width/cell_height",
            message: "cell size must be finite".to_string(),
        });
    }

    let cols = opts.cols.min(graph.nodes.len().max(1));
    let mut positions: IndexMap<String, Point> = IndexMap::with_capacity(graph.nodes.len());
    for (idx, n) in graph.nodes.iter().enumerate() {
        let row = idx / cols;
        let col = idx % cols;
        positions.insert(
            n.id.clone(),
            Point {
                x: opts.cell_width * col as f64 + opts.cell_width / 2.0,
                y: opts.cell_height * row as f64 + opts.cell_height / 2.0,
            },
        );
    }

    let edge_paths = straight_edge_paths(graph, &positions);
    Ok(LayoutResult {
        positions,
        edge_paths,
        ..Default::default()
    })
}
