#![forbid(unsafe_code)]

//! Headless section layout algorithms.
//!
//! `narwhal` positions the nodes of one small graph ("section") at a time:
//! a layered left-to-right layout for tiny sections, a constrained
//! force-directed layout for larger ones, and a fixed-column grid for nodes
//! without edges. It knows nothing about the surrounding diagram; callers
//! translate the section-local coordinates themselves.

pub mod algo;
pub mod error;
pub mod graph;

pub use algo::{
    Algorithm, AlignmentConstraint, ConstrainedOptions, GridOptions, LayeredOptions, RankDir,
};
pub use error::{Error, Result};
pub use graph::{Bounds, Edge, Graph, LayoutResult, Node, Point};

/// Headless layout entry point.
pub fn layout(graph: &Graph, algorithm: &Algorithm) -> Result<LayoutResult> {
    graph.validate()?;
    let mut result = match algorithm {
        Algorithm::Layered(opts) => algo::layered::layout(graph, opts)?,
        Algorithm::Constrained(opts) => algo::constrained::layout(graph, opts)?,
        Algorithm::Grid(opts) => algo::grid::layout(graph, opts)?,
    };
    result.bounds = graph::bounds_of(graph, &result.positions);
    Ok(result)
}
