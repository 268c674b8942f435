use crate::error::{Error, Result};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn validate(&self) -> Result<()> {
        let mut node_exists: FxHashSet<&str> = FxHashSet::default();
        for n in &self.nodes {
            if !node_exists.insert(n.id.as_str()) {
                return Err(Error::DuplicateNode {
                    node_id: n.id.clone(),
                });
            }
            if !(n.width.is_finite() && n.height.is_finite() && n.width >= 0.0 && n.height >= 0.0)
            {
                return Err(Error::InvalidSize {
                    node_id: n.id.clone(),
                });
            }
        }
        for e in &self.edges {
            if !node_exists.contains(e.source.as_str()) || !node_exists.contains(e.target.as_str())
            {
                return Err(Error::MissingEndpoint {
                    edge_id: e.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn index_of(&self) -> IndexMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, n)| (n.id.as_str(), idx))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub width: f64,
    pub height: f64,
    /// Initial position (center). Only the constrained layout reads it.
    pub x: f64,
    pub y: f64,
    /// Extra clearance kept around the node when separating overlaps.
    pub padding: f64,
}

impl Node {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            x: 0.0,
            y: 0.0,
            padding: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box in the `{x1, y1, w, h}` form the section packer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x1: f64,
    pub y1: f64,
    pub w: f64,
    pub h: f64,
}

impl Bounds {
    pub fn x2(&self) -> f64 {
        self.x1 + self.w
    }

    pub fn y2(&self) -> f64 {
        self.y1 + self.h
    }

    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for (x, y) in it {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self {
            x1: min_x,
            y1: min_y,
            w: max_x - min_x,
            h: max_y - min_y,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    /// Node centers keyed by node id, in graph order.
    pub positions: IndexMap<String, Point>,
    /// Edge polylines keyed by edge id.
    pub edge_paths: IndexMap<String, Vec<Point>>,
    /// Tight box around the node rectangles.
    pub bounds: Bounds,
}

pub(crate) fn bounds_of(graph: &Graph, positions: &IndexMap<String, Point>) -> Bounds {
    let mut pts: Vec<(f64, f64)> = Vec::with_capacity(graph.nodes.len() * 2);
    for n in &graph.nodes {
        let Some(p) = positions.get(n.id.as_str()) else {
            continue;
        };
        pts.push((p.x - n.width / 2.0, p.y - n.height / 2.0));
        pts.push((p.x + n.width / 2.0, p.y + n.height / 2.0));
    }
    Bounds::from_points(pts).unwrap_or_default()
}

/// Straight source-to-target paths for every edge with two placed endpoints.
pub(crate) fn straight_edge_paths(
    graph: &Graph,
    positions: &IndexMap<String, Point>,
) -> IndexMap<String, Vec<Point>> {
    let mut paths = IndexMap::with_capacity(graph.edges.len());
    for e in &graph.edges {
        let (Some(&a), Some(&b)) = (
            positions.get(e.source.as_str()),
            positions.get(e.target.as_str()),
        ) else {
            continue;
        };
        paths.insert(e.id.clone(), vec![a, b]);
    }
    paths
}
