//! Layout selection and the concurrent per-section layout runs.

use crate::error::{Error, Result};
use crate::model::{PassStats, Point};
use crate::options::LayoutOptions;
use crate::pipeline::{Collection, CollectionKind, Pass};
use futures::FutureExt;
use futures::future::join_all;
use indexmap::IndexMap;
use narwhal::{
    AlignmentConstraint, Algorithm, ConstrainedOptions, GridOptions, LayeredOptions, RankDir,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::panic::AssertUnwindSafe;

/// Section-local result of one layout run, kept across passes by hash code.
#[derive(Debug, Clone)]
pub(crate) struct CachedLayout {
    pub bbox: narwhal::Bounds,
    /// Node centers by layout uid.
    pub positions: IndexMap<String, narwhal::Point>,
    /// Edge polylines by link uid.
    pub edge_paths: IndexMap<String, Vec<narwhal::Point>>,
}

impl From<narwhal::LayoutResult> for CachedLayout {
    fn from(result: narwhal::LayoutResult) -> Self {
        Self {
            bbox: result.bounds,
            positions: result.positions,
            edge_paths: result.edge_paths,
        }
    }
}

/// A section laid out in this pass, either freshly or from the cache.
#[derive(Debug, Clone)]
pub(crate) struct SectionLayout {
    pub layout: CachedLayout,
    /// False when the solver failed and the seed positions were used instead.
    pub settled: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Plan {
    pub hash_code: i32,
    pub graph: narwhal::Graph,
    pub algorithm: Algorithm,
}

/// Chooses the algorithm for `collection` and builds its solver input.
///
/// Force layouts start from `seeds` (last known absolute positions) unless
/// this is the first layout of the view.
pub(crate) fn plan(
    collection: &Collection,
    pass: &Pass,
    seeds: &FxHashMap<String, Point>,
    options: &LayoutOptions,
) -> Plan {
    let h = &options.heuristics;
    let ns = options.node_size;
    let count = collection.members.len();

    let mut members: FxHashSet<&str> = FxHashSet::default();
    let mut nodes = Vec::with_capacity(count);
    for &idx in &collection.members {
        let Some(layout) = pass.layout(idx) else {
            continue;
        };
        members.insert(layout.uid.as_str());
        let size = ns * layout.scale;
        nodes.push(narwhal::Node::new(layout.uid.clone(), size, size));
    }

    let mut edges = Vec::with_capacity(collection.edges.len());
    for &li in &collection.edges {
        let link = &pass.links[li];
        if link.source == link.target
            || !members.contains(link.source.as_str())
            || !members.contains(link.target.as_str())
        {
            continue;
        }
        edges.push(narwhal::Edge {
            id: link.uid.clone(),
            source: link.source.clone(),
            target: link.target.clone(),
        });
    }

    let algorithm = match collection.kind {
        CollectionKind::Grid => Algorithm::Grid(GridOptions {
            cols: count.min(h.grid_columns.pick(count)),
            cell_width: ns * 3.0,
            cell_height: ns * 2.0,
        }),
        CollectionKind::Connected if count <= h.layered_max_nodes => {
            Algorithm::Layered(LayeredOptions {
                rank_dir: RankDir::LR,
                rank_sep: ns * 3.0,
                node_sep: ns * 2.0,
                ..Default::default()
            })
        }
        CollectionKind::Connected => {
            let group_stretch = h.group_stretch.pick(count);
            let mut majors = Vec::new();
            for (node, &idx) in nodes.iter_mut().zip(&collection.members) {
                let Some(layout) = pass.layout(idx) else {
                    continue;
                };
                let hub_stretch = if layout.is_major_hub {
                    majors.push(layout.uid.clone());
                    h.major_hub_stretch.pick(count)
                } else if layout.is_minor_hub {
                    h.minor_hub_stretch.pick(count)
                } else {
                    1.0
                };
                node.padding = ns * layout.scale * group_stretch * hub_stretch / 2.0;
                let seed = if options.first_layout {
                    Point::default()
                } else {
                    seeds
                        .get(&layout.uid)
                        .copied()
                        .unwrap_or(Point::new(1000.0, 1000.0))
                };
                node.x = seed.x;
                node.y = seed.y;
            }
            let alignment_constraint = (majors.len() > 1).then(|| AlignmentConstraint {
                horizontal: vec![majors],
                vertical: Vec::new(),
            });
            Algorithm::Constrained(ConstrainedOptions {
                random_seed: options.seed ^ u64::from(collection.hash_code as u32),
                ideal_edge_length: Some(ns),
                alignment_constraint,
                ..Default::default()
            })
        }
    };

    Plan {
        hash_code: collection.hash_code,
        graph: narwhal::Graph { nodes, edges },
        algorithm,
    }
}

/// Runs `solve` for section `hash_code`, turning errors and panics into [`Error`]s.
async fn contained<F>(hash_code: i32, solve: F) -> Result<narwhal::LayoutResult>
where
    F: FnOnce() -> narwhal::Result<narwhal::LayoutResult>,
{
    let outcome = AssertUnwindSafe(async move { solve() })
        .catch_unwind()
        .await;
    match outcome {
        Ok(result) => result.map_err(|source| Error::Layout { hash_code, source }),
        Err(_) => Err(Error::LayoutPanicked { hash_code }),
    }
}

async fn run_plan(plan: &Plan) -> Result<narwhal::LayoutResult> {
    contained(plan.hash_code, || narwhal::layout(&plan.graph, &plan.algorithm)).await
}

/// Runs every plan concurrently and waits for all of them.
pub(crate) async fn run_plans(plans: &[Plan]) -> Vec<Result<narwhal::LayoutResult>> {
    join_all(plans.iter().map(run_plan)).await
}

/// Seed positions, used when a solver gives up.
fn seed_result(plan: &Plan) -> narwhal::LayoutResult {
    let positions: IndexMap<String, narwhal::Point> = plan
        .graph
        .nodes
        .iter()
        .map(|n| (n.id.clone(), narwhal::Point::new(n.x, n.y)))
        .collect();
    let bbox = narwhal::Bounds::from_points(plan.graph.nodes.iter().flat_map(|n| {
        [
            (n.x - n.width / 2.0, n.y - n.height / 2.0),
            (n.x + n.width / 2.0, n.y + n.height / 2.0),
        ]
    }))
    .unwrap_or_default();
    narwhal::LayoutResult {
        positions,
        edge_paths: IndexMap::new(),
        bounds: bbox,
    }
}

/// Lays out every collection not already in `cache` and returns one layout per
/// collection, in collection order.
///
/// Cache entries whose hash no longer appears are evicted first. A failed
/// section keeps its seed positions and stays out of the cache, so the next
/// pass tries it again.
pub(crate) async fn run_collection_layouts(
    collections: &[Collection],
    pass: &Pass,
    cache: &mut FxHashMap<i32, CachedLayout>,
    seeds: &FxHashMap<String, Point>,
    options: &LayoutOptions,
) -> (Vec<SectionLayout>, PassStats) {
    let live: FxHashSet<i32> = collections.iter().map(|c| c.hash_code).collect();
    let before = cache.len();
    cache.retain(|hash, _| live.contains(hash));
    if cache.len() < before {
        tracing::debug!(evicted = before - cache.len(), "evicted stale section layouts");
    }

    let mut stats = PassStats {
        sections: collections.len(),
        ..Default::default()
    };
    let mut plans: Vec<Plan> = Vec::new();
    let mut planned: FxHashSet<i32> = FxHashSet::default();
    for collection in collections {
        if cache.contains_key(&collection.hash_code) {
            tracing::trace!(hash_code = collection.hash_code, "reusing cached section layout");
            stats.reused += 1;
        } else if planned.insert(collection.hash_code) {
            plans.push(plan(collection, pass, seeds, options));
        }
    }

    let results = run_plans(&plans).await;

    let mut failed: FxHashMap<i32, CachedLayout> = FxHashMap::default();
    for (plan, result) in plans.iter().zip(results) {
        match result {
            Ok(result) => {
                tracing::trace!(
                    hash_code = plan.hash_code,
                    algorithm = plan.algorithm.name(),
                    nodes = plan.graph.nodes.len(),
                    "section laid out"
                );
                stats.computed += 1;
                cache.insert(plan.hash_code, result.into());
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    algorithm = plan.algorithm.name(),
                    "section layout failed; keeping seed positions"
                );
                stats.failed += 1;
                failed.insert(plan.hash_code, seed_result(plan).into());
            }
        }
    }

    let layouts = collections
        .iter()
        .filter_map(|c| {
            if let Some(layout) = cache.get(&c.hash_code) {
                return Some(SectionLayout {
                    layout: layout.clone(),
                    settled: true,
                });
            }
            failed.get(&c.hash_code).map(|layout| SectionLayout {
                layout: layout.clone(),
                settled: false,
            })
        })
        .collect();

    tracing::debug!(
        sections = stats.sections,
        reused = stats.reused,
        computed = stats.computed,
        failed = stats.failed,
        "section layouts ready"
    );
    (layouts, stats)
}
