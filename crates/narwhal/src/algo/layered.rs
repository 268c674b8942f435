//! Layered (hierarchical) layout.
//!
//! The classic three phases, kept small because sections that use this layout
//! have only a handful of nodes:
//! - rank: longest path over an acyclic orientation (DFS back edges are reversed)
//! - order: alternating barycenter sweeps inside each rank
//! - position: ranks along the main axis, rank members centered on the cross axis

use crate::algo::{LayeredOptions, RankDir};
use crate::error::{Error, Result};
use crate::graph::{Graph, LayoutResult, Point, straight_edge_paths};
use indexmap::IndexMap;
use std::collections::VecDeque;

pub fn layout(graph: &Graph, opts: &LayeredOptions) -> Result<LayoutResult> {
    if !(opts.rank_sep.is_finite() && opts.node_sep.is_finite()) {
        return Err(Error::InvalidOption {
            option: "rank_sep/node_sep",
            message: "separations must be finite".to_string(),
        });
    }

    let n = graph.nodes.len();
    if n == 0 {
        return Ok(LayoutResult::default());
    }

    let index = graph.index_of();
    let mut edges: Vec<(usize, usize)> = Vec::with_capacity(graph.edges.len());
    for e in &graph.edges {
        let (Some(&a), Some(&b)) = (index.get(e.source.as_str()), index.get(e.target.as_str()))
        else {
            continue;
        };
        if a != b && !edges.contains(&(a, b)) {
            edges.push((a, b));
        }
    }

    let edges = make_acyclic(n, &edges);
    let ranks = longest_path_ranks(n, &edges);
    let mut layers = build_layers(&ranks);
    order_layers(&mut layers, &edges, n, opts.sweeps);
    let positions = assign_positions(graph, &layers, opts);

    let edge_paths = straight_edge_paths(graph, &positions);
    Ok(LayoutResult {
        positions,
        edge_paths,
        ..Default::default()
    })
}

/// Reverses every edge that closes a cycle in a depth-first walk (graph order).
fn make_acyclic(n: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        OnStack,
        Done,
    }

    let mut out_adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (idx, &(a, _)) in edges.iter().enumerate() {
        out_adj[a].push(idx);
    }

    let mut marks = vec![Mark::New; n];
    let mut reversed = vec![false; edges.len()];
    for start in 0..n {
        if marks[start] != Mark::New {
            continue;
        }
        // (node, next out-edge cursor)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::OnStack;
        while let Some(top) = stack.last_mut() {
            let (v, cursor) = *top;
            if let Some(&edge_idx) = out_adj[v].get(cursor) {
                top.1 += 1;
                let w = edges[edge_idx].1;
                match marks[w] {
                    Mark::OnStack => reversed[edge_idx] = true,
                    Mark::New => {
                        marks[w] = Mark::OnStack;
                        stack.push((w, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[v] = Mark::Done;
                stack.pop();
            }
        }
    }

    edges
        .iter()
        .zip(reversed)
        .map(|(&(a, b), rev)| if rev { (b, a) } else { (a, b) })
        .collect()
}

/// Longest-path ranking in topological (Kahn) order: `rank(w) = max(rank(v) + 1)`.
fn longest_path_ranks(n: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut in_degree = vec![0usize; n];
    let mut succ: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(a, b) in edges {
        succ[a].push(b);
        in_degree[b] += 1;
    }

    let mut ranks = vec![0usize; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
    while let Some(v) = queue.pop_front() {
        for &w in &succ[v] {
            ranks[w] = ranks[w].max(ranks[v] + 1);
            in_degree[w] -= 1;
            if in_degree[w] == 0 {
                queue.push_back(w);
            }
        }
    }
    ranks
}

fn build_layers(ranks: &[usize]) -> Vec<Vec<usize>> {
    let max_rank = ranks.iter().copied().max().unwrap_or(0);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); max_rank + 1];
    for (v, &r) in ranks.iter().enumerate() {
        layers[r].push(v);
    }
    layers.retain(|l| !l.is_empty());
    layers
}

fn order_layers(layers: &mut [Vec<usize>], edges: &[(usize, usize)], n: usize, sweeps: usize) {
    let mut pred: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut succ: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(a, b) in edges {
        succ[a].push(b);
        pred[b].push(a);
    }

    let mut order = vec![0f64; n];
    for layer in layers.iter() {
        for (pos, &v) in layer.iter().enumerate() {
            order[v] = pos as f64;
        }
    }

    for sweep in 0..sweeps {
        let downward = sweep % 2 == 0;
        let range: Vec<usize> = if downward {
            (1..layers.len()).collect()
        } else {
            (0..layers.len().saturating_sub(1)).rev().collect()
        };

        for layer_idx in range {
            let mut keyed: Vec<(usize, f64)> = layers[layer_idx]
                .iter()
                .map(|&v| {
                    let neighbours = if downward { &pred[v] } else { &succ[v] };
                    let bary = if neighbours.is_empty() {
                        order[v]
                    } else {
                        neighbours.iter().map(|&u| order[u]).sum::<f64>() / neighbours.len() as f64
                    };
                    (v, bary)
                })
                .collect();
            keyed.sort_by(|a, b| a.1.total_cmp(&b.1));
            layers[layer_idx] = keyed.iter().map(|&(v, _)| v).collect();
            for (pos, &v) in layers[layer_idx].iter().enumerate() {
                order[v] = pos as f64;
            }
        }
    }
}

fn assign_positions(
    graph: &Graph,
    layers: &[Vec<usize>],
    opts: &LayeredOptions,
) -> IndexMap<String, Point> {
    // (main axis thickness, cross axis extent) of a node for the chosen direction.
    let dims = |v: usize| -> (f64, f64) {
        let node = &graph.nodes[v];
        match opts.rank_dir {
            RankDir::LR => (node.width, node.height),
            RankDir::TB => (node.height, node.width),
        }
    };

    let extents: Vec<f64> = layers
        .iter()
        .map(|layer| {
            let sizes: f64 = layer.iter().map(|&v| dims(v).1).sum();
            sizes + opts.node_sep * layer.len().saturating_sub(1) as f64
        })
        .collect();
    let max_extent = extents.iter().copied().fold(0.0, f64::max);

    let mut main_cursor = 0.0;
    let mut coords: Vec<(f64, f64)> = vec![(0.0, 0.0); graph.nodes.len()];
    for (layer, extent) in layers.iter().zip(&extents) {
        let thickness = layer.iter().map(|&v| dims(v).0).fold(0.0, f64::max);
        let main = main_cursor + thickness / 2.0;
        let mut cross = (max_extent - extent) / 2.0;
        for &v in layer {
            let size = dims(v).1;
            coords[v] = (main, cross + size / 2.0);
            cross += size + opts.node_sep;
        }
        main_cursor += thickness + opts.rank_sep;
    }

    graph
        .nodes
        .iter()
        .enumerate()
        .map(|(v, node)| {
            let (main, cross) = coords[v];
            let p = match opts.rank_dir {
                RankDir::LR => Point::new(main, cross),
                RankDir::TB => Point::new(cross, main),
            };
            (node.id.clone(), p)
        })
        .collect()
}
