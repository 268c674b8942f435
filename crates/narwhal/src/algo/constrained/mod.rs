//! Force-directed layout with alignment constraints.
//!
//! The spring embedder follows the CoSE family: rectangle-clipped springs along
//! edges, pairwise repulsion inside a cutoff range, gravity for nodes that drift
//! too far from the component center, and a cooling schedule that caps per-axis
//! displacements. Alignment groups are enforced on the displacements of every
//! iteration (not by projecting positions afterwards), then snapped exactly once
//! the embedder stops.

use crate::algo::ConstrainedOptions;
use crate::error::{Error, Result};
use crate::graph::{Graph, LayoutResult, Point, straight_edge_paths};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

mod rng;

use rng::XorShift64Star;

pub fn layout(graph: &Graph, opts: &ConstrainedOptions) -> Result<LayoutResult> {
    if opts.max_iterations == 0 {
        return Err(Error::InvalidOption {
            option: "max_iterations",
            message: "at least one iteration is required".to_string(),
        });
    }
    if let Some(len) = opts.ideal_edge_length {
        if !(len.is_finite() && len > 0.0) {
            return Err(Error::InvalidOption {
                option: "ideal_edge_length",
                message: format!("expected a positive length, got {len}"),
            });
        }
    }

    let mut sim = SimGraph::from_graph(graph);
    if sim.nodes.is_empty() {
        return Ok(LayoutResult::default());
    }
    let constraints = Constraints::from_opts(&sim, opts);
    let ideal = opts
        .ideal_edge_length
        .unwrap_or_else(|| sim.average_node_size());

    let mut rng = XorShift64Star::new(opts.random_seed);
    sim.spread_coincident_starts(ideal, &mut rng);

    // Keep the final component center on the seeded center so incremental
    // layouts do not drift.
    let orig_center = sim.bounding_box_center().unwrap_or((0.0, 0.0));

    sim.run_spring_embedder(&constraints, ideal, opts.max_iterations);
    sim.snap_alignments(&constraints);
    sim.separate_overlaps(&constraints);

    let new_center = sim.bounding_box_center().unwrap_or((0.0, 0.0));
    sim.translate(orig_center.0 - new_center.0, orig_center.1 - new_center.1);

    let mut positions: IndexMap<String, Point> = IndexMap::with_capacity(sim.nodes.len());
    for n in &sim.nodes {
        positions.insert(n.id.clone(), Point::new(n.center_x(), n.center_y()));
    }
    let edge_paths = straight_edge_paths(graph, &positions);

    Ok(LayoutResult {
        positions,
        edge_paths,
        ..Default::default()
    })
}

#[derive(Debug, Clone)]
struct SimNode {
    id: String,
    // Size including the node's padding on every side.
    width: f64,
    height: f64,
    // Top-left anchored rectangle.
    left: f64,
    top: f64,

    spring_fx: f64,
    spring_fy: f64,
    repulsion_fx: f64,
    repulsion_fy: f64,
}

impl SimNode {
    fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    fn move_by(&mut self, dx: f64, dy: f64) {
        self.left += dx;
        self.top += dy;
    }

    fn half_w(&self) -> f64 {
        self.width / 2.0
    }

    fn half_h(&self) -> f64 {
        self.height / 2.0
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy)]
struct SimEdge {
    a: usize,
    b: usize,
}

#[derive(Debug, Clone, Default)]
struct Constraints {
    align_horizontal: Vec<Vec<usize>>,
    align_vertical: Vec<Vec<usize>>,
}

impl Constraints {
    fn from_opts(sim: &SimGraph, opts: &ConstrainedOptions) -> Self {
        let Some(a) = opts.alignment_constraint.as_ref() else {
            return Self::default();
        };
        Self {
            align_horizontal: map_align_lists(sim, &a.horizontal),
            align_vertical: map_align_lists(sim, &a.vertical),
        }
    }

    fn is_empty(&self) -> bool {
        self.align_horizontal.is_empty() && self.align_vertical.is_empty()
    }

    fn same_horizontal_group(&self, a: usize, b: usize) -> bool {
        self.align_horizontal
            .iter()
            .any(|g| g.contains(&a) && g.contains(&b))
    }
}

fn map_align_lists(sim: &SimGraph, groups: &[Vec<String>]) -> Vec<Vec<usize>> {
    groups
        .iter()
        .map(|g| {
            g.iter()
                .filter_map(|id| sim.id_to_idx.get(id.as_str()).copied())
                .collect::<Vec<_>>()
        })
        .filter(|g| g.len() > 1)
        .collect()
}

struct SimGraph {
    nodes: Vec<SimNode>,
    edges: Vec<SimEdge>,
    id_to_idx: FxHashMap<String, usize>,
}

impl SimGraph {
    const SPRING_STRENGTH: f64 = 0.45;
    const REPULSION_STRENGTH: f64 = 4500.0;
    const GRAVITY_STRENGTH: f64 = 0.25;
    const GRAVITY_RANGE_FACTOR: f64 = 3.8;
    const INITIAL_COOLING_FACTOR: f64 = 0.3;
    const FINAL_TEMPERATURE: f64 = 0.04;
    const CONVERGENCE_CHECK_PERIOD: usize = 100;
    const MAX_NODE_DISPLACEMENT: f64 = 100.0;
    const OVERLAP_PASSES: usize = 50;

    fn from_graph(graph: &Graph) -> Self {
        let mut nodes: Vec<SimNode> = Vec::with_capacity(graph.nodes.len());
        let mut id_to_idx: FxHashMap<String, usize> = FxHashMap::default();
        id_to_idx.reserve(graph.nodes.len());

        for (idx, n) in graph.nodes.iter().enumerate() {
            let pad = if n.padding.is_finite() {
                n.padding.max(0.0)
            } else {
                0.0
            };
            let w = n.width.max(1.0) + 2.0 * pad;
            let h = n.height.max(1.0) + 2.0 * pad;
            let (x, y) = if n.x.is_finite() && n.y.is_finite() {
                (n.x, n.y)
            } else {
                (0.0, 0.0)
            };
            nodes.push(SimNode {
                id: n.id.clone(),
                width: w,
                height: h,
                left: x - w / 2.0,
                top: y - h / 2.0,
                spring_fx: 0.0,
                spring_fy: 0.0,
                repulsion_fx: 0.0,
                repulsion_fy: 0.0,
            });
            id_to_idx.insert(n.id.clone(), idx);
        }

        let mut edges: Vec<SimEdge> = Vec::with_capacity(graph.edges.len());
        for e in &graph.edges {
            let Some(&a) = id_to_idx.get(e.source.as_str()) else {
                continue;
            };
            let Some(&b) = id_to_idx.get(e.target.as_str()) else {
                continue;
            };
            if a == b {
                continue;
            }
            edges.push(SimEdge { a, b });
        }

        Self {
            nodes,
            edges,
            id_to_idx,
        }
    }

    fn average_node_size(&self) -> f64 {
        let n = self.nodes.len() as f64;
        if n <= 0.0 {
            return 1.0;
        }
        let sum: f64 = self.nodes.iter().map(|n| (n.width + n.height) / 2.0).sum();
        (sum / n).max(1.0)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        for n in &mut self.nodes {
            n.move_by(dx, dy);
        }
    }

    fn bounding_box_center(&self) -> Option<(f64, f64)> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for n in &self.nodes {
            min_x = min_x.min(n.left);
            min_y = min_y.min(n.top);
            max_x = max_x.max(n.right());
            max_y = max_y.max(n.bottom());
        }
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return None;
        }
        Some(((min_x + max_x) / 2.0, (min_y + max_y) / 2.0))
    }

    /// Nodes that start on exactly the same point are fanned out on a circle around it.
    fn spread_coincident_starts(&mut self, radius_hint: f64, rng: &mut XorShift64Star) {
        let mut buckets: IndexMap<(u64, u64), Vec<usize>> = IndexMap::new();
        for (idx, n) in self.nodes.iter().enumerate() {
            let key = (n.center_x().to_bits(), n.center_y().to_bits());
            buckets.entry(key).or_default().push(idx);
        }

        for members in buckets.values().filter(|m| m.len() > 1) {
            let count = members.len() as f64;
            let radius = radius_hint * (count.sqrt()).max(1.0);
            let phase = rng.next_f64_unit() * std::f64::consts::TAU;
            for (i, &idx) in members.iter().enumerate() {
                let angle = phase + std::f64::consts::TAU * (i as f64) / count;
                let jitter = 1.0 + 0.05 * rng.next_f64_signed();
                let dx = radius * jitter * angle.cos();
                let dy = radius * jitter * angle.sin();
                self.nodes[idx].move_by(dx, dy);
            }
        }
    }

    fn run_spring_embedder(&mut self, constraints: &Constraints, ideal: f64, max_iterations: usize) {
        let min_repulsion_dist = (ideal / 10.0).max(0.0005);
        let half_ideal = ideal / 2.0;
        let repulsion_range = (2.0 * ideal).max(1.0);
        let gravity_range = self.estimated_size() * Self::GRAVITY_RANGE_FACTOR;

        let n = self.nodes.len() as f64;
        let total_displacement_threshold = (3.0 * ideal / 100.0) * n;

        let initial_cooling_factor = Self::INITIAL_COOLING_FACTOR;
        let mut cooling_factor = initial_cooling_factor;
        let max_iterations = max_iterations.max(self.nodes.len() * 5);
        let max_cooling_cycle = (max_iterations as f64) / (Self::CONVERGENCE_CHECK_PERIOD as f64);
        let mut cooling_cycle = 0.0f64;

        let mut total_iterations = 0usize;
        let mut old_total_displacement = 0.0f64;
        let mut last_total_displacement = 0.0f64;
        let mut disps: Vec<(f64, f64)> = vec![(0.0, 0.0); self.nodes.len()];

        loop {
            total_iterations += 1;
            if total_iterations >= max_iterations {
                break;
            }

            if total_iterations.is_multiple_of(Self::CONVERGENCE_CHECK_PERIOD) {
                let oscillating = total_iterations > (max_iterations / 3)
                    && (last_total_displacement - old_total_displacement).abs() < 2.0;
                let converged = last_total_displacement < total_displacement_threshold;
                old_total_displacement = last_total_displacement;
                if converged || oscillating {
                    break;
                }

                cooling_cycle += 1.0;
                let numerator = (100.0 * (initial_cooling_factor - Self::FINAL_TEMPERATURE)).ln();
                let denominator = max_cooling_cycle.ln().max(1e-9);
                let schedule = cooling_cycle.powf(numerator / denominator) / 100.0;
                cooling_factor = (initial_cooling_factor - schedule).max(Self::FINAL_TEMPERATURE);
            }

            self.apply_spring_forces(ideal);
            self.apply_repulsion_forces(repulsion_range, min_repulsion_dist, half_ideal);
            self.apply_gravity(gravity_range);

            let max_d = cooling_factor * Self::MAX_NODE_DISPLACEMENT;
            for (idx, n) in self.nodes.iter().enumerate() {
                let mdx = (cooling_factor * (n.spring_fx + n.repulsion_fx)).clamp(-max_d, max_d);
                let mdy = (cooling_factor * (n.spring_fy + n.repulsion_fy)).clamp(-max_d, max_d);
                disps[idx] = (mdx, mdy);
            }
            if !constraints.is_empty() {
                apply_constraints_to_displacements(&self.nodes, constraints, &mut disps, max_d);
            }

            let mut total_displacement = 0.0f64;
            for (n, &(mdx, mdy)) in self.nodes.iter_mut().zip(&disps) {
                n.move_by(mdx, mdy);
                total_displacement += mdx.abs() + mdy.abs();
                n.spring_fx = 0.0;
                n.spring_fy = 0.0;
                n.repulsion_fx = 0.0;
                n.repulsion_fy = 0.0;
            }
            last_total_displacement = total_displacement;
        }
    }

    fn apply_spring_forces(&mut self, ideal: f64) {
        for e in &self.edges {
            let (a, b) = (e.a, e.b);
            if rects_intersect(&self.nodes[a], &self.nodes[b]) {
                continue;
            }
            let (ax, ay) = rect_clip_point_towards(&self.nodes[a], &self.nodes[b]);
            let (bx, by) = rect_clip_point_towards(&self.nodes[b], &self.nodes[a]);
            let mut lx = bx - ax;
            let mut ly = by - ay;
            if lx.abs() < 1.0 {
                lx = lx.signum();
            }
            if ly.abs() < 1.0 {
                ly = ly.signum();
            }
            let len = (lx * lx + ly * ly).sqrt();
            if len == 0.0 {
                continue;
            }

            let spring_force = Self::SPRING_STRENGTH * (len - ideal);
            let sfx = spring_force * (lx / len);
            let sfy = spring_force * (ly / len);
            self.nodes[a].spring_fx += sfx;
            self.nodes[a].spring_fy += sfy;
            self.nodes[b].spring_fx -= sfx;
            self.nodes[b].spring_fy -= sfy;
        }
    }

    fn apply_repulsion_forces(&mut self, range: f64, min_dist: f64, separation_buffer: f64) {
        for i in 0..self.nodes.len() {
            for j in (i + 1)..self.nodes.len() {
                let dx = (self.nodes[i].center_x() - self.nodes[j].center_x()).abs()
                    - (self.nodes[i].half_w() + self.nodes[j].half_w());
                let dy = (self.nodes[i].center_y() - self.nodes[j].center_y()).abs()
                    - (self.nodes[i].half_h() + self.nodes[j].half_h());
                if dx > range || dy > range {
                    continue;
                }
                let (rfx, rfy) = calc_repulsion_force(
                    &self.nodes[i],
                    &self.nodes[j],
                    min_dist,
                    separation_buffer,
                );
                let (left, right) = self.nodes.split_at_mut(j);
                let a = &mut left[i];
                let b = &mut right[0];
                a.repulsion_fx += rfx;
                a.repulsion_fy += rfy;
                b.repulsion_fx -= rfx;
                b.repulsion_fy -= rfy;
            }
        }
    }

    fn apply_gravity(&mut self, gravity_range: f64) {
        if !(gravity_range.is_finite() && gravity_range > 0.0) {
            return;
        }
        let (cx, cy) = self.bounding_box_center().unwrap_or((0.0, 0.0));
        for n in &mut self.nodes {
            let dx = n.center_x() - cx;
            let dy = n.center_y() - cy;
            if dx.abs() + n.half_w() > gravity_range || dy.abs() + n.half_h() > gravity_range {
                n.spring_fx += -Self::GRAVITY_STRENGTH * dx;
                n.spring_fy += -Self::GRAVITY_STRENGTH * dy;
            }
        }
    }

    fn estimated_size(&self) -> f64 {
        let n = self.nodes.len() as f64;
        if n <= 0.0 {
            return 0.0;
        }
        let sum: f64 = self.nodes.iter().map(|n| (n.width + n.height) / 2.0).sum();
        (sum / n.sqrt()).max(1.0)
    }

    fn snap_alignments(&mut self, c: &Constraints) {
        for group in &c.align_horizontal {
            let target = group.iter().map(|&i| self.nodes[i].center_y()).sum::<f64>()
                / group.len() as f64;
            for &i in group {
                let dy = target - self.nodes[i].center_y();
                self.nodes[i].move_by(0.0, dy);
            }
        }
        for group in &c.align_vertical {
            let target = group.iter().map(|&i| self.nodes[i].center_x()).sum::<f64>()
                / group.len() as f64;
            for &i in group {
                let dx = target - self.nodes[i].center_x();
                self.nodes[i].move_by(dx, 0.0);
            }
        }
    }

    /// Pushes overlapping (padded) rectangles apart along the axis of least overlap.
    /// Aligned nodes never leave their alignment line.
    fn separate_overlaps(&mut self, c: &Constraints) {
        let mut y_locked = vec![false; self.nodes.len()];
        let mut x_locked = vec![false; self.nodes.len()];
        for &i in c.align_horizontal.iter().flatten() {
            y_locked[i] = true;
        }
        for &i in c.align_vertical.iter().flatten() {
            x_locked[i] = true;
        }

        for _ in 0..Self::OVERLAP_PASSES {
            let mut moved = false;
            for i in 0..self.nodes.len() {
                for j in (i + 1)..self.nodes.len() {
                    if !rects_intersect(&self.nodes[i], &self.nodes[j]) {
                        continue;
                    }
                    let (a, b) = (&self.nodes[i], &self.nodes[j]);
                    let overlap_x = a.right().min(b.right()) - a.left.max(b.left);
                    let overlap_y = a.bottom().min(b.bottom()) - a.top.max(b.top);
                    let (dir_x, dir_y) = decide_directions_for_overlapping_nodes(a, b);

                    let y_blocked = (y_locked[i] && y_locked[j]) || c.same_horizontal_group(i, j);
                    let x_blocked = x_locked[i] && x_locked[j];
                    let along_x = (overlap_x <= overlap_y || y_blocked) && !x_blocked;

                    let (locked_i, locked_j, dir, overlap) = if along_x {
                        (x_locked[i], x_locked[j], dir_x, overlap_x)
                    } else {
                        (y_locked[i], y_locked[j], dir_y, overlap_y)
                    };
                    // Split the push between both nodes unless one is pinned on that axis.
                    let (share_i, share_j) = match (locked_i, locked_j) {
                        (true, false) => (0.0, 1.0),
                        (false, true) => (1.0, 0.0),
                        _ => (0.5, 0.5),
                    };
                    let push = dir * overlap;
                    if along_x {
                        self.nodes[i].move_by(push * share_i, 0.0);
                        self.nodes[j].move_by(-push * share_j, 0.0);
                    } else {
                        self.nodes[i].move_by(0.0, push * share_i);
                        self.nodes[j].move_by(0.0, -push * share_j);
                    }
                    moved = true;
                }
            }
            if !moved {
                break;
            }
        }
    }
}

fn apply_constraints_to_displacements(
    nodes: &[SimNode],
    c: &Constraints,
    disps: &mut [(f64, f64)],
    max_d: f64,
) {
    // Move every member of a group onto the group's shared target line.
    for group in &c.align_horizontal {
        let target = group
            .iter()
            .map(|&idx| nodes[idx].center_y() + disps[idx].1)
            .sum::<f64>()
            / group.len() as f64;
        for &idx in group {
            disps[idx].1 += target - (nodes[idx].center_y() + disps[idx].1);
        }
    }
    for group in &c.align_vertical {
        let target = group
            .iter()
            .map(|&idx| nodes[idx].center_x() + disps[idx].0)
            .sum::<f64>()
            / group.len() as f64;
        for &idx in group {
            disps[idx].0 += target - (nodes[idx].center_x() + disps[idx].0);
        }
    }

    if max_d.is_finite() && max_d > 0.0 {
        for (dx, dy) in disps {
            *dx = dx.clamp(-max_d, max_d);
            *dy = dy.clamp(-max_d, max_d);
        }
    }
}

fn rects_intersect(a: &SimNode, b: &SimNode) -> bool {
    a.left < b.right() && a.right() > b.left && a.top < b.bottom() && a.bottom() > b.top
}

fn rect_clip_point_towards(a: &SimNode, b: &SimNode) -> (f64, f64) {
    let ax = a.center_x();
    let ay = a.center_y();
    let dx = b.center_x() - ax;
    let dy = b.center_y() - ay;

    if dx == 0.0 && dy == 0.0 {
        return (ax, ay);
    }

    let mut t_x = f64::INFINITY;
    let mut t_y = f64::INFINITY;
    if dx != 0.0 {
        t_x = (a.half_w() / dx.abs()).max(0.0);
    }
    if dy != 0.0 {
        t_y = (a.half_h() / dy.abs()).max(0.0);
    }
    let t = t_x.min(t_y);
    (ax + t * dx, ay + t * dy)
}

fn calc_repulsion_force(
    a: &SimNode,
    b: &SimNode,
    min_repulsion_dist: f64,
    separation_buffer: f64,
) -> (f64, f64) {
    if rects_intersect(a, b) {
        let (ox, oy) = calc_separation_amount(a, b, separation_buffer);
        return (-ox, -oy);
    }

    let (ax, ay) = rect_clip_point_towards(a, b);
    let (bx, by) = rect_clip_point_towards(b, a);
    let mut dx = bx - ax;
    let mut dy = by - ay;
    if dx.abs() < min_repulsion_dist {
        dx = dx.signum() * min_repulsion_dist;
    }
    if dy.abs() < min_repulsion_dist {
        dy = dy.signum() * min_repulsion_dist;
    }

    let dist_sq = dx * dx + dy * dy;
    let dist = dist_sq.sqrt();
    if dist == 0.0 {
        return (0.0, 0.0);
    }
    let repulsion_force = SimGraph::REPULSION_STRENGTH / dist_sq;
    (-repulsion_force * dx / dist, -repulsion_force * dy / dist)
}

fn calc_separation_amount(a: &SimNode, b: &SimNode, separation_buffer: f64) -> (f64, f64) {
    let (dir_x, dir_y) = decide_directions_for_overlapping_nodes(a, b);

    let mut overlap_x = a.right().min(b.right()) - a.left.max(b.left);
    let mut overlap_y = a.bottom().min(b.bottom()) - a.top.max(b.top);

    if (a.left <= b.left) && (a.right() >= b.right()) {
        overlap_x += (b.left - a.left).min(a.right() - b.right());
    } else if (b.left <= a.left) && (b.right() >= a.right()) {
        overlap_x += (a.left - b.left).min(b.right() - a.right());
    }
    if (a.top <= b.top) && (a.bottom() >= b.bottom()) {
        overlap_y += (b.top - a.top).min(a.bottom() - b.bottom());
    } else if (b.top <= a.top) && (b.bottom() >= a.bottom()) {
        overlap_y += (a.top - b.top).min(b.bottom() - a.bottom());
    }

    let mut slope = ((b.center_y() - a.center_y()) / (b.center_x() - a.center_x())).abs();
    if (b.center_y() == a.center_y()) && (b.center_x() == a.center_x()) {
        slope = 1.0;
    }

    let mut move_by_y = slope * overlap_x;
    let mut move_by_x = overlap_y / slope;
    if overlap_x < move_by_x {
        move_by_x = overlap_x;
    } else {
        move_by_y = overlap_y;
    }

    let dx = -dir_x * ((move_by_x / 2.0) + separation_buffer);
    let dy = -dir_y * ((move_by_y / 2.0) + separation_buffer);
    (dx, dy)
}

/// `-1` on an axis means `a` sits before `b` and should move towards negative.
fn decide_directions_for_overlapping_nodes(a: &SimNode, b: &SimNode) -> (f64, f64) {
    let dir_x = if a.center_x() < b.center_x() {
        -1.0
    } else {
        1.0
    };
    let dir_y = if a.center_y() < b.center_y() {
        -1.0
    } else {
        1.0
    };
    (dir_x, dir_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_at(left: f64, top: f64, w: f64, h: f64) -> SimNode {
        SimNode {
            id: "n".to_string(),
            width: w,
            height: h,
            left,
            top,
            spring_fx: 0.0,
            spring_fy: 0.0,
            repulsion_fx: 0.0,
            repulsion_fy: 0.0,
        }
    }

    #[test]
    fn clip_point_lands_on_the_rectangle_border() {
        let a = node_at(0.0, 0.0, 20.0, 20.0);
        let b = node_at(100.0, 0.0, 20.0, 20.0);
        assert_eq!(rect_clip_point_towards(&a, &b), (20.0, 10.0));
    }

    #[test]
    fn overlapping_nodes_repel_each_other() {
        let a = node_at(0.0, 0.0, 20.0, 20.0);
        let b = node_at(10.0, 0.0, 20.0, 20.0);
        let (fx, _) = calc_repulsion_force(&a, &b, 1.0, 5.0);
        // `a` is pushed left (away from `b`).
        assert!(fx < 0.0);
    }

    #[test]
    fn alignment_moves_displacements_onto_one_line() {
        let nodes = vec![node_at(0.0, 0.0, 10.0, 10.0), node_at(50.0, 40.0, 10.0, 10.0)];
        let c = Constraints {
            align_horizontal: vec![vec![0, 1]],
            align_vertical: Vec::new(),
        };
        let mut disps = vec![(0.0, 0.0), (0.0, 0.0)];
        apply_constraints_to_displacements(&nodes, &c, &mut disps, f64::INFINITY);
        let y0 = nodes[0].center_y() + disps[0].1;
        let y1 = nodes[1].center_y() + disps[1].1;
        assert!((y0 - y1).abs() < 1e-9);
    }
}
