use crate::model::{LayoutOutput, PlacedNode, Point, SectionTitle, TopologyGraph};
use crate::options::LayoutOptions;
use crate::pack::pack_sections;
use crate::pipeline::{CloneRecord, Pass, PassContext, build_collections};
use crate::profile::TopologyProfile;
use crate::run::{CachedLayout, run_collection_layouts};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag that stops a layout pass from publishing its result.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks every clone of this token cancelled.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Stateful layout engine for one topology view.
///
/// The engine keeps everything that makes consecutive passes stable: clone
/// records, per-section layouts keyed by structural hash, section titles, the
/// last position of every node and the positions the user dragged nodes to.
/// A section whose membership did not change between passes is not laid out
/// again, so polling refreshes do not move it.
///
/// ```
/// use topograph::{Link, LayoutOptions, Node, TopologyGraph, TopologyLayout, TopologyProfile};
///
/// let graph = TopologyGraph {
///     nodes: vec![
///         Node::new("svc", "service", "frontend"),
///         Node::new("dep", "deployment", "frontend-app"),
///     ],
///     links: vec![Link::new("svc", "dep", "uses")],
/// };
/// let mut engine = TopologyLayout::new(TopologyProfile::hcm());
/// let out = engine.layout_blocking(&graph, &LayoutOptions::default()).unwrap();
/// assert_eq!(out.nodes.len(), 2);
/// ```
#[derive(Debug)]
pub struct TopologyLayout {
    profile: TopologyProfile,
    node_clones: FxHashMap<String, CloneRecord>,
    cached_layouts: FxHashMap<i32, CachedLayout>,
    titles: Vec<SectionTitle>,
    self_links: IndexMap<String, Vec<String>>,
    positions: FxHashMap<String, Point>,
    dragged: FxHashMap<String, Point>,
    cancel: CancelToken,
}

impl TopologyLayout {
    /// Engine with empty caches and its own cancel token.
    pub fn new(profile: TopologyProfile) -> Self {
        Self::with_token(profile, CancelToken::new())
    }

    /// Engine whose passes stop publishing once `cancel` is cancelled.
    pub fn with_token(profile: TopologyProfile, cancel: CancelToken) -> Self {
        Self {
            profile,
            node_clones: FxHashMap::default(),
            cached_layouts: FxHashMap::default(),
            titles: Vec::new(),
            self_links: IndexMap::new(),
            positions: FxHashMap::default(),
            dragged: FxHashMap::default(),
            cancel,
        }
    }

    /// Profile every pass is run with.
    pub fn profile(&self) -> &TopologyProfile {
        &self.profile
    }

    /// Token that destroys this engine's passes when cancelled from elsewhere.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs one layout pass.
    ///
    /// Returns `None` when the engine was destroyed before or during the pass;
    /// nothing computed by such a pass is published.
    pub async fn layout(
        &mut self,
        graph: &TopologyGraph,
        options: &LayoutOptions,
    ) -> Option<LayoutOutput> {
        if self.cancel.is_cancelled() {
            tracing::warn!("layout requested on a destroyed engine");
            return None;
        }

        let ctx = PassContext {
            profile: &self.profile,
            options,
        };
        let mut order = self.profile.spec.order.clone();
        let mut pass = Pass::new(graph, &self.profile);
        let collections = build_collections(&mut pass, &mut order, &mut self.node_clones, &ctx);

        let (layouts, stats) = run_collection_layouts(
            &collections,
            &pass,
            &mut self.cached_layouts,
            &self.positions,
            options,
        )
        .await;

        if self.cancel.is_cancelled() {
            tracing::warn!(sections = stats.sections, "engine destroyed mid-pass; dropping layout");
            return None;
        }

        let packed = pack_sections(
            &mut pass,
            &collections,
            layouts,
            &order,
            &mut self.titles,
            &self.dragged,
            options,
        );

        self.self_links.clear();
        for edge in packed.edges.iter().filter(|e| e.layout.is_loop) {
            self.self_links
                .entry(edge.layout.source.clone())
                .or_default()
                .push(edge.link.uid.clone());
        }

        // Nodes of a failed section keep their previous seed.
        let previous = std::mem::take(&mut self.positions);
        let mut nodes = Vec::with_capacity(pass.nodes.len());
        for work in pass.nodes {
            let Some(layout) = work.layout else {
                continue;
            };
            if packed.unsettled.contains(&layout.uid) {
                if let Some(&seed) = previous.get(&layout.uid) {
                    self.positions.insert(layout.uid.clone(), seed);
                }
            } else {
                self.positions
                    .insert(layout.uid.clone(), Point::new(layout.x, layout.y));
            }
            nodes.push(PlacedNode {
                node: work.node,
                layout,
            });
        }

        tracing::debug!(
            nodes = nodes.len(),
            edges = packed.edges.len(),
            sections = stats.sections,
            reused = stats.reused,
            "layout pass finished"
        );
        Some(LayoutOutput {
            nodes,
            edges: packed.edges,
            layout_map: packed.layout_map,
            titles: self.titles.clone(),
            self_links: self.self_links.clone(),
            layout_bbox: packed.bbox,
            stats,
        })
    }

    /// [`layout`](Self::layout) on the current thread.
    pub fn layout_blocking(
        &mut self,
        graph: &TopologyGraph,
        options: &LayoutOptions,
    ) -> Option<LayoutOutput> {
        futures::executor::block_on(self.layout(graph, options))
    }

    /// Runs a pass and hands the result to `done`, unless the engine was
    /// destroyed first. Returns whether `done` was called.
    pub fn layout_with<F>(&mut self, graph: &TopologyGraph, options: &LayoutOptions, done: F) -> bool
    where
        F: FnOnce(LayoutOutput),
    {
        match self.layout_blocking(graph, options) {
            Some(out) => {
                done(out);
                true
            }
            None => false,
        }
    }

    /// Cancels any in-flight pass and drops every cache.
    pub fn destroy(&mut self) {
        self.cancel.cancel();
        self.node_clones.clear();
        self.cached_layouts.clear();
        self.titles.clear();
        self.self_links.clear();
        self.positions.clear();
        self.dragged.clear();
    }

    /// Whether [`destroy`](Self::destroy) ran or the token was cancelled.
    pub fn is_destroyed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Pins the node with layout uid `uid` at `at` in every later pass.
    pub fn drag_node(&mut self, uid: impl Into<String>, at: Point) {
        self.dragged.insert(uid.into(), at);
    }

    /// Lets a dragged node return to its computed position.
    pub fn release_node(&mut self, uid: &str) -> Option<Point> {
        self.dragged.remove(uid)
    }

    /// Number of section layouts held for reuse by the next pass.
    pub fn cached_sections(&self) -> usize {
        self.cached_layouts.len()
    }

    /// Layout uids of every clone created so far, sorted.
    pub fn clone_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.node_clones.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Loop link uids by node layout uid, from the last pass.
    pub fn self_links(&self) -> &IndexMap<String, Vec<String>> {
        &self.self_links
    }
}
