//! Per-pass working state and the stages that turn the flat input graph into
//! section collections.
//!
//! Stages run in a fixed order, each one narrowing the state the next one sees:
//! grouping by type, partitioning by connectivity, consolidating singletons,
//! cloning shared nodes, marking hubs, decorating, and finally building the
//! collections handed to the layout runner.

pub(crate) mod clone;
pub(crate) mod collect;
pub(crate) mod connect;
pub(crate) mod consolidate;
pub(crate) mod group;
pub(crate) mod hubs;

use crate::model::{Link, Node, NodeLayout, TopologyGraph};
use crate::options::LayoutOptions;
use crate::profile::TopologyProfile;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

pub(crate) use clone::CloneRecord;
pub(crate) use collect::{Collection, CollectionKind};

pub(crate) struct PassContext<'a> {
    pub profile: &'a TopologyProfile,
    pub options: &'a LayoutOptions,
}

/// A node of the current pass. `layout == None` marks a node merged into a controller.
#[derive(Debug, Clone)]
pub(crate) struct WorkNode {
    pub node: Node,
    pub layout: Option<NodeLayout>,
}

/// A link with a resolved uid and the layout uids its ends currently point at.
#[derive(Debug, Clone)]
pub(crate) struct WorkLink {
    pub link: Link,
    pub uid: String,
    pub source: String,
    pub target: String,
}

impl WorkLink {
    pub(crate) fn is_loop(&self) -> bool {
        self.link.source == self.link.target
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum End {
    Source,
    Target,
}

impl End {
    pub(crate) const BOTH: [End; 2] = [End::Source, End::Target];

    pub(crate) fn name(self) -> &'static str {
        match self {
            End::Source => "source",
            End::Target => "target",
        }
    }

    /// Raw node uid at this end of the input link.
    pub(crate) fn raw(self, link: &WorkLink) -> &str {
        match self {
            End::Source => &link.link.source,
            End::Target => &link.link.target,
        }
    }

    pub(crate) fn resolved_mut(self, link: &mut WorkLink) -> &mut String {
        match self {
            End::Source => &mut link.source,
            End::Target => &mut link.target,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SectionDetails {
    pub title: String,
    /// Sorted cluster names joined with `/`.
    pub clusters: String,
    pub is_multi_cluster: bool,
}

/// A connected group: member layout uid to node index, plus link indices.
#[derive(Debug, Clone, Default)]
pub(crate) struct Section {
    pub members: IndexMap<String, usize>,
    pub edges: Vec<usize>,
    pub details: SectionDetails,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TypeGroup {
    pub nodes: Vec<usize>,
    pub connected: Vec<Section>,
    pub unconnected: Vec<usize>,
}

pub(crate) struct Pass {
    pub nodes: Vec<WorkNode>,
    /// Live (unmerged) input nodes by uid.
    pub index: FxHashMap<String, usize>,
    /// Shared nodes that are cloned into every section referencing them.
    pub to_be_cloned: IndexMap<String, Node>,
    pub links: Vec<WorkLink>,
    pub groups: IndexMap<String, TypeGroup>,
}

impl Pass {
    pub(crate) fn new(graph: &TopologyGraph, profile: &TopologyProfile) -> Self {
        let mut nodes = Vec::with_capacity(graph.nodes.len());
        let mut index = FxHashMap::default();
        let mut to_be_cloned = IndexMap::new();
        for node in &graph.nodes {
            if profile.is_clone_type(&node.kind) {
                to_be_cloned.insert(node.uid.clone(), node.clone());
                continue;
            }
            index.insert(node.uid.clone(), nodes.len());
            nodes.push(WorkNode {
                node: node.clone(),
                layout: None,
            });
        }

        let links = graph
            .links
            .iter()
            .map(|link| WorkLink {
                uid: link.effective_uid(),
                source: link.source.clone(),
                target: link.target.clone(),
                link: link.clone(),
            })
            .collect();

        Self {
            nodes,
            index,
            to_be_cloned,
            links,
            groups: IndexMap::new(),
        }
    }

    /// A live input node or a clone candidate.
    pub(crate) fn is_known(&self, uid: &str) -> bool {
        self.index.contains_key(uid) || self.to_be_cloned.contains_key(uid)
    }

    pub(crate) fn layout(&self, idx: usize) -> Option<&NodeLayout> {
        self.nodes.get(idx).and_then(|n| n.layout.as_ref())
    }
}

/// Runs every stage up to and including collection building.
pub(crate) fn build_collections(
    pass: &mut Pass,
    order: &mut Vec<String>,
    clones: &mut FxHashMap<String, CloneRecord>,
    ctx: &PassContext<'_>,
) -> Vec<Collection> {
    group::group_nodes(pass, order);
    connect::group_by_connections(pass, order, ctx);
    consolidate::consolidate(pass, order, ctx);
    clone::clone_shared_nodes(pass, order, clones);
    hubs::mark_hubs(pass, order, ctx);
    decorate(pass, ctx);
    collect::create_collections(pass, order, ctx)
}

/// Shapes plus the profile's node annotations.
fn decorate(pass: &mut Pass, ctx: &PassContext<'_>) {
    let annotator = ctx.profile.annotator.as_deref();
    for work in &mut pass.nodes {
        let Some(layout) = work.layout.as_mut() else {
            continue;
        };
        let shape = ctx.profile.shape_for(&layout.kind);
        layout.shape = shape.shape;
        layout.class_name = shape.class_name;
        if let Some(annotator) = annotator {
            annotator.annotate(&work.node, layout, &ctx.options.locale);
            layout.details = annotator.details(&work.node);
        }
    }
}
