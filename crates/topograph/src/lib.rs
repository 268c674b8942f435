#![forbid(unsafe_code)]

//! Sectioned layout for application topology diagrams.
//!
//! `topograph` turns a flat `{nodes, links}` resource graph into a positioned
//! diagram. A pass groups nodes by type, folds pods and services into the
//! controllers that own them, splits every type into connected sections,
//! gives each section its own copy of shared nodes such as `internet`, marks
//! hubs, lays out each section with [`narwhal`] and packs the sections into
//! rows. Section layouts are cached by a structural hash so unchanged sections
//! stay where they are between refreshes.
//!
//! The stateful entry point is [`TopologyLayout`].

pub mod engine;
pub mod error;
pub mod hash;
pub mod label;
pub mod model;
pub mod options;
pub mod profile;

mod pack;
mod pipeline;
mod run;

pub use engine::{CancelToken, TopologyLayout};
pub use error::{Error, Result};
pub use model::{
    DetailRow, EdgeLayout, LayoutBBox, LayoutOutput, Link, Newcomer, Node, NodeLayout, PassStats,
    PlacedEdge, PlacedNode, Point, SectionTitle, TopologyGraph,
};
pub use options::{Heuristics, LayoutOptions, NODE_SIZE, StepTable};
pub use profile::{
    HcmAnnotator, NodeAnnotator, ProfileOptions, ProfileSpec, SectionTitler, ShapeSpec,
    TopologyProfile, TypeListTitler,
};

/// Lays out `graph` once with a fresh engine.
pub fn layout_once(
    graph: &TopologyGraph,
    profile: TopologyProfile,
    options: &LayoutOptions,
) -> LayoutOutput {
    TopologyLayout::new(profile)
        .layout_blocking(graph, options)
        .unwrap_or_default()
}
