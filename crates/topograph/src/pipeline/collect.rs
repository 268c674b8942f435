use super::{Pass, PassContext, SectionDetails, WorkNode};
use crate::hash::hash_members;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CollectionKind {
    Connected,
    Grid,
}

/// A section ready for layout: members in display order plus a structural hash.
#[derive(Debug, Clone)]
pub(crate) struct Collection {
    pub kind: CollectionKind,
    /// Type bucket the section came from.
    pub section_type: String,
    pub members: Vec<usize>,
    pub edges: Vec<usize>,
    pub hash_code: i32,
    pub details: SectionDetails,
}

/// Connected sections first (in type order), then the grids of unconnected nodes.
pub(crate) fn create_collections(
    pass: &mut Pass,
    order: &[String],
    ctx: &PassContext<'_>,
) -> Vec<Collection> {
    let mut connected = Vec::new();
    let mut grids = Vec::new();

    for kind in order {
        let Some(group) = pass.groups.get(kind) else {
            continue;
        };

        for section in &group.connected {
            let mut members: Vec<usize> = section.members.values().copied().collect();
            members.sort_by(|&a, &b| by_type_then_label(&pass.nodes[a], &pass.nodes[b]));
            let ids = section
                .members
                .keys()
                .map(String::as_str)
                .chain(section.edges.iter().map(|&li| pass.links[li].uid.as_str()));
            connected.push(Collection {
                kind: CollectionKind::Connected,
                section_type: kind.clone(),
                members,
                edges: section.edges.clone(),
                hash_code: hash_members(ids),
                details: section.details.clone(),
            });
        }

        let mut by_cluster: IndexMap<String, (BTreeSet<String>, Vec<usize>)> = IndexMap::new();
        for &idx in &group.unconnected {
            let work = &pass.nodes[idx];
            if work.layout.is_none() {
                continue;
            }
            let entry = by_cluster
                .entry(work.node.cluster_key().to_string())
                .or_default();
            let kind = if work.node.kind.is_empty() {
                "notype"
            } else {
                work.node.kind.as_str()
            };
            entry.0.insert(kind.to_string());
            entry.1.push(idx);
        }

        for (cluster, (types, mut nodes)) in by_cluster {
            let clusters = vec![cluster.clone()];
            let types: Vec<String> = types.into_iter().collect();
            let details = SectionDetails {
                title: ctx.profile.section_title(
                    &clusters,
                    &types,
                    ctx.options.multicluster,
                    &ctx.options.locale,
                ),
                clusters: cluster,
                is_multi_cluster: false,
            };

            let h = &ctx.options.heuristics;
            let chunks: Vec<Vec<usize>> = if nodes.len() > h.grid_split_threshold {
                nodes.sort_by(|&a, &b| newcomers_last(&pass.nodes[a], &pass.nodes[b]));
                nodes
                    .chunks(h.grid_chunk_size.max(1))
                    .map(<[usize]>::to_vec)
                    .collect()
            } else {
                vec![nodes]
            };

            for mut chunk in chunks {
                chunk.sort_by(|&a, &b| grid_order(&pass.nodes[a], &pass.nodes[b]));
                let hash_code =
                    hash_members(chunk.iter().map(|&idx| pass.nodes[idx].node.uid.as_str()));
                grids.push(Collection {
                    kind: CollectionKind::Grid,
                    section_type: kind.clone(),
                    members: chunk,
                    edges: Vec::new(),
                    hash_code,
                    details: details.clone(),
                });
            }
        }
    }

    for grid in &grids {
        for &idx in &grid.members {
            if let Some(newcomer) = pass.nodes[idx]
                .layout
                .as_mut()
                .and_then(|l| l.newcomer.as_mut())
            {
                newcomer.grid = true;
            }
        }
    }

    tracing::debug!(
        connected = connected.len(),
        grids = grids.len(),
        "built section collections"
    );
    connected.extend(grids);
    connected
}

fn by_type_then_label(a: &WorkNode, b: &WorkNode) -> Ordering {
    match (a.layout.as_ref(), b.layout.as_ref()) {
        (Some(la), Some(lb)) => la.kind.cmp(&lb.kind).then_with(|| la.label.cmp(&lb.label)),
        _ => Ordering::Equal,
    }
}

/// Order used before splitting a large bucket: newcomers last, then label, then uid.
fn newcomers_last(a: &WorkNode, b: &WorkNode) -> Ordering {
    let (Some(la), Some(lb)) = (a.layout.as_ref(), b.layout.as_ref()) else {
        return Ordering::Equal;
    };
    la.newcomer
        .is_some()
        .cmp(&lb.newcomer.is_some())
        .then_with(|| la.label.cmp(&lb.label))
        .then_with(|| la.uid.cmp(&lb.uid))
}

/// Grid cell order: settled nodes first; among them aggregates (dot), then
/// nodes with a self link, then type and label. Newcomers already shown come
/// before fresh ones.
fn grid_order(a: &WorkNode, b: &WorkNode) -> Ordering {
    let (Some(la), Some(lb)) = (a.layout.as_ref(), b.layout.as_ref()) else {
        return Ordering::Equal;
    };
    match (&la.newcomer, &lb.newcomer) {
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(na), Some(nb)) => nb.displayed.cmp(&na.displayed),
        (None, None) => lb
            .show_dot
            .cmp(&la.show_dot)
            .then_with(|| {
                b.node
                    .self_link
                    .is_some()
                    .cmp(&a.node.self_link.is_some())
            })
            .then_with(|| la.kind.cmp(&lb.kind))
            .then_with(|| la.label.cmp(&lb.label)),
    }
}
