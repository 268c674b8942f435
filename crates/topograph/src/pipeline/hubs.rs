use super::{Pass, PassContext, Section, WorkLink, WorkNode};
use crate::options::Heuristics;
use indexmap::IndexMap;

pub(crate) fn mark_hubs(pass: &mut Pass, order: &[String], ctx: &PassContext<'_>) {
    if !ctx.profile.spec.options.show_hubs {
        return;
    }
    let heuristics = &ctx.options.heuristics;
    let mut marked = 0usize;
    for kind in order {
        let Some(group) = pass.groups.get(kind) else {
            continue;
        };
        for section in &group.connected {
            marked += mark_section(section, &pass.links, &mut pass.nodes, heuristics);
        }
    }
    tracing::debug!(marked, "marked hubs");
}

/// Flags the best connected members of one section; returns how many were flagged.
fn mark_section(
    section: &Section,
    links: &[WorkLink],
    nodes: &mut [WorkNode],
    h: &Heuristics,
) -> usize {
    let mut inputs: IndexMap<&str, usize> = IndexMap::new();
    let mut outputs: IndexMap<&str, usize> = IndexMap::new();
    for uid in section.members.keys() {
        inputs.insert(uid, 0);
        outputs.insert(uid, 0);
    }
    for &li in &section.edges {
        let link = &links[li];
        if let Some(n) = outputs.get_mut(link.source.as_str()) {
            *n += 1;
        }
        if let Some(n) = inputs.get_mut(link.target.as_str()) {
            *n += 1;
        }
    }

    let mut hubs: Vec<(usize, &str)> = inputs
        .iter()
        .filter_map(|(&uid, &ins)| {
            let score = hub_score(ins, outputs.get(uid).copied().unwrap_or(0), h);
            (score > 0).then_some((score, uid))
        })
        .collect();
    hubs.sort_by(|a, b| b.0.cmp(&a.0));

    let majors = if section.members.len() < h.major_hub_section_size {
        h.major_hubs_small
    } else {
        h.major_hubs_large
    };
    for (rank, (_, uid)) in hubs.iter().enumerate() {
        let Some(layout) = section
            .members
            .get(*uid)
            .and_then(|&idx| nodes[idx].layout.as_mut())
        else {
            continue;
        };
        if rank < majors {
            layout.is_major_hub = true;
            layout.scale = h.major_hub_scale;
        } else {
            layout.is_major_hub = false;
            layout.is_minor_hub = true;
            layout.scale = h.minor_hub_scale;
        }
    }
    hubs.len()
}

/// In-degree when that alone qualifies, else in+out when that qualifies, else 0.
pub(crate) fn hub_score(ins: usize, outs: usize, h: &Heuristics) -> usize {
    if ins >= h.hub_min_inputs {
        ins
    } else if ins + outs >= h.hub_min_connections {
        ins + outs
    } else {
        0
    }
}
