use super::{End, Pass, WorkNode};
use crate::hash::hash_members;
use crate::label::wrap_label;
use crate::model::{Node, NodeLayout};
use rustc_hash::FxHashMap;

/// A shared node as drawn inside one section.
#[derive(Debug, Clone)]
pub(crate) struct CloneRecord {
    pub node: Node,
    pub layout: NodeLayout,
}

impl CloneRecord {
    fn of(original: &Node, uid: &str) -> Self {
        let mut layout = NodeLayout::new(uid, original.kind.clone());
        layout.label = original.name.clone();
        layout.compact_label = wrap_label(&original.name, 12, 2);
        layout.cloned = true;
        Self {
            node: original.clone(),
            layout,
        }
    }
}

/// Gives every section its own copy of each shared node it links to.
///
/// Clone ids are `{original}_{section type}_{hash of member uids}`; the same
/// membership always maps to the same record in `clones`.
pub(crate) fn clone_shared_nodes(
    pass: &mut Pass,
    order: &[String],
    clones: &mut FxHashMap<String, CloneRecord>,
) {
    if pass.to_be_cloned.is_empty() {
        return;
    }
    let Pass {
        nodes,
        to_be_cloned,
        links,
        groups,
        ..
    } = pass;

    let mut created = 0usize;
    for kind in order {
        let Some(group) = groups.get_mut(kind) else {
            continue;
        };
        for section in &mut group.connected {
            let hash = hash_members(section.members.keys().map(String::as_str));
            for &li in &section.edges {
                for end in End::BOTH {
                    let raw = end.raw(&links[li]);
                    let Some(original) = to_be_cloned.get(raw) else {
                        continue;
                    };
                    let cuid = format!("{raw}_{kind}_{hash}");
                    if !section.members.contains_key(&cuid) {
                        let record = clones.entry(cuid.clone()).or_insert_with(|| {
                            created += 1;
                            CloneRecord::of(original, &cuid)
                        });
                        nodes.push(WorkNode {
                            node: record.node.clone(),
                            layout: Some(record.layout.clone()),
                        });
                        section.members.insert(cuid.clone(), nodes.len() - 1);
                    }
                    *end.resolved_mut(&mut links[li]) = cuid;
                }
            }
        }
    }
    tracing::debug!(created, cached = clones.len(), "cloned shared nodes");
}
