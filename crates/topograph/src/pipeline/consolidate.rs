use super::{End, Pass, PassContext, Section, SectionDetails};
use indexmap::IndexMap;
use std::collections::BTreeSet;

#[derive(Default)]
struct Consolidated {
    members: IndexMap<String, usize>,
    edges: Vec<usize>,
    cluster: String,
    types: BTreeSet<String>,
}

/// Folds one-node sections that only talk to clone candidates into shared
/// sections keyed by `direction/cluster/clone type`.
///
/// A folded node joins the group of its first link, so it is still placed once.
/// One-node sections with any other link (a self loop, say) are kept as is.
pub(crate) fn consolidate(pass: &mut Pass, order: &[String], ctx: &PassContext<'_>) {
    let mut folded = 0usize;
    for kind in order {
        let Some(sections) = pass.groups.get_mut(kind).map(|g| std::mem::take(&mut g.connected))
        else {
            continue;
        };

        let mut kept: Vec<Section> = Vec::with_capacity(sections.len());
        let mut merged: IndexMap<String, Consolidated> = IndexMap::new();
        for section in sections {
            let Some(key) = consolidation_key(pass, &section) else {
                kept.push(section);
                continue;
            };
            folded += 1;
            let group = merged.entry(key).or_default();
            for (uid, &idx) in &section.members {
                group.members.insert(uid.clone(), idx);
                let node = &pass.nodes[idx].node;
                if group.cluster.is_empty() {
                    group.cluster = node.cluster_key().to_string();
                }
                group.types.insert(node.kind.clone());
            }
            for &li in &section.edges {
                for end in End::BOTH {
                    if let Some(shared) = pass.to_be_cloned.get(end.raw(&pass.links[li])) {
                        group.types.insert(shared.kind.clone());
                    }
                }
                group.edges.push(li);
            }
        }

        // New groups go first, last created at the very front.
        for (_, group) in merged {
            let clusters = vec![group.cluster.clone()];
            let types: Vec<String> = group.types.into_iter().collect();
            kept.insert(
                0,
                Section {
                    members: group.members,
                    edges: group.edges,
                    details: SectionDetails {
                        title: ctx.profile.section_title(
                            &clusters,
                            &types,
                            ctx.options.multicluster,
                            &ctx.options.locale,
                        ),
                        clusters: group.cluster,
                        is_multi_cluster: false,
                    },
                },
            );
        }

        if let Some(group) = pass.groups.get_mut(kind) {
            group.connected = kept;
        }
    }
    if folded > 0 {
        tracing::debug!(folded, "consolidated single-node sections");
    }
}

/// `Some(key)` when `section` is a single node whose every link reaches a clone candidate.
fn consolidation_key(pass: &Pass, section: &Section) -> Option<String> {
    if section.members.len() != 1 || section.edges.is_empty() {
        return None;
    }
    let (uid, &idx) = section.members.first()?;
    let mut key = None;
    for &li in &section.edges {
        let link = &pass.links[li];
        let shared_end = End::BOTH.into_iter().find(|end| {
            let raw = end.raw(link);
            raw != uid.as_str() && pass.to_be_cloned.contains_key(raw)
        })?;
        if key.is_none() {
            let shared = pass.to_be_cloned.get(shared_end.raw(link))?;
            key = Some(format!(
                "{}/{}/{}",
                shared_end.name(),
                pass.nodes[idx].node.cluster_key(),
                shared.kind
            ));
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use crate::model::Node;
    use crate::options::LayoutOptions;
    use crate::pipeline::test_support::{graph, run_stages};
    use crate::pipeline::CollectionKind;
    use crate::profile::TopologyProfile;

    #[test]
    fn singletons_talking_to_the_internet_share_one_section() {
        let g = graph(
            vec![
                Node::new("a", "service", "a").with_cluster("east"),
                Node::new("b", "service", "b").with_cluster("east"),
                Node::new("c", "service", "c").with_cluster("west"),
                Node::new("net", "internet", "internet"),
            ],
            vec![("a", "net"), ("b", "net"), ("c", "net")],
        );
        let (pass, collections, _) =
            run_stages(&g, &TopologyProfile::hcm(), &LayoutOptions::default());

        let connected: Vec<_> = collections
            .iter()
            .filter(|c| c.kind == CollectionKind::Connected)
            .collect();
        assert_eq!(connected.len(), 2);
        // The west group was created last and sits first.
        assert_eq!(connected[0].details.clusters, "west");
        assert_eq!(connected[1].details.clusters, "east");
        assert_eq!(connected[1].members.len(), 3);
        assert_eq!(connected[1].details.title, "internet, service");
        let clones = connected[1]
            .members
            .iter()
            .filter(|&&idx| pass.layout(idx).unwrap().cloned)
            .count();
        assert_eq!(clones, 1);
    }

    #[test]
    fn singletons_with_a_self_loop_are_kept() {
        let mut looped = Node::new("a", "service", "a");
        looped.self_link = Some("aauses".to_string());
        let g = graph(vec![looped, Node::new("net", "internet", "i")], vec![("a", "a"), ("a", "net")]);
        let (_, collections, _) =
            run_stages(&g, &TopologyProfile::hcm(), &LayoutOptions::default());
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].edges.len(), 2);
    }
}
