use super::{Pass, PassContext, Section, SectionDetails, WorkLink};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

/// Links indexed by the node at either end.
#[derive(Debug, Default)]
pub(crate) struct Adjacency {
    /// Target uid to the links ending there.
    incoming: FxHashMap<String, Vec<usize>>,
    /// Source uid to the links leaving it.
    outgoing: FxHashMap<String, Vec<usize>>,
    /// Every uid touched by a usable link.
    touched: FxHashSet<String>,
}

impl Adjacency {
    /// Indexes the links whose both ends are live nodes or clone candidates.
    pub(crate) fn build(pass: &Pass) -> Self {
        let mut adj = Self::default();
        for (li, wl) in pass.links.iter().enumerate() {
            let (s, t) = (&wl.link.source, &wl.link.target);
            if s.is_empty() || t.is_empty() || !pass.is_known(s) || !pass.is_known(t) {
                continue;
            }
            adj.incoming.entry(t.clone()).or_default().push(li);
            adj.outgoing.entry(s.clone()).or_default().push(li);
            adj.touched.insert(s.clone());
            adj.touched.insert(t.clone());
        }
        adj
    }

    pub(crate) fn is_touched(&self, uid: &str) -> bool {
        self.touched.contains(uid)
    }

    /// `(link index, uid at the far end)` for every link touching `uid`.
    pub(crate) fn around<'a>(
        &'a self,
        uid: &'a str,
        links: &'a [WorkLink],
    ) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        let incoming = self
            .incoming
            .get(uid)
            .into_iter()
            .flatten()
            .map(move |&li| (li, links[li].link.source.as_str()));
        let outgoing = self
            .outgoing
            .get(uid)
            .into_iter()
            .flatten()
            .map(move |&li| (li, links[li].link.target.as_str()));
        incoming.chain(outgoing)
    }
}

/// Splits every type bucket into connected sections and unconnected leftovers.
///
/// A node claimed by one section is never revisited, so every live node ends up
/// in exactly one section or one leftover list. Traversal never walks through a
/// clone candidate; those attach per section later.
pub(crate) fn group_by_connections(pass: &mut Pass, order: &[String], ctx: &PassContext<'_>) {
    let adj = Adjacency::build(pass);
    let mut claimed: FxHashSet<String> = FxHashSet::default();

    for kind in order {
        let Some(bucket) = pass.groups.get(kind).map(|g| g.nodes.clone()) else {
            continue;
        };
        let mut connected = Vec::new();
        let mut unconnected = Vec::new();
        for idx in bucket {
            let uid = pass.nodes[idx].node.uid.clone();
            if !adj.is_touched(&uid) {
                unconnected.push(idx);
            } else if !claimed.contains(&uid) {
                connected.push(gather(pass, &adj, &mut claimed, uid));
            }
        }
        if let Some(group) = pass.groups.get_mut(kind) {
            group.connected = connected;
            group.unconnected = unconnected;
        }
    }

    pass.groups
        .retain(|_, g| !g.connected.is_empty() || !g.unconnected.is_empty());

    for kind in order {
        let Some(mut sections) = pass.groups.get_mut(kind).map(|g| std::mem::take(&mut g.connected))
        else {
            continue;
        };
        for section in &mut sections {
            collect_edges(pass, &adj, section, ctx);
        }
        if let Some(group) = pass.groups.get_mut(kind) {
            group.connected = sections;
        }
    }

    tracing::debug!(
        links = pass.links.len(),
        touched = adj.touched.len(),
        sections = pass.groups.values().map(|g| g.connected.len()).sum::<usize>(),
        "partitioned nodes by connectivity"
    );
}

/// Work-stack flood fill along both link directions.
fn gather(pass: &Pass, adj: &Adjacency, claimed: &mut FxHashSet<String>, start: String) -> Section {
    let mut section = Section::default();
    let mut stack = vec![start];
    while let Some(uid) = stack.pop() {
        if !claimed.insert(uid.clone()) {
            continue;
        }
        let Some(&idx) = pass.index.get(&uid) else {
            continue;
        };
        for (_, next) in adj.around(&uid, &pass.links) {
            if !claimed.contains(next) && !pass.to_be_cloned.contains_key(next) {
                stack.push(next.to_string());
            }
        }
        section.members.insert(uid, idx);
    }
    section
}

fn collect_edges(pass: &mut Pass, adj: &Adjacency, section: &mut Section, ctx: &PassContext<'_>) {
    let mut edges: IndexMap<String, usize> = IndexMap::new();
    let mut clusters: BTreeSet<String> = BTreeSet::new();
    let mut types: BTreeSet<String> = BTreeSet::new();

    for uid in section.members.keys() {
        let touching: Vec<usize> = adj.around(uid, &pass.links).map(|(li, _)| li).collect();
        for li in touching {
            let wl = &mut pass.links[li];
            // Ends point at the raw nodes until cloning repoints them.
            if wl.source != wl.link.source {
                wl.source = wl.link.source.clone();
            }
            if wl.target != wl.link.target {
                wl.target = wl.link.target.clone();
            }
            edges.insert(wl.uid.clone(), li);

            for end in [&pass.links[li].link.source, &pass.links[li].link.target] {
                if let Some(&idx) = pass.index.get(end.as_str()) {
                    let node = &pass.nodes[idx].node;
                    clusters.insert(node.cluster_key().to_string());
                    types.insert(node.kind.clone());
                }
            }
        }
    }

    let clusters: Vec<String> = clusters.into_iter().collect();
    let types: Vec<String> = types.into_iter().collect();
    section.edges = edges.into_values().collect();
    section.details = SectionDetails {
        title: ctx.profile.section_title(
            &clusters,
            &types,
            ctx.options.multicluster,
            &ctx.options.locale,
        ),
        clusters: clusters.join("/"),
        is_multi_cluster: clusters.len() > 1,
    };
}

#[cfg(test)]
mod tests {
    use crate::model::Node;
    use crate::options::LayoutOptions;
    use crate::pipeline::test_support::{graph, run_stages};
    use crate::profile::TopologyProfile;
    use rustc_hash::FxHashMap;

    #[test]
    fn every_live_node_lands_in_exactly_one_section() {
        let nodes = vec![
            Node::new("a", "deployment", "a"),
            Node::new("b", "pod", "b"),
            Node::new("c", "pod", "c"),
            Node::new("d", "container", "d"),
            Node::new("e", "container", "e"),
            Node::new("f", "service", "f"),
            Node::new("g", "service", "g"),
            Node::new("net", "internet", "internet"),
        ];
        let g = graph(
            nodes,
            vec![("a", "b"), ("b", "c"), ("d", "c"), ("f", "net"), ("g", "net"), ("x", "a")],
        );
        let (pass, collections, _) =
            run_stages(&g, &TopologyProfile::hcm(), &LayoutOptions::default());

        let mut seen: FxHashMap<String, usize> = FxHashMap::default();
        for c in &collections {
            for &idx in &c.members {
                let layout = pass.layout(idx).unwrap();
                if !layout.cloned {
                    *seen.entry(layout.uid.clone()).or_default() += 1;
                }
            }
        }
        for uid in ["a", "b", "c", "d", "e", "f", "g"] {
            assert_eq!(seen.get(uid), Some(&1), "{uid} placed {:?} times", seen.get(uid));
        }
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn traversal_crosses_types_but_not_clones() {
        let g = graph(
            vec![
                Node::new("svc", "service", "svc"),
                Node::new("dep", "deployment", "dep"),
                Node::new("pod", "pod", "pod-x"),
                Node::new("other", "service", "other"),
                Node::new("net", "internet", "internet"),
            ],
            vec![("svc", "dep"), ("dep", "pod"), ("svc", "net"), ("other", "net"), ("other", "pod")],
        );
        let profile = TopologyProfile::hcm();
        let mut pass = crate::pipeline::Pass::new(&g, &profile);
        let mut order = profile.spec.order.clone();
        let options = LayoutOptions::default();
        let ctx = crate::pipeline::PassContext {
            profile: &profile,
            options: &options,
        };
        crate::pipeline::group::group_nodes(&mut pass, &mut order);
        super::group_by_connections(&mut pass, &order, &ctx);

        let services = &pass.groups["service"];
        assert_eq!(services.connected.len(), 1);
        let members: Vec<&str> = services.connected[0].members.keys().map(String::as_str).collect();
        assert_eq!(members.len(), 4);
        assert!(!members.contains(&"net"));
        assert!(!pass.groups.contains_key("controller"));
        assert_eq!(services.connected[0].edges.len(), 5);
    }
}
