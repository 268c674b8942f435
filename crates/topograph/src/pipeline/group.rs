use super::{Pass, WorkNode};
use crate::label::{display_name, wrap_label};
use crate::model::NodeLayout;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;

const CONTROLLER_KINDS: [&str; 4] = ["deployment", "daemonset", "statefulset", "cronjob"];

fn pod_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-[0-9a-fA-F]{8,10}-[0-9a-zA-Z]{4,5}$").expect("valid regex"))
}

fn service_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-service$").expect("valid regex"))
}

/// Bucket a node type falls into; unlisted types go to `unknown`.
fn bucket_of(kind: &str, order: &mut Vec<String>) -> String {
    let bucket = if CONTROLLER_KINDS.contains(&kind) {
        "controller"
    } else {
        kind
    };
    if order.iter().any(|t| t == bucket) {
        return bucket.to_string();
    }
    if !order.iter().any(|t| t == "unknown") {
        order.push("unknown".to_string());
    }
    "unknown".to_string()
}

fn base_layout(work: &WorkNode) -> NodeLayout {
    let node = &work.node;
    let label = display_name(&node.name);
    let mut layout = NodeLayout::new(node.uid.clone(), node.kind.clone());
    layout.label = wrap_label(&label, 18, 3);
    layout.compact_label = wrap_label(&label, 12, 2);
    layout.self_link = node.self_link.clone();
    layout.newcomer = node.newcomer.clone();
    layout
}

/// Buckets live nodes by type and folds pods and services into the
/// controllers that own them.
pub(crate) fn group_nodes(pass: &mut Pass, order: &mut Vec<String>) {
    let mut controllers: FxHashMap<String, usize> = FxHashMap::default();

    for idx in 0..pass.nodes.len() {
        let bucket = bucket_of(&pass.nodes[idx].node.kind, order);
        let mut layout = base_layout(&pass.nodes[idx]);
        let node = &pass.nodes[idx].node;
        match bucket.as_str() {
            "controller" => {
                let qname = format!("{}/{}", node.namespace, node.name);
                controllers.insert(qname.clone(), idx);
                layout.qname = Some(qname);
            }
            "pod" => {
                let name = pod_suffix_regex().replace(&node.name, "");
                layout.qname = Some(format!("{}/{}", node.namespace, name));
            }
            "service" => {
                let name = service_suffix_regex().replace(&node.name, "");
                layout.qname = Some(format!("{}/{}", node.namespace, name));
            }
            _ => {}
        }
        pass.nodes[idx].layout = Some(layout);
        pass.groups.entry(bucket).or_default().nodes.push(idx);
    }

    if !pass.groups.contains_key("controller") {
        return;
    }

    merge_pods(pass, &controllers);
    let promoted = merge_services(pass, &controllers);
    show_controllers_as_services(pass, order, &promoted);

    tracing::debug!(
        groups = pass.groups.len(),
        live = pass.index.len(),
        promoted = promoted.len(),
        "grouped nodes by type"
    );
}

fn owning_controller(
    pass: &Pass,
    idx: usize,
    controllers: &FxHashMap<String, usize>,
) -> Option<usize> {
    let qname = pass.layout(idx)?.qname.as_deref()?;
    controllers.get(qname).copied()
}

fn merge_pods(pass: &mut Pass, controllers: &FxHashMap<String, usize>) {
    let Some(pods) = pass.groups.get("pod").map(|g| g.nodes.clone()) else {
        return;
    };
    let mut kept = Vec::with_capacity(pods.len());
    for idx in pods.into_iter().rev() {
        let Some(controller) = owning_controller(pass, idx, controllers) else {
            kept.push(idx);
            continue;
        };
        pass.nodes[idx].layout = None;
        let pod = pass.nodes[idx].node.clone();
        pass.index.remove(&pod.uid);
        if let Some(layout) = pass.nodes[controller].layout.as_mut() {
            layout.pods.push(pod);
            layout.has_pods = true;
            layout.show_dot = true;
        }
    }
    kept.reverse();
    if let Some(group) = pass.groups.get_mut("pod") {
        group.nodes = kept;
    }
}

/// Returns the qnames of controllers that absorbed a service.
fn merge_services(pass: &mut Pass, controllers: &FxHashMap<String, usize>) -> Vec<String> {
    let Some(services) = pass.groups.get("service").map(|g| g.nodes.clone()) else {
        return Vec::new();
    };
    let mut promoted: Vec<String> = Vec::new();
    let mut kept = Vec::with_capacity(services.len());
    for idx in services.into_iter().rev() {
        let Some(controller) = owning_controller(pass, idx, controllers) else {
            kept.push(idx);
            continue;
        };
        let qname = pass
            .nodes
            .get_mut(idx)
            .and_then(|n| n.layout.take())
            .and_then(|l| l.qname)
            .unwrap_or_default();
        let service = pass.nodes[idx].node.clone();
        pass.index.remove(&service.uid);
        if let Some(layout) = pass.nodes[controller].layout.as_mut() {
            layout.services.push(service);
        }
        if !promoted.contains(&qname) {
            promoted.push(qname);
        }
    }
    kept.reverse();
    if let Some(group) = pass.groups.get_mut("service") {
        group.nodes = kept;
    }
    promoted
}

fn show_controllers_as_services(pass: &mut Pass, order: &mut Vec<String>, promoted: &[String]) {
    if promoted.is_empty() {
        return;
    }
    if !order.iter().any(|t| t == "service") {
        order.push("service".to_string());
    }
    for qname in promoted {
        let Some(group) = pass.groups.get_mut("controller") else {
            return;
        };
        let found = group.nodes.iter().position(|&idx| {
            pass.nodes[idx]
                .layout
                .as_ref()
                .and_then(|l| l.qname.as_deref())
                == Some(qname.as_str())
        });
        let Some(pos) = found else {
            continue;
        };
        let idx = group.nodes.remove(pos);
        if let Some(layout) = pass.nodes[idx].layout.as_mut() {
            layout.kind = "service".to_string();
            layout.has_service = true;
            layout.show_dot = true;
        }
        pass.groups
            .entry("service".to_string())
            .or_default()
            .nodes
            .push(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;
    use crate::pipeline::test_support::graph;
    use crate::profile::TopologyProfile;

    fn shop() -> Vec<Node> {
        vec![
            Node::new("d1", "deployment", "web").with_namespace("shop"),
            Node::new("p1", "pod", "web-7f8c9d2b1a-x7k2p").with_namespace("shop"),
            Node::new("p2", "pod", "web-5d6c7b8a9f-q1w2e").with_namespace("shop"),
            Node::new("p3", "pod", "batch-5d6c7b8a9f-q1w2e").with_namespace("shop"),
            Node::new("s1", "service", "web-service").with_namespace("shop"),
            Node::new("s2", "service", "db").with_namespace("shop"),
        ]
    }

    fn grouped(nodes: Vec<Node>) -> (Pass, Vec<String>) {
        let profile = TopologyProfile::hcm();
        let mut pass = Pass::new(&graph(nodes, vec![]), &profile);
        let mut order = profile.spec.order.clone();
        group_nodes(&mut pass, &mut order);
        (pass, order)
    }

    #[test]
    fn pods_and_services_fold_into_their_controller() {
        let (pass, _) = grouped(shop());
        let controller = pass.layout(0).unwrap();
        let pods: Vec<&str> = controller.pods.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(pods, vec!["p2", "p1"]);
        assert!(controller.has_pods && controller.has_service && controller.show_dot);
        assert_eq!(controller.kind, "service");
        assert_eq!(controller.services[0].uid, "s1");

        assert!(pass.layout(1).is_none());
        assert!(pass.layout(4).is_none());
        assert_eq!(pass.groups["pod"].nodes, vec![3]);
        assert_eq!(pass.groups["service"].nodes, vec![5, 0]);
        assert!(pass.groups["controller"].nodes.is_empty());
        assert!(!pass.index.contains_key("p1"));
    }

    #[test]
    fn grouping_is_deterministic() {
        let (a, _) = grouped(shop());
        let (b, _) = grouped(shop());
        for idx in 0..a.nodes.len() {
            let la = a.layout(idx).map(|l| (l.kind.clone(), l.pods.clone(), l.services.clone()));
            let lb = b.layout(idx).map(|l| (l.kind.clone(), l.pods.clone(), l.services.clone()));
            assert_eq!(la, lb);
        }
    }

    #[test]
    fn unlisted_types_fall_into_unknown() {
        let (pass, order) = grouped(vec![Node::new("x", "configmap", "settings")]);
        assert_eq!(order.last().map(String::as_str), Some("unknown"));
        assert_eq!(pass.groups["unknown"].nodes, vec![0]);
        assert_eq!(pass.layout(0).unwrap().kind, "configmap");
    }

    #[test]
    fn labels_hide_generated_suffixes() {
        let (pass, _) = grouped(vec![Node::new("p", "pod", "web-7f8c9d2b1a-x7k2p")]);
        assert_eq!(pass.layout(0).unwrap().label, "web-{uid}");
        assert_eq!(pass.layout(0).unwrap().qname.as_deref(), Some("/web"));
    }
}
