use std::collections::BTreeMap;
use std::sync::Arc;
use topograph::{
    CancelToken, LayoutOptions, Link, Node, NodeAnnotator, NodeLayout, Point, TopologyGraph,
    TopologyLayout, TopologyProfile,
};

fn graph(nodes: Vec<Node>, links: &[(&str, &str)]) -> TopologyGraph {
    TopologyGraph {
        nodes,
        links: links
            .iter()
            .map(|(s, t)| Link::new(*s, *t, "uses"))
            .collect(),
    }
}

/// `pairs` disjoint service -> deployment sections.
fn pairs(count: usize) -> TopologyGraph {
    let mut nodes = Vec::new();
    let mut links = Vec::new();
    for i in 0..count {
        nodes.push(Node::new(format!("s{i}"), "service", format!("svc-{i}")));
        nodes.push(Node::new(format!("d{i}"), "deployment", format!("app-{i}")));
        links.push(Link::new(format!("s{i}"), format!("d{i}"), "uses"));
    }
    TopologyGraph { nodes, links }
}

fn mesh() -> TopologyGraph {
    let nodes = (0..9)
        .map(|i| Node::new(format!("p{i}"), "pod", format!("worker-{i}")))
        .chain([Node::new("net", "internet", "internet")])
        .collect();
    graph(
        nodes,
        &[
            ("p0", "p1"),
            ("p1", "p2"),
            ("p2", "p3"),
            ("p3", "p4"),
            ("p4", "p5"),
            ("p5", "p6"),
            ("p6", "p7"),
            ("p7", "p8"),
            ("p8", "p0"),
            ("p0", "net"),
        ],
    )
}

#[test]
fn controller_absorbs_its_pods_and_service() {
    let g = graph(
        vec![
            Node::new("dep", "deployment", "web").with_namespace("shop"),
            Node::new("p1", "pod", "web-7f8c9d2b1a-x7k2p").with_namespace("shop"),
            Node::new("p2", "pod", "web-7f8c9d2b1a-a1b2c").with_namespace("shop"),
            Node::new("p3", "pod", "web-7f8c9d2b1a-z9y8x").with_namespace("shop"),
            Node::new("svc", "service", "web-service").with_namespace("shop"),
        ],
        &[("p1", "dep"), ("p2", "dep"), ("p3", "dep"), ("svc", "dep")],
    );
    let mut engine = TopologyLayout::new(TopologyProfile::hcm());
    let out = engine
        .layout_blocking(&g, &LayoutOptions::default())
        .expect("engine is live");

    assert_eq!(out.nodes.len(), 1);
    let layout = &out.nodes[0].layout;
    assert_eq!(layout.uid, "dep");
    assert!(layout.has_pods);
    assert_eq!(layout.pods.len(), 3);
    assert!(layout.has_service);
    assert!(layout.show_dot);
    assert_eq!(layout.info.as_deref(), Some("3 pods"));
    assert!(out.nodes.iter().all(|n| n.node.kind != "pod" && n.node.kind != "service"));
}

#[test]
fn unchanged_sections_are_reused_between_passes() {
    let mut engine = TopologyLayout::new(TopologyProfile::hcm());
    let options = LayoutOptions::default();
    let first = engine.layout_blocking(&mesh(), &options).unwrap();
    assert_eq!(first.stats.reused, 0);
    assert!(first.stats.computed > 0);

    let second = engine.layout_blocking(&mesh(), &options).unwrap();
    assert_eq!(second.stats.computed, 0);
    assert_eq!(second.stats.reused, second.stats.sections);

    let positions = |out: &topograph::LayoutOutput| -> BTreeMap<String, (f64, f64)> {
        out.nodes
            .iter()
            .map(|n| (n.layout.uid.clone(), (n.layout.x, n.layout.y)))
            .collect()
    };
    assert_eq!(positions(&first), positions(&second));
}

#[test]
fn a_changed_section_is_laid_out_again() {
    let mut engine = TopologyLayout::new(TopologyProfile::hcm());
    let options = LayoutOptions::default();
    engine.layout_blocking(&pairs(2), &options).unwrap();

    let mut grown = pairs(2);
    grown.nodes.push(Node::new("extra", "pod", "extra"));
    grown.links.push(Link::new("d1", "extra", "uses"));
    let out = engine.layout_blocking(&grown, &options).unwrap();
    assert_eq!(out.stats.reused, 1);
    assert_eq!(out.stats.computed, 1);
    assert_eq!(engine.cached_sections(), 2);
}

#[test]
fn clones_follow_section_membership() {
    let g = graph(
        vec![
            Node::new("a", "service", "a"),
            Node::new("b", "deployment", "b"),
            Node::new("c", "service", "c"),
            Node::new("d", "deployment", "d"),
            Node::new("net", "internet", "internet"),
        ],
        &[("a", "b"), ("a", "net"), ("c", "d"), ("c", "net")],
    );
    let mut engine = TopologyLayout::new(TopologyProfile::hcm());
    let out = engine.layout_blocking(&g, &LayoutOptions::default()).unwrap();
    let clones: Vec<&str> = out
        .nodes
        .iter()
        .filter(|n| n.layout.cloned)
        .map(|n| n.layout.uid.as_str())
        .collect();
    assert_eq!(clones.len(), 2);
    assert_ne!(clones[0], clones[1]);
    assert!(out.nodes.iter().all(|n| n.layout.uid != "net"));

    let before = engine.clone_ids();
    engine.layout_blocking(&g, &LayoutOptions::default()).unwrap();
    assert_eq!(engine.clone_ids(), before);

    for edge in out.edges.iter().filter(|e| e.link.target == "net") {
        assert!(edge.layout.target.starts_with("net_service_"));
        assert!(out.node(&edge.layout.target).is_some());
    }
}

#[test]
fn busy_nodes_become_hubs() {
    let mut nodes: Vec<Node> = (0..19)
        .map(|i| Node::new(format!("p{i}"), "pod", format!("p{i}")))
        .collect();
    nodes.push(Node::new("hub", "pod", "hub"));
    let mut links: Vec<Link> = (0..4)
        .map(|i| Link::new(format!("p{i}"), "hub", "uses"))
        .collect();
    for i in 4..19 {
        links.push(Link::new(format!("p{}", i - 1), format!("p{i}"), "uses"));
    }
    let g = TopologyGraph { nodes, links };

    let out = topograph::layout_once(&g, TopologyProfile::hcm(), &LayoutOptions::default());
    let hub = out.node("hub").unwrap();
    assert!(hub.layout.is_major_hub);
    assert_eq!(hub.layout.scale, 1.6);
    let p3 = out.node("p3").unwrap();
    assert!(!p3.layout.is_major_hub && !p3.layout.is_minor_hub);
}

#[test]
fn rows_stay_within_the_break_width() {
    let options = LayoutOptions {
        break_width: 1000.0,
        ..Default::default()
    };
    let out = topograph::layout_once(&pairs(12), TopologyProfile::hcm(), &options);
    assert_eq!(out.nodes.len(), 24);

    let title_y: BTreeMap<i32, f64> = out.titles.iter().map(|t| (t.hash_code, t.y)).collect();
    let mut rows: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
    for node in &out.nodes {
        let hash = out.layout_map[&node.layout.uid];
        let key = title_y[&hash].round() as i64;
        let half = options.node_size * node.layout.scale / 2.0;
        let span = rows
            .entry(key)
            .or_insert((f64::INFINITY, f64::NEG_INFINITY));
        span.0 = span.0.min(node.layout.x - half);
        span.1 = span.1.max(node.layout.x + half);
    }
    assert!(rows.len() > 1);
    for (y, (lo, hi)) in rows {
        assert!(hi - lo <= options.break_width, "row at {y} spans {}", hi - lo);
    }
    assert!(out.layout_bbox.width > 0.0 && out.layout_bbox.height > 0.0);
}

#[test]
fn dragged_nodes_keep_their_place() {
    let mut engine = TopologyLayout::new(TopologyProfile::hcm());
    let options = LayoutOptions::default();
    let first = engine.layout_blocking(&pairs(1), &options).unwrap();
    let computed = first.node("s0").map(|n| (n.layout.x, n.layout.y)).unwrap();

    engine.drag_node("s0", Point::new(-400.0, 900.0));
    let out = engine.layout_blocking(&pairs(1), &options).unwrap();
    let s0 = &out.node("s0").unwrap().layout;
    assert_eq!((s0.x, s0.y), (-400.0, 900.0));
    assert_eq!(s0.undragged.map(|p| (p.x, p.y)), Some(computed));
    let edge = &out.edges[0].layout;
    let start = edge.path[0];
    assert!((start.x + edge.transform.x + 400.0).abs() < 1e-9);
    assert!((start.y + edge.transform.y - 900.0).abs() < 1e-9);

    assert!(engine.release_node("s0").is_some());
    let out = engine.layout_blocking(&pairs(1), &options).unwrap();
    let s0 = &out.node("s0").unwrap().layout;
    assert_eq!((s0.x, s0.y), computed);
    assert!(s0.dragged.is_none());
}

#[test]
fn hidden_links_are_flagged() {
    let mut options = LayoutOptions::default();
    options.hidden_links.insert("s1d1uses".to_string());
    let out = topograph::layout_once(&pairs(2), TopologyProfile::hcm(), &options);
    let hidden: Vec<&str> = out
        .edges
        .iter()
        .filter(|e| e.layout.hidden)
        .map(|e| e.link.uid.as_str())
        .collect();
    assert_eq!(hidden, vec!["s1d1uses"]);
}

struct CancelOnAnnotate(CancelToken);

impl NodeAnnotator for CancelOnAnnotate {
    fn annotate(&self, _node: &Node, _layout: &mut NodeLayout, _locale: &str) {
        self.0.cancel();
    }
}

#[test]
fn a_pass_cancelled_midway_publishes_nothing() {
    let token = CancelToken::new();
    let profile =
        TopologyProfile::hcm().with_annotator(Arc::new(CancelOnAnnotate(token.clone())));
    let mut engine = TopologyLayout::with_token(profile, token);

    let mut published = 0;
    let ran = engine.layout_with(&pairs(1), &LayoutOptions::default(), |_| published += 1);
    assert!(!ran);
    assert_eq!(published, 0);
    assert!(engine.is_destroyed());
}

#[test]
fn yaml_profiles_drive_the_engine() {
    let profile = TopologyProfile::from_yaml_str(
        r#"
order: [app, db]
cloneTypes: [gateway]
options:
  showHubs: false
  showSectionTitles: true
  titleSeparator: " + "
"#,
    )
    .unwrap();
    let g = graph(
        vec![
            Node::new("a", "app", "a"),
            Node::new("b", "db", "b"),
            Node::new("gw", "gateway", "gw"),
        ],
        &[("a", "b"), ("a", "gw")],
    );
    let out = topograph::layout_once(&g, profile, &LayoutOptions::default());
    assert_eq!(out.nodes.len(), 3);
    assert_eq!(out.nodes.iter().filter(|n| n.layout.cloned).count(), 1);
    assert_eq!(out.titles.len(), 1);
    assert_eq!(out.titles[0].title, "app + db");
}

#[test]
fn a_failing_section_leaves_its_siblings_laid_out_and_is_retried() {
    let mut nodes: Vec<Node> = (0..8)
        .map(|i| Node::new(format!("p{i}"), "pod", format!("worker-{i}")))
        .collect();
    nodes.push(Node::new("a", "container", "a"));
    nodes.push(Node::new("b", "container", "b"));
    nodes.push(Node::new("lonely", "container", "lonely"));
    let mut links: Vec<Link> = (1..8)
        .map(|i| Link::new(format!("p{}", i - 1), format!("p{i}"), "uses"))
        .collect();
    links.push(Link::new("a", "b", "uses"));
    let g = TopologyGraph { nodes, links };

    // A zero node size leaves the force solver without an edge length.
    let options = LayoutOptions {
        node_size: 0.0,
        ..Default::default()
    };
    let mut engine = TopologyLayout::new(TopologyProfile::hcm());
    let out = engine.layout_blocking(&g, &options).unwrap();
    assert_eq!(out.stats.sections, 3);
    assert_eq!(out.stats.computed, 2);
    assert_eq!(out.stats.failed, 1);
    assert_eq!(engine.cached_sections(), 2);
    assert_eq!(out.nodes.len(), 11);
    assert!(out.nodes.iter().all(|n| out.layout_map.contains_key(&n.layout.uid)));

    let again = engine.layout_blocking(&g, &options).unwrap();
    assert_eq!(again.stats.reused, 2);
    assert_eq!(again.stats.computed, 0);
    assert_eq!(again.stats.failed, 1);
}
