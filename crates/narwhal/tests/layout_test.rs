use narwhal::{
    Algorithm, AlignmentConstraint, ConstrainedOptions, Edge, Error, Graph, GridOptions,
    LayeredOptions, Node, layout,
};

fn edge(source: &str, target: &str) -> Edge {
    Edge {
        id: format!("{source}->{target}"),
        source: source.to_string(),
        target: target.to_string(),
    }
}

fn chain(ids: &[&str]) -> Graph {
    Graph {
        nodes: ids.iter().map(|id| Node::new(*id, 50.0, 50.0)).collect(),
        edges: ids.windows(2).map(|w| edge(w[0], w[1])).collect(),
    }
}

#[test]
fn layered_chain_runs_left_to_right_on_one_line() {
    let g = chain(&["a", "b", "c"]);
    let res = layout(&g, &Algorithm::Layered(LayeredOptions::default())).unwrap();

    let a = res.positions["a"];
    let b = res.positions["b"];
    let c = res.positions["c"];
    assert!(a.x < b.x && b.x < c.x);
    assert_eq!(a.y, b.y);
    assert_eq!(b.y, c.y);
    assert_eq!(b.x - a.x, 50.0 + 150.0);
}

#[test]
fn layered_bounds_cover_every_node() {
    let g = chain(&["a", "b"]);
    let res = layout(&g, &Algorithm::Layered(LayeredOptions::default())).unwrap();
    assert_eq!(res.bounds.x1, 0.0);
    assert_eq!(res.bounds.y1, 0.0);
    assert_eq!(res.bounds.w, 250.0);
    assert_eq!(res.bounds.h, 50.0);
    assert_eq!(res.edge_paths["a->b"].len(), 2);
}

#[test]
fn constrained_layout_honours_horizontal_alignment() {
    let mut g = chain(&["hub", "x", "y", "z", "w", "v", "u"]);
    g.edges.push(edge("hub", "y"));
    g.edges.push(edge("hub", "z"));
    g.edges.push(edge("w", "hub"));

    let opts = ConstrainedOptions {
        alignment_constraint: Some(AlignmentConstraint {
            horizontal: vec![vec!["hub".to_string(), "v".to_string()]],
            vertical: Vec::new(),
        }),
        ..Default::default()
    };
    let res = layout(&g, &Algorithm::Constrained(opts)).unwrap();

    assert_eq!(res.positions.len(), 7);
    let dy = (res.positions["hub"].y - res.positions["v"].y).abs();
    assert!(dy < 1e-6, "aligned nodes drifted apart by {dy}");
}

#[test]
fn constrained_layout_separates_nodes_that_start_together() {
    let g = chain(&["a", "b", "c", "d", "e", "f", "g", "h"]);
    let res = layout(&g, &Algorithm::Constrained(ConstrainedOptions::default())).unwrap();

    let pts: Vec<_> = res.positions.values().copied().collect();
    for (i, p) in pts.iter().enumerate() {
        for q in &pts[i + 1..] {
            let apart = (p.x - q.x).abs() >= 50.0 - 1e-6 || (p.y - q.y).abs() >= 50.0 - 1e-6;
            assert!(apart, "{p:?} overlaps {q:?}");
        }
    }
}

#[test]
fn constrained_layout_is_deterministic_for_a_seed() {
    let g = chain(&["a", "b", "c", "d", "e", "f", "g"]);
    let opts = ConstrainedOptions {
        random_seed: 42,
        ..Default::default()
    };
    let first = layout(&g, &Algorithm::Constrained(opts.clone())).unwrap();
    let second = layout(&g, &Algorithm::Constrained(opts)).unwrap();
    assert_eq!(first.positions, second.positions);
}

#[test]
fn grid_layout_wraps_after_the_column_count() {
    let g = Graph {
        nodes: (0..7).map(|i| Node::new(format!("n{i}"), 50.0, 50.0)).collect(),
        edges: Vec::new(),
    };
    let res = layout(
        &g,
        &Algorithm::Grid(GridOptions {
            cols: 3,
            cell_width: 150.0,
            cell_height: 100.0,
        }),
    )
    .unwrap();
    assert_eq!(res.positions["n3"].x, res.positions["n0"].x);
    assert_eq!(res.positions["n3"].y, res.positions["n0"].y + 100.0);
    assert_eq!(res.bounds.w, 2.0 * 150.0 + 50.0);
}

#[test]
fn validation_rejects_dangling_edges() {
    let mut g = chain(&["a", "b"]);
    g.edges.push(edge("a", "ghost"));
    let err = layout(&g, &Algorithm::Layered(LayeredOptions::default())).unwrap_err();
    assert!(matches!(err, Error::MissingEndpoint { edge_id } if edge_id == "a->ghost"));
}

#[test]
fn validation_rejects_duplicate_nodes() {
    let mut g = chain(&["a", "b"]);
    g.nodes.push(Node::new("a", 10.0, 10.0));
    let err = layout(&g, &Algorithm::Grid(GridOptions::default())).unwrap_err();
    assert!(matches!(err, Error::DuplicateNode { node_id } if node_id == "a"));
}

#[test]
fn empty_graph_lays_out_to_nothing() {
    let res = layout(
        &Graph::default(),
        &Algorithm::Constrained(ConstrainedOptions::default()),
    )
    .unwrap();
    assert!(res.positions.is_empty());
    assert_eq!(res.bounds.w, 0.0);
}
