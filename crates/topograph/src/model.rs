use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A resource in the normalized input graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub uid: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Owning cluster(s); several names are joined when a resource spans clusters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    /// Id of a link from this node to itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    /// Set for nodes that appeared since the previous refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newcomer: Option<Newcomer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<String>,
}

impl Node {
    pub fn new(uid: impl Into<String>, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            kind: kind.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster_name = Some(cluster.into());
        self
    }

    pub(crate) fn cluster_key(&self) -> &str {
        self.cluster_name.as_deref().unwrap_or("noclusters")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Newcomer {
    /// Already shown once in its grid slot.
    #[serde(default)]
    pub displayed: bool,
    /// Placed in a grid section by the last pass.
    #[serde(default)]
    pub grid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Derived from `source + target + type` when empty.
    #[serde(default)]
    pub uid: String,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: kind.into(),
            uid: String::new(),
        }
    }

    pub(crate) fn effective_uid(&self) -> String {
        if self.uid.is_empty() {
            format!("{}{}{}", self.source, self.target, self.kind)
        } else {
            self.uid.clone()
        }
    }
}

/// The normalized `{nodes, links}` graph the engine consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<narwhal::Point> for Point {
    fn from(p: narwhal::Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRow {
    #[serde(rename = "type")]
    pub kind: String,
    pub label_key: String,
    pub value: String,
}

impl DetailRow {
    pub fn label(label_key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: "label".to_string(),
            label_key: label_key.into(),
            value: value.into(),
        }
    }
}

/// Display state the engine attaches to every node it places.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLayout {
    pub uid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    pub compact_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qname: Option<String>,
    pub shape: String,
    pub class_name: String,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    /// Center of the section the node was placed in.
    pub center: Point,
    pub is_major_hub: bool,
    pub is_minor_hub: bool,
    pub show_dot: bool,
    pub has_pods: bool,
    pub has_service: bool,
    pub pods: Vec<Node>,
    pub services: Vec<Node>,
    pub cloned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newcomer: Option<Newcomer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<DetailRow>,
    /// Position chosen by the user; overrides the computed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dragged: Option<Point>,
    /// Computed position of a dragged node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undragged: Option<Point>,
}

impl NodeLayout {
    pub(crate) fn new(uid: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            kind: kind.into(),
            label: String::new(),
            compact_label: String::new(),
            qname: None,
            shape: String::new(),
            class_name: String::new(),
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            center: Point::default(),
            is_major_hub: false,
            is_minor_hub: false,
            show_dot: false,
            has_pods: false,
            has_service: false,
            pods: Vec::new(),
            services: Vec::new(),
            cloned: false,
            self_link: None,
            newcomer: None,
            info: None,
            details: Vec::new(),
            dragged: None,
            undragged: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedNode {
    #[serde(flatten)]
    pub node: Node,
    pub layout: NodeLayout,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeLayout {
    /// Layout uid of the source node or of its clone.
    pub source: String,
    pub target: String,
    pub is_loop: bool,
    pub hidden: bool,
    pub center: Point,
    /// Section-local to diagram offset.
    pub transform: Point,
    pub path: Vec<Point>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedEdge {
    #[serde(flatten)]
    pub link: Link,
    pub layout: EdgeLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionTitle {
    pub title: String,
    pub hash_code: i32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutBBox {
    pub x1: f64,
    pub y1: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    pub sections: usize,
    /// Sections whose cached layout was reused.
    pub reused: usize,
    /// Sections laid out by a solver in this pass.
    pub computed: usize,
    /// Sections whose solver failed; they keep their seed positions.
    pub failed: usize,
}

/// Everything a renderer needs from one layout pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOutput {
    pub nodes: Vec<PlacedNode>,
    pub edges: Vec<PlacedEdge>,
    /// Node layout uid to the hash code of the section holding it.
    pub layout_map: IndexMap<String, i32>,
    pub titles: Vec<SectionTitle>,
    /// Node layout uid to the uids of its loop links.
    pub self_links: IndexMap<String, Vec<String>>,
    pub layout_bbox: LayoutBBox,
    pub stats: PassStats,
}

impl LayoutOutput {
    pub fn node(&self, layout_uid: &str) -> Option<&PlacedNode> {
        self.nodes.iter().find(|n| n.layout.uid == layout_uid)
    }
}
