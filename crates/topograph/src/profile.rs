//! Deployment profiles: type order, clone types, shapes and the hooks that
//! title sections and annotate nodes.

use crate::error::{Error, Result};
use crate::model::{DetailRow, Node, NodeLayout};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Produces the title of a section from the sorted resource types it holds.
pub trait SectionTitler: Send + Sync {
    fn title(&self, types: &[String], locale: &str) -> String;
}

/// Attaches human-readable info and detail rows to placed nodes.
pub trait NodeAnnotator: Send + Sync {
    fn annotate(&self, node: &Node, layout: &mut NodeLayout, locale: &str);

    fn details(&self, _node: &Node) -> Vec<DetailRow> {
        Vec::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeSpec {
    pub shape: String,
    pub class_name: String,
}

impl ShapeSpec {
    fn new(shape: &str, class_name: &str) -> Self {
        Self {
            shape: shape.to_string(),
            class_name: class_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileOptions {
    pub show_hubs: bool,
    pub show_section_titles: bool,
    /// Joins the type names of a section title.
    pub title_separator: String,
    /// Attach pod counts and detail rows to nodes.
    pub annotate_nodes: bool,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            show_hubs: false,
            show_section_titles: false,
            title_separator: ", ".to_string(),
            annotate_nodes: false,
        }
    }
}

/// The serializable part of a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileSpec {
    /// Section type priority.
    pub order: Vec<String>,
    /// Types drawn once per section that references them.
    pub clone_types: Vec<String>,
    pub shapes: IndexMap<String, ShapeSpec>,
    pub options: ProfileOptions,
}

impl ProfileSpec {
    pub fn hcm() -> Self {
        let shapes = [
            ("internet", "circle"),
            ("host", "circle"),
            ("service", "heptagon"),
            ("deployment", "circle"),
            ("daemonset", "octogon"),
            ("statefulset", "heptagon"),
            ("pod", "circle"),
            ("container", "octogon"),
        ]
        .into_iter()
        .map(|(kind, shape)| (kind.to_string(), ShapeSpec::new(shape, kind)))
        .collect();

        Self {
            order: ["host", "service", "controller", "pod", "container", "unmanaged"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            clone_types: vec!["internet".to_string(), "host".to_string()],
            shapes,
            options: ProfileOptions {
                show_hubs: true,
                show_section_titles: true,
                annotate_nodes: true,
                ..Default::default()
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if self.order.is_empty() {
            return Err(Error::InvalidProfile {
                message: "`order` must name at least one type".to_string(),
            });
        }
        for (idx, kind) in self.order.iter().enumerate() {
            if self.order[..idx].contains(kind) {
                return Err(Error::InvalidProfile {
                    message: format!("type `{kind}` appears twice in `order`"),
                });
            }
        }
        Ok(())
    }
}

/// Titles a section with its type names, e.g. `deployment, pod`.
#[derive(Debug, Clone)]
pub struct TypeListTitler {
    pub separator: String,
}

impl Default for TypeListTitler {
    fn default() -> Self {
        Self {
            separator: ", ".to_string(),
        }
    }
}

impl SectionTitler for TypeListTitler {
    fn title(&self, types: &[String], _locale: &str) -> String {
        types.join(&self.separator)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HcmAnnotator;

impl NodeAnnotator for HcmAnnotator {
    fn annotate(&self, _node: &Node, layout: &mut NodeLayout, _locale: &str) {
        match layout.pods.len() {
            0 if !layout.services.is_empty() => layout.info = Some("service".to_string()),
            0 => {}
            1 => layout.info = Some("1 pod".to_string()),
            n => layout.info = Some(format!("{n} pods")),
        }
    }

    fn details(&self, node: &Node) -> Vec<DetailRow> {
        let mut rows = Vec::new();
        if !node.kind.is_empty() {
            rows.push(DetailRow::label("resource.type", &node.kind));
        }
        if let Some(cluster) = node.cluster_name.as_deref() {
            rows.push(DetailRow::label("resource.cluster", cluster));
        }
        if !node.namespace.is_empty() {
            rows.push(DetailRow::label("resource.namespace", &node.namespace));
        }
        if let Some(topology) = node.topology.as_deref() {
            rows.push(DetailRow::label("resource.topology", topology));
        }
        rows
    }
}

#[derive(Clone)]
pub struct TopologyProfile {
    pub spec: ProfileSpec,
    pub titler: Option<Arc<dyn SectionTitler>>,
    pub annotator: Option<Arc<dyn NodeAnnotator>>,
}

impl fmt::Debug for TopologyProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopologyProfile")
            .field("spec", &self.spec)
            .field("titler", &self.titler.is_some())
            .field("annotator", &self.annotator.is_some())
            .finish()
    }
}

impl Default for TopologyProfile {
    fn default() -> Self {
        Self::hcm()
    }
}

impl TopologyProfile {
    /// The built-in application topology profile.
    pub fn hcm() -> Self {
        Self {
            spec: ProfileSpec::hcm(),
            titler: Some(Arc::new(TypeListTitler::default())),
            annotator: Some(Arc::new(HcmAnnotator)),
        }
    }

    /// Builds a profile from a spec, wiring the built-in hooks its options ask for.
    pub fn from_spec(spec: ProfileSpec) -> Result<Self> {
        spec.validate()?;
        let titler: Option<Arc<dyn SectionTitler>> = if spec.options.show_section_titles {
            Some(Arc::new(TypeListTitler {
                separator: spec.options.title_separator.clone(),
            }))
        } else {
            None
        };
        let annotator: Option<Arc<dyn NodeAnnotator>> = if spec.options.annotate_nodes {
            Some(Arc::new(HcmAnnotator))
        } else {
            None
        };
        Ok(Self {
            spec,
            titler,
            annotator,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_spec(serde_json::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::from_spec(serde_yaml::from_str(text)?)
    }

    pub fn with_titler(mut self, titler: Arc<dyn SectionTitler>) -> Self {
        self.titler = Some(titler);
        self
    }

    pub fn with_annotator(mut self, annotator: Arc<dyn NodeAnnotator>) -> Self {
        self.annotator = Some(annotator);
        self
    }

    pub fn show_hubs(mut self, show: bool) -> Self {
        self.spec.options.show_hubs = show;
        self
    }

    pub(crate) fn is_clone_type(&self, kind: &str) -> bool {
        self.spec.clone_types.iter().any(|t| t == kind)
    }

    /// Shape for a node type; unknown types fall back to a circle styled by type.
    pub(crate) fn shape_for(&self, kind: &str) -> ShapeSpec {
        self.spec
            .shapes
            .get(kind)
            .cloned()
            .unwrap_or_else(|| ShapeSpec::new("circle", kind))
    }

    /// Section title: cluster names first when several clusters are shown.
    pub(crate) fn section_title(
        &self,
        clusters: &[String],
        types: &[String],
        multicluster: bool,
        locale: &str,
    ) -> String {
        let Some(titler) = self.titler.as_ref() else {
            return String::new();
        };
        let prefix = if multicluster {
            format!("{}\n", clusters.join(", "))
        } else {
            String::new()
        };
        format!("{prefix}{}", titler.title(types, locale))
    }
}
