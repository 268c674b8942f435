use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Edge length unit every spacing in the diagram is derived from.
pub const NODE_SIZE: f64 = 50.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    pub node_size: f64,
    /// Maximum row width before sections wrap onto a new row.
    pub break_width: f64,
    /// Prefix section titles with their cluster names.
    pub multicluster: bool,
    /// Lay out force sections from scratch instead of seeding them with the
    /// positions of the previous pass.
    pub first_layout: bool,
    pub locale: String,
    /// Link uids the renderer draws hidden.
    pub hidden_links: IndexSet<String>,
    /// Seed of the force layout jitter.
    pub seed: u64,
    pub heuristics: Heuristics,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            node_size: NODE_SIZE,
            break_width: 1500.0,
            multicluster: false,
            first_layout: false,
            locale: "en".to_string(),
            hidden_links: IndexSet::new(),
            seed: 0,
            heuristics: Heuristics::default(),
        }
    }
}

/// Hand-tuned visual constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Heuristics {
    /// In-degree that makes a node a hub on its own.
    pub hub_min_inputs: usize,
    /// In-degree plus out-degree that makes a node a hub.
    pub hub_min_connections: usize,
    /// Sections smaller than this get `major_hubs_small` major hubs, others `major_hubs_large`.
    pub major_hub_section_size: usize,
    pub major_hubs_small: usize,
    pub major_hubs_large: usize,
    pub major_hub_scale: f64,
    pub minor_hub_scale: f64,
    /// Connected sections up to this size use the layered layout.
    pub layered_max_nodes: usize,
    /// Grid buckets above this size are split into chunks.
    pub grid_split_threshold: usize,
    pub grid_chunk_size: usize,
    pub grid_columns: StepTable<usize>,
    /// Sections of at least this size sort before smaller ones.
    pub large_section_size: usize,
    /// A row closes before the first grid once it holds more sections than this.
    pub cells_before_grid_row: usize,
    pub group_stretch: StepTable<f64>,
    pub major_hub_stretch: StepTable<f64>,
    pub minor_hub_stretch: StepTable<f64>,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            hub_min_inputs: 4,
            hub_min_connections: 6,
            major_hub_section_size: 15,
            major_hubs_small: 2,
            major_hubs_large: 3,
            major_hub_scale: 1.6,
            minor_hub_scale: 1.4,
            layered_max_nodes: 6,
            grid_split_threshold: 48,
            grid_chunk_size: 32,
            grid_columns: StepTable::new(vec![(3, 1), (9, 3), (12, 4), (18, 6)], 8),
            large_section_size: 5,
            cells_before_grid_row: 5,
            group_stretch: StepTable::new(vec![(10, 1.3), (15, 1.2), (20, 1.1)], 1.0),
            major_hub_stretch: StepTable::new(vec![(15, 1.2), (20, 1.5)], 1.6),
            minor_hub_stretch: StepTable::new(vec![(15, 1.1), (20, 1.4)], 1.5),
        }
    }
}

/// Step function over a count: the first `(limit, value)` with `count <= limit` wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTable<T> {
    pub steps: Vec<(usize, T)>,
    pub otherwise: T,
}

impl<T: Copy> StepTable<T> {
    pub fn new(steps: Vec<(usize, T)>, otherwise: T) -> Self {
        Self { steps, otherwise }
    }

    pub fn pick(&self, count: usize) -> T {
        self.steps
            .iter()
            .find(|(limit, _)| count <= *limit)
            .map(|(_, v)| *v)
            .unwrap_or(self.otherwise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_columns_follow_the_node_count() {
        let h = Heuristics::default();
        let cols: Vec<usize> = [1, 3, 4, 9, 10, 12, 13, 18, 19, 40]
            .iter()
            .map(|&n| h.grid_columns.pick(n))
            .collect();
        assert_eq!(cols, vec![1, 1, 3, 3, 4, 4, 6, 6, 8, 8]);
    }

    #[test]
    fn stretch_shrinks_as_sections_grow() {
        let h = Heuristics::default();
        assert_eq!(h.group_stretch.pick(7), 1.3);
        assert_eq!(h.group_stretch.pick(15), 1.2);
        assert_eq!(h.group_stretch.pick(21), 1.0);
        assert_eq!(h.major_hub_stretch.pick(30), 1.6);
        assert_eq!(h.minor_hub_stretch.pick(16), 1.4);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: LayoutOptions =
            serde_json::from_str(r#"{"breakWidth": 900, "hiddenLinks": ["a"]}"#).unwrap();
        assert_eq!(opts.break_width, 900.0);
        assert_eq!(opts.node_size, NODE_SIZE);
        assert!(opts.hidden_links.contains("a"));
        assert_eq!(opts.heuristics.hub_min_inputs, 4);
    }
}
