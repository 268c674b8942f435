pub mod constrained;
pub mod grid;
pub mod layered;

#[derive(Debug, Clone)]
pub enum Algorithm {
    /// Layered (Sugiyama-style) layout, used for tiny sections.
    Layered(LayeredOptions),
    /// Force-directed layout with alignment constraints.
    Constrained(ConstrainedOptions),
    /// Fixed-column grid for nodes without edges.
    Grid(GridOptions),
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Layered(_) => "layered",
            Algorithm::Constrained(_) => "constrained",
            Algorithm::Grid(_) => "grid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankDir {
    TB,
    #[default]
    LR,
}

#[derive(Debug, Clone)]
pub struct LayeredOptions {
    pub rank_dir: RankDir,
    /// Gap between consecutive ranks.
    pub rank_sep: f64,
    /// Gap between neighbours inside one rank.
    pub node_sep: f64,
    /// Number of alternating barycenter sweeps.
    pub sweeps: usize,
}

impl Default for LayeredOptions {
    fn default() -> Self {
        Self {
            rank_dir: RankDir::LR,
            rank_sep: 150.0,
            node_sep: 100.0,
            sweeps: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstrainedOptions {
    /// Seed for the deterministic jitter used when start positions coincide.
    pub random_seed: u64,
    /// Ideal edge length; `None` derives it from the node sizes.
    pub ideal_edge_length: Option<f64>,
    pub alignment_constraint: Option<AlignmentConstraint>,
    pub max_iterations: usize,
}

impl Default for ConstrainedOptions {
    fn default() -> Self {
        Self {
            random_seed: 0,
            ideal_edge_length: None,
            alignment_constraint: None,
            max_iterations: 2500,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlignmentConstraint {
    /// Nodes in each inner vec share the same y coordinate (horizontal alignment).
    pub horizontal: Vec<Vec<String>>,
    /// Nodes in each inner vec share the same x coordinate (vertical alignment).
    pub vertical: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct GridOptions {
    pub cols: usize,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            cols: 1,
            cell_width: 150.0,
            cell_height: 100.0,
        }
    }
}
