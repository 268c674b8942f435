//! Row packing: places every section's local layout into the diagram.

use crate::model::{EdgeLayout, LayoutBBox, Link, PlacedEdge, Point, SectionTitle};
use crate::options::LayoutOptions;
use crate::pipeline::{Collection, CollectionKind, Pass};
use crate::run::{CachedLayout, SectionLayout};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;

/// One finished row of sections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Row {
    /// Width of the row with the minimal spacer between sections.
    pub width: f64,
    /// Height of the tallest section plus title clearance.
    pub height: f64,
    pub cells: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Packed {
    pub layout_map: IndexMap<String, i32>,
    pub edges: Vec<PlacedEdge>,
    pub bbox: LayoutBBox,
    pub rows: Vec<Row>,
    /// Layout uids placed from seed positions because their solver failed.
    pub unsettled: FxHashSet<String>,
}

struct Cell<'a> {
    collection: &'a Collection,
    layout: CachedLayout,
    settled: bool,
}

/// Horizontal placement inside one row: section `i` starts `base + step * i`
/// past its packed position, and sections are `gap` apart.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RowPlacement {
    base: f64,
    step: f64,
    gap: f64,
}

impl RowPlacement {
    fn center(row: &Row, widest: f64, spacer: f64) -> Self {
        let slack = widest - row.width;
        let plain = Self {
            base: 0.0,
            step: 0.0,
            gap: spacer,
        };
        if slack <= 0.0 {
            return plain;
        }
        match row.cells {
            1 => Self {
                base: slack / 2.0,
                ..plain
            },
            2 => {
                let gap = spacer * 3.0;
                let extra = gap - spacer;
                if slack >= extra {
                    Self {
                        base: (slack - extra) / 2.0,
                        step: 0.0,
                        gap,
                    }
                } else {
                    Self {
                        base: slack / 2.0,
                        ..plain
                    }
                }
            }
            cells => {
                let share = slack / cells as f64;
                let gap = spacer * 2.0;
                let extra = (cells - 1) as f64 * (gap - spacer);
                if share >= spacer * 2.0 && slack >= extra {
                    Self {
                        base: (slack - extra) / 2.0,
                        step: 0.0,
                        gap,
                    }
                } else {
                    Self {
                        base: 0.0,
                        step: share,
                        gap: spacer,
                    }
                }
            }
        }
    }
}

fn type_index(order: &[String], kind: &str) -> usize {
    order.iter().position(|t| t == kind).unwrap_or(usize::MAX)
}

/// Stable section order: connected before grids; multi-cluster first; large
/// sections grouped by how much of the diagram their type fills.
fn compare_cells(
    a: &Cell<'_>,
    b: &Cell<'_>,
    order: &[String],
    type_sizes: &FxHashMap<&str, usize>,
    large: usize,
) -> Ordering {
    let (ca, cb) = (a.collection, b.collection);
    let ax = type_index(order, &ca.section_type);
    let bx = type_index(order, &cb.section_type);
    let a_grid = ca.kind == CollectionKind::Grid;
    let b_grid = cb.kind == CollectionKind::Grid;

    let by_kind = a_grid.cmp(&b_grid);
    if by_kind != Ordering::Equal {
        return by_kind;
    }
    if a_grid {
        return ax
            .cmp(&bx)
            .then_with(|| ca.details.clusters.cmp(&cb.details.clusters))
            .then_with(|| ca.hash_code.cmp(&cb.hash_code));
    }

    let az = a.layout.positions.len();
    let bz = b.layout.positions.len();
    let a_large = az >= large;
    let b_large = bz >= large;
    cb.details
        .is_multi_cluster
        .cmp(&ca.details.is_multi_cluster)
        .then_with(|| b_large.cmp(&a_large))
        .then_with(|| {
            if a_large && b_large {
                let at = type_sizes.get(ca.section_type.as_str()).copied().unwrap_or(0);
                let bt = type_sizes.get(cb.section_type.as_str()).copied().unwrap_or(0);
                bt.cmp(&at).then_with(|| bz.cmp(&az))
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| ca.details.clusters.cmp(&cb.details.clusters))
        .then_with(|| bz.cmp(&az))
        .then_with(|| ax.cmp(&bx))
        .then_with(|| ca.hash_code.cmp(&cb.hash_code))
}

/// Splits sorted sections into rows. A row closes before a section that would
/// push it past `break_width`, after the last non-grid section once more than
/// `cells_before_grid_row` sections sit in it, and at the end.
fn rows_of(cells: &[Cell<'_>], options: &LayoutOptions) -> (Vec<Row>, Vec<usize>) {
    let spacer = options.node_size * 3.0;
    let mut rows = Vec::new();
    let mut row_of = Vec::with_capacity(cells.len());
    let mut current = Row {
        width: 0.0,
        height: 0.0,
        cells: 0,
    };
    let mut x = 0.0;

    let close = |rows: &mut Vec<Row>, current: &mut Row, x: &mut f64| {
        rows.push(Row {
            height: current.height + options.node_size * 2.0,
            ..*current
        });
        *current = Row {
            width: 0.0,
            height: 0.0,
            cells: 0,
        };
        *x = 0.0;
    };

    for (idx, cell) in cells.iter().enumerate() {
        let bbox = cell.layout.bbox;
        if current.cells > 0 && x + bbox.w > options.break_width {
            close(&mut rows, &mut current, &mut x);
        }
        row_of.push(rows.len());
        current.cells += 1;
        current.width = current.width.max(x + bbox.w);
        current.height = current.height.max(bbox.h);
        x += bbox.w + spacer;

        let is_grid = cell.collection.kind == CollectionKind::Grid;
        let next_is_grid = cells
            .get(idx + 1)
            .map(|c| c.collection.kind == CollectionKind::Grid);
        let last = next_is_grid.is_none();
        if last
            || (current.cells > options.heuristics.cells_before_grid_row
                && !is_grid
                && next_is_grid == Some(true))
        {
            close(&mut rows, &mut current, &mut x);
        }
    }
    (rows, row_of)
}

/// Places sorted sections row by row, writing final positions into the pass
/// nodes and returning the placed edges, layout map and diagram bounds.
///
/// `titles` keeps one title per section hash across passes; entries for
/// sections that disappeared are dropped and new sections get a new entry.
pub(crate) fn pack_sections(
    pass: &mut Pass,
    collections: &[Collection],
    layouts: Vec<SectionLayout>,
    order: &[String],
    titles: &mut Vec<SectionTitle>,
    dragged: &FxHashMap<String, Point>,
    options: &LayoutOptions,
) -> Packed {
    let ns = options.node_size;
    let spacer = ns * 3.0;
    let row_gap = ns * 2.0;

    let mut cells: Vec<Cell<'_>> = collections
        .iter()
        .zip(layouts)
        .map(|(collection, section)| Cell {
            collection,
            layout: section.layout,
            settled: section.settled,
        })
        .collect();

    let live: FxHashSet<i32> = cells.iter().map(|c| c.collection.hash_code).collect();
    titles.retain(|t| live.contains(&t.hash_code));
    for cell in &cells {
        let hash_code = cell.collection.hash_code;
        if !titles.iter().any(|t| t.hash_code == hash_code) {
            titles.push(SectionTitle {
                title: cell.collection.details.title.clone(),
                hash_code,
                x: 0.0,
                y: 0.0,
            });
        }
    }

    let mut type_sizes: FxHashMap<&str, usize> = FxHashMap::default();
    for cell in &cells {
        *type_sizes
            .entry(cell.collection.section_type.as_str())
            .or_default() += cell.layout.positions.len();
    }
    let large = options.heuristics.large_section_size;
    cells.sort_by(|a, b| compare_cells(a, b, order, &type_sizes, large));

    let (rows, row_of) = rows_of(&cells, options);
    let widest = rows.iter().map(|r| r.width).fold(0.0, f64::max);

    let mut packed = Packed::default();
    let mut min = (f64::INFINITY, f64::INFINITY);
    let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    let mut row = 0usize;
    let mut cell_in_row = 0usize;
    let mut x = 0.0;
    let mut y = 0.0;
    let mut placement = rows.first().map(|r| RowPlacement::center(r, widest, spacer));

    for (idx, cell) in cells.iter().enumerate() {
        if row_of[idx] > row {
            y += rows[row].height + row_gap;
            row = row_of[idx];
            cell_in_row = 0;
            x = 0.0;
            placement = Some(RowPlacement::center(&rows[row], widest, spacer));
        }
        let Some(place) = placement else {
            break;
        };
        let bbox = cell.layout.bbox;
        let collection = cell.collection;

        let dx = place.base + place.step * cell_in_row as f64;
        let dy = if row == 0 {
            0.0
        } else if collection.kind == CollectionKind::Grid {
            ns * 2.0
        } else {
            (rows[row].height - bbox.h) / 2.0
        };
        let center = Point::new(x + dx + bbox.w / 2.0, y + dy + bbox.h / 2.0);
        let transform = Point::new(x + dx - bbox.x1, y + dy - bbox.y1);

        if let Some(title) = titles
            .iter_mut()
            .find(|t| t.hash_code == collection.hash_code)
        {
            title.x = x + dx - ns / 2.0;
            title.y = y + dy - ns * 2.0;
            min = (min.0.min(title.x), min.1.min(title.y));
            max = (max.0.max(title.x), max.1.max(title.y));
        }

        let mut finals: FxHashMap<&str, (Point, bool)> = FxHashMap::default();
        for &member in &collection.members {
            let Some(layout) = pass.nodes[member].layout.as_mut() else {
                continue;
            };
            let Some(local) = cell.layout.positions.get(&layout.uid) else {
                continue;
            };
            let computed = Point::new(local.x + transform.x, local.y + transform.y);
            min = (min.0.min(computed.x), min.1.min(computed.y));
            max = (max.0.max(computed.x), max.1.max(computed.y));

            layout.center = center;
            match dragged.get(&layout.uid) {
                Some(&at) => {
                    layout.undragged = Some(computed);
                    layout.dragged = Some(at);
                    layout.x = at.x;
                    layout.y = at.y;
                }
                None => {
                    layout.undragged = None;
                    layout.dragged = None;
                    layout.x = computed.x;
                    layout.y = computed.y;
                }
            }
            packed
                .layout_map
                .insert(layout.uid.clone(), collection.hash_code);
            if !cell.settled {
                packed.unsettled.insert(layout.uid.clone());
            }
        }
        for &member in &collection.members {
            if let Some(layout) = pass.nodes[member].layout.as_ref() {
                finals.insert(
                    layout.uid.as_str(),
                    (Point::new(layout.x, layout.y), layout.dragged.is_some()),
                );
            }
        }

        for &li in &collection.edges {
            let link = &pass.links[li];
            let is_loop = link.is_loop();
            let source = finals.get(link.source.as_str()).copied();
            let target = finals.get(link.target.as_str()).copied();
            let to_local = |p: Point| Point::new(p.x - transform.x, p.y - transform.y);

            let path = match (source, target) {
                (Some((s, s_dragged)), Some((t, t_dragged))) if !is_loop && (s_dragged || t_dragged) => {
                    vec![to_local(s), to_local(t)]
                }
                _ => match cell.layout.edge_paths.get(&link.uid) {
                    Some(path) => path.iter().map(|&p| p.into()).collect(),
                    None => [source, target]
                        .into_iter()
                        .flatten()
                        .map(|(p, _)| to_local(p))
                        .take(if is_loop { 1 } else { 2 })
                        .collect(),
                },
            };

            packed.edges.push(PlacedEdge {
                link: Link {
                    uid: link.uid.clone(),
                    ..link.link.clone()
                },
                layout: EdgeLayout {
                    source: link.source.clone(),
                    target: link.target.clone(),
                    is_loop,
                    hidden: options.hidden_links.contains(&link.uid),
                    center,
                    transform,
                    path,
                },
            });
        }

        x += bbox.w + place.gap;
        cell_in_row += 1;
    }

    if min.0.is_finite() && max.0.is_finite() {
        packed.bbox = LayoutBBox {
            x1: min.0,
            y1: min.1,
            width: (max.0 - min.0) * 1.1,
            height: (max.1 - min.1) * 1.1,
        };
    }
    tracing::debug!(
        rows = rows.len(),
        sections = cells.len(),
        width = packed.bbox.width,
        height = packed.bbox.height,
        "packed sections into rows"
    );
    packed.rows = rows;
    packed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SectionDetails;

    fn collection(kind: CollectionKind, hash_code: i32, section_type: &str) -> Collection {
        Collection {
            kind,
            section_type: section_type.to_string(),
            members: Vec::new(),
            edges: Vec::new(),
            hash_code,
            details: SectionDetails {
                clusters: "noclusters".to_string(),
                ..Default::default()
            },
        }
    }

    fn layout(c: &Collection, w: f64, h: f64, nodes: usize) -> CachedLayout {
        CachedLayout {
            bbox: narwhal::Bounds { x1: 0.0, y1: 0.0, w, h },
            positions: (0..nodes)
                .map(|i| (format!("{}-{i}", c.hash_code), narwhal::Point::new(0.0, 0.0)))
                .collect(),
            edge_paths: IndexMap::new(),
        }
    }

    #[test]
    fn rows_never_exceed_the_break_width_unless_one_section_does() {
        let options = LayoutOptions {
            break_width: 1000.0,
            ..Default::default()
        };
        let widths = [400.0, 300.0, 500.0, 1200.0, 200.0, 700.0, 350.0];
        let collections: Vec<Collection> = (0..widths.len())
            .map(|i| collection(CollectionKind::Connected, i as i32, "service"))
            .collect();
        let cells: Vec<Cell<'_>> = collections
            .iter()
            .zip(widths)
            .map(|(c, w)| Cell {
                collection: c,
                layout: layout(c, w, 100.0, 1),
                settled: true,
            })
            .collect();
        let (rows, row_of) = rows_of(&cells, &options);
        assert_eq!(row_of.len(), widths.len());
        for row in &rows {
            assert!(
                row.width <= options.break_width || row.cells == 1,
                "row {row:?} is too wide"
            );
        }
        assert_eq!(rows.iter().map(|r| r.cells).sum::<usize>(), widths.len());
        assert!(rows.iter().all(|r| r.height == 200.0));
    }

    #[test]
    fn a_grid_starts_a_new_row_after_many_sections() {
        let options = LayoutOptions::default();
        let mut collections: Vec<Collection> = (0..6)
            .map(|i| collection(CollectionKind::Connected, i, "service"))
            .collect();
        collections.push(collection(CollectionKind::Grid, 99, "container"));
        let cells: Vec<Cell<'_>> = collections
            .iter()
            .map(|c| Cell {
                collection: c,
                layout: layout(c, 50.0, 50.0, 1),
                settled: true,
            })
            .collect();
        let (rows, row_of) = rows_of(&cells, &options);
        assert_eq!(rows.len(), 2);
        assert_eq!(row_of[5], 0);
        assert_eq!(row_of[6], 1);
    }

    #[test]
    fn sort_puts_grids_last_and_large_sections_first() {
        let order: Vec<String> = ["service", "pod", "container"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let grid = collection(CollectionKind::Grid, 1, "container");
        let small = collection(CollectionKind::Connected, 2, "service");
        let large = collection(CollectionKind::Connected, 3, "pod");
        let mut multi = collection(CollectionKind::Connected, 4, "pod");
        multi.details.is_multi_cluster = true;
        multi.details.clusters = "east/west".to_string();

        let mut cells = vec![
            Cell { collection: &grid, layout: layout(&grid, 10.0, 10.0, 9), settled: true },
            Cell { collection: &small, layout: layout(&small, 10.0, 10.0, 2), settled: true },
            Cell { collection: &large, layout: layout(&large, 10.0, 10.0, 8), settled: true },
            Cell { collection: &multi, layout: layout(&multi, 10.0, 10.0, 2), settled: true },
        ];
        let mut sizes: FxHashMap<&str, usize> = FxHashMap::default();
        for c in &cells {
            *sizes.entry(c.collection.section_type.as_str()).or_default() += c.layout.positions.len();
        }
        cells.sort_by(|a, b| compare_cells(a, b, &order, &sizes, 5));
        let hashes: Vec<i32> = cells.iter().map(|c| c.collection.hash_code).collect();
        assert_eq!(hashes, vec![4, 3, 2, 1]);
    }

    #[test]
    fn two_section_rows_use_a_wider_gap() {
        let row = Row {
            width: 500.0,
            height: 100.0,
            cells: 2,
        };
        let place = RowPlacement::center(&row, 1000.0, 150.0);
        assert_eq!(place.gap, 450.0);
        assert_eq!(place.base, 100.0);

        let tight = RowPlacement::center(&row, 600.0, 150.0);
        assert_eq!(tight.gap, 150.0);
        assert_eq!(tight.base, 50.0);

        let full = RowPlacement::center(&row, 500.0, 150.0);
        assert_eq!(full, RowPlacement { base: 0.0, step: 0.0, gap: 150.0 });
    }
}
