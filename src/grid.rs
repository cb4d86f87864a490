//! Grid table reconstruction
//!
//! Builds explicit cell grids from horizontal/vertical line sets: snaps
//! near-collinear lines together, finds line intersections, closes minimal
//! rectangles into cells, and groups connected cells into tables. This is
//! the reconstruction routine the table adapter delegates to; it is fallible
//! by contract, and the adapter maps any failure to an empty table list.

use std::collections::{HashMap, HashSet};

use crate::access::{AccessError, Rule, RuleOrientation};
use crate::geometry::BBox;

/// Parameters for grid reconstruction. The caller supplies all three from
/// the page's average character size: glyph size is a natural proxy for
/// acceptable line-gap slack.
#[derive(Debug, Clone, Copy)]
pub struct GridSettings {
    /// Lines shorter than this are discarded before assembly.
    pub edge_min_length: f32,
    /// Lines within this positional distance snap to one grid line; gaps in
    /// their extents up to this size are bridged.
    pub join_tolerance: f32,
    /// Slack when testing whether two lines cross.
    pub intersection_tolerance: f32,
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub bbox: BBox,
}

/// A connected group of cells.
#[derive(Debug, Clone)]
pub struct GridTable {
    pub bbox: BBox,
    /// Cells in row-major order (top-to-bottom, left-to-right).
    pub cells: Vec<Cell>,
}

/// Reconstruct cell grids from cleaned line sets.
pub fn build_tables(
    horizontal: &[Rule],
    vertical: &[Rule],
    settings: &GridSettings,
) -> Result<Vec<GridTable>, AccessError> {
    for rule in horizontal.iter().chain(vertical) {
        if !rule.position.is_finite() || !rule.start.is_finite() || !rule.end.is_finite() {
            return Err(AccessError("non-finite line geometry".into()));
        }
    }
    if !settings.edge_min_length.is_finite() || settings.edge_min_length <= 0.0 {
        return Err(AccessError("invalid grid settings".into()));
    }

    let h = snap_lines(horizontal, RuleOrientation::Horizontal, settings);
    let v = snap_lines(vertical, RuleOrientation::Vertical, settings);
    if h.len() < 2 || v.len() < 2 {
        return Ok(Vec::new());
    }

    // Grid axes: snapped positions, sorted.
    let mut xs: Vec<f32> = v.iter().map(|r| r.position).collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    xs.dedup();
    let mut ys: Vec<f32> = h.iter().map(|r| r.position).collect();
    ys.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    ys.dedup();

    // Intersection points, as (x index, y index).
    let tol = settings.intersection_tolerance;
    let mut points: HashSet<(usize, usize)> = HashSet::new();
    for h_rule in &h {
        for v_rule in &v {
            let x = v_rule.position;
            let y = h_rule.position;
            if x >= h_rule.start - tol
                && x <= h_rule.end + tol
                && y >= v_rule.start - tol
                && y <= v_rule.end + tol
            {
                let xi = index_of(&xs, x);
                let yi = index_of(&ys, y);
                if let (Some(xi), Some(yi)) = (xi, yi) {
                    points.insert((xi, yi));
                }
            }
        }
    }

    // Minimal rectangles: for each corner point, the nearest right and lower
    // neighbors on the grid must exist, along with the opposite corner.
    let mut cells: Vec<(Cell, [(usize, usize); 4])> = Vec::new();
    for &(xi, yi) in &points {
        let right = ((xi + 1)..xs.len()).find(|&x2| points.contains(&(x2, yi)));
        let below = ((yi + 1)..ys.len()).find(|&y2| points.contains(&(xi, y2)));
        if let (Some(x2), Some(y2)) = (right, below) {
            if points.contains(&(x2, y2)) {
                cells.push((
                    Cell {
                        bbox: BBox::new(xs[xi], ys[yi], xs[x2], ys[y2]),
                    },
                    [(xi, yi), (x2, yi), (xi, y2), (x2, y2)],
                ));
            }
        }
    }

    Ok(group_cells(cells))
}

/// Snap near-collinear lines: cluster positions within the join tolerance,
/// then merge extents whose gaps the tolerance bridges. Short fragments are
/// dropped after merging.
fn snap_lines(rules: &[Rule], orientation: RuleOrientation, settings: &GridSettings) -> Vec<Rule> {
    let mut sorted: Vec<Rule> = rules.to_vec();
    sorted.sort_by(|a, b| {
        a.position
            .partial_cmp(&b.position)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Cluster by position.
    let mut clusters: Vec<Vec<Rule>> = Vec::new();
    for rule in sorted {
        match clusters.last_mut() {
            Some(cluster)
                if rule.position - cluster[0].position <= settings.join_tolerance =>
            {
                cluster.push(rule)
            }
            _ => clusters.push(vec![rule]),
        }
    }

    let mut snapped = Vec::new();
    for cluster in clusters {
        let position =
            cluster.iter().map(|r| r.position).sum::<f32>() / cluster.len() as f32;

        // Merge extents within the cluster.
        let mut extents: Vec<(f32, f32)> = cluster.iter().map(|r| (r.start, r.end)).collect();
        extents.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        let mut merged: Vec<(f32, f32)> = Vec::new();
        for (start, end) in extents {
            match merged.last_mut() {
                Some((_, last_end)) if start - *last_end <= settings.join_tolerance => {
                    *last_end = last_end.max(end)
                }
                _ => merged.push((start, end)),
            }
        }

        for (start, end) in merged {
            if end - start >= settings.edge_min_length {
                snapped.push(Rule {
                    orientation,
                    position,
                    start,
                    end,
                });
            }
        }
    }
    snapped
}

fn index_of(axis: &[f32], value: f32) -> Option<usize> {
    axis.iter().position(|&v| v == value)
}

/// Group cells that share corner points into tables.
fn group_cells(cells: Vec<(Cell, [(usize, usize); 4])>) -> Vec<GridTable> {
    if cells.is_empty() {
        return Vec::new();
    }

    let mut parent: Vec<usize> = (0..cells.len()).collect();
    fn find(parent: &mut [usize], i: usize) -> usize {
        if parent[i] != i {
            let root = find(parent, parent[i]);
            parent[i] = root;
        }
        parent[i]
    }

    let mut by_corner: HashMap<(usize, usize), usize> = HashMap::new();
    for (idx, (_, corners)) in cells.iter().enumerate() {
        for corner in corners {
            if let Some(&other) = by_corner.get(corner) {
                let a = find(&mut parent, idx);
                let b = find(&mut parent, other);
                parent[a] = b;
            } else {
                by_corner.insert(*corner, idx);
            }
        }
    }

    let mut groups: HashMap<usize, Vec<Cell>> = HashMap::new();
    for idx in 0..cells.len() {
        let root = find(&mut parent, idx);
        groups.entry(root).or_default().push(cells[idx].0);
    }

    let mut tables: Vec<GridTable> = groups
        .into_values()
        .map(|mut cells| {
            cells.sort_by(|a, b| {
                (a.bbox.top, a.bbox.left)
                    .partial_cmp(&(b.bbox.top, b.bbox.left))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let bbox = cells
                .iter()
                .skip(1)
                .fold(cells[0].bbox, |acc, c| acc.union(&c.bbox));
            GridTable { bbox, cells }
        })
        .collect();

    tables.sort_by(|a, b| {
        a.bbox
            .top
            .partial_cmp(&b.bbox.top)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    tables
}
