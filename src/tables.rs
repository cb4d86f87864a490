//! Table extraction
//!
//! Adapts the page's cleaned line sets into a grid specification and
//! delegates cell construction to the grid reconstruction routine. All
//! reconstruction failures are caught and yield an empty table list; the
//! resulting tables are sorted by vertical position and their occupied
//! phrases recorded so the paragraph segmenter can exclude them.

use std::collections::HashSet;

use log::{debug, warn};

use crate::geometry::BBox;
use crate::grid::{build_tables, Cell, GridSettings};
use crate::phrases::Phrase;
use crate::rules::LineSets;
use crate::stats::CharStats;

/// A reconstructed table: an ordered set of cells plus the covering box.
#[derive(Debug, Clone)]
pub struct Table {
    /// 1-based index within the page, in vertical order.
    pub tid: usize,
    pub bbox: BBox,
    pub cells: Vec<Cell>,
}

/// Build tables from the cleaned line sets and claim the phrases they cover.
/// Returns the tables (sorted by top coordinate) and the claimed phrase
/// indices.
pub fn extract_tables(
    lines: &LineSets,
    phrases: &[Phrase],
    stats: &CharStats,
) -> (Vec<Table>, HashSet<usize>) {
    // Glyph size is a natural proxy for how much slack broken borders need.
    let settings = GridSettings {
        edge_min_length: stats.ave_cs,
        join_tolerance: stats.ave_cs,
        intersection_tolerance: stats.ave_cs,
    };

    let grids = match build_tables(&lines.horizontal, &lines.vertical, &settings) {
        Ok(grids) => grids,
        Err(e) => {
            warn!("table reconstruction failed, no tables: {}", e);
            Vec::new()
        }
    };

    let tables: Vec<Table> = grids
        .into_iter()
        .enumerate()
        .map(|(i, grid)| Table {
            tid: i + 1,
            bbox: grid.bbox,
            cells: grid.cells,
        })
        .collect();

    let mut claimed = HashSet::new();
    for (idx, phrase) in phrases.iter().enumerate() {
        if tables
            .iter()
            .any(|t| t.bbox.contains_point(phrase.bbox.center_x(), phrase.bbox.center_y()))
        {
            claimed.insert(idx);
        }
    }

    debug!("{} tables, {} phrases claimed", tables.len(), claimed.len());
    (tables, claimed)
}
