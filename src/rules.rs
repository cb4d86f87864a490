//! Table line sourcing and cleanup
//!
//! Gathers straight edges from the page interior, splits them into
//! horizontal/vertical sets, collapses "double lines" (borders drawn as two
//! hairlines), and optionally augments with zero-dimension line primitives
//! (dotted borders) and flattened thin curves (curved borders). Any
//! extraction failure yields empty line sets; this stage is never fatal.

use log::{debug, warn};

use crate::access::{CurveSegment, LineSegment, PageAccess, Rule, RuleOrientation};
use crate::config::LayoutConfig;
use crate::geometry::BBox;

/// Cleaned horizontal and vertical line sets, ready for grid assembly.
#[derive(Debug, Clone, Default)]
pub struct LineSets {
    pub horizontal: Vec<Rule>,
    pub vertical: Vec<Rule>,
}

/// Gather and clean the page's table candidate lines.
pub fn gather_lines<A: PageAccess>(page: &A, config: &LayoutConfig) -> LineSets {
    // Inset by one unit on each side to avoid page-border artifacts; fall
    // back to the unshrunk edge set if the windowed query fails.
    let interior = BBox::new(1.0, 1.0, page.width() - 1.0, page.height() - 1.0);
    let edges = match page.edges_within(interior) {
        Ok(edges) => edges,
        Err(e) => {
            warn!("interior edge query failed ({}), using full edge set", e);
            match page.edges() {
                Ok(edges) => edges,
                Err(e) => {
                    warn!("edge extraction failed ({}), no table lines", e);
                    return LineSets::default();
                }
            }
        }
    };

    let mut horizontal: Vec<Rule> = Vec::new();
    let mut vertical: Vec<Rule> = Vec::new();
    for edge in edges {
        match edge.orientation {
            RuleOrientation::Horizontal => horizontal.push(edge),
            RuleOrientation::Vertical => vertical.push(edge),
        }
    }

    let horizontal = collapse_double_lines(
        horizontal,
        config.min_double_line_tolerance,
        config.max_double_line_tolerance,
    );
    let vertical = collapse_double_lines(
        vertical,
        config.min_double_line_tolerance,
        config.max_double_line_tolerance,
    );

    let mut sets = LineSets {
        horizontal,
        vertical,
    };

    // Dotted-line tables hide in explicit line primitives with a collapsed
    // dimension.
    if config.dotted_line_flag {
        match page.line_primitives() {
            Ok(lines) => add_zero_dimension_lines(&mut sets, &lines),
            Err(e) => debug!("line primitive query failed, skipping dotted lines: {}", e),
        }
    }

    // Curved borders flatten to straight rules when the curve is thin.
    if config.curved_line_flag {
        match page.curves() {
            Ok(curves) => add_flattened_curves(&mut sets, &curves),
            Err(e) => debug!("curve query failed, skipping curved lines: {}", e),
        }
    }

    debug!(
        "table lines: {} horizontal, {} vertical",
        sets.horizontal.len(),
        sets.vertical.len()
    );
    sets
}

/// Collapse pairs of near-parallel same-orientation lines into one.
///
/// Two lines form a "double line" when their positional gap lies in
/// `(min_tolerance, max_tolerance]` and their extents overlap; the earlier
/// line (sorted by position) represents the pair. Gaps at or below the
/// minimum are left alone so distinct grid lines are never merged away.
pub fn collapse_double_lines(mut lines: Vec<Rule>, min_tolerance: f32, max_tolerance: f32) -> Vec<Rule> {
    lines.sort_by(|a, b| {
        a.position
            .partial_cmp(&b.position)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Rule> = Vec::with_capacity(lines.len());
    for line in lines {
        let is_double = kept.last().is_some_and(|prev| {
            let gap = line.position - prev.position;
            gap > min_tolerance
                && gap <= max_tolerance
                && line.start <= prev.end
                && prev.start <= line.end
        });
        if !is_double {
            kept.push(line);
        }
    }
    kept
}

/// Zero-height lines become horizontal rules, zero-width lines vertical
/// rules.
fn add_zero_dimension_lines(sets: &mut LineSets, lines: &[LineSegment]) {
    for line in lines {
        if line.height() == 0.0 && line.width() > 0.0 {
            sets.horizontal.push(Rule::horizontal(line.top, line.x0, line.x1));
        } else if line.width() == 0.0 && line.height() > 0.0 {
            sets.vertical.push(Rule::vertical(line.x0, line.top, line.bottom));
        }
    }
}

/// Flatten thin curves to straight rules at their midline. A curve counts as
/// thin when its bounding box is under 2 units in one dimension; fat or
/// closed curves are not border material and are ignored.
fn add_flattened_curves(sets: &mut LineSets, curves: &[CurveSegment]) {
    const THIN: f32 = 2.0;
    for curve in curves {
        let b = curve.bbox;
        if !b.is_finite() {
            continue;
        }
        if b.height() < THIN && b.width() >= THIN {
            sets.horizontal.push(Rule::horizontal(b.center_y(), b.left, b.right));
        } else if b.width() < THIN && b.height() >= THIN {
            sets.vertical.push(Rule::vertical(b.center_x(), b.top, b.bottom));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::MemPage;

    #[test]
    fn test_double_line_collapse_close_pair() {
        let lines = vec![
            Rule::horizontal(100.0, 50.0, 500.0),
            Rule::horizontal(100.5, 50.0, 500.0),
        ];
        let cleaned = collapse_double_lines(lines, 0.05, 2.0);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].position, 100.0);
    }

    #[test]
    fn test_double_line_far_pair_kept() {
        let lines = vec![
            Rule::horizontal(100.0, 50.0, 500.0),
            Rule::horizontal(150.0, 50.0, 500.0),
        ];
        let cleaned = collapse_double_lines(lines, 0.05, 2.0);
        assert_eq!(cleaned.len(), 2);
    }

    #[test]
    fn test_double_line_below_minimum_kept() {
        // Gaps at or below the minimum are not doubles.
        let lines = vec![
            Rule::horizontal(100.0, 50.0, 500.0),
            Rule::horizontal(100.04, 50.0, 500.0),
        ];
        let cleaned = collapse_double_lines(lines, 0.05, 2.0);
        assert_eq!(cleaned.len(), 2);
    }

    #[test]
    fn test_double_line_requires_extent_overlap() {
        let lines = vec![
            Rule::horizontal(100.0, 50.0, 200.0),
            Rule::horizontal(100.5, 300.0, 500.0),
        ];
        let cleaned = collapse_double_lines(lines, 0.05, 2.0);
        assert_eq!(cleaned.len(), 2);
    }

    #[test]
    fn test_gather_excludes_page_border_artifacts() {
        let mut page = MemPage::new(600.0, 800.0);
        page.edges = vec![
            // Hairline on the page border.
            Rule::horizontal(0.2, 0.0, 600.0),
            Rule::horizontal(400.0, 100.0, 500.0),
            Rule::vertical(100.0, 380.0, 450.0),
        ];
        let sets = gather_lines(&page, &LayoutConfig::default());
        assert_eq!(sets.horizontal.len(), 1);
        assert_eq!(sets.horizontal[0].position, 400.0);
        assert_eq!(sets.vertical.len(), 1);
    }

    #[test]
    fn test_dotted_lines_included_when_enabled() {
        let mut page = MemPage::new(600.0, 800.0);
        page.lines = vec![
            LineSegment {
                x0: 100.0,
                top: 300.0,
                x1: 500.0,
                bottom: 300.0,
            },
            LineSegment {
                x0: 100.0,
                top: 300.0,
                x1: 100.0,
                bottom: 400.0,
            },
        ];
        let sets = gather_lines(&page, &LayoutConfig::default());
        assert_eq!(sets.horizontal.len(), 1);
        assert_eq!(sets.vertical.len(), 1);

        let config = LayoutConfig {
            dotted_line_flag: false,
            ..Default::default()
        };
        let sets = gather_lines(&page, &config);
        assert!(sets.horizontal.is_empty());
        assert!(sets.vertical.is_empty());
    }

    #[test]
    fn test_thin_curves_flattened() {
        let mut page = MemPage::new(600.0, 800.0);
        page.curves = vec![
            // Thin and wide: a curved horizontal border.
            CurveSegment {
                bbox: BBox::new(100.0, 299.5, 500.0, 300.5),
            },
            // Fat: ignored.
            CurveSegment {
                bbox: BBox::new(100.0, 100.0, 200.0, 200.0),
            },
        ];
        let sets = gather_lines(&page, &LayoutConfig::default());
        assert_eq!(sets.horizontal.len(), 1);
        assert!((sets.horizontal[0].position - 300.0).abs() < 0.01);
        assert!(sets.vertical.is_empty());
    }
}
