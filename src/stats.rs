//! Character statistics analysis
//!
//! Computes the page's average and minimum glyph size, page orientation, and
//! the adaptive tolerances that drive word extraction. Never fails: a page
//! with no qualifying glyphs falls back to the configured default size.

use crate::access::{Glyph, Orientation};
use crate::config::LayoutConfig;
use crate::geometry::mean;

/// Derived per-page character statistics.
#[derive(Debug, Clone, Copy)]
pub struct CharStats {
    /// Average character size over glyphs within the configured bounds.
    pub ave_cs: f32,
    /// Minimum character size over glyphs within the configured bounds.
    pub min_cs: f32,
    pub orientation: Orientation,
    /// Horizontal word-extraction tolerance.
    pub x_tolerance: f32,
    /// Vertical word-extraction tolerance.
    pub y_tolerance: f32,
}

/// Drop overlapping duplicate glyphs: some producers emit the same glyph
/// twice (fake bold, redaction layers). Two glyphs are duplicates when their
/// text matches and both corner offsets are within `overlap_size`.
pub fn remove_duplicate_glyphs(glyphs: &mut Vec<Glyph>, overlap_size: f32) {
    let mut kept: Vec<Glyph> = Vec::with_capacity(glyphs.len());
    for glyph in glyphs.drain(..) {
        let duplicate = kept.iter().any(|k| {
            k.text == glyph.text
                && (k.bbox.left - glyph.bbox.left).abs() <= overlap_size
                && (k.bbox.top - glyph.bbox.top).abs() <= overlap_size
        });
        if !duplicate {
            kept.push(glyph);
        }
    }
    *glyphs = kept;
}

/// Analyze glyph sizes and page shape into [`CharStats`].
pub fn analyze_char_stats(
    glyphs: &[Glyph],
    config: &LayoutConfig,
    page_width: f32,
    page_height: f32,
) -> CharStats {
    let sizes: Vec<f32> = glyphs
        .iter()
        .map(|g| g.size)
        .filter(|&s| s >= config.char_size_lower && s <= config.char_size_upper)
        .collect();

    let ave_cs = mean(&sizes).unwrap_or(config.default_char_size);
    let min_cs = sizes.iter().copied().fold(f32::INFINITY, f32::min);
    let min_cs = if min_cs.is_finite() {
        min_cs
    } else {
        config.default_char_size
    };

    let orientation = if page_width <= page_height {
        Orientation::Portrait
    } else {
        Orientation::Landscape
    };

    let y_default = if ave_cs / 3.0 <= 3.0 { 3.0 } else { ave_cs / 2.0 };
    let y_tolerance = config.y_tolerance.unwrap_or(y_default);
    let x_tolerance = config.x_tolerance.unwrap_or(ave_cs * 1.5);

    CharStats {
        ave_cs,
        min_cs,
        orientation,
        x_tolerance,
        y_tolerance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;

    fn make_glyph(text: &str, left: f32, top: f32, size: f32) -> Glyph {
        Glyph {
            bbox: BBox::new(left, top, left + size * 0.6, top + size),
            size,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_stats_with_glyphs() {
        let glyphs = vec![
            make_glyph("a", 0.0, 0.0, 10.0),
            make_glyph("b", 10.0, 0.0, 14.0),
            // Outside the configured bounds: ignored.
            make_glyph("c", 20.0, 0.0, 100.0),
            make_glyph("d", 30.0, 0.0, 1.0),
        ];
        let stats = analyze_char_stats(&glyphs, &LayoutConfig::default(), 600.0, 800.0);
        assert_eq!(stats.ave_cs, 12.0);
        assert_eq!(stats.min_cs, 10.0);
        assert_eq!(stats.orientation, Orientation::Portrait);
    }

    #[test]
    fn test_stats_fallback_without_glyphs() {
        let stats = analyze_char_stats(&[], &LayoutConfig::default(), 800.0, 600.0);
        assert!(stats.ave_cs > 0.0);
        assert!(stats.min_cs > 0.0);
        assert_eq!(stats.ave_cs, 12.0);
        assert_eq!(stats.orientation, Orientation::Landscape);
    }

    #[test]
    fn test_adaptive_tolerances() {
        // Small glyphs: vertical tolerance stays at the 3-unit default.
        let small = vec![make_glyph("a", 0.0, 0.0, 6.0)];
        let stats = analyze_char_stats(&small, &LayoutConfig::default(), 600.0, 800.0);
        assert_eq!(stats.y_tolerance, 3.0);
        assert_eq!(stats.x_tolerance, 9.0);

        // Large glyphs: vertical tolerance scales to half the average size.
        let large = vec![make_glyph("a", 0.0, 0.0, 20.0)];
        let stats = analyze_char_stats(&large, &LayoutConfig::default(), 600.0, 800.0);
        assert_eq!(stats.y_tolerance, 10.0);
    }

    #[test]
    fn test_tolerance_overrides() {
        let config = LayoutConfig {
            x_tolerance: Some(2.5),
            y_tolerance: Some(1.0),
            ..Default::default()
        };
        let stats = analyze_char_stats(&[], &config, 600.0, 800.0);
        assert_eq!(stats.x_tolerance, 2.5);
        assert_eq!(stats.y_tolerance, 1.0);
    }

    #[test]
    fn test_remove_duplicate_glyphs() {
        let mut glyphs = vec![
            make_glyph("x", 10.0, 10.0, 10.0),
            make_glyph("x", 10.2, 10.1, 10.0),
            make_glyph("x", 30.0, 10.0, 10.0),
        ];
        remove_duplicate_glyphs(&mut glyphs, 0.3);
        assert_eq!(glyphs.len(), 2);
    }
}
