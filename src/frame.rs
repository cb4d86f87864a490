//! Content frame detection
//!
//! Finds the vertical band of the page that holds body content, excluding
//! header and footer zones detected across sibling pages.

use log::warn;

use crate::access::{Orientation, PageZone, ZoneLevel};
use crate::config::LayoutConfig;
use crate::stats::CharStats;

/// The vertical band of the page within which body content is analyzed.
/// `top <= bottom` always holds.
#[derive(Debug, Clone, Copy)]
pub struct ContentFrame {
    pub top: f32,
    pub bottom: f32,
}

/// Compute the content frame from header/footer zones matching the page's
/// orientation. Header zones push the frame top down (plus a margin); footer
/// zones pull the frame bottom up. A degenerate result falls back to the full
/// page height.
pub fn detect_frame(
    zones: &[PageZone],
    stats: &CharStats,
    config: &LayoutConfig,
    page_height: f32,
) -> ContentFrame {
    let margin = config.main_frame_tolerance.unwrap_or(stats.ave_cs / 2.0);

    let top = zones
        .iter()
        .filter(|z| z.orientation == stats.orientation && z.level == ZoneLevel::Head)
        .map(|z| z.bottom + margin)
        .fold(f32::NEG_INFINITY, f32::max);
    let top = if top.is_finite() { top } else { 0.0 };

    let bottom = zones
        .iter()
        .filter(|z| z.orientation == stats.orientation && z.level == ZoneLevel::Tail)
        .map(|z| z.top)
        .fold(f32::INFINITY, f32::min);
    let bottom = if bottom.is_finite() { bottom } else { page_height };

    if top > bottom {
        warn!(
            "degenerate header/footer zones (top {} > bottom {}), using full page",
            top, bottom
        );
        return ContentFrame {
            top: 0.0,
            bottom: page_height,
        };
    }

    ContentFrame { top, bottom }
}

/// Whether a vertical span lies inside any zone matching the orientation.
/// Used to claim phrases that sit in header/footer bands.
pub fn in_zone(zones: &[PageZone], orientation: Orientation, top: f32, bottom: f32) -> bool {
    zones
        .iter()
        .filter(|z| z.orientation == orientation)
        .any(|z| top >= z.top && bottom <= z.bottom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::analyze_char_stats;

    fn portrait_stats() -> CharStats {
        analyze_char_stats(&[], &LayoutConfig::default(), 600.0, 800.0)
    }

    fn make_zone(level: ZoneLevel, top: f32, bottom: f32) -> PageZone {
        PageZone {
            orientation: Orientation::Portrait,
            level,
            top,
            bottom,
        }
    }

    #[test]
    fn test_frame_without_zones() {
        let frame = detect_frame(&[], &portrait_stats(), &LayoutConfig::default(), 800.0);
        assert_eq!(frame.top, 0.0);
        assert_eq!(frame.bottom, 800.0);
    }

    #[test]
    fn test_frame_with_head_and_tail() {
        let zones = vec![
            make_zone(ZoneLevel::Head, 10.0, 40.0),
            make_zone(ZoneLevel::Tail, 760.0, 790.0),
        ];
        let config = LayoutConfig {
            main_frame_tolerance: Some(5.0),
            ..Default::default()
        };
        let frame = detect_frame(&zones, &portrait_stats(), &config, 800.0);
        assert_eq!(frame.top, 45.0);
        assert_eq!(frame.bottom, 760.0);
        assert!(frame.top <= frame.bottom);
    }

    #[test]
    fn test_frame_default_margin_is_half_char_size() {
        let zones = vec![make_zone(ZoneLevel::Head, 10.0, 40.0)];
        // default_char_size 12 -> margin 6
        let frame = detect_frame(&zones, &portrait_stats(), &LayoutConfig::default(), 800.0);
        assert_eq!(frame.top, 46.0);
    }

    #[test]
    fn test_frame_ignores_other_orientation() {
        let zones = vec![PageZone {
            orientation: Orientation::Landscape,
            level: ZoneLevel::Head,
            top: 10.0,
            bottom: 40.0,
        }];
        let frame = detect_frame(&zones, &portrait_stats(), &LayoutConfig::default(), 800.0);
        assert_eq!(frame.top, 0.0);
    }

    #[test]
    fn test_degenerate_zones_fall_back_to_full_page() {
        let zones = vec![
            make_zone(ZoneLevel::Head, 500.0, 700.0),
            make_zone(ZoneLevel::Tail, 100.0, 200.0),
        ];
        let frame = detect_frame(&zones, &portrait_stats(), &LayoutConfig::default(), 800.0);
        assert!(frame.top <= frame.bottom);
        assert_eq!(frame.top, 0.0);
        assert_eq!(frame.bottom, 800.0);
    }
}
