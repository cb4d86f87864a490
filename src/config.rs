//! Analysis configuration
//!
//! All tunable thresholds for the page analysis pipeline, as named,
//! strongly-typed fields with documented defaults. The shape of the
//! configuration is validated once, when it is attached to a page analyzer,
//! not on every field access.

use crate::LayoutError;

/// Configuration for per-page layout analysis.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Fallback character size when a page has no qualifying glyphs.
    pub default_char_size: f32,
    /// Glyph sizes above this bound are ignored by the statistics pass.
    pub char_size_upper: f32,
    /// Glyph sizes below this bound are ignored by the statistics pass.
    pub char_size_lower: f32,
    /// Override for the horizontal word-extraction tolerance
    /// (default: `ave_cs * 1.5`).
    pub x_tolerance: Option<f32>,
    /// Override for the vertical word-extraction tolerance
    /// (default: 3, or `ave_cs / 2` for large glyphs).
    pub y_tolerance: Option<f32>,
    /// Margin added below header zones when computing the content frame
    /// (default: `ave_cs / 2`).
    pub main_frame_tolerance: Option<f32>,
    /// Positional slack under which two equal glyphs count as duplicates.
    pub char_overlap_size: f32,
    /// Lower bound of the double-line gap window; pairs closer than this are
    /// left alone.
    pub min_double_line_tolerance: f32,
    /// Upper bound of the double-line gap window; pairs within the window
    /// collapse to a single line.
    pub max_double_line_tolerance: f32,
    /// Include zero-dimension line primitives (dotted table borders).
    pub dotted_line_flag: bool,
    /// Include straight-line approximations of thin curves (curved borders).
    pub curved_line_flag: bool,
    /// Merged figure regions with width or height at or below this are
    /// dropped.
    pub min_image_size: f32,
    /// Pagination zone: a phrase must sit at or below
    /// `height * page_num_top_fraction`.
    pub page_num_top_fraction: f32,
    /// Pagination zone: left bound of the horizontal band, as a fraction of
    /// page width.
    pub page_num_left_fraction: f32,
    /// Pagination zone: right bound of the horizontal band, as a fraction of
    /// page width.
    pub page_num_right_fraction: f32,
    /// Run table line analysis and extraction.
    pub table_flag: bool,
    /// Run figure merging and image extraction.
    pub image_flag: bool,
    /// Run paragraph border analysis and segmentation.
    pub paragraph_flag: bool,
    /// Markers whose presence in the page text enables table-of-contents
    /// detection. Matched with whitespace stripped, ASCII case-insensitive.
    pub toc_markers: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_char_size: 12.0,
            char_size_upper: 30.0,
            char_size_lower: 3.0,
            x_tolerance: None,
            y_tolerance: None,
            main_frame_tolerance: None,
            char_overlap_size: 0.3,
            min_double_line_tolerance: 0.05,
            max_double_line_tolerance: 2.0,
            dotted_line_flag: true,
            curved_line_flag: true,
            min_image_size: 80.0,
            page_num_top_fraction: 0.8,
            page_num_left_fraction: 0.25,
            page_num_right_fraction: 0.75,
            table_flag: true,
            image_flag: true,
            paragraph_flag: true,
            toc_markers: vec!["目录".to_string(), "contents".to_string()],
        }
    }
}

impl LayoutConfig {
    /// Validate configuration shape. Called once when the configuration is
    /// attached to a page; a failure here is caller misuse, never document
    /// data.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !self.default_char_size.is_finite() || self.default_char_size <= 0.0 {
            return Err(LayoutError::InvalidConfig(
                "default_char_size must be positive".into(),
            ));
        }
        if self.char_size_lower <= 0.0 || self.char_size_lower >= self.char_size_upper {
            return Err(LayoutError::InvalidConfig(
                "char size bounds must satisfy 0 < lower < upper".into(),
            ));
        }
        if self.min_double_line_tolerance < 0.0
            || self.min_double_line_tolerance >= self.max_double_line_tolerance
        {
            return Err(LayoutError::InvalidConfig(
                "double-line tolerances must satisfy 0 <= min < max".into(),
            ));
        }
        if self.min_image_size < 0.0 {
            return Err(LayoutError::InvalidConfig(
                "min_image_size must be non-negative".into(),
            ));
        }
        for (name, value) in [
            ("page_num_top_fraction", self.page_num_top_fraction),
            ("page_num_left_fraction", self.page_num_left_fraction),
            ("page_num_right_fraction", self.page_num_right_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(LayoutError::InvalidConfig(format!(
                    "{} must lie in [0, 1]",
                    name
                )));
            }
        }
        if self.page_num_left_fraction >= self.page_num_right_fraction {
            return Err(LayoutError::InvalidConfig(
                "pagination band must satisfy left_fraction < right_fraction".into(),
            ));
        }
        for (name, value) in [
            ("x_tolerance", self.x_tolerance),
            ("y_tolerance", self.y_tolerance),
            ("main_frame_tolerance", self.main_frame_tolerance),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(LayoutError::InvalidConfig(format!(
                        "{} override must be non-negative",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}
