//! External page access layer
//!
//! The analyzer never parses PDF byte streams. Raw page primitives (glyphs,
//! vector edges, zero-dimension rules, curves, figure regions) arrive through
//! the [`PageAccess`] trait, implemented over whatever low-level PDF library
//! the caller uses. Every geometry query is fallible: the pipeline treats a
//! failed query as "no data" and keeps going.
//!
//! [`MemPage`] is a self-contained in-memory implementation backed by a glyph
//! list, with word extraction by explicit tolerances. It doubles as the test
//! harness for the whole pipeline.

use crate::geometry::BBox;

/// A failed geometry query on the access layer. Callers inside the pipeline
/// degrade to empty results instead of propagating these.
#[derive(Debug, Clone, thiserror::Error)]
#[error("page geometry query failed: {0}")]
pub struct AccessError(pub String);

/// A single positioned glyph.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub bbox: BBox,
    /// Nominal glyph size (font size in page units).
    pub size: f32,
    pub text: String,
}

/// A word-level token produced by the access layer's extraction.
#[derive(Debug, Clone)]
pub struct Word {
    pub bbox: BBox,
    pub text: String,
}

/// Orientation of a page, derived from its aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Whether a header/footer zone sits at the top or bottom of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneLevel {
    Head,
    Tail,
}

/// A header or footer band detected across sibling pages, supplied
/// externally and filtered by orientation match.
#[derive(Debug, Clone)]
pub struct PageZone {
    pub orientation: Orientation,
    pub level: ZoneLevel,
    pub top: f32,
    pub bottom: f32,
}

/// Axis orientation of a straight line segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOrientation {
    Horizontal,
    Vertical,
}

/// An axis-aligned line segment: a fixed position on one axis and an extent
/// on the other. Horizontal rules have `position` = y and `start..end` = x
/// range; vertical rules the converse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub orientation: RuleOrientation,
    pub position: f32,
    pub start: f32,
    pub end: f32,
}

impl Rule {
    pub fn horizontal(y: f32, x0: f32, x1: f32) -> Self {
        Self {
            orientation: RuleOrientation::Horizontal,
            position: y,
            start: x0,
            end: x1,
        }
    }

    pub fn vertical(x: f32, y0: f32, y1: f32) -> Self {
        Self {
            orientation: RuleOrientation::Vertical,
            position: x,
            start: y0,
            end: y1,
        }
    }
}

/// An explicit line primitive from the page content (dotted-line tables are
/// typically drawn as zero-height or zero-width lines).
#[derive(Debug, Clone, Copy)]
pub struct LineSegment {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl LineSegment {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// A curve primitive, reduced to its bounding box. Thin curves are usable as
/// table borders; anything else is ignored by the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct CurveSegment {
    pub bbox: BBox,
}

/// A raster figure region reported by the page.
#[derive(Debug, Clone)]
pub struct FigureRegion {
    pub bbox: BBox,
    /// Source reference (object name or identifier in the host document).
    pub src: String,
}

/// Narrow interface to the low-level PDF access layer, per page.
///
/// All geometry queries are synchronous and fallible; implementations should
/// return whatever partial data they have rather than panic.
pub trait PageAccess {
    fn width(&self) -> f32;
    fn height(&self) -> f32;

    /// The page's raw glyph set, in extraction order.
    fn glyphs(&self) -> &[Glyph];

    /// Word extraction with explicit horizontal/vertical merge tolerances.
    /// Words come back top-to-bottom, left-to-right; the paragraph segmenter
    /// relies on that order.
    fn extract_words(&self, x_tolerance: f32, y_tolerance: f32) -> Result<Vec<Word>, AccessError>;

    /// Straight edges across the whole page.
    fn edges(&self) -> Result<Vec<Rule>, AccessError>;

    /// Straight edges clipped to a window of the page.
    fn edges_within(&self, bbox: BBox) -> Result<Vec<Rule>, AccessError>;

    /// Explicit line primitives (including zero-dimension lines).
    fn line_primitives(&self) -> Result<Vec<LineSegment>, AccessError>;

    /// Curve primitives.
    fn curves(&self) -> Result<Vec<CurveSegment>, AccessError>;

    /// Raster figure regions.
    fn figures(&self) -> Result<Vec<FigureRegion>, AccessError>;

    /// Glyphs spatially contained in a window of the page.
    fn glyphs_within(&self, bbox: BBox) -> Result<Vec<Glyph>, AccessError>;
}

/// In-memory page: primitives held directly, word extraction done by glyph
/// clustering. Useful for tests and for callers that already have positioned
/// glyphs from another extraction stage.
#[derive(Debug, Clone, Default)]
pub struct MemPage {
    pub width: f32,
    pub height: f32,
    pub glyphs: Vec<Glyph>,
    pub edges: Vec<Rule>,
    pub lines: Vec<LineSegment>,
    pub curves: Vec<CurveSegment>,
    pub figures: Vec<FigureRegion>,
}

impl MemPage {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }
}

impl PageAccess for MemPage {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    fn extract_words(&self, x_tolerance: f32, y_tolerance: f32) -> Result<Vec<Word>, AccessError> {
        Ok(cluster_words(&self.glyphs, x_tolerance, y_tolerance))
    }

    fn edges(&self) -> Result<Vec<Rule>, AccessError> {
        Ok(self.edges.clone())
    }

    fn edges_within(&self, bbox: BBox) -> Result<Vec<Rule>, AccessError> {
        if !bbox.is_finite() || bbox.left > bbox.right || bbox.top > bbox.bottom {
            return Err(AccessError("degenerate clip window".into()));
        }
        let clipped = self
            .edges
            .iter()
            .filter(|r| match r.orientation {
                RuleOrientation::Horizontal => {
                    r.position >= bbox.top
                        && r.position <= bbox.bottom
                        && r.end >= bbox.left
                        && r.start <= bbox.right
                }
                RuleOrientation::Vertical => {
                    r.position >= bbox.left
                        && r.position <= bbox.right
                        && r.end >= bbox.top
                        && r.start <= bbox.bottom
                }
            })
            .copied()
            .collect();
        Ok(clipped)
    }

    fn line_primitives(&self) -> Result<Vec<LineSegment>, AccessError> {
        Ok(self.lines.clone())
    }

    fn curves(&self) -> Result<Vec<CurveSegment>, AccessError> {
        Ok(self.curves.clone())
    }

    fn figures(&self) -> Result<Vec<FigureRegion>, AccessError> {
        Ok(self.figures.clone())
    }

    fn glyphs_within(&self, bbox: BBox) -> Result<Vec<Glyph>, AccessError> {
        if !bbox.is_finite() {
            return Err(AccessError("degenerate clip window".into()));
        }
        Ok(self
            .glyphs
            .iter()
            .filter(|g| bbox.contains(&g.bbox))
            .cloned()
            .collect())
    }
}

/// Cluster glyphs into words: glyphs join the current word while they stay on
/// the same visual line (tops within `y_tolerance`) and the horizontal gap to
/// the previous glyph is within `x_tolerance`. Whitespace glyphs terminate
/// the current word.
fn cluster_words(glyphs: &[Glyph], x_tolerance: f32, y_tolerance: f32) -> Vec<Word> {
    // Sort into reading order: lines by top (within tolerance), then left.
    let mut ordered: Vec<&Glyph> = glyphs.iter().collect();
    ordered.sort_by(|a, b| {
        let dy = a.bbox.top - b.bbox.top;
        if dy.abs() > y_tolerance {
            dy.partial_cmp(&0.0).unwrap_or(std::cmp::Ordering::Equal)
        } else {
            a.bbox
                .left
                .partial_cmp(&b.bbox.left)
                .unwrap_or(std::cmp::Ordering::Equal)
        }
    });

    let mut words: Vec<Word> = Vec::new();
    let mut current: Option<(BBox, String)> = None;

    for glyph in ordered {
        if glyph.text.trim().is_empty() {
            if let Some((bbox, text)) = current.take() {
                words.push(Word { bbox, text });
            }
            continue;
        }

        match current.as_mut() {
            Some((bbox, text))
                if (glyph.bbox.top - bbox.top).abs() <= y_tolerance
                    && glyph.bbox.left - bbox.right <= x_tolerance
                    && glyph.bbox.left >= bbox.left =>
            {
                *bbox = bbox.union(&glyph.bbox);
                text.push_str(&glyph.text);
            }
            _ => {
                if let Some((bbox, text)) = current.take() {
                    words.push(Word { bbox, text });
                }
                current = Some((glyph.bbox, glyph.text.clone()));
            }
        }
    }

    if let Some((bbox, text)) = current {
        words.push(Word { bbox, text });
    }

    words
}
