//! Phrase extraction and normalization
//!
//! Pulls word-level tokens ("phrases") from the content frame using the
//! adaptive tolerances, derives the page's average line height, classifies
//! pagination phrases (page-number artifacts near the page bottom), and
//! normalizes each phrase's vertical bounds against the median of its
//! constituent glyphs. Mixed-script words (Latin digits beside CJK glyphs)
//! otherwise report skewed heights.

use std::collections::HashSet;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::access::PageAccess;
use crate::config::LayoutConfig;
use crate::frame::ContentFrame;
use crate::geometry::{mean, median, BBox};
use crate::stats::CharStats;

/// A word-level token with a bounding box. Created once per page during
/// extraction and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    pub bbox: BBox,
    pub text: String,
}

/// Output of the phrase extraction stage.
#[derive(Debug, Clone)]
pub struct PhraseSet {
    /// Phrases in extraction order (top-to-bottom, left-to-right).
    pub phrases: Vec<Phrase>,
    /// Average inter-line gap; falls back to `ave_cs / 2` when no positive
    /// gaps exist.
    pub ave_lh: f32,
    /// Indices of phrases classified as pagination artifacts.
    pub pagination: HashSet<usize>,
    /// Whether the page looks like a table of contents.
    pub toc_page: bool,
}

/// Lines ending in a dot leader followed by a final token, e.g.
/// `Chapter 3 ........ 17`. Used for table-of-contents detection.
static TOC_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.．…·]{2,}\s*(\S+)\s*$").unwrap());

/// Standalone page-number shapes: bare digits with optional dashes,
/// brackets, or "Page"/"第…页" decorations.
static PAGE_NUM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[-–—(\[]*\s*(?:page\s*|p\.?\s*|第\s*)?\d{1,4}\s*(?:页)?\s*[-–—)\]]*$")
        .unwrap()
});

/// Extract, classify, and normalize the page's phrases.
pub fn extract_phrases<A: PageAccess>(
    page: &A,
    frame: &ContentFrame,
    stats: &CharStats,
    config: &LayoutConfig,
) -> PhraseSet {
    let words = match page.extract_words(stats.x_tolerance, stats.y_tolerance) {
        Ok(words) => words,
        Err(e) => {
            warn!("word extraction failed, continuing with empty page: {}", e);
            Vec::new()
        }
    };

    let toc_page = detect_toc_page(&words, config, stats.y_tolerance);

    let mut phrases: Vec<Phrase> = words
        .into_iter()
        .filter(|w| w.bbox.top >= frame.top && w.bbox.bottom <= frame.bottom)
        .map(|w| Phrase {
            bbox: w.bbox,
            text: normalize_text(&w.text),
        })
        .collect();

    // Average line height from successive phrase pairs; only positive gaps
    // count (same-line neighbors produce zero or negative gaps).
    let gaps: Vec<f32> = phrases
        .windows(2)
        .map(|pair| pair[1].bbox.top - pair[0].bbox.bottom)
        .filter(|&g| g > 0.0)
        .collect();
    let ave_lh = mean(&gaps).unwrap_or(stats.ave_cs / 2.0);

    let pagination = find_pagination_phrases(&phrases, page.width(), page.height(), config);

    // Normalize vertical bounds against the median of the glyphs inside each
    // phrase's box. A failed or empty crop keeps the original bounds.
    for phrase in &mut phrases {
        match page.glyphs_within(phrase.bbox) {
            Ok(glyphs) if !glyphs.is_empty() => {
                let tops: Vec<f32> = glyphs.iter().map(|g| g.bbox.top).collect();
                let bottoms: Vec<f32> = glyphs.iter().map(|g| g.bbox.bottom).collect();
                if let (Some(top), Some(bottom)) = (median(&tops), median(&bottoms)) {
                    phrase.bbox.top = top;
                    phrase.bbox.bottom = bottom;
                }
            }
            Ok(_) => {}
            Err(e) => debug!("phrase bound normalization skipped: {}", e),
        }
    }

    debug!(
        "extracted {} phrases ({} pagination), ave_lh {:.2}",
        phrases.len(),
        pagination.len(),
        ave_lh
    );

    PhraseSet {
        phrases,
        ave_lh,
        pagination,
        toc_page,
    }
}

/// Collapse non-breaking spaces and control characters, trim the ends.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\u{a0}' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Classify pagination phrases: page-number-shaped text sitting in the
/// configured bottom band of the page.
fn find_pagination_phrases(
    phrases: &[Phrase],
    page_width: f32,
    page_height: f32,
    config: &LayoutConfig,
) -> HashSet<usize> {
    let top_limit = page_height * config.page_num_top_fraction;
    let left_limit = page_width * config.page_num_left_fraction;
    let right_limit = page_width * config.page_num_right_fraction;

    phrases
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            p.bbox.top >= top_limit
                && p.bbox.center_x() >= left_limit
                && p.bbox.center_x() <= right_limit
                && PAGE_NUM_RE.is_match(p.text.trim())
        })
        .map(|(i, _)| i)
        .collect()
}

/// Detect a table-of-contents page: a configured marker appears in the page
/// text (whitespace stripped) and some line matches the dot-leader pattern
/// with a non-numeric final token. Leaders that survive word extraction as
/// text mean later segmentation must merge entries aggressively.
fn detect_toc_page(words: &[crate::access::Word], config: &LayoutConfig, y_tolerance: f32) -> bool {
    // Rebuild visual lines: successive words share a line while their tops
    // stay within the vertical tolerance.
    let mut lines: Vec<String> = Vec::new();
    let mut last_top = f32::NEG_INFINITY;
    for word in words {
        if (word.bbox.top - last_top).abs() <= y_tolerance && !lines.is_empty() {
            let line = lines.last_mut().unwrap();
            line.push(' ');
            line.push_str(&word.text);
        } else {
            lines.push(word.text.clone());
        }
        last_top = word.bbox.top;
    }

    let stripped: String = lines
        .iter()
        .flat_map(|l| l.chars())
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let has_marker = config
        .toc_markers
        .iter()
        .any(|m| !m.is_empty() && stripped.contains(&m.to_lowercase()));
    if !has_marker {
        return false;
    }

    for line in &lines {
        let compact: String = line.chars().filter(|c| *c != '\u{a0}').collect();
        if let Some(caps) = TOC_LINE_RE.captures(&compact) {
            let token = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            if !token.is_empty() && !token.chars().all(|c| c.is_ascii_digit()) {
                return true;
            }
        }
    }
    false
}
