//! Paragraph segmentation
//!
//! Walks the page's phrases in reading order and groups the ones no table,
//! image, header/footer zone, or pagination detector has claimed into
//! paragraphs. A phrase opens a new paragraph when the vertical gap to the
//! carried position says so and the left-border alignment rules fail to
//! demote it back to a continuation line; far-offset same-line phrases
//! become spans instead of lines. Each paragraph gets a style from its
//! opening line, and the page as a whole gets cross-page continuation flags
//! so a consumer can stitch paragraphs across page breaks.

use std::collections::HashSet;

use log::debug;

use crate::geometry::BBox;
use crate::phrases::Phrase;
use crate::stats::CharStats;

/// A full line of paragraph text.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub bbox: BBox,
    pub text: String,
}

/// A same-line continuation set off by a large horizontal offset, e.g. the
/// value column of a label/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub bbox: BBox,
    pub text: String,
    /// Offset from the paragraph's left edge.
    pub margin_left: f32,
}

/// One entry of a paragraph, in reading order.
#[derive(Debug, Clone, PartialEq)]
pub enum ParaEntry {
    Text(Text),
    Span(Span),
}

impl ParaEntry {
    pub fn bbox(&self) -> BBox {
        match self {
            ParaEntry::Text(t) => t.bbox,
            ParaEntry::Span(s) => s.bbox,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ParaEntry::Text(t) => &t.text,
            ParaEntry::Span(s) => &s.text,
        }
    }
}

/// Style derived from a paragraph's opening line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParaStyle {
    /// Set when the line's character size deviates from the page average by
    /// 30% or more.
    pub font_size: Option<f32>,
    /// The line is horizontally centered and well short of the right border.
    pub center: bool,
    /// Left indent from the paragraph border, for deeply indented openings.
    pub margin_left: Option<f32>,
}

impl ParaStyle {
    pub fn is_empty(&self) -> bool {
        self.font_size.is_none() && !self.center && self.margin_left.is_none()
    }
}

/// An ordered paragraph of text entries.
#[derive(Debug, Clone)]
pub struct Paragraph {
    /// 1-based index within the page.
    pub para_idx: usize,
    pub entries: Vec<ParaEntry>,
    pub style: ParaStyle,
    pub bbox: BBox,
}

/// The result of segmenting one page.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    pub paragraphs: Vec<Paragraph>,
    /// False when the page's first paragraph looks like the continuation of
    /// the previous page's last one. None when the page has no paragraphs.
    pub new_para_start_flag: Option<bool>,
    /// False when the page's last paragraph runs to the right border and so
    /// likely continues on the next page.
    pub new_para_end_flag: Option<bool>,
    /// Indices of the phrases consumed into paragraphs.
    pub consumed: Vec<usize>,
}

/// The region paragraph text lives in: the tight bounding box of the
/// unclaimed phrases, or the whole page when nothing remains.
pub fn paragraph_border(
    phrases: &[Phrase],
    excluded: &HashSet<usize>,
    page_width: f32,
    page_height: f32,
) -> BBox {
    let mut border: Option<BBox> = None;
    for (idx, phrase) in phrases.iter().enumerate() {
        if excluded.contains(&idx) {
            continue;
        }
        border = Some(match border {
            Some(b) => b.union(&phrase.bbox),
            None => phrase.bbox,
        });
    }
    border.unwrap_or_else(|| BBox::new(0.0, 0.0, page_width, page_height))
}

/// Group unclaimed phrases into paragraphs.
///
/// `border` is the text region, `ave_lh` the page's average line spacing.
/// On a table-of-contents page every vertically separated line is its own
/// paragraph.
pub fn segment_paragraphs(
    phrases: &[Phrase],
    excluded: &HashSet<usize>,
    border: BBox,
    stats: &CharStats,
    ave_lh: f32,
    page_width: f32,
    toc_page: bool,
) -> Segmentation {
    let (ll, tt, lr) = (border.left, border.top, border.right);
    let ave_cs = stats.ave_cs;

    let mut out = Segmentation::default();
    let mut entries: Vec<ParaEntry> = Vec::new();
    let mut style = ParaStyle::default();

    // Carried position of the previously processed phrase.
    let mut p_left = ll;
    let mut p_top = tt;
    let mut p_right = ll;
    let mut p_bottom = tt;
    let mut prev_height = 0.0f32;

    let mut first = true;
    // Raw character size and left edge of the first phrase, for the
    // cross-page continuation flags.
    let mut first_ave_ts = ave_cs;
    let mut first_left = ll;

    for (idx, phrase) in phrases.iter().enumerate() {
        if excluded.contains(&idx) {
            continue;
        }
        let b = phrase.bbox;
        let char_count = phrase.text.chars().count().max(1) as f32;
        let raw_ts = b.width() / char_count;
        let ave_ts = raw_ts.max(ave_cs);
        let ave_th = b.height().max(ave_cs);

        let mut new_para = false;
        let mut new_line = true;
        let mut center_flag = false;
        let mut div_flag = false;

        if first {
            first = false;
            new_para = true;
            first_ave_ts = if phrase.text.is_empty() { ave_cs } else { raw_ts };
            first_left = b.left;
            center_flag = (page_width - b.right - b.left).abs() <= ave_ts / 2.0
                && (lr - b.right).abs() >= 4.0 * ave_ts;
            div_flag = b.left > ll + ave_ts * 4.0;
        } else if toc_page {
            // Every separated line of a contents page is its own entry.
            if b.bottom >= p_bottom + ave_th / 4.0 {
                new_para = true;
            } else {
                new_line = false;
            }
        } else if b.bottom - p_bottom >= ave_th / 4.0 {
            new_para = true;
            // Demote back to a continuation line when the gap is a normal
            // line advance and the left edges line up with a full previous
            // line.
            let line_gap_ok = b.top - p_bottom <= (ave_th * 1.2).max(ave_lh);
            let flush_left = (b.left - ll).abs() <= ave_ts
                && p_right > lr - ave_ts * 1.5
                && (b.height() - prev_height).abs() <= 1.0;
            let exact_left = (b.left - ll).abs() <= 1.0 && p_right >= lr - ave_ts * 1.5;
            if line_gap_ok && (flush_left || exact_left) {
                new_para = false;
            }
            if new_para {
                center_flag = (page_width - b.right - b.left).abs() <= ave_ts / 2.0
                    && (lr - b.right).abs() >= 4.0 * ave_ts;
                div_flag = b.left > ll + ave_ts * 4.0;
            }
        } else if (b.left - p_right).abs() >= ave_ts * 2.0
            && (b.top - p_top).abs() <= ave_ts / 2.0
        {
            new_line = false;
        }

        if new_para && !entries.is_empty() {
            out.paragraphs.push(close_paragraph(
                out.paragraphs.len() + 1,
                std::mem::take(&mut entries),
                std::mem::take(&mut style),
            ));
        }

        // The first line that produces any style fixes it for the paragraph.
        // Center and indent can only come from a paragraph-opening line.
        if style.is_empty() {
            if ave_cs > 0.0 && (ave_ts - ave_cs).abs() / ave_cs >= 0.3 {
                style.font_size = Some(ave_ts);
            }
            if center_flag {
                style.center = true;
            } else if div_flag {
                style.margin_left = Some(b.left - ll);
            }
        }

        if new_line {
            entries.push(ParaEntry::Text(Text {
                bbox: b,
                text: phrase.text.clone(),
            }));
        } else {
            entries.push(ParaEntry::Span(Span {
                bbox: b,
                text: phrase.text.clone(),
                margin_left: b.left - p_left,
            }));
        }

        p_left = b.left;
        p_top = b.top;
        p_right = b.right;
        p_bottom = b.bottom;
        prev_height = b.height();
        out.consumed.push(idx);
    }

    if !entries.is_empty() {
        out.paragraphs.push(close_paragraph(
            out.paragraphs.len() + 1,
            entries,
            style,
        ));
    }

    if !out.paragraphs.is_empty() {
        let first_tol = first_ave_ts.max(ave_cs);
        out.new_para_start_flag = Some(first_left - ll > first_tol);
        out.new_para_end_flag = Some((p_right - lr).abs() > first_tol * 1.5);
    }

    debug!(
        "{} paragraphs, start flag {:?}, end flag {:?}",
        out.paragraphs.len(),
        out.new_para_start_flag,
        out.new_para_end_flag
    );
    out
}

fn close_paragraph(para_idx: usize, entries: Vec<ParaEntry>, style: ParaStyle) -> Paragraph {
    let bbox = entries
        .iter()
        .skip(1)
        .fold(entries[0].bbox(), |acc, e| acc.union(&e.bbox()));
    Paragraph {
        para_idx,
        entries,
        style,
        bbox,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::stats::analyze_char_stats;

    fn stats() -> CharStats {
        // Empty glyph set falls back to the default character size (12).
        analyze_char_stats(&[], &LayoutConfig::default(), 600.0, 800.0)
    }

    fn phrase(left: f32, top: f32, right: f32, bottom: f32, text: &str) -> Phrase {
        Phrase {
            bbox: BBox::new(left, top, right, bottom),
            text: text.into(),
        }
    }

    fn segment(phrases: &[Phrase], toc: bool) -> Segmentation {
        let excluded = HashSet::new();
        let border = paragraph_border(phrases, &excluded, 600.0, 800.0);
        segment_paragraphs(phrases, &excluded, border, &stats(), 12.0, 600.0, toc)
    }

    #[test]
    fn test_consecutive_lines_merge() {
        let phrases = vec![
            phrase(50.0, 100.0, 200.0, 112.0, "first line of text"),
            phrase(50.0, 126.0, 200.0, 138.0, "second line of it"),
        ];
        let seg = segment(&phrases, false);
        assert_eq!(seg.paragraphs.len(), 1);
        assert_eq!(seg.paragraphs[0].entries.len(), 2);
        assert!(matches!(seg.paragraphs[0].entries[1], ParaEntry::Text(_)));
        assert_eq!(seg.paragraphs[0].bbox, BBox::new(50.0, 100.0, 200.0, 138.0));
    }

    #[test]
    fn test_large_gap_splits_paragraphs() {
        let phrases = vec![
            phrase(50.0, 100.0, 200.0, 112.0, "first line of text"),
            phrase(50.0, 160.0, 200.0, 172.0, "a new paragraph"),
        ];
        let seg = segment(&phrases, false);
        assert_eq!(seg.paragraphs.len(), 2);
        assert_eq!(seg.paragraphs[0].para_idx, 1);
        assert_eq!(seg.paragraphs[1].para_idx, 2);
    }

    #[test]
    fn test_far_offset_same_line_becomes_span() {
        let phrases = vec![
            phrase(50.0, 100.0, 200.0, 112.0, "label text here"),
            phrase(350.0, 101.0, 420.0, 112.0, "value"),
        ];
        let seg = segment(&phrases, false);
        assert_eq!(seg.paragraphs.len(), 1);
        assert_eq!(seg.paragraphs[0].entries.len(), 2);
        match &seg.paragraphs[0].entries[1] {
            ParaEntry::Span(span) => assert_eq!(span.margin_left, 300.0),
            other => panic!("expected span, got {:?}", other),
        }
    }

    #[test]
    fn test_toc_page_keeps_lines_separate() {
        // Under normal rules these two lines would merge.
        let phrases = vec![
            phrase(50.0, 100.0, 200.0, 112.0, "Chapter one....5"),
            phrase(50.0, 120.0, 200.0, 132.0, "Chapter two....9"),
        ];
        assert_eq!(segment(&phrases, false).paragraphs.len(), 1);
        assert_eq!(segment(&phrases, true).paragraphs.len(), 2);
    }

    #[test]
    fn test_centered_heading_style() {
        let phrases = vec![
            phrase(50.0, 100.0, 550.0, 112.0, "a very wide line of ordinary body text"),
            phrase(250.0, 160.0, 350.0, 172.0, "Heading"),
        ];
        let seg = segment(&phrases, false);
        assert_eq!(seg.paragraphs.len(), 2);
        assert!(seg.paragraphs[1].style.center);
        assert!(!seg.paragraphs[0].style.center);
    }

    #[test]
    fn test_indented_opening_gets_margin() {
        let phrases = vec![
            phrase(50.0, 100.0, 550.0, 112.0, "a very wide line of ordinary body text"),
            phrase(150.0, 160.0, 550.0, 172.0, "deeply indented paragraph opening line"),
        ];
        let seg = segment(&phrases, false);
        assert_eq!(seg.paragraphs.len(), 2);
        assert_eq!(seg.paragraphs[1].style.margin_left, Some(100.0));
    }

    #[test]
    fn test_oversized_text_records_font_size() {
        // 200 units over 5 chars: 40 per char vs the page average of 12.
        let phrases = vec![phrase(50.0, 100.0, 250.0, 140.0, "TITLE")];
        let seg = segment(&phrases, false);
        assert_eq!(seg.paragraphs.len(), 1);
        assert_eq!(seg.paragraphs[0].style.font_size, Some(40.0));
    }

    #[test]
    fn test_continuation_flags() {
        // First line starts flush with the border: the page likely continues
        // the previous one. Last line stops well short of the right border:
        // the final paragraph ends here.
        let phrases = vec![
            phrase(50.0, 100.0, 550.0, 112.0, "body text that fills the whole line width"),
            phrase(50.0, 126.0, 200.0, 138.0, "short last line"),
        ];
        let seg = segment(&phrases, false);
        assert_eq!(seg.new_para_start_flag, Some(false));
        assert_eq!(seg.new_para_end_flag, Some(true));
    }

    #[test]
    fn test_no_paragraphs_leaves_flags_unset() {
        let seg = segment(&[], false);
        assert!(seg.paragraphs.is_empty());
        assert_eq!(seg.new_para_start_flag, None);
        assert_eq!(seg.new_para_end_flag, None);
    }

    #[test]
    fn test_excluded_phrases_skipped() {
        let phrases = vec![
            phrase(50.0, 100.0, 200.0, 112.0, "kept line of text"),
            phrase(50.0, 126.0, 200.0, 138.0, "claimed by a table"),
        ];
        let excluded: HashSet<usize> = [1].into_iter().collect();
        let border = paragraph_border(&phrases, &excluded, 600.0, 800.0);
        assert_eq!(border, BBox::new(50.0, 100.0, 200.0, 112.0));
        let seg = segment_paragraphs(&phrases, &excluded, border, &stats(), 12.0, 600.0, false);
        assert_eq!(seg.paragraphs.len(), 1);
        assert_eq!(seg.consumed, vec![0]);
    }

    #[test]
    fn test_border_falls_back_to_full_page() {
        let border = paragraph_border(&[], &HashSet::new(), 600.0, 800.0);
        assert_eq!(border, BBox::new(0.0, 0.0, 600.0, 800.0));
    }
}
