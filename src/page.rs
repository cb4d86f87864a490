//! Page analysis orchestration
//!
//! Ties the pipeline stages together: glyph statistics, content frame,
//! phrase extraction, table and image detection, and paragraph segmentation.
//! Results are computed lazily and cached per page; changing the
//! configuration or page identity invalidates the cache. A batch helper runs
//! many pages in parallel.

use std::collections::HashSet;

use log::debug;
use rayon::prelude::*;

use crate::access::{PageAccess, PageZone};
use crate::config::LayoutConfig;
use crate::figures::{extract_images, Image};
use crate::frame::{detect_frame, in_zone, ContentFrame};
use crate::geometry::BBox;
use crate::paragraphs::{paragraph_border, segment_paragraphs, Paragraph};
use crate::phrases::{extract_phrases, Phrase};
use crate::rules::gather_lines;
use crate::stats::{analyze_char_stats, remove_duplicate_glyphs, CharStats};
use crate::tables::{extract_tables, Table};
use crate::LayoutError;

/// Phrase indices claimed by each non-paragraph consumer. A phrase in any of
/// these sets never contributes to a paragraph.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSets {
    pub header_footer: HashSet<usize>,
    pub table: HashSet<usize>,
    pub image: HashSet<usize>,
    pub pagination: HashSet<usize>,
}

impl ExclusionSets {
    /// The union of all claimed indices.
    pub fn all(&self) -> HashSet<usize> {
        let mut all = self.header_footer.clone();
        all.extend(&self.table);
        all.extend(&self.image);
        all.extend(&self.pagination);
        all
    }
}

/// Any page-level object, for the merged vertical ordering.
#[derive(Debug, Clone)]
pub enum PageObject {
    Paragraph(Paragraph),
    Table(Table),
    Image(Image),
}

impl PageObject {
    pub fn top(&self) -> f32 {
        match self {
            PageObject::Paragraph(p) => p.bbox.top,
            PageObject::Table(t) => t.bbox.top,
            PageObject::Image(i) => i.bbox.top,
        }
    }
}

/// The full analysis of one page.
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    pub stats: CharStats,
    pub frame: ContentFrame,
    pub phrases: Vec<Phrase>,
    pub ave_lh: f32,
    pub toc_page: bool,
    pub border: BBox,
    pub exclusions: ExclusionSets,
    pub tables: Vec<Table>,
    pub images: Vec<Image>,
    pub paragraphs: Vec<Paragraph>,
    /// Paragraphs, tables, and images merged in vertical order.
    pub objects: Vec<PageObject>,
    pub new_para_start_flag: Option<bool>,
    pub new_para_end_flag: Option<bool>,
}

/// Lazy analyzer for a single page.
pub struct PageAnalyzer<A: PageAccess> {
    access: A,
    pid: usize,
    config: LayoutConfig,
    zones: Vec<PageZone>,
    logos: Vec<BBox>,
    cache: Option<PageAnalysis>,
}

impl<A: PageAccess> PageAnalyzer<A> {
    /// Wrap a page for analysis. Fails when the configuration is invalid.
    pub fn new(access: A, pid: usize, config: LayoutConfig) -> Result<Self, LayoutError> {
        config.validate()?;
        Ok(Self {
            access,
            pid,
            config,
            zones: Vec::new(),
            logos: Vec::new(),
            cache: None,
        })
    }

    /// Known header/footer zones, e.g. from a document-level watermark scan.
    pub fn with_zones(mut self, zones: Vec<PageZone>) -> Self {
        self.zones = zones;
        self.cache = None;
        self
    }

    /// Known logo/watermark regions to exclude from image detection.
    pub fn with_logos(mut self, logos: Vec<BBox>) -> Self {
        self.logos = logos;
        self.cache = None;
        self
    }

    pub fn pid(&self) -> usize {
        self.pid
    }

    /// Reassign the page identity and drop cached results.
    pub fn set_pid(&mut self, pid: usize) {
        self.pid = pid;
        self.cache = None;
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replace the configuration and drop cached results. Fails when the new
    /// configuration is invalid; the old one stays in place.
    pub fn set_config(&mut self, config: LayoutConfig) -> Result<(), LayoutError> {
        config.validate()?;
        self.config = config;
        self.cache = None;
        Ok(())
    }

    pub fn access(&self) -> &A {
        &self.access
    }

    /// Drop cached results; the next query recomputes from scratch.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// The page's analysis, computing and caching it on first use.
    pub fn analysis(&mut self) -> &PageAnalysis {
        if self.cache.is_none() {
            self.cache = Some(self.compute());
        }
        self.cache.as_ref().unwrap()
    }

    pub fn paragraphs(&mut self) -> &[Paragraph] {
        &self.analysis().paragraphs
    }

    pub fn tables(&mut self) -> &[Table] {
        &self.analysis().tables
    }

    pub fn images(&mut self) -> &[Image] {
        &self.analysis().images
    }

    pub fn objects(&mut self) -> &[PageObject] {
        &self.analysis().objects
    }

    fn compute(&self) -> PageAnalysis {
        let width = self.access.width();
        let height = self.access.height();
        debug!("analyzing page {} ({}x{})", self.pid, width, height);

        let mut glyphs = self.access.glyphs().to_vec();
        remove_duplicate_glyphs(&mut glyphs, self.config.char_overlap_size);
        let stats = analyze_char_stats(&glyphs, &self.config, width, height);

        let frame = detect_frame(&self.zones, &stats, &self.config, height);
        let phrase_set = extract_phrases(&self.access, &frame, &stats, &self.config);

        let mut exclusions = ExclusionSets {
            pagination: phrase_set.pagination.clone(),
            ..Default::default()
        };
        for (idx, phrase) in phrase_set.phrases.iter().enumerate() {
            if in_zone(
                &self.zones,
                stats.orientation,
                phrase.bbox.top,
                phrase.bbox.bottom,
            ) {
                exclusions.header_footer.insert(idx);
            }
        }

        let tables = if self.config.table_flag {
            let lines = gather_lines(&self.access, &self.config);
            let (tables, claimed) = extract_tables(&lines, &phrase_set.phrases, &stats);
            exclusions.table = claimed;
            tables
        } else {
            Vec::new()
        };

        let images = if self.config.image_flag {
            let (images, claimed) = extract_images(
                &self.access,
                &tables,
                &self.logos,
                &phrase_set.phrases,
                &self.config,
            );
            exclusions.image = claimed;
            images
        } else {
            Vec::new()
        };

        let excluded = exclusions.all();
        let border = paragraph_border(&phrase_set.phrases, &excluded, width, height);
        let segmentation = if self.config.paragraph_flag {
            segment_paragraphs(
                &phrase_set.phrases,
                &excluded,
                border,
                &stats,
                phrase_set.ave_lh,
                width,
                phrase_set.toc_page,
            )
        } else {
            Default::default()
        };

        let mut objects: Vec<PageObject> = segmentation
            .paragraphs
            .iter()
            .cloned()
            .map(PageObject::Paragraph)
            .chain(tables.iter().cloned().map(PageObject::Table))
            .chain(images.iter().cloned().map(PageObject::Image))
            .collect();
        objects.sort_by(|a, b| {
            a.top()
                .partial_cmp(&b.top())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        PageAnalysis {
            stats,
            frame,
            phrases: phrase_set.phrases,
            ave_lh: phrase_set.ave_lh,
            toc_page: phrase_set.toc_page,
            border,
            exclusions,
            tables,
            images,
            paragraphs: segmentation.paragraphs,
            objects,
            new_para_start_flag: segmentation.new_para_start_flag,
            new_para_end_flag: segmentation.new_para_end_flag,
        }
    }
}

/// Analyze a batch of pages in parallel, filling each analyzer's cache.
pub fn analyze_pages<A>(analyzers: &mut [PageAnalyzer<A>])
where
    A: PageAccess + Send,
{
    analyzers.par_iter_mut().for_each(|analyzer| {
        analyzer.analysis();
    });
}
