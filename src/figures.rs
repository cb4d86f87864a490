//! Figure merging and image extraction
//!
//! Merges the page's raw figure regions into image entities, excluding
//! regions that overlap detected tables or known logo/watermark regions,
//! filtering out tiny regions, and flagging near-full-page regions as scans.
//! Phrases sitting inside image regions are claimed so the paragraph
//! segmenter skips them. Geometry failures for one region never abort the
//! rest.

use std::collections::HashSet;

use log::{debug, warn};

use crate::access::{FigureRegion, PageAccess};
use crate::config::LayoutConfig;
use crate::geometry::BBox;
use crate::phrases::Phrase;
use crate::tables::Table;

/// Fraction of the page an image must cover to count as a full-page scan.
const SCAN_AREA_FRACTION: f32 = 0.7;

/// An image entity.
#[derive(Debug, Clone)]
pub struct Image {
    pub bbox: BBox,
    /// Source reference from the access layer.
    pub src: String,
    /// True when the region covers most of the page, i.e. a scanned page
    /// rather than an embedded figure.
    pub scan: bool,
}

/// Merge and filter the page's figure regions. Returns the image list and
/// the indices of phrases contained in image regions.
pub fn extract_images<A: PageAccess>(
    page: &A,
    tables: &[Table],
    logos: &[BBox],
    phrases: &[Phrase],
    config: &LayoutConfig,
) -> (Vec<Image>, HashSet<usize>) {
    let raw = match page.figures() {
        Ok(raw) => raw,
        Err(e) => {
            warn!("figure query failed, no images: {}", e);
            Vec::new()
        }
    };

    // Regions overlapping a table or a logo/watermark are not images.
    let candidates: Vec<FigureRegion> = raw
        .into_iter()
        .filter(|f| {
            if !f.bbox.is_finite() {
                debug!("skipping figure {:?} with degenerate bounds", f.src);
                return false;
            }
            let on_table = tables.iter().any(|t| t.bbox.overlaps(&f.bbox));
            let on_logo = logos.iter().any(|l| l.overlaps(&f.bbox));
            !on_table && !on_logo
        })
        .collect();

    let merged = merge_regions(candidates);

    let page_area = page.width() * page.height();
    let mut images = Vec::new();
    for region in merged {
        if region.bbox.width() <= config.min_image_size
            || region.bbox.height() <= config.min_image_size
        {
            continue;
        }
        let scan = page_area > 0.0 && region.bbox.area() / page_area >= SCAN_AREA_FRACTION;
        images.push(Image {
            bbox: region.bbox,
            src: region.src,
            scan,
        });
    }

    let mut claimed = HashSet::new();
    for (idx, phrase) in phrases.iter().enumerate() {
        if images
            .iter()
            .any(|img| img.bbox.contains_point(phrase.bbox.center_x(), phrase.bbox.center_y()))
        {
            claimed.insert(idx);
        }
    }

    debug!("{} images, {} phrases claimed", images.len(), claimed.len());
    (images, claimed)
}

/// Merge overlapping figure regions into their unions, repeating until no
/// two regions overlap. The first region's source reference represents the
/// merged region.
fn merge_regions(mut regions: Vec<FigureRegion>) -> Vec<FigureRegion> {
    loop {
        let mut merged_any = false;
        let mut result: Vec<FigureRegion> = Vec::with_capacity(regions.len());
        for region in regions {
            match result.iter_mut().find(|r| r.bbox.overlaps(&region.bbox)) {
                Some(existing) => {
                    existing.bbox = existing.bbox.union(&region.bbox);
                    merged_any = true;
                }
                None => result.push(region),
            }
        }
        regions = result;
        if !merged_any {
            return regions;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::MemPage;

    fn make_figure(left: f32, top: f32, right: f32, bottom: f32) -> FigureRegion {
        FigureRegion {
            bbox: BBox::new(left, top, right, bottom),
            src: "fig".into(),
        }
    }

    #[test]
    fn test_overlapping_figures_merge() {
        let mut page = MemPage::new(600.0, 800.0);
        page.figures = vec![
            make_figure(100.0, 100.0, 300.0, 300.0),
            make_figure(250.0, 250.0, 400.0, 400.0),
            make_figure(100.0, 600.0, 300.0, 760.0),
        ];
        let (images, _) =
            extract_images(&page, &[], &[], &[], &LayoutConfig::default());
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].bbox, BBox::new(100.0, 100.0, 400.0, 400.0));
    }

    #[test]
    fn test_small_figures_filtered() {
        let mut page = MemPage::new(600.0, 800.0);
        page.figures = vec![make_figure(100.0, 100.0, 150.0, 150.0)];
        let (images, _) = extract_images(&page, &[], &[], &[], &LayoutConfig::default());
        assert!(images.is_empty());
    }

    #[test]
    fn test_scan_flag_threshold() {
        let mut page = MemPage::new(600.0, 800.0);
        // 75% of a 600x800 page.
        page.figures = vec![make_figure(0.0, 0.0, 600.0, 600.0)];
        let (images, _) = extract_images(&page, &[], &[], &[], &LayoutConfig::default());
        assert_eq!(images.len(), 1);
        assert!(images[0].scan);

        // 40% of the page.
        page.figures = vec![make_figure(0.0, 0.0, 600.0, 320.0)];
        let (images, _) = extract_images(&page, &[], &[], &[], &LayoutConfig::default());
        assert_eq!(images.len(), 1);
        assert!(!images[0].scan);
    }

    #[test]
    fn test_logo_regions_excluded() {
        let mut page = MemPage::new(600.0, 800.0);
        page.figures = vec![make_figure(100.0, 100.0, 300.0, 300.0)];
        let logos = vec![BBox::new(150.0, 150.0, 250.0, 250.0)];
        let (images, _) = extract_images(&page, &[], &logos, &[], &LayoutConfig::default());
        assert!(images.is_empty());
    }

    #[test]
    fn test_phrases_inside_images_claimed() {
        let mut page = MemPage::new(600.0, 800.0);
        page.figures = vec![make_figure(100.0, 100.0, 400.0, 400.0)];
        let phrases = vec![
            Phrase {
                bbox: BBox::new(150.0, 150.0, 200.0, 162.0),
                text: "caption".into(),
            },
            Phrase {
                bbox: BBox::new(150.0, 600.0, 200.0, 612.0),
                text: "body".into(),
            },
        ];
        let (_, claimed) =
            extract_images(&page, &[], &[], &phrases, &LayoutConfig::default());
        assert!(claimed.contains(&0));
        assert!(!claimed.contains(&1));
    }
}
