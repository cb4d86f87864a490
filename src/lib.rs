//! Page layout analysis for extracted PDF content
//!
//! This crate provides:
//! - Character statistics and adaptive extraction tolerances per page
//! - Phrase extraction with header/footer, pagination, and contents-page
//!   handling
//! - Table reconstruction from ruled line grids, including dotted and
//!   curved borders
//! - Figure merging with full-page scan detection
//! - Paragraph segmentation with styles, spans, and cross-page
//!   continuation flags
//!
//! The entry point is [`PageAnalyzer`], which wraps any [`PageAccess`]
//! implementation and computes a cached [`PageAnalysis`] on demand.

pub mod access;
pub mod config;
pub mod figures;
pub mod frame;
pub mod geometry;
pub mod grid;
pub mod page;
pub mod paragraphs;
pub mod phrases;
pub mod rules;
pub mod stats;
pub mod tables;

pub use access::{AccessError, Glyph, MemPage, Orientation, PageAccess, PageZone, ZoneLevel};
pub use config::LayoutConfig;
pub use figures::Image;
pub use geometry::BBox;
pub use page::{analyze_pages, ExclusionSets, PageAnalysis, PageAnalyzer, PageObject};
pub use paragraphs::{ParaEntry, ParaStyle, Paragraph, Span, Text};
pub use phrases::Phrase;
pub use tables::Table;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
