//! Post-layout table-of-contents page numbers for rendered PDFs.
//!
//! The TOC is rendered with unique placeholder tokens (`P#0001`, ...) because
//! page numbers are unknown before pagination. This crate finds those tokens,
//! works out on which page each section starts, and paints the numbers over
//! the tokens without disturbing the rest of the page.
//!
//! Most callers only need [`TocPipelineBuilder`]:
//!
//! ```ignore
//! let mut pipeline = folio::TocPipelineBuilder::new().build();
//! match pipeline.run(input, output)? {
//!     folio::TocOutcome::Rewritten(report) => println!("{} numbers", report.patches),
//!     other => println!("{:?}", other),
//! }
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod resolver;
pub mod rewriter;
pub mod scanner;
pub mod seed;

pub use config::TocConfig;
pub use error::TocError;
pub use extractor::{TocPages, cluster_lines, extract, strip_section_number};
pub use pipeline::{
    ArtifactWriter, AtomicFileWriter, PipelineState, RewriteReport, TocOutcome, TocPipeline, TocPipelineBuilder,
};
pub use resolver::{PageCursor, Resolution, normalize, resolve, resolve_with_report};
pub use rewriter::{RewriteOptions, RewriteStats, estimate_font_size, rewrite, rewrite_file};
pub use scanner::{has_placeholders, scan, try_scan};
pub use seed::{seed_file, seed_toc_placeholders};

pub use folio_types::{Color, PlaceholderOccurrence, PlaceholderToken, ReplacementMap, ResolvedEntry, TocEntry};
