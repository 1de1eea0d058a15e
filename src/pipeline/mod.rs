//! TOC post-processing orchestration.
//!
//! - [`TocPipelineBuilder`]: Fluent builder for configuring a run
//! - [`TocPipeline`]: The scan → extract → resolve → rewrite state machine
//! - [`ArtifactWriter`]: How the rewritten document is persisted
//!
//! # Example
//!
//! ```ignore
//! use folio::TocPipelineBuilder;
//!
//! let mut pipeline = TocPipelineBuilder::new().with_enabled(true).build();
//! let outcome = pipeline.run_in_place("book.pdf".as_ref())?;
//! ```

mod builder;
mod orchestrator;
mod outcome;
mod writer;

pub use builder::TocPipelineBuilder;
pub use orchestrator::TocPipeline;
pub use outcome::{PipelineState, RewriteReport, TocOutcome};
pub use writer::{ArtifactWriter, AtomicFileWriter, write_atomically};
