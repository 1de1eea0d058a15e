// src/pipeline/builder.rs
use super::orchestrator::TocPipeline;
use super::writer::{ArtifactWriter, AtomicFileWriter};
use crate::config::TocConfig;
use folio_types::Color;

/// A builder for creating a `TocPipeline`.
pub struct TocPipelineBuilder {
    config: TocConfig,
    writer: Box<dyn ArtifactWriter>,
}

impl Default for TocPipelineBuilder {
    fn default() -> Self {
        Self { config: TocConfig::from_env(), writer: Box::new(AtomicFileWriter) }
    }
}

impl TocPipelineBuilder {
    /// Creates a builder with default settings overlaid with the environment (`FOLIO_TOC_DEBUG`).
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces every setting at once.
    pub fn with_config(mut self, config: TocConfig) -> Self {
        self.config = config;
        self
    }

    /// When disabled the pipeline only copies the input to the output.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn with_cover_color(mut self, color: Color) -> Self {
        self.config.cover_color = color;
        self
    }

    /// Removes placeholder glyphs from the page content in addition to covering them.
    pub fn with_glyph_retirement(mut self, retire: bool) -> Self {
        self.config.retire_glyphs = retire;
        self
    }

    /// Strokes the box each number is drawn in.
    pub fn with_debug_outlines(mut self, debug: bool) -> Self {
        self.config.debug_outlines = debug;
        self
    }

    /// Sets how the rewritten document is persisted.
    pub fn with_writer(mut self, writer: impl ArtifactWriter + 'static) -> Self {
        self.writer = Box::new(writer);
        self
    }

    pub fn build(self) -> TocPipeline {
        TocPipeline::new(self.config, self.writer)
    }
}
