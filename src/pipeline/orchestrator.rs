// src/pipeline/orchestrator.rs
use super::outcome::{PipelineState, RewriteReport, TocOutcome};
use super::writer::ArtifactWriter;
use crate::config::TocConfig;
use crate::error::TocError;
use crate::extractor::{TocPages, extract_from_layers};
use crate::resolver::{BodyText, Resolution, resolve_in};
use crate::rewriter::{RewriteOptions, rewrite_file};
use crate::scanner::scan_layers;
use folio_text_layer::extract_pages;
use log::{debug, info, warn};
use lopdf::Document;
use std::fs;
use std::path::Path;

/// Post-processes one rendered PDF: scan → extract → resolve → rewrite.
///
/// Only a missing input is an error. Every other failure passes the input
/// through unchanged and is reported as [`TocOutcome::Degraded`].
pub struct TocPipeline {
    config: TocConfig,
    writer: Box<dyn ArtifactWriter>,
    state: PipelineState,
}

/// What the read pass hands to the rewrite pass.
struct Analysis {
    resolution: Resolution,
}

impl TocPipeline {
    pub(crate) fn new(config: TocConfig, writer: Box<dyn ArtifactWriter>) -> Self {
        Self { config, writer, state: PipelineState::Idle }
    }

    pub fn config(&self) -> &TocConfig {
        &self.config
    }

    /// State reached by the last run, `Idle` before the first.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Rewrites the document in place.
    pub fn run_in_place(&mut self, path: &Path) -> Result<TocOutcome, TocError> {
        self.run(path, path)
    }

    /// Reads `input` and writes the result to `output`, which may be the same path.
    pub fn run(&mut self, input: &Path, output: &Path) -> Result<TocOutcome, TocError> {
        self.state = PipelineState::Idle;
        if !input.is_file() {
            self.transition(PipelineState::Failed);
            return Err(TocError::InputNotFound(input.to_path_buf()));
        }

        if !self.config.enabled {
            info!("TOC page numbers disabled; copying '{}' through.", input.display());
            copy_through(input, output)?;
            self.transition(PipelineState::Done);
            return Ok(TocOutcome::Disabled);
        }

        let analysis = match self.analyze(input) {
            Ok(Some(analysis)) => analysis,
            Ok(None) => {
                copy_through(input, output)?;
                self.transition(PipelineState::Done);
                return Ok(TocOutcome::NoPlaceholders);
            }
            Err(degraded) => return self.degrade(input, output, degraded),
        };

        self.transition(PipelineState::Rewriting);
        let options = RewriteOptions::from(&self.config);
        let map = &analysis.resolution.map;
        let written = rewrite_file(input, map, options)
            .and_then(|(bytes, stats)| self.writer.write(output, &bytes).map(|()| stats));
        match written {
            Ok(stats) => {
                let Resolution { map, entries } = analysis.resolution;
                let report = RewriteReport::new(map, entries, stats);
                if !report.guessed.is_empty() {
                    warn!("[REWRITE] {} page number(s) are guesses.", report.guessed.len());
                }
                self.transition(PipelineState::Done);
                info!("Injected {} TOC page number(s) into '{}'.", report.patches, output.display());
                Ok(TocOutcome::Rewritten(report))
            }
            Err(e) => self.degrade(input, output, (PipelineState::Rewriting, e.to_string())),
        }
    }

    /// The read pass. Returns `None` when the document has no placeholders.
    ///
    /// The document handle is dropped before this returns, so the rewrite
    /// pass always starts from a fresh load.
    fn analyze(&mut self, input: &Path) -> Result<Option<Analysis>, (PipelineState, String)> {
        self.transition(PipelineState::Scanning);
        let doc = fs::read(input)
            .map_err(TocError::from)
            .and_then(|bytes| Ok(Document::load_mem(&bytes)?))
            .map_err(|e| (PipelineState::Scanning, e.to_string()))?;
        let layers = extract_pages(&doc).map_err(|e| (PipelineState::Scanning, e.to_string()))?;
        drop(doc);

        let occurrences = scan_layers(&layers);
        if occurrences.is_empty() {
            self.transition(PipelineState::NoPlaceholders);
            return Ok(None);
        }

        self.transition(PipelineState::Extracting);
        let pages = TocPages::from_occurrences(&occurrences);
        let entries = extract_from_layers(&layers, &occurrences);
        if entries.is_empty() {
            return Err((PipelineState::Extracting, "no placeholder has heading text on its line".to_string()));
        }
        let max_toc_page = pages
            .max_toc_page()
            .ok_or_else(|| (PipelineState::Extracting, "placeholders without a page".to_string()))?;

        self.transition(PipelineState::Resolving);
        let body = BodyText::from_layers(&layers);
        let resolution = resolve_in(&body, &entries, max_toc_page);
        if resolution.map.is_empty() {
            return Err((PipelineState::Resolving, "no page number could be assigned".to_string()));
        }
        Ok(Some(Analysis { resolution }))
    }

    fn degrade(
        &mut self,
        input: &Path,
        output: &Path,
        (stage, reason): (PipelineState, String),
    ) -> Result<TocOutcome, TocError> {
        warn!("TOC post-processing failed while {}: {}. Keeping the original document.", stage, reason);
        self.transition(PipelineState::Failed);
        copy_through(input, output)?;
        Ok(TocOutcome::Degraded { stage, reason })
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("TOC pipeline: {} -> {}", self.state, next);
        self.state = next;
    }
}

/// Byte-for-byte copy; nothing to do when both paths name the same file.
fn copy_through(input: &Path, output: &Path) -> Result<(), TocError> {
    if same_file(input, output) {
        return Ok(());
    }
    fs::copy(input, output)?;
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
