// src/pipeline/outcome.rs
use crate::rewriter::RewriteStats;
use folio_types::{PlaceholderToken, ReplacementMap, ResolvedEntry};
use serde::Serialize;
use std::fmt;

/// Where a [`TocPipeline`](super::TocPipeline) run currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    Scanning,
    NoPlaceholders,
    Extracting,
    Resolving,
    Rewriting,
    Done,
    /// Absorbing: the run stopped and the original document was passed through.
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Scanning => "scanning",
            PipelineState::NoPlaceholders => "no-placeholders",
            PipelineState::Extracting => "extracting",
            PipelineState::Resolving => "resolving",
            PipelineState::Rewriting => "rewriting",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Details of a successful rewrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RewriteReport {
    pub replacements: ReplacementMap,
    pub entries: Vec<ResolvedEntry>,
    /// Tokens whose heading was not found and whose number is a forward guess.
    pub guessed: Vec<PlaceholderToken>,
    pub pages_rewritten: usize,
    pub patches: usize,
    pub retired_runs: usize,
    pub overflows: usize,
}

impl RewriteReport {
    pub(crate) fn new(replacements: ReplacementMap, entries: Vec<ResolvedEntry>, stats: RewriteStats) -> Self {
        let guessed = entries.iter().filter(|e| e.is_guess()).map(|e| e.token.clone()).collect();
        Self {
            replacements,
            entries,
            guessed,
            pages_rewritten: stats.pages,
            patches: stats.patches,
            retired_runs: stats.retired_runs,
            overflows: stats.overflows,
        }
    }
}

/// How a run ended. Every variant except `Rewritten` leaves the output byte-identical to the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TocOutcome {
    /// The feature was switched off; the input was copied through.
    Disabled,
    /// No placeholder was found; the input was copied through.
    NoPlaceholders,
    /// A stage failed; the input was copied through.
    Degraded { stage: PipelineState, reason: String },
    Rewritten(RewriteReport),
}

impl TocOutcome {
    pub fn is_rewritten(&self) -> bool {
        matches!(self, TocOutcome::Rewritten(_))
    }

    pub fn report(&self) -> Option<&RewriteReport> {
        match self {
            TocOutcome::Rewritten(report) => Some(report),
            _ => None,
        }
    }
}
