// src/config.rs
use folio_types::Color;
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable that enables debug outlines around drawn page numbers.
pub const DEBUG_ENV_VAR: &str = "FOLIO_TOC_DEBUG";

/// Settings for one TOC post-processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocConfig {
    /// When false the input is copied through untouched.
    pub enabled: bool,
    /// Fill color of the patch drawn over each placeholder.
    pub cover_color: Color,
    /// Remove placeholder glyphs from the content stream in addition to covering them.
    pub retire_glyphs: bool,
    /// Stroke the draw rectangle of every number.
    pub debug_outlines: bool,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cover_color: Color::TOC_BACKGROUND,
            retire_glyphs: true,
            debug_outlines: false,
        }
    }
}

impl TocConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self { debug_outlines: debug_flag(env::var(DEBUG_ENV_VAR).ok().as_deref()), ..Self::default() }
    }
}

/// Set means non-empty and not `0` or `false`.
pub(crate) fn debug_flag(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => v != "0" && !v.eq_ignore_ascii_case("false"),
    }
}
