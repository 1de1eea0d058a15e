pub mod color;
pub mod content;
pub mod document;
pub mod geometry;
pub mod ids;

pub use color::Color;
pub use content::{GlyphRun, GlyphSource};
pub use document::{
    PlaceholderOccurrence, ReplacementMap, ResolutionSource, ResolvedEntry, ResolvedPage,
    TocEntry,
};
pub use geometry::{Point, Rect};
pub use ids::{InvalidToken, PlaceholderToken};
