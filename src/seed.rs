// src/seed.rs
//! Seeds placeholder tokens into a rendered HTML table of contents.
//!
//! Each TOC link gets a `data-toc-placeholder="P#NNNN"` attribute, numbered
//! from 1 in document order, which the stylesheet renders where the page number
//! will go.

use crate::error::TocError;
use crate::pipeline::write_atomically;
use folio_types::PlaceholderToken;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Class added to `<body>` so the stylesheet can reserve room for page numbers.
pub const BODY_CLASS: &str = "toc-page-numbers";
pub const PLACEHOLDER_ATTRIBUTE: &str = "data-toc-placeholder";

static BODY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<body([^>]*)>").expect("BUG: invalid BODY_TAG regex literal"));

static TOC_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a href="(#[^"]*)" id="(toc-[^"]*)"[^>]*>([^<]*)</a>"#).expect("BUG: invalid TOC_LINK regex literal")
});

/// Returns the seeded HTML and the number of placeholders added.
///
/// Disabled seeding, or HTML without an `id="TOC"` element, comes back unchanged.
pub fn seed_toc_placeholders(html: &str, enabled: bool) -> (String, usize) {
    if !enabled || !html.contains(r#"id="TOC""#) {
        return (html.to_string(), 0);
    }

    let body = BODY_TAG.replace(html, |caps: &Captures| {
        if caps[1].contains(BODY_CLASS) {
            caps[0].to_string()
        } else {
            format!(r#"<body{} class="{}">"#, &caps[1], BODY_CLASS)
        }
    });

    let mut count = 0;
    let seeded = TOC_LINK.replace_all(&body, |caps: &Captures| match PlaceholderToken::numbered(count + 1) {
        Ok(token) => {
            count += 1;
            debug!("Seeding {} for '{}'", token, &caps[3]);
            format!(
                r#"<a href="{}" id="{}" {}="{}">{}</a>"#,
                &caps[1], &caps[2], PLACEHOLDER_ATTRIBUTE, token, &caps[3]
            )
        }
        Err(e) => {
            warn!("TOC link '{}' left without a placeholder: {}", &caps[2], e);
            caps[0].to_string()
        }
    });
    let seeded = seeded.into_owned();
    (seeded, count)
}

/// Seeds the HTML file in place and returns the number of placeholders added.
///
/// The file is replaced atomically and only when something changed.
pub fn seed_file(path: &Path, enabled: bool) -> Result<usize, TocError> {
    if !enabled {
        return Ok(0);
    }
    let html = fs::read_to_string(path)?;
    let (seeded, count) = seed_toc_placeholders(&html, true);
    if seeded == html {
        return Ok(0);
    }
    write_atomically(path, |file| file.write_all(seeded.as_bytes()))?;
    info!("Seeded {} TOC placeholder(s) into '{}'.", count, path.display());
    Ok(count)
}
