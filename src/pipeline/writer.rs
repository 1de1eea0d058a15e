// src/pipeline/writer.rs
use crate::error::TocError;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Persists the rewritten document.
pub trait ArtifactWriter {
    fn write(&self, target: &Path, bytes: &[u8]) -> Result<(), TocError>;
}

/// Writes through a temporary file in the target's directory and renames it into place.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicFileWriter;

impl ArtifactWriter for AtomicFileWriter {
    fn write(&self, target: &Path, bytes: &[u8]) -> Result<(), TocError> {
        write_atomically(target, |file| file.write_all(bytes))
    }
}

/// Fills a temporary file next to `target` and renames it over `target`.
///
/// On any failure the temporary file is removed and `target` is left as it was.
pub fn write_atomically<F>(target: &Path, fill: F) -> Result<(), TocError>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::Builder::new().prefix(".folio-").suffix(".tmp").tempfile_in(dir)?;
    fill(temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| TocError::Io(e.error))?;
    Ok(())
}
