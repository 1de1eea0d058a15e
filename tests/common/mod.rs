#![allow(dead_code)]

pub mod fixtures;
pub mod pdf_assertions;

use lopdf::Document;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Routes `log` output through the test harness; safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A scratch directory holding one input PDF.
pub struct Workspace {
    pub dir: TempDir,
    pub input: PathBuf,
}

impl Workspace {
    pub fn with_pdf(doc: Document) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("book.pdf");
        std::fs::write(&input, fixtures::to_bytes(doc))?;
        Ok(Self { dir, input })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// File names in the scratch directory, sorted.
    pub fn files(&self) -> Vec<String> {
        list_dir(self.dir.path())
    }
}

pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.file_name().to_string_lossy().into_owned()).collect())
        .unwrap_or_default();
    names.sort();
    names
}

pub fn load(path: &Path) -> Result<Document, Box<dyn std::error::Error>> {
    Ok(Document::load_mem(&std::fs::read(path)?)?)
}
