//! Download sinks: where finished export artifacts are delivered.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::info;

use crate::export::pdf::PDF_MIME;
use crate::export::word::WORD_MIME;
use crate::Result;

/// A finished export, ready to be saved under its suggested file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn pdf(quotation_number: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("Quotation-{}.pdf", quotation_number),
            mime_type: PDF_MIME.to_string(),
            bytes,
        }
    }

    pub fn word(quotation_number: &str, html: String) -> Self {
        Self {
            file_name: format!("Quotation-{}.doc", quotation_number),
            mime_type: WORD_MIME.to_string(),
            bytes: html.into_bytes(),
        }
    }
}

/// Receives artifacts; the terminal counterpart of a browser download
pub trait DownloadSink: Send + Sync {
    /// Store `artifact` and return where it ended up.
    fn save(&self, artifact: &Artifact) -> Result<PathBuf>;
}

/// Writes artifacts into a directory, overwriting same-named files
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, artifact: &Artifact) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&artifact.file_name);
        std::fs::write(&path, &artifact.bytes)?;
        info!("saved {} ({} bytes) to {}", artifact.file_name, artifact.bytes.len(), path.display());
        Ok(path)
    }
}

/// Keeps artifacts in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<Artifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.saved.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl DownloadSink for MemorySink {
    fn save(&self, artifact: &Artifact) -> Result<PathBuf> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| crate::Error::Export("memory sink lock poisoned".into()))?;
        saved.push(artifact.clone());
        Ok(PathBuf::from(&artifact.file_name))
    }
}
