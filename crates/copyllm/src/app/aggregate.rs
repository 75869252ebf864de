//! Rendering file contents into labelled blocks.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::label::LabelFormatter;
use crate::domain::model::AggregatedDocument;

/// Reads files and collects them into an [`AggregatedDocument`].
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    labels: LabelFormatter,
}

impl Aggregator {
    pub fn new(labels: LabelFormatter) -> Self {
        Self { labels }
    }

    /// Blocks for files discovered under `base`, in the given order.
    pub fn aggregate_files(&self, base: &Path, files: &[PathBuf]) -> Result<AggregatedDocument> {
        let mut document = AggregatedDocument::new();
        for file in files {
            let content = read_text(file)?;
            document.push(self.labels.label(file, Some(base)), content);
        }
        Ok(document)
    }

    /// Block for a single explicitly selected file, labelled without a base.
    pub fn aggregate_file(&self, file: &Path) -> Result<AggregatedDocument> {
        let mut document = AggregatedDocument::new();
        document.push(self.labels.label(file, None), read_text(file)?);
        Ok(document)
    }
}

/// Read a whole file as UTF-8 text.
fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
