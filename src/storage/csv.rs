//! CSV dataset file
//!
//! Columns are `text,label,category,title,url,source`. Files start with a
//! UTF-8 byte-order mark so spreadsheet tools pick the right encoding, and
//! are written to a temporary sibling first then renamed into place.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use super::Dataset;
use crate::error::{Error, Result};
use crate::models::ArticleRecord;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes a [`Dataset`] to a CSV file
#[derive(Debug, Clone)]
pub struct CsvDatasetWriter {
    path: PathBuf,
}

impl CsvDatasetWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every record, replacing any existing file. Returns the row count.
    pub fn write(&self, dataset: &Dataset) -> Result<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        let mut file = BufWriter::new(File::create(&temp_path)?);
        file.write_all(UTF8_BOM)?;

        let mut writer = csv::Writer::from_writer(file);
        for record in dataset.records() {
            writer.serialize(record)?;
        }
        // An empty dataset still gets a header row
        if dataset.is_empty() {
            writer.write_record(["text", "label", "category", "title", "url", "source"])?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&temp_path, &self.path).map_err(|e| {
            Error::with_source(
                format!("Failed to move dataset into place at {}", self.path.display()),
                e,
            )
        })?;

        tracing::info!(
            path = %self.path.display(),
            rows = dataset.len(),
            "Dataset written"
        );
        Ok(dataset.len())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset.csv".to_string());
        self.path.with_file_name(format!("{name}.tmp"))
    }
}

/// Load a dataset file written by [`CsvDatasetWriter`]
///
/// Duplicate URLs in the file are dropped, keeping the first row.
pub fn read(path: &Path) -> Result<Dataset> {
    let mut raw = String::new();
    File::open(path)?.read_to_string(&mut raw)?;
    let content = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut records = Vec::new();
    for row in reader.deserialize::<ArticleRecord>() {
        records.push(row?);
    }
    Ok(Dataset::from_records(records))
}

/// Fold `fresh` into the dataset stored at `path` and reshuffle with `seed`
///
/// Rows already in the file win over fresh rows with the same URL. Returns
/// the merged dataset and the number of fresh rows added.
pub fn merge_existing(path: &Path, fresh: Dataset, seed: u64) -> Result<(Dataset, usize)> {
    let mut merged = read(path)?;
    let added = merged.merge(fresh.into_records());
    merged.shuffle(seed);

    tracing::info!(path = %path.display(), added, rows = merged.len(), "Merged with existing dataset");
    Ok((merged, added))
}
