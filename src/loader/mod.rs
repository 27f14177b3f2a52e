//! CSV folder loading.
//!
//! This module discovers the CSV exports directly inside the data folder
//! and concatenates them into a single working [`Table`].

mod labels;

pub use labels::{default_replacements, LabelNormalizer};

use crate::error::{PlotError, Result};
use crate::models::Table;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Extension of the tabular exports picked up by the loader.
pub const CSV_EXTENSION: &str = "csv";

/// Loads every CSV file of a folder into one table.
#[derive(Debug, Clone)]
pub struct TableLoader {
    extension: String,
    delimiter: u8,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self {
            extension: CSV_EXTENSION.to_string(),
            delimiter: b',',
        }
    }
}

impl TableLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a different field delimiter (e.g. `;` for spreadsheet exports).
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Matching files directly under `folder`, ordered by file name.
    pub fn list_files(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        if !folder.is_dir() {
            return Err(PlotError::MissingFolder {
                path: folder.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(folder).to_path_buf();
                PlotError::io(path, e.into())
            })?;
            if entry.file_type().is_file() && self.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Loads and concatenates all matching files.
    ///
    /// Fails with [`PlotError::NoData`] when the folder holds no CSV file.
    /// Files with differing headers are merged as a column union.
    pub fn load(&self, folder: &Path) -> Result<Table> {
        let files = self.list_files(folder)?;
        if files.is_empty() {
            let folder = std::fs::canonicalize(folder).unwrap_or_else(|_| folder.to_path_buf());
            return Err(PlotError::NoData { folder });
        }

        let mut table = Table::default();
        for file in &files {
            let part = self.read_file(file)?;
            debug!("Loaded {} rows from {}", part.len(), file.display());
            table.append(part);
        }

        info!(
            "Loaded {} rows with {} columns from {} files",
            table.len(),
            table.columns().len(),
            files.len()
        );
        Ok(table)
    }

    /// Parses one CSV file with a header row.
    pub fn read_file(&self, path: &Path) -> Result<Table> {
        let csv_error = |source| PlotError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_path(path)
            .map_err(csv_error)?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut table = Table::new(headers);
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            // short rows are padded, long rows would lose data
            if record.len() > table.columns().len() {
                return Err(PlotError::RowTooWide {
                    path: path.to_path_buf(),
                    line: record.position().map_or(0, |p| p.line()),
                    expected: table.columns().len(),
                    found: record.len(),
                });
            }
            table.push_row(
                record
                    .iter()
                    .map(|field| (!field.is_empty()).then(|| field.to_string()))
                    .collect(),
            );
        }

        Ok(table)
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext == self.extension)
    }
}
