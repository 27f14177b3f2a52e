//! Error taxonomy for the loading and rendering pipeline.
//!
//! The core returns [`PlotError`]; the application layer wraps it in
//! `anyhow` with additional context.

use std::path::PathBuf;

/// Errors raised by the loader, the freshness cache and the renderer.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    /// The input folder contains no matching CSV files.
    #[error("no CSV files in folder {}", folder.display())]
    NoData { folder: PathBuf },

    /// An input or output folder does not exist.
    #[error("folder does not exist: {}", path.display())]
    MissingFolder { path: PathBuf },

    /// A statistic could not be computed for a chart.
    #[error("failed to render '{title}': {message}")]
    Render { title: String, message: String },

    /// A CSV file could not be parsed.
    #[error("failed to parse {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A CSV row carries more fields than its header.
    #[error("{}:{line}: row has {found} fields but the header has {expected}", path.display())]
    RowTooWide {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A chart could not be drawn into a bitmap file.
    #[error("failed to rasterize {}: {message}", path.display())]
    Rasterize { path: PathBuf, message: String },
}

impl PlotError {
    /// Build a render error for the chart with the given title.
    pub fn render(title: &str, message: impl Into<String>) -> Self {
        PlotError::Render {
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlotError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlotError>;
