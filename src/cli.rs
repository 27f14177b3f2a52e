//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::render::ImageFormat;
use clap::Parser;
use std::path::PathBuf;

/// Survey Plotter - charts from survey CSV exports
///
/// Loads every CSV export in the data folder, normalizes answer labels and
/// renders the charts declared in .survey-plotter.toml as SVG and PNG.
///
/// Examples:
///   survey-plotter
///   survey-plotter --data-dir exports --plot-dir charts --formats svg
///   survey-plotter --only "Participation" --no-save --show
///   survey-plotter --dry-run
///   survey-plotter --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Folder containing the CSV exports
    ///
    /// Only files directly inside the folder are read.
    #[arg(short, long, value_name = "DIR", env = "SURVEY_PLOTTER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Folder receiving one subfolder per image format
    #[arg(short, long, value_name = "DIR", env = "SURVEY_PLOTTER_PLOT_DIR")]
    pub plot_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .survey-plotter.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Image formats to write (comma-separated)
    ///
    /// Example: --formats svg,png
    #[arg(short, long, value_name = "FORMATS", value_delimiter = ',')]
    pub formats: Option<Vec<ImageFormat>>,

    /// Do not write any files
    #[arg(long)]
    pub no_save: bool,

    /// Open every chart in the system image viewer
    #[arg(long)]
    pub show: bool,

    /// Only render charts with this title (repeatable)
    #[arg(long, value_name = "TITLE")]
    pub only: Vec<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: list input files and charts without rendering
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .survey-plotter.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref formats) = self.formats {
            if formats.is_empty() && !self.no_save {
                return Err("At least one format is required when saving".to_string());
            }
        }

        if let Some(ref data_dir) = self.data_dir {
            if !data_dir.is_dir() {
                return Err(format!(
                    "Data directory does not exist: {}",
                    data_dir.display()
                ));
            }
        }

        if self.only.iter().any(|title| title.trim().is_empty()) {
            return Err("--only needs a chart title".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `general.verbose` from the config file; `--quiet`
    /// still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
