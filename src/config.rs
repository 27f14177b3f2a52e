//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.survey-plotter.toml` files.

use crate::loader::default_replacements;
use crate::recipes::{ChartRecipe, ParticipationRecipe, PieRecipe};
use crate::render::theme::parse_color;
use crate::render::ImageFormat;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".survey-plotter.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Chart styling.
    #[serde(default)]
    pub style: StyleConfig,

    /// Freshness cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Answer tokens rewritten after loading.
    #[serde(default = "default_replacements")]
    pub labels: BTreeMap<String, String>,

    /// Charts generated on each run.
    #[serde(default = "default_charts")]
    pub charts: Vec<ChartRecipe>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            output: OutputConfig::default(),
            style: StyleConfig::default(),
            cache: CacheConfig::default(),
            labels: default_replacements(),
            charts: default_charts(),
        }
    }
}

fn default_charts() -> Vec<ChartRecipe> {
    vec![
        ChartRecipe::Participation(ParticipationRecipe {
            title: "Participation".to_string(),
            population: 5500,
        }),
        ChartRecipe::Pie(PieRecipe {
            title: "Age Distribution".to_string(),
            column: "Altersklasse".to_string(),
            filters: Vec::new(),
            drop: Vec::new(),
            rename: BTreeMap::new(),
            combine: Vec::new(),
        }),
    ]
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Folder holding the CSV exports.
    #[serde(default = "default_data_folder")]
    pub data_folder: String,

    /// Folder receiving one subfolder per output format.
    #[serde(default = "default_plot_folder")]
    pub plot_folder: String,

    /// CSV field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_folder: default_data_folder(),
            plot_folder: default_plot_folder(),
            delimiter: default_delimiter(),
            verbose: false,
        }
    }
}

fn default_data_folder() -> String {
    "data/csv".to_string()
}

fn default_plot_folder() -> String {
    "plot".to_string()
}

fn default_delimiter() -> char {
    ','
}

/// Where and how finished charts go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Image formats written for every chart.
    #[serde(default = "default_formats")]
    pub formats: Vec<ImageFormat>,

    /// Write charts to the plot folder.
    #[serde(default = "default_true")]
    pub save: bool,

    /// Open each chart in the system viewer.
    #[serde(default)]
    pub show: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            save: true,
            show: false,
        }
    }
}

fn default_formats() -> Vec<ImageFormat> {
    vec![ImageFormat::Svg, ImageFormat::Png]
}

fn default_true() -> bool {
    true
}

/// A font used for one text role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    /// Comma separated family list; the first installed family is used.
    pub family: String,

    /// Size in points.
    pub size: f64,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    /// Overrides the text color for this role.
    #[serde(default)]
    pub color: Option<String>,
}

/// Chart styling shared by every figure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Figure width in inches.
    #[serde(default = "default_width")]
    pub width: f64,

    /// Figure height in inches.
    #[serde(default = "default_height")]
    pub height: f64,

    /// Pixels per inch.
    #[serde(default = "default_dpi")]
    pub dpi: f64,

    /// Line width of curves in points.
    #[serde(default = "default_line_width")]
    pub line_width: f64,

    #[serde(default = "default_headline_font")]
    pub headline_font: FontConfig,

    #[serde(default = "default_description_font")]
    pub description_font: FontConfig,

    #[serde(default = "default_footnote_font")]
    pub footnote_font: FontConfig,

    /// Foreground color for text, ticks and legends.
    #[serde(default = "default_text_color")]
    pub text_color: String,

    #[serde(default = "default_background_color")]
    pub background_color: String,

    /// Colors assigned to categories, reused cyclically.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            dpi: default_dpi(),
            line_width: default_line_width(),
            headline_font: default_headline_font(),
            description_font: default_description_font(),
            footnote_font: default_footnote_font(),
            text_color: default_text_color(),
            background_color: default_background_color(),
            palette: default_palette(),
        }
    }
}

fn default_width() -> f64 {
    27.0
}

fn default_height() -> f64 {
    17.0
}

fn default_dpi() -> f64 {
    100.0
}

fn default_line_width() -> f64 {
    default_height() / 4.0
}

fn default_headline_font() -> FontConfig {
    FontConfig {
        family: "Futura, sans-serif".to_string(),
        size: 50.0,
        bold: true,
        italic: false,
        color: None,
    }
}

fn default_description_font() -> FontConfig {
    FontConfig {
        family: "Futura, sans-serif".to_string(),
        size: 30.0,
        bold: false,
        italic: false,
        color: None,
    }
}

fn default_footnote_font() -> FontConfig {
    FontConfig {
        family: "Futura, sans-serif".to_string(),
        size: 16.0,
        bold: false,
        italic: true,
        color: Some("gray".to_string()),
    }
}

fn default_text_color() -> String {
    "white".to_string()
}

fn default_background_color() -> String {
    "black".to_string()
}

fn default_palette() -> Vec<String> {
    vec!["#FEED00", "#FFB30D", "#B9E3F9"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Freshness cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a folder timestamp stays valid.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Maximum number of folders remembered.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            capacity: default_capacity(),
        }
    }
}

fn default_ttl_seconds() -> u64 {
    crate::freshness::DEFAULT_TTL.as_secs()
}

fn default_capacity() -> usize {
    crate::freshness::DEFAULT_CAPACITY
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings and only
    /// override values they explicitly provide.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_folder = data_dir.to_string_lossy().to_string();
        }
        if let Some(ref plot_dir) = args.plot_dir {
            self.general.plot_folder = plot_dir.to_string_lossy().to_string();
        }
        if let Some(ref formats) = args.formats {
            self.output.formats = formats.clone();
        }

        if args.no_save {
            self.output.save = false;
        }
        if args.show {
            self.output.show = true;
        }

        if !args.only.is_empty() {
            self.charts
                .retain(|chart| args.only.iter().any(|title| title == chart.title()));
        }
    }

    /// Check the merged settings before any work starts.
    pub fn validate(&self) -> Result<()> {
        if !self.output.save && !self.output.show {
            bail!("Nothing to do: saving and showing are both disabled");
        }
        if self.output.save && self.output.formats.is_empty() {
            bail!("At least one output format is required when saving");
        }
        if self.style.palette.is_empty() {
            bail!("The style palette needs at least one color");
        }
        let style = &self.style;
        let fonts = [
            &style.headline_font,
            &style.description_font,
            &style.footnote_font,
        ];
        let colors = std::iter::once(&style.text_color)
            .chain(std::iter::once(&style.background_color))
            .chain(&style.palette)
            .chain(fonts.iter().filter_map(|f| f.color.as_ref()));
        for color in colors {
            if parse_color(color).is_none() {
                bail!("Unknown color '{}' (use #RRGGBB or a basic name)", color);
            }
        }
        if self.style.width <= 0.0 || self.style.height <= 0.0 || self.style.dpi <= 0.0 {
            bail!("Figure width, height and dpi must be positive");
        }
        if !self.general.delimiter.is_ascii() {
            bail!("CSV delimiter must be an ASCII character");
        }
        for chart in &self.charts {
            chart
                .validate()
                .with_context(|| format!("Invalid chart '{}'", chart.title()))?;
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
