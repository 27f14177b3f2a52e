//! Chart rendering.
//!
//! Every chart goes through the same lifecycle in [`Renderer::render`]:
//! a fresh drawing area is opened, the chart draws itself, the title and
//! the data freshness footnote are added, and the finished figure is saved
//! and/or shown. Drawing goes through `plotters`; the figure is drawn once
//! into an in-memory SVG before anything touches the plot folder.

pub mod axes;
pub mod density;
pub mod filename;
pub mod line;
pub mod output;
pub mod pie;
pub mod stacked;
pub mod stats;
pub mod theme;
pub mod timeline;

pub use density::DensityChart;
pub use line::LineChart;
pub use output::{ImageFormat, OutputSettings, SystemViewer, Viewer};
pub use pie::PieChart;
pub use stacked::StackedAreaChart;
pub use theme::Theme;
pub use timeline::TimelineChart;

use crate::error::{PlotError, Result};
use crate::freshness::FreshnessCache;
use output::artifact_path;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Space kept free around the chart body, as fractions of the figure.
const MARGIN_TOP: f64 = 0.03;
const MARGIN_BOTTOM: f64 = 0.06;
const MARGIN_SIDE: f64 = 0.04;

/// A chart that can paint itself onto any plotters drawing area.
pub trait Chart {
    fn draw<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        theme: &Theme,
    ) -> std::result::Result<(), DrawError>;
}

/// Failure inside a chart's drawing routine, usually an empty data slice.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DrawError(pub String);

impl DrawError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for DrawError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        DrawError(e.to_string())
    }
}

/// Footnote text for a freshness timestamp.
pub fn footnote_text(timestamp: &str) -> String {
    format!("CSV File Timestamp: {} UTC", timestamp)
}

/// Paints background, footnote, title and chart onto a fresh root area.
fn paint<DB: DrawingBackend, C: Chart>(
    root: &DrawingArea<DB, Shift>,
    theme: &Theme,
    title: &str,
    footnote: &str,
    chart: &C,
) -> std::result::Result<(), DrawError> {
    root.fill(&theme.background)?;

    let (width, height) = root.dim_in_pixel();
    let (w, h) = (f64::from(width), f64::from(height));
    let body = root.titled(title, theme.headline.style())?.margin(
        (h * MARGIN_TOP) as u32,
        (h * MARGIN_BOTTOM) as u32,
        (w * MARGIN_SIDE) as u32,
        (w * MARGIN_SIDE) as u32,
    );
    chart.draw(&body, theme)?;

    let pad = theme.footnote.size_px.round() as i32;
    let style = theme
        .footnote
        .style()
        .pos(Pos::new(HPos::Right, VPos::Bottom));
    root.draw(&Text::new(
        footnote.to_string(),
        (width as i32 - pad, height as i32 - pad),
        style,
    ))?;

    root.present()?;
    Ok(())
}

/// Draws a chart on its own, without title or footnote.
#[cfg(test)]
pub(crate) fn sketch<C: Chart>(chart: &C, theme: &Theme) -> std::result::Result<String, DrawError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, theme.size()).into_drawing_area();
        root.fill(&theme.background)?;
        chart.draw(&root, theme)?;
        root.present()?;
    }
    Ok(svg)
}

/// Draws charts and writes them to the plot folder.
pub struct Renderer {
    theme: Theme,
    output: OutputSettings,
    data_folder: PathBuf,
    freshness: FreshnessCache,
    viewer: Box<dyn Viewer>,
}

impl Renderer {
    pub fn new(
        theme: Theme,
        output: OutputSettings,
        data_folder: impl Into<PathBuf>,
        freshness: FreshnessCache,
    ) -> Self {
        Self {
            theme,
            output,
            data_folder: data_folder.into(),
            freshness,
            viewer: Box::new(SystemViewer::default()),
        }
    }

    /// Replaces the viewer used for `show`.
    pub fn with_viewer(mut self, viewer: Box<dyn Viewer>) -> Self {
        self.viewer = viewer;
        self
    }

    /// Renders one chart and returns the paths of the saved artifacts.
    ///
    /// Every call opens new drawing areas, so a failing chart leaves
    /// nothing behind for the next one and writes no file.
    pub fn render<C: Chart>(&mut self, title: &str, chart: &C) -> Result<Vec<PathBuf>> {
        let timestamp = self.freshness.get_timestamp(&self.data_folder)?;
        let footnote = footnote_text(&timestamp);

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.theme.size()).into_drawing_area();
            paint(&root, &self.theme, title, &footnote, chart)
                .map_err(|e| PlotError::render(title, e.0))?;
        }
        debug!("Rendered '{}' ({} bytes of SVG)", title, svg.len());

        let saved = if self.output.save {
            self.save(title, &footnote, chart, &svg)?
        } else {
            Vec::new()
        };

        if self.output.show {
            let target = match saved.first() {
                Some(path) => path.clone(),
                None => write_temp_svg(&svg)?,
            };
            if let Err(e) = self.viewer.open(&target) {
                warn!("Could not open {}: {}", target.display(), e);
            }
        }

        Ok(saved)
    }

    fn save<C: Chart>(
        &self,
        title: &str,
        footnote: &str,
        chart: &C,
        svg: &str,
    ) -> Result<Vec<PathBuf>> {
        let stem = filename::sanitize(title);
        let mut saved = Vec::new();

        for &format in &self.output.formats {
            let path = artifact_path(&self.output.plot_folder, format, &stem);
            if let Some(folder) = path.parent().filter(|folder| !folder.is_dir()) {
                return Err(PlotError::MissingFolder {
                    path: folder.to_path_buf(),
                });
            }

            match format {
                ImageFormat::Svg => {
                    std::fs::write(&path, svg).map_err(|e| PlotError::io(&path, e))?;
                }
                ImageFormat::Png => {
                    let root = BitMapBackend::new(&path, self.theme.size()).into_drawing_area();
                    paint(&root, &self.theme, title, footnote, chart).map_err(|e| {
                        PlotError::Rasterize {
                            path: path.clone(),
                            message: e.0,
                        }
                    })?;
                }
            }

            info!("Saved {}", path.display());
            saved.push(path);
        }

        Ok(saved)
    }
}

/// Writes a figure to a temporary file that outlives the process, so an
/// external viewer can still read it.
fn write_temp_svg(svg: &str) -> Result<PathBuf> {
    let temp_dir = std::env::temp_dir();
    let mut file = tempfile::Builder::new()
        .prefix("survey-plotter-")
        .suffix(".svg")
        .tempfile()
        .map_err(|e| PlotError::io(&temp_dir, e))?;
    file.write_all(svg.as_bytes())
        .map_err(|e| PlotError::io(file.path(), e))?;
    file.into_temp_path()
        .keep()
        .map_err(|e| PlotError::io(&temp_dir, e.error))
}
