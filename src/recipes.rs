//! Chart recipes and the runner that turns them into rendered charts.
//!
//! A recipe names a chart kind, a title, the columns to aggregate and
//! optional equality filters. Recipes are declared as `[[charts]]` entries
//! in the configuration file.

use crate::error::{PlotError, Result};
use crate::models::{parse_export_timestamp, CategoricalSeries, Table};
use crate::render::density::{DEFAULT_BANDWIDTH, DEFAULT_DOMAIN, DEFAULT_Y_MAX};
use crate::render::line::SeriesLayout;
use crate::render::{
    DensityChart, LineChart, PieChart, Renderer, StackedAreaChart, TimelineChart,
};
use anyhow::{bail, ensure};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

/// Keeps only rows whose `column` equals `equals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub equals: String,
}

/// One chart to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartRecipe {
    /// Respondents against the whole population.
    Participation(ParticipationRecipe),
    /// Answer distribution of one column.
    Pie(PieRecipe),
    /// Smoothed rating distribution per group.
    Density(DensityRecipe),
    /// One line per category.
    Line(SeriesRecipe),
    /// Stacked areas per category.
    StackedArea(SeriesRecipe),
    /// Cumulative responses over the export timestamps.
    Timeline(TimelineRecipe),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipationRecipe {
    pub title: String,
    /// Number of people who could have answered.
    pub population: u64,
}

/// Counts of one column over a filtered slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountRecipe {
    pub column: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Labels removed after counting.
    #[serde(default)]
    pub drop: Vec<String>,
    /// Labels renamed after counting.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieRecipe {
    pub title: String,
    pub column: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub drop: Vec<String>,
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    /// Further counts added on top, evaluated on the already filtered slice.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub combine: Vec<CountRecipe>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityRecipe {
    pub title: String,
    pub rating_column: String,
    pub group_column: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Defaults to the rating column name.
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default = "default_share_label")]
    pub y_label: String,
    #[serde(default = "default_domain")]
    pub domain: [f64; 2],
    #[serde(default = "default_bandwidth")]
    pub bandwidth: f64,
    #[serde(default = "default_y_max")]
    pub y_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecipe {
    pub title: String,
    pub category_column: String,
    pub categories: Vec<String>,
    pub x_column: String,
    pub y_column: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Defaults to the x column name.
    #[serde(default)]
    pub x_label: Option<String>,
    /// Defaults to the y column name.
    #[serde(default)]
    pub y_label: Option<String>,
    #[serde(default = "default_domain")]
    pub x_limits: [f64; 2],
    #[serde(default = "default_unit_range")]
    pub y_limits: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRecipe {
    pub title: String,
    /// Column holding form export timestamps.
    pub column: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default = "default_date_label")]
    pub x_label: String,
    #[serde(default = "default_responses_label")]
    pub y_label: String,
}

fn default_date_label() -> String {
    "Date".to_string()
}

fn default_responses_label() -> String {
    "Responses".to_string()
}

fn default_share_label() -> String {
    "Share".to_string()
}

fn default_domain() -> [f64; 2] {
    [DEFAULT_DOMAIN.0, DEFAULT_DOMAIN.1]
}

fn default_bandwidth() -> f64 {
    DEFAULT_BANDWIDTH
}

fn default_y_max() -> f64 {
    DEFAULT_Y_MAX
}

fn default_unit_range() -> [f64; 2] {
    [0.0, 1.0]
}

impl ChartRecipe {
    pub fn title(&self) -> &str {
        match self {
            ChartRecipe::Participation(r) => &r.title,
            ChartRecipe::Pie(r) => &r.title,
            ChartRecipe::Density(r) => &r.title,
            ChartRecipe::Line(r) | ChartRecipe::StackedArea(r) => &r.title,
            ChartRecipe::Timeline(r) => &r.title,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChartRecipe::Participation(_) => "participation",
            ChartRecipe::Pie(_) => "pie",
            ChartRecipe::Density(_) => "density",
            ChartRecipe::Line(_) => "line",
            ChartRecipe::StackedArea(_) => "stacked_area",
            ChartRecipe::Timeline(_) => "timeline",
        }
    }

    pub fn filters(&self) -> &[Filter] {
        match self {
            ChartRecipe::Pie(r) => r.filters.as_slice(),
            ChartRecipe::Density(r) => r.filters.as_slice(),
            ChartRecipe::Line(r) | ChartRecipe::StackedArea(r) => r.filters.as_slice(),
            ChartRecipe::Timeline(r) => r.filters.as_slice(),
            ChartRecipe::Participation(_) => &[],
        }
    }

    /// Checks settings that do not depend on the data.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.title().trim().is_empty() {
            bail!("chart title must not be empty");
        }
        match self {
            ChartRecipe::Participation(r) => {
                ensure!(r.population > 0, "population must be positive");
            }
            ChartRecipe::Pie(r) => {
                ensure!(!r.column.is_empty(), "pie column must be set");
                for extra in &r.combine {
                    ensure!(!extra.column.is_empty(), "combined column must be set");
                }
            }
            ChartRecipe::Density(r) => {
                ensure!(
                    r.bandwidth.is_finite() && r.bandwidth > 0.0,
                    "bandwidth must be positive"
                );
                ensure!(r.domain[1] > r.domain[0], "rating domain must be increasing");
                ensure!(r.y_max > 0.0, "y_max must be positive");
            }
            ChartRecipe::Line(r) | ChartRecipe::StackedArea(r) => {
                ensure!(!r.categories.is_empty(), "at least one category is required");
                ensure!(r.x_limits[1] > r.x_limits[0], "x limits must be increasing");
                ensure!(r.y_limits[1] > r.y_limits[0], "y limits must be increasing");
            }
            ChartRecipe::Timeline(r) => {
                ensure!(!r.column.is_empty(), "timestamp column must be set");
            }
        }
        Ok(())
    }
}

/// Rows of `table` matching every filter.
pub fn apply_filters(table: &Table, filters: &[Filter]) -> Table {
    let mut slice = table.clone();
    for filter in filters {
        slice = slice.filter_eq(&filter.column, &filter.equals);
    }
    slice
}

fn require_column(table: &Table, title: &str, column: &str) -> Result<()> {
    if table.column_index(column).is_none() {
        return Err(PlotError::render(title, format!("missing column '{}'", column)));
    }
    Ok(())
}

fn count(
    table: &Table,
    title: &str,
    column: &str,
    drop: &[String],
    rename: &BTreeMap<String, String>,
) -> Result<CategoricalSeries> {
    let mut series = table
        .value_counts(column)
        .ok_or_else(|| PlotError::render(title, format!("missing column '{}'", column)))?;
    for label in drop {
        series = series.without(label);
    }
    for (from, to) in rename {
        series = series.renamed(from, to);
    }
    Ok(series)
}

/// Participant counts against the population.
pub fn participation_series(table: &Table, population: u64) -> CategoricalSeries {
    let participants = table.len() as u64;
    CategoricalSeries::from_pairs([
        ("Non-Participants", population.saturating_sub(participants)),
        ("Participants", participants),
    ])
}

/// Category counts for a pie recipe.
pub fn pie_series(table: &Table, recipe: &PieRecipe) -> Result<CategoricalSeries> {
    let slice = apply_filters(table, &recipe.filters);
    let mut series = count(&slice, &recipe.title, &recipe.column, &recipe.drop, &recipe.rename)?;
    for extra in &recipe.combine {
        let sub = apply_filters(&slice, &extra.filters);
        let counts = count(&sub, &recipe.title, &extra.column, &extra.drop, &extra.rename)?;
        series = series.combined(&counts);
    }
    Ok(series)
}

/// Parsed export timestamps of one column.
///
/// Cells that are not export timestamps are skipped with a warning; a column
/// without a single parseable cell is an error.
pub fn timeline_times(table: &Table, title: &str, column: &str) -> Result<Vec<DateTime<Utc>>> {
    let cells = table
        .column(column)
        .ok_or_else(|| PlotError::render(title, format!("missing column '{}'", column)))?;

    let mut times = Vec::new();
    let mut skipped = 0usize;
    for cell in cells.into_iter().flatten() {
        match parse_export_timestamp(cell) {
            Some(time) => times.push(time),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("'{}': skipped {} cells of '{}' that are not export timestamps", title, skipped, column);
    }
    if times.is_empty() {
        return Err(PlotError::render(
            title,
            format!("no export timestamps in column '{}'", column),
        ));
    }
    Ok(times)
}

fn series_layout(recipe: &SeriesRecipe) -> SeriesLayout {
    SeriesLayout {
        category_column: recipe.category_column.clone(),
        categories: recipe.categories.clone(),
        x_column: recipe.x_column.clone(),
        y_column: recipe.y_column.clone(),
        x_label: recipe.x_label.clone().unwrap_or_else(|| recipe.x_column.clone()),
        y_label: recipe.y_label.clone().unwrap_or_else(|| recipe.y_column.clone()),
        x_limits: (recipe.x_limits[0], recipe.x_limits[1]),
        y_limits: (recipe.y_limits[0], recipe.y_limits[1]),
    }
}

/// Slices the table for one recipe and renders it.
pub fn render_recipe(
    renderer: &mut Renderer,
    table: &Table,
    recipe: &ChartRecipe,
) -> Result<Vec<PathBuf>> {
    let title = recipe.title();
    debug!("Rendering {} chart '{}'", recipe.kind(), title);

    match recipe {
        ChartRecipe::Participation(r) => {
            let chart = PieChart::new(participation_series(table, r.population));
            renderer.render(title, &chart)
        }
        ChartRecipe::Pie(r) => {
            let chart = PieChart::new(pie_series(table, r)?);
            renderer.render(title, &chart)
        }
        ChartRecipe::Density(r) => {
            let slice = apply_filters(table, &r.filters);
            require_column(&slice, title, &r.rating_column)?;
            require_column(&slice, title, &r.group_column)?;
            let ratings = slice
                .rating_table(&r.rating_column, &r.group_column)
                .unwrap_or_default();

            let mut chart = DensityChart::new(ratings).with_table_means();
            chart.group_label = r.group_column.clone();
            chart.x_label = r.x_label.clone().unwrap_or_else(|| r.rating_column.clone());
            chart.y_label = r.y_label.clone();
            chart.domain = (r.domain[0], r.domain[1]);
            chart.bandwidth = r.bandwidth;
            chart.y_max = r.y_max;
            renderer.render(title, &chart)
        }
        ChartRecipe::Line(r) => {
            let slice = apply_filters(table, &r.filters);
            renderer.render(title, &LineChart::new(&slice, series_layout(r)))
        }
        ChartRecipe::StackedArea(r) => {
            let slice = apply_filters(table, &r.filters);
            renderer.render(title, &StackedAreaChart::new(&slice, series_layout(r)))
        }
        ChartRecipe::Timeline(r) => {
            let slice = apply_filters(table, &r.filters);
            let mut chart = TimelineChart::new(timeline_times(&slice, title, &r.column)?);
            chart.x_label = r.x_label.clone();
            chart.y_label = r.y_label.clone();
            renderer.render(title, &chart)
        }
    }
}

/// Outcome of a full run over all recipes.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Chart titles with the artifacts written for them.
    pub rendered: Vec<(String, Vec<PathBuf>)>,
    /// Chart titles with the error that stopped them.
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn artifact_count(&self) -> usize {
        self.rendered.iter().map(|(_, paths)| paths.len()).sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Renders every recipe in order. A failing chart is logged and recorded;
/// the remaining charts still run.
pub fn run_recipes(
    renderer: &mut Renderer,
    table: &Table,
    recipes: &[ChartRecipe],
    show_progress: bool,
) -> RunSummary {
    let progress = if show_progress {
        let pb = ProgressBar::new(recipes.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut summary = RunSummary::default();
    for recipe in recipes {
        let title = recipe.title().to_string();
        if let Some(ref pb) = progress {
            pb.set_message(title.clone());
        }

        match render_recipe(renderer, table, recipe) {
            Ok(paths) => summary.rendered.push((title, paths)),
            Err(e) => {
                error!("Chart '{}' failed: {}", title, e);
                summary.failed.push((title, e.to_string()));
            }
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    info!(
        "Rendered {} of {} charts",
        summary.rendered.len(),
        recipes.len()
    );
    summary
}
