//! One line per category over two numeric columns.

use super::axes::{frame, legend, AxisSpec, TickFormat};
use super::stats::sort_by_x;
use super::theme::Theme;
use super::{Chart, DrawError};
use crate::models::Table;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Which columns of a table feed a per-category series chart.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesLayout {
    pub category_column: String,
    /// Category values to plot, in drawing order.
    pub categories: Vec<String>,
    pub x_column: String,
    pub y_column: String,
    pub x_label: String,
    pub y_label: String,
    pub x_limits: (f64, f64),
    pub y_limits: (f64, f64),
}

impl SeriesLayout {
    /// Numeric `(x, y)` points of one category, sorted by x.
    pub fn points(&self, table: &Table, category: &str) -> Result<Vec<(f64, f64)>, DrawError> {
        let rows = table.filter_eq(&self.category_column, category);
        let mut points = rows
            .numeric_pairs(&self.x_column, &self.y_column)
            .ok_or_else(|| {
                DrawError::new(format!(
                    "missing column '{}' or '{}'",
                    self.x_column, self.y_column
                ))
            })?;
        if points.is_empty() {
            return Err(DrawError::new(format!(
                "no numeric rows for {} = '{}'",
                self.category_column, category
            )));
        }
        sort_by_x(&mut points);
        Ok(points)
    }

    pub(crate) fn check(&self, table: &Table) -> Result<(), DrawError> {
        if self.categories.is_empty() {
            return Err(DrawError::new("no categories to plot"));
        }
        if table.column_index(&self.category_column).is_none() {
            return Err(DrawError::new(format!(
                "missing column '{}'",
                self.category_column
            )));
        }
        if !(self.x_limits.1 > self.x_limits.0) || !(self.y_limits.1 > self.y_limits.0) {
            return Err(DrawError::new("axis limits must be increasing"));
        }
        Ok(())
    }

    /// Frame settings with the given y tick format.
    pub(crate) fn axis_spec(&self, y_format: TickFormat) -> AxisSpec {
        AxisSpec::new(self.x_limits, self.y_limits)
            .labels(&self.x_label, &self.y_label)
            .formats(TickFormat::Plain, y_format)
    }
}

/// Multi-category line chart.
#[derive(Debug, Clone)]
pub struct LineChart<'a> {
    pub table: &'a Table,
    pub layout: SeriesLayout,
}

impl<'a> LineChart<'a> {
    pub fn new(table: &'a Table, layout: SeriesLayout) -> Self {
        Self { table, layout }
    }
}

impl Chart for LineChart<'_> {
    fn draw<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        theme: &Theme,
    ) -> Result<(), DrawError> {
        let layout = &self.layout;
        layout.check(self.table)?;

        // collect everything first so a bad category leaves the area blank
        let series = layout
            .categories
            .iter()
            .map(|category| layout.points(self.table, category))
            .collect::<Result<Vec<_>, _>>()?;

        let mut chart = frame(area, theme, &layout.axis_spec(TickFormat::Plain))?;
        let width = theme.stroke(1.0);
        for (i, (category, points)) in layout.categories.iter().zip(series).enumerate() {
            let style = theme.color(i).stroke_width(width);
            chart
                .draw_series(LineSeries::new(points, style))?
                .label(category.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
        legend(&mut chart, theme)
    }
}
