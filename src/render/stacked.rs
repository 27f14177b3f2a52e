//! Stacked area chart over a shared x grid.

use super::axes::{frame, legend, TickFormat};
use super::line::SeriesLayout;
use super::stats::{hatch_lines, interp, stack, Band};
use super::theme::Theme;
use super::{Chart, DrawError};
use crate::models::Table;
use plotters::coord::Shift;
use plotters::prelude::*;

pub const HATCHES: [&str; 3] = ["//", "\\\\", "||"];
/// Distance between hatch strokes in pixels.
const HATCH_SPACING_PX: f64 = 18.0;
const FILL_OPACITY: f64 = 0.55;

#[derive(Debug, Clone)]
pub struct StackedAreaChart<'a> {
    pub table: &'a Table,
    pub layout: SeriesLayout,
}

impl<'a> StackedAreaChart<'a> {
    pub fn new(table: &'a Table, layout: SeriesLayout) -> Self {
        Self { table, layout }
    }

    /// Sorted, de-duplicated x values across the whole table.
    pub fn grid(&self) -> Result<Vec<f64>, DrawError> {
        let mut xs = self
            .table
            .numeric_column(&self.layout.x_column)
            .ok_or_else(|| DrawError::new(format!("missing column '{}'", self.layout.x_column)))?;
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        if xs.is_empty() {
            return Err(DrawError::new(format!(
                "no numeric values in '{}'",
                self.layout.x_column
            )));
        }
        Ok(xs)
    }

    /// Grid plus one band per category, bottom to top.
    pub fn bands(&self) -> Result<(Vec<f64>, Vec<Band>), DrawError> {
        let grid = self.grid()?;
        let contributions = self
            .layout
            .categories
            .iter()
            .map(|category| {
                let points = self.layout.points(self.table, category)?;
                Ok(grid
                    .iter()
                    .filter_map(|x| interp(*x, &points))
                    .collect::<Vec<_>>())
            })
            .collect::<Result<Vec<_>, DrawError>>()?;
        Ok((grid, stack(&contributions)))
    }
}

impl Chart for StackedAreaChart<'_> {
    fn draw<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        theme: &Theme,
    ) -> Result<(), DrawError> {
        let layout = &self.layout;
        layout.check(self.table)?;
        let (grid, bands) = self.bands()?;

        let mut chart = frame(area, theme, &layout.axis_spec(TickFormat::Percent))?;
        let (w, h) = chart.plotting_area().dim_in_pixel();
        let units_per_px = (
            (layout.x_limits.1 - layout.x_limits.0) / f64::from(w.max(1)),
            (layout.y_limits.1 - layout.y_limits.0) / f64::from(h.max(1)),
        );

        for (i, (category, band)) in layout.categories.iter().zip(&bands).enumerate() {
            let color = theme.color(i);
            // upper edge left to right, lower edge back
            let outline: Vec<(f64, f64)> = grid
                .iter()
                .copied()
                .zip(band.upper.iter().copied())
                .chain(grid.iter().copied().zip(band.lower.iter().copied()).rev())
                .collect();
            chart
                .draw_series(std::iter::once(Polygon::new(
                    outline,
                    color.mix(FILL_OPACITY).filled(),
                )))?
                .label(category.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 8), (x + 20, y + 8)], color.filled()));

            let hatch = HATCHES[i % HATCHES.len()];
            let stroke = theme.background.stroke_width(2);
            chart.draw_series(
                hatch_lines(&grid, band, hatch, units_per_px, HATCH_SPACING_PX)
                    .into_iter()
                    .map(|line| PathElement::new(line, stroke)),
            )?;
        }
        legend(&mut chart, theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::sketch;
    use crate::render::line::tests::semester_table;

    fn layout(categories: &[&str]) -> SeriesLayout {
        SeriesLayout {
            category_column: "Course".to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            x_column: "Semester".to_string(),
            y_column: "Share".to_string(),
            x_label: "Semester".to_string(),
            y_label: "Share".to_string(),
            x_limits: (1.0, 3.0),
            y_limits: (0.0, 1.0),
        }
    }

    #[test]
    fn test_grid_is_sorted_and_unique() {
        let table = semester_table();
        let chart = StackedAreaChart::new(&table, layout(&["Math", "Art"]));
        assert_eq!(chart.grid().unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_band_tops_are_cumulative() {
        let table = semester_table();
        let chart = StackedAreaChart::new(&table, layout(&["Math", "Art"]));
        let (grid, bands) = chart.bands().unwrap();

        // Art is interpolated at semester 2
        let math = [0.1, 0.2, 0.3];
        let art = [0.5, 0.45, 0.4];
        for i in 0..grid.len() {
            assert!((bands[0].upper[i] - math[i]).abs() < 1e-12);
            assert!((bands[1].lower[i] - math[i]).abs() < 1e-12);
            assert!((bands[1].upper[i] - (math[i] + art[i])).abs() < 1e-12);
        }
    }

    #[test]
    fn test_every_band_gets_hatched() {
        let table = semester_table();
        let chart = StackedAreaChart::new(&table, layout(&["Math", "Art"]));
        let (grid, bands) = chart.bands().unwrap();
        for (band, pattern) in bands.iter().zip(HATCHES) {
            assert!(!hatch_lines(&grid, band, pattern, (0.01, 0.002), 18.0).is_empty());
        }

        let svg = sketch(&chart, &Theme::default()).unwrap();
        assert_eq!(svg.matches("<polygon").count(), 2);
        assert!(svg.contains(">Math</text>"));
        assert!(svg.contains("%</text>"));
    }

    #[test]
    fn test_category_without_rows_fails() {
        let table = semester_table();
        let chart = StackedAreaChart::new(&table, layout(&["Music"]));
        assert!(chart.bands().is_err());
    }
}
