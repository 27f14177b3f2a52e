//! Pie chart of a categorical series.

use super::theme::Theme;
use super::{Chart, DrawError};
use crate::models::CategoricalSeries;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;

/// Slices start at twelve o'clock and run counter-clockwise.
const START_ANGLE: f64 = PI / 2.0;
/// Percentage labels sit at this fraction of the radius.
const PCT_DISTANCE: f64 = 0.6;
/// Category labels sit just outside the pie.
const LABEL_DISTANCE: f64 = 1.1;
const LABEL_BOX_OPACITY: f64 = 0.3;
/// Arc segments per full turn.
const ARC_STEPS: f64 = 360.0;

/// One slice, angles in radians measured counter-clockwise from east.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub share: f64,
    pub start: f64,
    pub end: f64,
}

impl Slice {
    pub fn middle(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.share * 100.0)
    }
}

#[derive(Debug, Clone)]
pub struct PieChart {
    series: CategoricalSeries,
}

impl PieChart {
    pub fn new(series: CategoricalSeries) -> Self {
        Self { series }
    }

    /// Slices ordered by label, so input order never changes the figure.
    pub fn slices(&self) -> Result<Vec<Slice>, DrawError> {
        let total = self.series.total();
        if total == 0 {
            return Err(DrawError::new("pie chart has no counts"));
        }

        let mut angle = START_ANGLE;
        Ok(self
            .series
            .sorted_by_label()
            .into_iter()
            .map(|(label, count)| {
                let share = count as f64 / total as f64;
                let start = angle;
                angle += share * 2.0 * PI;
                Slice {
                    label: label.to_string(),
                    share,
                    start,
                    end: angle,
                }
            })
            .collect())
    }
}

impl Chart for PieChart {
    fn draw<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        theme: &Theme,
    ) -> Result<(), DrawError> {
        let slices = self.slices()?;

        let (width, height) = area.dim_in_pixel();
        let center = (f64::from(width) / 2.0, f64::from(height) / 2.0);
        let radius = f64::from(width.min(height)) * 0.4;

        for (i, slice) in slices.iter().enumerate() {
            let fill = theme.color(i).filled();
            if slice.share >= 1.0 {
                area.draw(&Circle::new(pixel(center), radius.round() as i32, fill))?;
            } else {
                area.draw(&Polygon::new(wedge(center, radius, slice), fill))?;
            }

            let middle = slice.middle();
            let anchor = if middle.cos() >= 0.0 {
                HPos::Left
            } else {
                HPos::Right
            };
            let style = theme.description.style().pos(Pos::new(anchor, VPos::Center));
            let at = polar(center, radius * LABEL_DISTANCE, middle);
            area.draw(&Text::new(slice.label.clone(), pixel(at), style))?;
        }

        // percentages go on top of every wedge
        let style = theme
            .description
            .style()
            .pos(Pos::new(HPos::Center, VPos::Center));
        let box_fill = theme.background.mix(LABEL_BOX_OPACITY).filled();
        for slice in &slices {
            let text = slice.percent_label();
            let (x, y) = pixel(polar(center, radius * PCT_DISTANCE, slice.middle()));
            let (w, h) = area.estimate_text_size(&text, &style)?;
            let pad = (h / 3) as i32;
            let (half_w, half_h) = ((w / 2) as i32 + pad, (h / 2) as i32 + pad);
            area.draw(&Rectangle::new(
                [(x - half_w, y - half_h), (x + half_w, y + half_h)],
                box_fill,
            ))?;
            area.draw(&Text::new(text, (x, y), style.clone()))?;
        }
        Ok(())
    }
}

/// Wedge outline in pixel space: center, then the arc.
fn wedge(center: (f64, f64), radius: f64, slice: &Slice) -> Vec<(i32, i32)> {
    let sweep = slice.end - slice.start;
    let steps = ((sweep / (2.0 * PI)) * ARC_STEPS).ceil().max(2.0) as usize;
    std::iter::once(pixel(center))
        .chain((0..=steps).map(|i| {
            let angle = slice.start + sweep * i as f64 / steps as f64;
            pixel(polar(center, radius, angle))
        }))
        .collect()
}

/// Screen y grows downwards, so positive angles turn counter-clockwise.
fn polar(center: (f64, f64), radius: f64, angle: f64) -> (f64, f64) {
    (
        center.0 + radius * angle.cos(),
        center.1 - radius * angle.sin(),
    )
}

fn pixel((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::sketch;

    fn draw(series: CategoricalSeries) -> Result<String, DrawError> {
        sketch(&PieChart::new(series), &Theme::default())
    }

    #[test]
    fn test_slices_are_ordered_by_label() {
        let chart = PieChart::new(CategoricalSeries::from_pairs([("Yes", 2), ("No", 1)]));
        let slices = chart.slices().unwrap();

        assert_eq!(slices[0].label, "No");
        assert_eq!(slices[0].percent_label(), "33.3%");
        assert_eq!(slices[1].percent_label(), "66.7%");
        assert!((slices[0].start - PI / 2.0).abs() < 1e-12);
        assert!((slices[1].end - (PI / 2.0 + 2.0 * PI)).abs() < 1e-9);

        let svg = draw(CategoricalSeries::from_pairs([("Yes", 2), ("No", 1)])).unwrap();
        let no = svg.find(">No</text>").unwrap();
        let yes = svg.find(">Yes</text>").unwrap();
        assert!(no < yes);
        assert!(svg.contains(">33.3%</text>"));
    }

    #[test]
    fn test_first_slice_turns_counter_clockwise() {
        let chart = PieChart::new(CategoricalSeries::from_pairs([("a", 1), ("b", 3)]));
        let slices = chart.slices().unwrap();
        // a quarter from twelve o'clock ends at nine o'clock
        let (x, y) = polar((0.0, 0.0), 1.0, slices[0].end);
        assert!((x + 1.0).abs() < 1e-9 && y.abs() < 1e-9);
    }

    #[test]
    fn test_permuted_series_render_identically() {
        let a = draw(CategoricalSeries::from_pairs([("b", 3), ("a", 1), ("c", 2)])).unwrap();
        let b = draw(CategoricalSeries::from_pairs([("c", 2), ("b", 3), ("a", 1)])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_category_is_full_circle() {
        let svg = draw(CategoricalSeries::from_pairs([("Yes", 4)])).unwrap();
        assert!(svg.contains("<circle"));
        assert!(svg.contains(">100.0%</text>"));
    }

    #[test]
    fn test_zero_total_is_an_error() {
        assert!(draw(CategoricalSeries::default()).is_err());
        assert!(draw(CategoricalSeries::from_pairs([("Yes", 0)])).is_err());
    }
}
