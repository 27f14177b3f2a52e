//! Cumulative responses over time.

use super::axes::{frame, AxisSpec, TickFormat};
use super::theme::Theme;
use super::{Chart, DrawError};
use chrono::{DateTime, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Running response count, one step per submitted form.
#[derive(Debug, Clone)]
pub struct TimelineChart {
    times: Vec<DateTime<Utc>>,
    pub x_label: String,
    pub y_label: String,
}

impl TimelineChart {
    pub fn new(mut times: Vec<DateTime<Utc>>) -> Self {
        times.sort();
        Self {
            times,
            x_label: "Date".to_string(),
            y_label: "Responses".to_string(),
        }
    }

    /// `(days after the first response, responses so far)`.
    pub fn points(&self) -> Vec<(f64, f64)> {
        let Some(&origin) = self.times.first() else {
            return Vec::new();
        };
        self.times
            .iter()
            .enumerate()
            .map(|(i, time)| {
                let days = (*time - origin).num_seconds() as f64 / SECONDS_PER_DAY;
                (days, (i + 1) as f64)
            })
            .collect()
    }
}

impl Chart for TimelineChart {
    fn draw<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        theme: &Theme,
    ) -> Result<(), DrawError> {
        let Some(&origin) = self.times.first() else {
            return Err(DrawError::new("no timestamps to plot"));
        };
        let points = self.points();
        let last_day = points.last().map_or(0.0, |p| p.0);
        let total = points.len() as f64;

        // a single day still gets a readable axis
        let spec = AxisSpec::new((0.0, last_day.max(1.0)), (0.0, (total * 1.1).ceil()))
            .labels(&self.x_label, &self.y_label)
            .formats(TickFormat::Days(origin), TickFormat::Plain);
        let mut chart = frame(area, theme, &spec)?;
        chart.draw_series(LineSeries::new(
            points,
            theme.color(0).stroke_width(theme.stroke(1.0)),
        ))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::sketch;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 10, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_points_are_sorted_and_cumulative() {
        let chart = TimelineChart::new(vec![at(4, 0), at(2, 12), at(2, 0)]);
        assert_eq!(chart.points(), vec![(0.0, 1.0), (0.5, 2.0), (2.0, 3.0)]);
    }

    #[test]
    fn test_axis_shows_dates() {
        let chart = TimelineChart::new(vec![at(2, 0), at(5, 0)]);
        let svg = sketch(&chart, &Theme::default()).unwrap();
        assert!(svg.contains(">02.10.2023</text>"));
        assert!(svg.contains(">Responses</text>"));
    }

    #[test]
    fn test_empty_timeline_fails() {
        let err = sketch(&TimelineChart::new(Vec::new()), &Theme::default()).unwrap_err();
        assert_eq!(err.to_string(), "no timestamps to plot");
    }
}
