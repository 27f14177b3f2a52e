//! Cartesian frame shared by the line, stacked, density and timeline charts.

use super::stats::{format_percent, format_tick};
use super::theme::Theme;
use super::DrawError;
use chrono::{DateTime, Duration, Utc};
use plotters::chart::{ChartContext, SeriesLabelPosition};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

pub type Frame<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// How tick values are printed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickFormat {
    Plain,
    /// Fractions shown as whole percentages.
    Percent,
    /// Days after the given instant, shown as a calendar date.
    Days(DateTime<Utc>),
}

impl TickFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            TickFormat::Plain => format_tick(value),
            TickFormat::Percent => format_percent(value),
            TickFormat::Days(origin) => {
                let offset = Duration::seconds((value * 86_400.0).round() as i64);
                (*origin + offset).format("%d.%m.%Y").to_string()
            }
        }
    }
}

/// Ranges, labels and tick formats of a two-dimensional frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub x_label: String,
    pub y_label: String,
    pub x_format: TickFormat,
    pub y_format: TickFormat,
}

impl AxisSpec {
    pub fn new(x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self {
            x_range,
            y_range,
            x_label: String::new(),
            y_label: String::new(),
            x_format: TickFormat::Plain,
            y_format: TickFormat::Plain,
        }
    }

    pub fn labels(mut self, x: &str, y: &str) -> Self {
        self.x_label = x.to_string();
        self.y_label = y.to_string();
        self
    }

    pub fn formats(mut self, x: TickFormat, y: TickFormat) -> Self {
        self.x_format = x;
        self.y_format = y;
        self
    }

    fn check(&self) -> Result<(), DrawError> {
        let increasing = |(lo, hi): (f64, f64)| lo.is_finite() && hi.is_finite() && hi > lo;
        if !increasing(self.x_range) || !increasing(self.y_range) {
            return Err(DrawError::new("axis limits must be increasing"));
        }
        Ok(())
    }
}

/// Builds the frame and draws its axes, ticks and axis labels.
pub fn frame<'a, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    theme: &Theme,
    spec: &AxisSpec,
) -> Result<Frame<'a, DB>, DrawError> {
    spec.check()?;
    let label_space = (theme.description.size_px * 3.0).round() as u32;

    let mut chart = ChartBuilder::on(area)
        .margin(theme.description.size_px.round() as u32)
        .x_label_area_size(label_space)
        .y_label_area_size(label_space)
        .build_cartesian_2d(
            spec.x_range.0..spec.x_range.1,
            spec.y_range.0..spec.y_range.1,
        )?;

    let x_format = |v: &f64| spec.x_format.format(*v);
    let y_format = |v: &f64| spec.y_format.format(*v);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(theme.grid_color.mix(0.6))
        .light_line_style(TRANSPARENT)
        .axis_style(theme.text_color)
        .label_style(theme.description.style())
        .axis_desc_style(theme.description.style())
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .x_labels(10)
        .y_labels(6)
        .x_label_formatter(&x_format)
        .y_label_formatter(&y_format)
        .draw()?;

    Ok(chart)
}

/// Draws the legend box for every labelled series.
pub fn legend<'a, DB: DrawingBackend + 'a>(chart: &mut Frame<'a, DB>, theme: &Theme) -> Result<(), DrawError> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(theme.background.mix(0.8))
        .border_style(theme.text_color)
        .label_font(theme.description.style())
        .draw()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tick_formats() {
        assert_eq!(TickFormat::Plain.format(2.0), "2");
        assert_eq!(TickFormat::Percent.format(0.25), "25%");

        let origin = Utc.with_ymd_and_hms(2023, 10, 2, 10, 0, 0).unwrap();
        assert_eq!(TickFormat::Days(origin).format(0.0), "02.10.2023");
        assert_eq!(TickFormat::Days(origin).format(30.0), "01.11.2023");
    }

    #[test]
    fn test_flat_ranges_are_rejected() {
        assert!(AxisSpec::new((1.0, 10.0), (0.0, 1.0)).check().is_ok());
        assert!(AxisSpec::new((1.0, 1.0), (0.0, 1.0)).check().is_err());
        assert!(AxisSpec::new((1.0, 2.0), (0.5, f64::NAN)).check().is_err());
    }
}
