//! Smoothed rating distributions with mean markers.

use super::axes::{frame, legend, AxisSpec, TickFormat};
use super::stats::kde;
use super::theme::Theme;
use super::{Chart, DrawError};
use crate::models::RatingTable;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

pub const DEFAULT_DOMAIN: (f64, f64) = (1.0, 10.0);
pub const DEFAULT_BANDWIDTH: f64 = 0.75;
pub const DEFAULT_Y_MAX: f64 = 0.25;
const CURVE_POINTS: usize = 300;
const AGGREGATE_LABEL: &str = "Average Smoothed";

/// One density curve per group plus an aggregate curve over all ratings.
#[derive(Debug, Clone)]
pub struct DensityChart {
    pub ratings: RatingTable,
    /// Dashed rules drawn at each `(label, mean)`.
    pub group_means: Vec<(String, f64)>,
    /// Heavier rule for the mean over everything.
    pub overall_mean: Option<f64>,
    /// Prefix for group legend labels, usually the grouping column.
    pub group_label: String,
    pub x_label: String,
    pub y_label: String,
    pub domain: (f64, f64),
    pub bandwidth: f64,
    pub y_max: f64,
}

impl DensityChart {
    pub fn new(ratings: RatingTable) -> Self {
        Self {
            ratings,
            group_means: Vec::new(),
            overall_mean: None,
            group_label: String::new(),
            x_label: "x".to_string(),
            y_label: "y".to_string(),
            domain: DEFAULT_DOMAIN,
            bandwidth: DEFAULT_BANDWIDTH,
            y_max: DEFAULT_Y_MAX,
        }
    }

    /// Uses the table's own group means and overall mean for the rules.
    pub fn with_table_means(mut self) -> Self {
        self.group_means = self.ratings.group_means();
        self.overall_mean = self.ratings.mean();
        self
    }

    fn curve(&self, samples: &[f64]) -> Result<Vec<(f64, f64)>, DrawError> {
        kde(samples, self.bandwidth, self.domain, CURVE_POINTS).ok_or_else(|| {
            DrawError::new(format!(
                "cannot smooth {} ratings with bandwidth {}",
                samples.len(),
                self.bandwidth
            ))
        })
    }
}

impl Chart for DensityChart {
    fn draw<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        theme: &Theme,
    ) -> Result<(), DrawError> {
        if self.ratings.is_empty() {
            return Err(DrawError::new("no ratings to plot"));
        }
        if !(self.domain.1 > self.domain.0) {
            return Err(DrawError::new(format!(
                "empty rating domain {}..{}",
                self.domain.0, self.domain.1
            )));
        }

        // smooth everything first so a bad group leaves the area blank
        let curves = self.curves()?;
        let spec = AxisSpec::new(self.domain, (0.0, self.y_max))
            .labels(&self.x_label, &self.y_label)
            .formats(TickFormat::Plain, TickFormat::Percent);
        let mut chart = frame(area, theme, &spec)?;

        let width = theme.stroke(1.0);
        let aggregate = curves.len() - 1;
        for (i, (label, curve)) in curves.into_iter().enumerate() {
            let color = if i == aggregate {
                theme.accent()
            } else {
                theme.color(i)
            };
            let style = color.stroke_width(width);
            chart
                .draw_series(LineSeries::new(curve, style))?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }

        let dash = (width * 3) as i32;
        for rule in self.mean_rules() {
            let style = match rule.color {
                None => theme.accent().mix(0.5).stroke_width(width * 2),
                Some(i) => theme.color(i).stroke_width(width),
            };
            chart
                .draw_series(DashedLineSeries::new(
                    vec![(rule.x, 0.0), (rule.x, self.y_max)],
                    dash,
                    dash / 2 + 1,
                    style,
                ))?
                .label(rule.label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }

        legend(&mut chart, theme)
    }
}

/// Dashed vertical marker at a mean.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanRule {
    pub label: String,
    pub x: f64,
    /// Palette index of the group; `None` for the overall mean.
    pub color: Option<usize>,
}

impl DensityChart {
    /// Labelled curves: one per group, then the aggregate.
    pub fn curves(&self) -> Result<Vec<(String, Vec<(f64, f64)>)>, DrawError> {
        let mut curves = Vec::new();
        for group in self.ratings.groups() {
            let label = format!("{} {}", self.group_label, group).trim().to_string();
            curves.push((label, self.curve(&self.ratings.ratings_for(group))?));
        }
        curves.push((
            AGGREGATE_LABEL.to_string(),
            self.curve(&self.ratings.ratings())?,
        ));
        Ok(curves)
    }

    /// Mean markers that fall inside the rating domain.
    pub fn mean_rules(&self) -> Vec<MeanRule> {
        let groups = self.group_means.iter().enumerate().map(|(i, (label, mean))| MeanRule {
            label: format!("Mean ({})", label),
            x: *mean,
            color: Some(i),
        });
        let overall = self.overall_mean.map(|mean| MeanRule {
            label: "Mean".to_string(),
            x: mean,
            color: None,
        });
        groups
            .chain(overall)
            .filter(|rule| rule.x >= self.domain.0 && rule.x <= self.domain.1)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::sketch;

    fn ratings() -> RatingTable {
        RatingTable::from_pairs([(7.0, "A"), (8.0, "A"), (3.0, "B"), (4.0, "B"), (9.0, "A")])
    }

    fn draw(chart: &DensityChart) -> Result<String, DrawError> {
        sketch(chart, &Theme::default())
    }

    #[test]
    fn test_curve_per_group_plus_aggregate() {
        let mut chart = DensityChart::new(ratings()).with_table_means();
        chart.group_label = "Semester".to_string();

        let labels: Vec<String> = chart.curves().unwrap().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Semester A", "Semester B", "Average Smoothed"]);

        let svg = draw(&chart).unwrap();
        assert!(svg.contains("Semester A"));
        assert!(svg.contains("Average Smoothed"));
        assert!(svg.contains("Mean (A)"));
        assert!(svg.contains("%</text>"));
    }

    #[test]
    fn test_overall_mean_rule_comes_last() {
        let chart = DensityChart::new(ratings()).with_table_means();
        let rules = chart.mean_rules();

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].label, "Mean (A)");
        assert!((rules[0].x - 8.0).abs() < 1e-12);
        assert_eq!(rules[2].label, "Mean");
        assert_eq!(rules[2].color, None);
        assert!((rules[2].x - 6.2).abs() < 1e-12);
    }

    #[test]
    fn test_mean_outside_domain_is_not_drawn() {
        let mut chart = DensityChart::new(ratings());
        chart.group_means = vec![("far".to_string(), 42.0), ("near".to_string(), 5.0)];
        let rules = chart.mean_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].label, "Mean (near)");
        assert_eq!(rules[0].color, Some(1));
    }

    #[test]
    fn test_empty_ratings_fail() {
        let err = draw(&DensityChart::new(RatingTable::default())).unwrap_err();
        assert_eq!(err.to_string(), "no ratings to plot");
    }

    #[test]
    fn test_invalid_bandwidth_fails() {
        let mut chart = DensityChart::new(ratings());
        chart.bandwidth = 0.0;
        assert!(draw(&chart).is_err());
    }
}
