//! Numeric helpers behind the smoothed and stacked charts.

use std::f64::consts::PI;

/// Evenly spaced points from `lo` to `hi` inclusive.
pub fn linspace(lo: f64, hi: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![lo],
        n => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n).map(|i| lo + step * i as f64).collect()
        }
    }
}

/// Gaussian kernel density estimate evaluated on `points` grid positions
/// spanning `domain`.
///
/// The curve is rescaled so its integral over the domain is one, which keeps
/// all density mass inside the valid range. Returns `None` for an empty
/// sample or a non-positive bandwidth.
pub fn kde(
    samples: &[f64],
    bandwidth: f64,
    domain: (f64, f64),
    points: usize,
) -> Option<Vec<(f64, f64)>> {
    if samples.is_empty() || bandwidth <= 0.0 || !bandwidth.is_finite() {
        return None;
    }

    let norm = 1.0 / (samples.len() as f64 * bandwidth * (2.0 * PI).sqrt());
    let grid = linspace(domain.0, domain.1, points);
    let mut curve: Vec<(f64, f64)> = grid
        .into_iter()
        .map(|x| {
            let sum: f64 = samples
                .iter()
                .map(|s| {
                    let u = (x - s) / bandwidth;
                    (-0.5 * u * u).exp()
                })
                .sum();
            (x, sum * norm)
        })
        .collect();

    let area = trapezoid(&curve);
    if area > 0.0 {
        for point in &mut curve {
            point.1 /= area;
        }
    }
    Some(curve)
}

/// Trapezoidal integral of a sampled curve.
pub fn trapezoid(curve: &[(f64, f64)]) -> f64 {
    curve
        .windows(2)
        .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
        .sum()
}

/// Linear interpolation of `(x, y)` samples at `x`, clamping to the end
/// values outside the sampled range. `samples` must be sorted by x.
pub fn interp(x: f64, samples: &[(f64, f64)]) -> Option<f64> {
    let first = samples.first()?;
    let last = samples.last()?;
    if x <= first.0 {
        return Some(first.1);
    }
    if x >= last.0 {
        return Some(last.1);
    }

    let upper = samples.partition_point(|(sx, _)| *sx < x);
    let (x1, y1) = samples[upper];
    let (x0, y0) = samples[upper - 1];
    if x1 == x0 {
        return Some(y1);
    }
    Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
}

/// Sorts samples by x in place.
pub fn sort_by_x(samples: &mut [(f64, f64)]) {
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));
}

/// One filled band of a stacked area chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Stacks per-category contributions bottom to top.
///
/// Band `k` spans from the sum of contributions `0..k` to the sum of
/// contributions `0..=k`, pointwise over the shared grid.
pub fn stack(contributions: &[Vec<f64>]) -> Vec<Band> {
    let width = contributions.first().map_or(0, Vec::len);
    let mut running = vec![0.0; width];
    contributions
        .iter()
        .map(|values| {
            let lower = running.clone();
            for (total, value) in running.iter_mut().zip(values) {
                *total += value;
            }
            Band {
                lower,
                upper: running.clone(),
            }
        })
        .collect()
}

/// Samples taken along each diagonal hatch stroke.
const HATCH_SAMPLES: usize = 240;
/// Upper bound on strokes per band, for degenerate scales.
const MAX_HATCH_LINES: f64 = 10_000.0;

/// Hatch strokes covering one band, in data coordinates.
///
/// Only the first character of `pattern` matters: `/` and `\` give 45°
/// strokes on screen, `|` vertical ones, anything else none. `units_per_px`
/// converts the pixel `spacing` into data units on each axis.
pub fn hatch_lines(
    grid: &[f64],
    band: &Band,
    pattern: &str,
    units_per_px: (f64, f64),
    spacing: f64,
) -> Vec<Vec<(f64, f64)>> {
    let (ux, uy) = units_per_px;
    let (Some(&x0), Some(&x1)) = (grid.first(), grid.last()) else {
        return Vec::new();
    };
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if x1 <= x0 || !usable(ux) || !usable(uy) || !usable(spacing) {
        return Vec::new();
    }

    let lower: Vec<(f64, f64)> = grid.iter().copied().zip(band.lower.iter().copied()).collect();
    let upper: Vec<(f64, f64)> = grid.iter().copied().zip(band.upper.iter().copied()).collect();
    let bounds = |x: f64| Some((interp(x, &lower)?, interp(x, &upper)?));

    let slope = match pattern.chars().next() {
        Some('|') => {
            let dx = spacing * ux;
            if (x1 - x0) / dx > MAX_HATCH_LINES {
                return Vec::new();
            }
            let mut lines = Vec::new();
            let mut x = x0 + dx / 2.0;
            while x < x1 {
                if let Some((lo, hi)) = bounds(x).filter(|(lo, hi)| hi > lo) {
                    lines.push(vec![(x, lo), (x, hi)]);
                }
                x += dx;
            }
            return lines;
        }
        Some('/') => uy / ux,
        Some('\\') => -uy / ux,
        _ => return Vec::new(),
    };

    let bottom = band.lower.iter().copied().fold(f64::INFINITY, f64::min);
    let top = band.upper.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(top > bottom) {
        return Vec::new();
    }
    let rise = slope * (x1 - x0);
    let (c_lo, c_hi) = if slope > 0.0 {
        (bottom - rise, top)
    } else {
        (bottom, top - rise)
    };
    let dc = spacing * std::f64::consts::SQRT_2 * uy;
    if (c_hi - c_lo) / dc > MAX_HATCH_LINES {
        return Vec::new();
    }

    let xs = linspace(x0, x1, HATCH_SAMPLES);
    let mut lines = Vec::new();
    let mut c = c_lo + dc / 2.0;
    while c < c_hi {
        let mut run = Vec::new();
        for &x in &xs {
            let y = c + slope * (x - x0);
            if bounds(x).is_some_and(|(lo, hi)| y >= lo && y <= hi) {
                run.push((x, y));
            } else if run.len() >= 2 {
                lines.push(std::mem::take(&mut run));
            } else {
                run.clear();
            }
        }
        if run.len() >= 2 {
            lines.push(run);
        }
        c += dc;
    }
    lines
}

/// Tick label without trailing zeros.
pub fn format_tick(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Tick label of a fraction rendered as a whole percentage.
pub fn format_percent(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(1.0, 10.0, 4), vec![1.0, 4.0, 7.0, 10.0]);
        assert_eq!(linspace(1.0, 10.0, 1), vec![1.0]);
        assert!(linspace(1.0, 10.0, 0).is_empty());
    }

    #[test]
    fn test_kde_integrates_to_one_inside_domain() {
        let samples = [1.0, 1.5, 2.0, 9.5, 10.0];
        let curve = kde(&samples, 0.8, (1.0, 10.0), 300).unwrap();

        assert_eq!(curve.len(), 300);
        assert_eq!(curve[0].0, 1.0);
        assert_eq!(curve[299].0, 10.0);
        assert!((trapezoid(&curve) - 1.0).abs() < 1e-9);
        assert!(curve.iter().all(|(_, y)| *y >= 0.0));
    }

    #[test]
    fn test_kde_peaks_near_samples() {
        let curve = kde(&[5.0, 5.0, 5.0], 0.5, (1.0, 10.0), 91).unwrap();
        let peak = curve
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap();
        assert!((peak.0 - 5.0).abs() < 0.11);
    }

    #[test]
    fn test_kde_rejects_empty_and_bad_bandwidth() {
        assert!(kde(&[], 1.0, (1.0, 10.0), 10).is_none());
        assert!(kde(&[3.0], 0.0, (1.0, 10.0), 10).is_none());
    }

    #[test]
    fn test_interp_matches_numpy_semantics() {
        let samples = [(1.0, 10.0), (3.0, 30.0), (5.0, 10.0)];
        assert_eq!(interp(0.0, &samples), Some(10.0));
        assert_eq!(interp(2.0, &samples), Some(20.0));
        assert_eq!(interp(3.0, &samples), Some(30.0));
        assert_eq!(interp(4.5, &samples), Some(15.0));
        assert_eq!(interp(9.0, &samples), Some(10.0));
        assert_eq!(interp(2.0, &[]), None);
    }

    #[test]
    fn test_stack_tops_are_cumulative_sums() {
        let contributions = vec![
            vec![0.1, 0.2, 0.3],
            vec![0.4, 0.0, 0.1],
            vec![0.2, 0.5, 0.25],
        ];
        let bands = stack(&contributions);

        assert_eq!(bands.len(), 3);
        for (k, band) in bands.iter().enumerate() {
            for x in 0..3 {
                let expected: f64 = contributions[..=k].iter().map(|c| c[x]).sum();
                assert!((band.upper[x] - expected).abs() < 1e-12);
                assert!((band.upper[x] - band.lower[x] - contributions[k][x]).abs() < 1e-12);
            }
        }
        assert_eq!(bands[0].lower, vec![0.0; 3]);
        assert_eq!(bands[1].lower, bands[0].upper);
    }

    fn unit_band() -> Band {
        Band {
            lower: vec![0.0, 0.0],
            upper: vec![1.0, 1.0],
        }
    }

    #[test]
    fn test_vertical_hatch_spans_band() {
        let lines = hatch_lines(&[0.0, 10.0], &unit_band(), "||", (1.0, 0.1), 2.0);
        let xs: Vec<f64> = lines.iter().map(|l| l[0].0).collect();
        assert_eq!(xs, vec![1.0, 3.0, 5.0, 7.0, 9.0]);
        assert!(lines.iter().all(|l| l == &vec![(l[0].0, 0.0), (l[0].0, 1.0)]));
    }

    #[test]
    fn test_diagonal_hatch_stays_inside_band() {
        let band = Band {
            lower: vec![0.0, 0.5, 0.0],
            upper: vec![1.0, 2.0, 1.0],
        };
        let grid = [0.0, 5.0, 10.0];
        for pattern in ["//", "\\\\"] {
            let lines = hatch_lines(&grid, &band, pattern, (0.05, 0.01), 10.0);
            assert!(!lines.is_empty(), "{pattern}");
            for (x, y) in lines.iter().flatten() {
                let lo = interp(*x, &[(0.0, 0.0), (5.0, 0.5), (10.0, 0.0)]).unwrap();
                let hi = interp(*x, &[(0.0, 1.0), (5.0, 2.0), (10.0, 1.0)]).unwrap();
                assert!(*y >= lo - 1e-9 && *y <= hi + 1e-9);
            }
        }
    }

    #[test]
    fn test_no_hatch_for_flat_band_or_unknown_pattern() {
        let flat = Band {
            lower: vec![0.3, 0.3],
            upper: vec![0.3, 0.3],
        };
        for pattern in ["//", "||"] {
            assert!(hatch_lines(&[0.0, 1.0], &flat, pattern, (0.01, 0.01), 5.0).is_empty());
        }
        assert!(hatch_lines(&[0.0, 1.0], &unit_band(), "xx", (0.01, 0.01), 5.0).is_empty());
        assert!(hatch_lines(&[2.0], &unit_band(), "//", (0.01, 0.01), 5.0).is_empty());
    }

    #[test]
    fn test_tick_formatting() {
        assert_eq!(format_tick(3.0), "3");
        assert_eq!(format_tick(2.5), "2.5");
        assert_eq!(format_tick(0.25), "0.25");
        assert_eq!(format_percent(0.25), "25%");
        assert_eq!(format_percent(0.2), "20%");
    }
}
