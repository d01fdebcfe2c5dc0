//! Plot rendering.
//!
//! - `svg`: the plot file written after every fit
//! - `ascii`: fixed-size character plot for non-interactive terminals
//!
//! Both draw in the `(x, y)` plane with equal aspect, so the spiral keeps its
//! shape regardless of the output's width/height ratio.

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;

/// Axis ranges of a plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotBounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

/// Bounds covering every finite point, padded by `pad_frac` of the span, then
/// widened along one axis so that `x_span / y_span == aspect`.
///
/// `aspect` is the width/height ratio of the drawing area in the units one
/// data unit should occupy equally (pixels, or character cells corrected for
/// their height). Returns `None` when no point is finite.
pub fn equal_aspect_bounds(points: impl IntoIterator<Item = (f64, f64)>, aspect: f64, pad_frac: f64) -> Option<PlotBounds> {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (x, y) in points {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !(x_min.is_finite() && y_min.is_finite()) {
        return None;
    }

    let (x_min, x_max) = pad_range(x_min, x_max, pad_frac);
    let (y_min, y_max) = pad_range(y_min, y_max, pad_frac);
    let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };

    let x_span = x_max - x_min;
    let y_span = y_max - y_min;
    if x_span / y_span < aspect {
        let half = 0.5 * y_span * aspect;
        let mid = 0.5 * (x_min + x_max);
        Some(PlotBounds {
            x: [mid - half, mid + half],
            y: [y_min, y_max],
        })
    } else {
        let half = 0.5 * x_span / aspect;
        let mid = 0.5 * (y_min + y_max);
        Some(PlotBounds {
            x: [x_min, x_max],
            y: [mid - half, mid + half],
        })
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = max - min;
    // A single point still needs a visible window.
    let pad = if span > 0.0 { span * frac } else { 1.0 };
    (min - pad, max + pad)
}

/// Finite points only; plotting backends choke on NaN coordinates.
pub(crate) fn finite_points(points: impl IntoIterator<Item = (f64, f64)>) -> Vec<(f64, f64)> {
    points
        .into_iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn narrow_data_is_widened_horizontally() {
        let b = equal_aspect_bounds([(0.0, 0.0), (1.0, 10.0)], 2.0, 0.0).unwrap();
        assert_eq!(b.y, [0.0, 10.0]);
        assert_relative_eq!(b.x[1] - b.x[0], 20.0);
        assert_relative_eq!(0.5 * (b.x[0] + b.x[1]), 0.5);
    }

    #[test]
    fn wide_data_is_widened_vertically() {
        let b = equal_aspect_bounds([(-10.0, 1.0), (10.0, 2.0)], 1.0, 0.05).unwrap();
        assert_relative_eq!(b.x[0], -11.0);
        assert_relative_eq!(b.x[1], 11.0);
        assert_relative_eq!(b.y[1] - b.y[0], 22.0);
        assert_relative_eq!(0.5 * (b.y[0] + b.y[1]), 1.5);
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let b = equal_aspect_bounds([(f64::NAN, 1.0), (2.0, 3.0), (f64::INFINITY, 0.0)], 1.0, 0.0).unwrap();
        assert_eq!(b, PlotBounds { x: [1.0, 3.0], y: [2.0, 4.0] });
        assert!(equal_aspect_bounds([(f64::NAN, f64::NAN)], 1.0, 0.0).is_none());
    }
}
