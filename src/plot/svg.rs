//! SVG plot of observed points against the fitted curve.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;
use tracing::info;

use crate::domain::{Observations, Params};
use crate::error::{AppError, ErrorKind};
use crate::io::export::ensure_parent_dir;
use crate::models::predict;
use crate::plot::{PlotBounds, equal_aspect_bounds, finite_points};

pub const SVG_SIZE: (u32, u32) = (800, 600);

const CAPTION: &str = "Observed vs Fitted Parametric Curve";
const MARGIN: u32 = 20;
const X_LABEL_AREA: u32 = 40;
const Y_LABEL_AREA: u32 = 60;

/// Write the scatter + fitted-curve plot to `path` (must end in `.svg`).
///
/// The curve connects the predictions at the observed `t` in data order.
pub fn render_fit_svg(path: &Path, obs: &Observations, params: &Params) -> Result<(), AppError> {
    ensure_parent_dir(path)?;

    let points = finite_points(obs.x().iter().copied().zip(obs.y().iter().copied()));
    let (x_fit, y_fit) = predict(params, obs.t());
    let curve = finite_points(x_fit.into_iter().zip(y_fit));

    draw_svg(path, &points, &curve)
        .map_err(|e| AppError::new(ErrorKind::Render, format!("Failed to render plot '{}': {e}", path.display())))?;

    info!(path = %path.display(), points = points.len(), "wrote plot");
    Ok(())
}

fn draw_svg(path: &Path, points: &[(f64, f64)], curve: &[(f64, f64)]) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, SVG_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let body = root.titled(CAPTION, ("sans-serif", 22))?;

    // Size of the data area once margins and label areas are taken out.
    let (w, h) = body.dim_in_pixel();
    let plot_w = w.saturating_sub(2 * MARGIN + Y_LABEL_AREA).max(1);
    let plot_h = h.saturating_sub(2 * MARGIN + X_LABEL_AREA).max(1);
    let aspect = f64::from(plot_w) / f64::from(plot_h);

    let bounds = equal_aspect_bounds(points.iter().chain(curve.iter()).copied(), aspect, 0.05).unwrap_or(PlotBounds {
        x: [0.0, 1.0],
        y: [0.0, 1.0],
    });

    let mut chart = ChartBuilder::on(&body)
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(bounds.x[0]..bounds.x[1], bounds.y[0]..bounds.y[1])?;

    chart
        .configure_mesh()
        .x_desc("x")
        .y_desc("y")
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.3))
        .draw()?;

    let point_color = RGBColor(31, 119, 180);
    let curve_color = RGBColor(255, 127, 14);

    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 3, point_color.mix(0.6).filled())))?
        .label("Observed data")
        .legend(move |(x, y)| Circle::new((x + 10, y), 3, point_color.filled()));

    chart
        .draw_series(LineSeries::new(curve.iter().copied(), curve_color.stroke_width(2)))?
        .label("Fitted curve (L1 optimized)")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], curve_color.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::linspace;

    #[test]
    fn writes_svg_with_title_and_legend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots").join("fitted_curve.svg");

        let params = Params::new(0.3, 0.01, 10.0);
        let t = linspace(6.0, 60.0, 30);
        let (x, y) = predict(&params, &t);
        let obs = Observations::new(t, x, y).unwrap();

        render_fit_svg(&path, &obs, &params).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains(CAPTION));
        assert!(svg.contains("Fitted curve (L1 optimized)"));
        assert!(svg.contains("<circle"));
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn single_nan_point_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.svg");
        let obs = Observations::new(vec![f64::NAN], vec![f64::NAN], vec![1.0]).unwrap();
        render_fit_svg(&path, &obs, &Params::default()).unwrap();
        assert!(path.is_file());
    }
}
