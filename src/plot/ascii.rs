//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal or CI log
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - fitted curve: `-` line

use crate::domain::{FitFile, Observations, Params};
use crate::models::predict;
use crate::plot::{PlotBounds, equal_aspect_bounds, finite_points};

/// Character cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;

/// Render observations and the fitted curve (sampled at the observed `t`).
pub fn render_ascii_plot(obs: &Observations, params: &Params, width: usize, height: usize) -> String {
    let (x_fit, y_fit) = predict(params, obs.t());
    let curve: Vec<(f64, f64)> = x_fit.into_iter().zip(y_fit).collect();
    let points: Vec<(f64, f64)> = obs.x().iter().copied().zip(obs.y().iter().copied()).collect();
    render_plot(&points, &curve, width, height)
}

/// Render the curve grid of a saved fit JSON file (curve only, no points).
pub fn render_ascii_plot_from_fit_file(fit: &FitFile, width: usize, height: usize) -> String {
    let curve: Vec<(f64, f64)> = fit.grid.x.iter().copied().zip(fit.grid.y.iter().copied()).collect();
    render_plot(&[], &curve, width, height)
}

fn render_plot(points: &[(f64, f64)], curve: &[(f64, f64)], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let aspect = width as f64 / (height as f64 * CELL_ASPECT);
    let bounds = equal_aspect_bounds(points.iter().chain(curve.iter()).copied(), aspect, 0.05).unwrap_or(PlotBounds {
        x: [0.0, 1.0],
        y: [0.0, 1.0],
    });

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    draw_curve(&mut grid, curve, &bounds);

    for (x, y) in finite_points(points.iter().copied()) {
        let col = map_x(x, bounds.x, width);
        let row = map_y(y, bounds.y, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: x=[{:.2}, {:.2}] | y=[{:.2}, {:.2}]\n",
        bounds.x[0], bounds.x[1], bounds.y[0], bounds.y[1]
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn map_x(x: f64, range: [f64; 2], width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - range[0]) / (range[1] - range[0])).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, range: [f64; 2], height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - range[0]) / (range[1] - range[0])).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Connect consecutive curve points; a non-finite point breaks the line.
fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], bounds: &PlotBounds) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        if !(x.is_finite() && y.is_finite()) {
            prev = None;
            continue;
        }
        let col = map_x(x, bounds.x, width);
        let row = map_y(y, bounds.y, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, '-'),
            None => grid[row][col] = '-',
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitGrid, FitResult, StageReport, TSource};

    #[test]
    fn plot_golden_snapshot_small() {
        let points = [(0.0, 0.0), (10.0, 10.0)];
        let curve = [(0.0, 0.0), (10.0, 0.0)];

        let txt = render_plot(&points, &curve, 10, 5);
        let expected = concat!(
            "Plot: x=[-0.50, 10.50] | y=[-0.50, 10.50]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn nan_points_are_skipped() {
        let points = [(f64::NAN, 1.0), (1.0, 1.0)];
        let txt = render_plot(&points, &[], 12, 6);
        let body: String = txt.lines().skip(1).collect();
        assert_eq!(body.matches('o').count(), 1);
    }

    #[test]
    fn in_memory_plot_has_requested_size() {
        let params = Params::new(0.3, 0.01, 10.0);
        let t = vec![6.0, 20.0, 40.0, 60.0];
        let (x, y) = predict(&params, &t);
        let obs = Observations::new(t, x, y).unwrap();

        let txt = render_ascii_plot(&obs, &params, 40, 12);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 13);
        assert!(lines[1..].iter().all(|l| l.chars().count() == 40));
        assert!(lines[1..].iter().any(|l| l.contains('o')));
    }

    #[test]
    fn fit_file_plot_draws_curve_only() {
        let params = Params::default();
        let stage = StageReport {
            start: params,
            params,
            objective: 0.0,
            iterations: 0,
            evaluations: 0,
            converged: true,
        };
        let t = crate::math::linspace(6.0, 60.0, 50);
        let (x, y) = predict(&params, &t);
        let file = FitFile {
            tool: "spiral".to_string(),
            generated_at: String::new(),
            data_path: String::new(),
            t_source: TSource::Synthesized,
            fit: FitResult {
                params,
                theta_degrees: params.theta_degrees(),
                total_l1: 0.0,
                mean_l1: 0.0,
                n: 50,
                stage_l2: stage,
                stage_l1: stage,
            },
            latex: String::new(),
            grid: FitGrid { t, x, y },
        };

        let txt = render_ascii_plot_from_fit_file(&file, 30, 10);
        let body: String = txt.lines().skip(1).collect();
        assert!(body.contains('-'));
        assert!(!body.contains('o'));
    }
}
