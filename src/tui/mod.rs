//! Ratatui-based terminal viewer.
//!
//! Shows the observed points and the fitted curve with the fit summary, and
//! blocks until the user closes it.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::debug;

use crate::domain::{FitResult, Observations};
use crate::error::{AppError, ErrorKind};
use crate::models::predict;
use crate::plot::{PlotBounds, equal_aspect_bounds, finite_points};

mod plotters_chart;

use plotters_chart::FitChart;

/// Braille canvas cells are about twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;

/// Open the viewer for a finished fit. Returns when the user quits.
pub fn show_fit(obs: &Observations, fit: &FitResult) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(ErrorKind::Terminal, format!("Failed to initialize terminal: {e}")))?;

    let mut viewer = Viewer::new(obs, fit);
    viewer.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::new(ErrorKind::Terminal, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(
                ErrorKind::Terminal,
                format!("Failed to enter alternate screen: {e}"),
            ));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct Viewer {
    fit: FitResult,
    points: Vec<(f64, f64)>,
    curve: Vec<(f64, f64)>,
    show_curve: bool,
    show_points: bool,
}

impl Viewer {
    fn new(obs: &Observations, fit: &FitResult) -> Self {
        let (curve, points) = chart_series(obs, fit);
        Self {
            fit: *fit,
            points,
            curve,
            show_curve: true,
            show_points: true,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(ErrorKind::Terminal, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(ErrorKind::Terminal, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(ErrorKind::Terminal, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        debug!("viewer closed");
        Ok(())
    }

    /// Returns true when the viewer should close.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') => self.show_curve = !self.show_curve,
            KeyCode::Char('p') => self.show_points = !self.show_points,
            _ => {}
        }
        false
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let p = &self.fit.params;
        let lines = vec![
            Line::from(vec![
                Span::styled("spiral", Style::default().fg(Color::Cyan)),
                Span::raw(format!(
                    " | theta={:.6} rad ({:.4}°) | M={:.6} | X={:.6}",
                    p.theta, self.fit.theta_degrees, p.m, p.x_offset
                )),
            ]),
            Line::from(Span::styled(
                format!(
                    "n={} | total L1={:.6} | mean L1={:.6}",
                    self.fit.n, self.fit.total_l1, self.fit.mean_l1
                ),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Observed vs Fitted").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let (chart_rect, insets) = chart_layout(inner);
        let aspect = f64::from(chart_rect.width.max(1)) / (f64::from(chart_rect.height.max(1)) * CELL_ASPECT);
        let bounds = equal_aspect_bounds(self.points.iter().chain(self.curve.iter()).copied(), aspect, 0.05)
            .unwrap_or(PlotBounds {
                x: [0.0, 1.0],
                y: [0.0, 1.0],
            });

        let widget = FitChart {
            curve: &self.curve,
            points: &self.points,
            x_bounds: bounds.x,
            y_bounds: bounds.y,
            show_curve: self.show_curve,
            show_points: self.show_points,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, bounds.x, bounds.y);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let toggle = |on: bool| if on { "on" } else { "off" };
        let line = Line::from(vec![
            Span::styled("c curve  p points  q/Esc quit", Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(
                format!("curve: {} | points: {}", toggle(self.show_curve), toggle(self.show_points)),
                Style::default().fg(Color::Yellow),
            ),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart series: fitted curve at the observed `t` (data order) and the
/// observed points, both without non-finite entries.
fn chart_series(obs: &Observations, fit: &FitResult) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let (x_fit, y_fit) = predict(&fit.params, obs.t());
    let curve = finite_points(x_fit.into_iter().zip(y_fit));
    let points = finite_points(obs.x().iter().copied().zip(obs.y().iter().copied()));
    (curve, points)
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{x_val:.1}");
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.0}");
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("x")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("y").style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Params, StageReport};
    use ratatui::backend::TestBackend;

    fn fixture() -> (Observations, FitResult) {
        let params = Params::new(0.3, 0.01, 10.0);
        let t = vec![6.0, 12.0, f64::NAN, 30.0];
        let (x, y) = predict(&params, &t);
        let obs = Observations::new(t, x, y).unwrap();
        let stage = StageReport {
            start: Params::default(),
            params,
            objective: 0.0,
            iterations: 1,
            evaluations: 1,
            converged: true,
        };
        let fit = FitResult {
            params,
            theta_degrees: params.theta_degrees(),
            total_l1: 0.0,
            mean_l1: 0.0,
            n: 4,
            stage_l2: stage,
            stage_l1: stage,
        };
        (obs, fit)
    }

    #[test]
    fn chart_series_drops_non_finite_samples() {
        let (obs, fit) = fixture();
        let (curve, points) = chart_series(&obs, &fit);
        assert_eq!(curve.len(), 3);
        assert_eq!(points.len(), 3);
        assert_eq!(curve, points);
    }

    #[test]
    fn keys_toggle_series_and_quit() {
        let (obs, fit) = fixture();
        let mut viewer = Viewer::new(&obs, &fit);
        assert!(!viewer.handle_key(KeyCode::Char('c')));
        assert!(!viewer.show_curve);
        assert!(!viewer.handle_key(KeyCode::Char('p')));
        assert!(!viewer.show_points);
        assert!(viewer.handle_key(KeyCode::Char('q')));
        assert!(viewer.handle_key(KeyCode::Esc));
    }

    #[test]
    fn draws_summary_into_test_backend() {
        let (obs, fit) = fixture();
        let viewer = Viewer::new(&obs, &fit);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| viewer.draw(f)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("total L1=0.000000"));
        assert!(text.contains("q/Esc quit"));
    }
}
