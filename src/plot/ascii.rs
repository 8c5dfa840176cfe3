//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - fitted curves: `-`, `~`, `+` (in fit order)
//! - asymptote: `.`
//! - data | extrapolation boundary: `|`

use crate::plot::{ChartData, Panel, pad_range, y_range};

const CURVE_GLYPHS: [char; 3] = ['-', '~', '+'];

/// Render every panel of the chart, separated by a blank line.
pub fn render_ascii_chart(data: &ChartData, width: usize, height: usize) -> String {
    data.panels
        .iter()
        .map(|panel| render_panel(panel, data.x_range, data.boundary, width, height))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_panel(panel: &Panel, x_range: (f64, f64), boundary: f64, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let (x_min, x_max) = x_range;

    let (y_min, y_max) = y_range(panel).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curves first; the other elements only fill blank cells, points overlay all.
    for (curve, &glyph) in panel.curves.iter().zip(CURVE_GLYPHS.iter().cycle()) {
        draw_curve(&mut grid, &curve.points, x_range, (y_min, y_max), glyph);
    }

    if let Some(c) = panel.asymptote {
        let y = map_y(c, y_min, y_max, height);
        for cell in grid[y].iter_mut().filter(|c| **c == ' ') {
            *cell = '.';
        }
    }

    if boundary > x_min && boundary < x_max {
        let x = map_x(boundary, x_min, x_max, width);
        for row in grid.iter_mut() {
            if row[x] == ' ' {
                row[x] = '|';
            }
        }
    }

    for &(n, y) in &panel.observed {
        let x = map_x(n, x_min, x_max, width);
        let y = map_y(y, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | N=[{x_min}, {x_max}] | y=[{y_min:.3}, {y_max:.3}]\n",
        panel.statistic.display_name()
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    let mut legend = String::from("o observed");
    for (curve, glyph) in panel.curves.iter().zip(CURVE_GLYPHS.iter().cycle()) {
        legend.push_str(&format!("  {glyph} {}", curve.family));
    }
    if panel.asymptote.is_some() {
        legend.push_str("  . asymptote");
    }
    legend.push_str("  | data | extrapolation");
    out.push_str(&legend);
    out.push('\n');

    out
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_range: (f64, f64), y_range: (f64, f64), glyph: char) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        let x = map_x(t, x_range.0, x_range.1, width);
        let yy = map_y(y, y_range.0, y_range.1, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, yy, glyph),
            None if grid[yy][x] == ' ' => grid[yy][x] = glyph,
            None => {}
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham).
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
