//! SVG chart output (plotters).
//!
//! Two side-by-side panels: mean cost (observed points, fitted curves and the
//! asymptote) and spread (observed points and the square-root fit). Both carry
//! a vertical marker at the largest sampled `N`.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::ModelFamily;
use crate::error::AppError;
use crate::plot::{ChartData, Panel, pad_range, y_range};

pub const BOUNDARY_LABEL: &str = "data | extrapolation";

/// Render the chart into an SVG document string.
pub fn render_svg(data: &ChartData, size: (u32, u32)) -> Result<String, AppError> {
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, size).into_drawing_area();
        draw_chart(&root, data).map_err(|e| AppError::new(2, format!("Failed to render chart: {e}")))?;
        root.present()
            .map_err(|e| AppError::new(2, format!("Failed to render chart: {e}")))?;
    }
    Ok(buf)
}

/// Render the chart to an SVG file.
pub fn write_svg_chart(path: &Path, data: &ChartData, size: (u32, u32)) -> Result<(), AppError> {
    let svg = render_svg(data, size)?;
    std::fs::write(path, svg)
        .map_err(|e| AppError::new(2, format!("Failed to write chart '{}': {e}", path.display())))
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    data: &ChartData,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    let areas = root.split_evenly((1, data.panels.len().max(1)));
    for (area, panel) in areas.iter().zip(&data.panels) {
        draw_panel(area, panel, data.x_range, data.boundary)?;
    }
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    x_range: (f64, f64),
    boundary: f64,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (x0, x1) = x_range;
    let (y0, y1) = y_range(panel).unwrap_or((0.0, 1.0));
    let (y0, y1) = pad_range(y0, y1, 0.1);

    let title = panel.statistic.display_name();
    let mut chart = ChartBuilder::on(area)
        .caption(format!("{title} vs N"), ("sans-serif", 18))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc("N")
        .y_desc(title)
        .draw()?;

    chart
        .draw_series(
            panel
                .observed
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, BLUE.filled())),
        )?
        .label("observed")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, BLUE.filled()));

    for curve in &panel.curves {
        let color = family_color(curve.family);
        chart
            .draw_series(LineSeries::new(curve.points.iter().copied(), color.stroke_width(2)))?
            .label(curve.family.to_string())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    if let Some(c) = panel.asymptote {
        let grey = RGBColor(128, 128, 128);
        chart
            .draw_series(std::iter::once(PathElement::new(vec![(x0, c), (x1, c)], grey)))?
            .label(format!("asymptote C={c:.4}"))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], grey));
    }

    if boundary > x0 && boundary < x1 {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(boundary, y0), (boundary, y1)],
            BLACK.mix(0.6),
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            BOUNDARY_LABEL,
            (boundary, y1),
            ("sans-serif", 12).into_font().color(&BLACK),
        )))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn family_color(family: ModelFamily) -> RGBColor {
    match family {
        ModelFamily::Asymptotic => RED,
        ModelFamily::Logarithmic => RGBColor(0, 150, 0),
        ModelFamily::SqrtGrowth => RGBColor(255, 140, 0),
    }
}
