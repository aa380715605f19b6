//! Figure rendering with plotters (PNG bitmap or SVG).

use crate::error::{CellDistError, Result};
use crate::pipeline::OutputFormat;
use crate::report::comparison::ComparisonResult;
use crate::report::ray::RayPlot;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

type DrawResult = std::result::Result<(), Box<dyn Error + Send + Sync>>;

const BAR_SIZE: (u32, u32) = (1200, 800);
const RAY_SIZE: (u32, u32) = (1000, 1000);

/// Fraction of a sample slot taken by its bars.
const GROUP_WIDTH: f64 = 0.8;

fn plot_error(e: Box<dyn Error + Send + Sync>) -> CellDistError {
    CellDistError::Plot(e.to_string())
}

/// Render a grouped bar chart with SE whiskers.
pub fn render_comparison(result: &ComparisonResult, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Png => {
            let root = BitMapBackend::new(path, BAR_SIZE).into_drawing_area();
            draw_comparison(&root, result).map_err(plot_error)
        }
        OutputFormat::Svg => {
            let root = SVGBackend::new(path, BAR_SIZE).into_drawing_area();
            draw_comparison(&root, result).map_err(plot_error)
        }
    }
}

/// Render points colored by label with one segment per nearest-neighbor link.
pub fn render_rays(plot: &RayPlot, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Png => {
            let root = BitMapBackend::new(path, RAY_SIZE).into_drawing_area();
            draw_rays(&root, plot).map_err(plot_error)
        }
        OutputFormat::Svg => {
            let root = SVGBackend::new(path, RAY_SIZE).into_drawing_area();
            draw_rays(&root, plot).map_err(plot_error)
        }
    }
}

fn draw_comparison<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    result: &ComparisonResult,
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let n = result.n_samples().max(1);
    let y_max = result
        .bars()
        .iter()
        .flat_map(|g| g.bars.iter().map(|b| b.upper))
        .fold(0.0f64, f64::max)
        .max(1.0);

    let caption = match result.p_value {
        Some(p) => format!("{} (paired t-test p = {:.3e})", result.title, p),
        None => result.title.clone(),
    };

    let mut chart = ChartBuilder::on(root)
        .caption(caption, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0.0..y_max * 1.1)?;

    let sample_ids = result.sample_ids.clone();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x| {
            let idx = x.round();
            if (x - idx).abs() < 1e-6 && idx >= 0.0 && (idx as usize) < sample_ids.len() {
                sample_ids[idx as usize].clone()
            } else {
                String::new()
            }
        })
        .y_desc(result.axis_title.as_str())
        .draw()?;

    let n_bars = result.targets.len().max(1);
    let width = GROUP_WIDTH / n_bars as f64;
    for (r, label) in result.targets.iter().enumerate() {
        let color = Palette99::pick(r).to_rgba();
        let offset = -GROUP_WIDTH / 2.0 + width * r as f64;
        chart
            .draw_series(result.means[r].iter().enumerate().map(|(c, &mean)| {
                let x0 = c as f64 + offset;
                Rectangle::new([(x0, 0.0), (x0 + width, mean)], color.filled())
            }))?
            .label(label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));

        chart.draw_series(result.means[r].iter().enumerate().map(|(c, &mean)| {
            let x = c as f64 + offset + width / 2.0;
            let se = result.std_errors[r][c];
            PathElement::new(vec![(x, (mean - se).max(0.0)), (x, mean + se)], BLACK.stroke_width(2))
        }))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_rays<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, plot: &RayPlot) -> DrawResult
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (x_range, y_range) = match plot.window {
        Some(w) if w.x_max > w.x_min && w.y_max > w.y_min => (w.x_min..w.x_max, w.y_min..w.y_max),
        Some(w) => ((w.x_min - 1.0)..(w.x_max + 1.0), (w.y_min - 1.0)..(w.y_max + 1.0)),
        None => (0.0..1.0, 0.0..1.0),
    };

    let mut chart = ChartBuilder::on(root)
        .caption(plot.title(), ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(format!("x ({})", plot.unit))
        .y_desc(format!("y ({})", plot.unit))
        .draw()?;

    chart.draw_series(plot.links.iter().map(|l| {
        PathElement::new(vec![(l.from.x, l.from.y), (l.to.x, l.to.y)], BLACK.mix(0.6).stroke_width(1))
    }))?;

    for (i, (label, points)) in plot.points.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 3, color.filled())))?
            .label(label.as_str())
            .legend(move |(x, y)| Circle::new((x + 8, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
