//! Drawing of prepared figures with plotters.

use crate::catalog::PlotDescriptor;
use crate::plot::ImageFormat;
use crate::prepare::{positive_extent, Axes, Figure, LineChart, Panel, PanelRect, Series, TriangleChart};
use anyhow::Result;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::ranged1d::Ranged;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::register_font;
use std::path::Path;
use std::sync::OnceLock;

const FIGURE_SIZE: (u32, u32) = (1000, 700);
const TRIANGLE_SIZE: (u32, u32) = (900, 900);

const SERIES_COLORS: [RGBColor; 6] = [BLUE, RED, GREEN, MAGENTA, CYAN, BLACK];

const FONT_FAMILY: &str = "sans-serif";
static FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Register the bundled font under `sans-serif`; every backend lays out text with it
fn register_fonts() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT_DATA).is_ok());
    anyhow::ensure!(ok, "bundled font could not be loaded");
    Ok(())
}

/// Render `figure` to `path`, returning the number of chart panels drawn
pub fn render(figure: &Figure, descriptor: &PlotDescriptor, format: ImageFormat, path: &Path) -> Result<usize> {
    register_fonts()?;
    let size = match figure {
        Figure::Lines(_) => FIGURE_SIZE,
        Figure::Triangle(_) => TRIANGLE_SIZE,
    };

    match format {
        ImageFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_figure(&root, figure, descriptor)
        }
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_figure(&root, figure, descriptor)
        }
    }
}

fn draw_figure<DB>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    descriptor: &PlotDescriptor,
) -> Result<usize>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let panels = match figure {
        Figure::Lines(chart) => {
            draw_line_chart(root, chart, descriptor)?;
            1
        }
        Figure::Triangle(chart) => draw_triangle(root, chart, descriptor)?,
    };

    root.present()?;
    Ok(panels)
}

fn exp_label(v: &f64) -> String {
    format!("{:.0e}", v)
}

fn draw_line_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &LineChart,
    descriptor: &PlotDescriptor,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut builder = ChartBuilder::on(root);
    builder
        .margin(15)
        .caption(descriptor.title, (FONT_FAMILY, 30))
        .x_label_area_size(45)
        .y_label_area_size(80);

    match chart.axes {
        Axes::Linear => {
            let (x_range, y_range) = linear_ranges(chart);
            let mut ctx = builder.build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;

            ctx.configure_mesh()
                .x_desc(descriptor.x_label)
                .y_desc(descriptor.y_label)
                .draw()?;

            draw_series_set(&mut ctx, &chart.series, |x, y| {
                x.is_finite() && y.is_finite() && x >= x_range.0 && x <= x_range.1
            })?;

            if chart.legend {
                ctx.configure_series_labels()
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .draw()?;
            }
        }
        Axes::LogLog => {
            let (x_range, y_range) = log_ranges(chart);
            let mut ctx = builder.build_cartesian_2d(
                (x_range.0..x_range.1).log_scale(),
                (y_range.0..y_range.1).log_scale(),
            )?;

            ctx.configure_mesh()
                .x_desc(descriptor.x_label)
                .y_desc(descriptor.y_label)
                .x_label_formatter(&exp_label)
                .y_label_formatter(&exp_label)
                .draw()?;

            draw_series_set(&mut ctx, &chart.series, |x, y| {
                in_log_window(x, x_range) && in_log_window(y, y_range)
            })?;

            if chart.legend {
                ctx.configure_series_labels()
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .draw()?;
            }
        }
    }

    Ok(())
}

fn in_log_window(v: f64, range: (f64, f64)) -> bool {
    v.is_finite() && v > 0.0 && v >= range.0 && v <= range.1
}

/// Split a polyline into runs of consecutive points accepted by `keep`
fn segments<F: Fn(f64, f64) -> bool>(points: &[(f64, f64)], keep: F) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for &(x, y) in points {
        if keep(x, y) {
            current.push((x, y));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn draw_series_set<'a, DB, X, Y, F>(
    ctx: &mut ChartContext<'a, DB, Cartesian2d<X, Y>>,
    series: &[Series],
    keep: F,
) -> Result<()>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    X: Ranged<ValueType = f64>,
    Y: Ranged<ValueType = f64>,
    F: Fn(f64, f64) -> bool,
{
    for (idx, s) in series.iter().enumerate() {
        let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
        let mut labelled = false;

        for run in segments(&s.points, &keep) {
            let anno = ctx.draw_series(LineSeries::new(run, color.stroke_width(2)))?;
            if let (Some(label), false) = (s.label.as_ref(), labelled) {
                anno.label(label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
                labelled = true;
            }
        }
    }
    Ok(())
}

fn finite_extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Widen an empty range so the axis has something to span
fn linear_span((lo, hi): (f64, f64)) -> (f64, f64) {
    if lo < hi {
        (lo, hi)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}

fn log_span((lo, hi): (f64, f64)) -> (f64, f64) {
    if lo < hi {
        (lo, hi)
    } else {
        (lo / 10.0, hi * 10.0)
    }
}

fn points(chart: &LineChart) -> impl Iterator<Item = &(f64, f64)> {
    chart.series.iter().flat_map(|s| s.points.iter())
}

fn linear_ranges(chart: &LineChart) -> ((f64, f64), (f64, f64)) {
    let x_range = chart
        .x_range
        .or_else(|| finite_extent(points(chart).map(|p| p.0)))
        .map(linear_span)
        .unwrap_or((0.0, 1.0));

    let y_range = chart.y_range.unwrap_or_else(|| {
        let visible = points(chart)
            .filter(|(x, _)| *x >= x_range.0 && *x <= x_range.1)
            .map(|p| p.1);
        match finite_extent(visible) {
            Some(extent) => {
                let (lo, hi) = linear_span(extent);
                let pad = (hi - lo) * 0.05;
                (lo - pad, hi + pad)
            }
            None => (0.0, 1.0),
        }
    });

    (x_range, y_range)
}

fn log_ranges(chart: &LineChart) -> ((f64, f64), (f64, f64)) {
    let x_range = chart
        .x_range
        .or_else(|| positive_extent(points(chart).map(|p| p.0)))
        .map(log_span)
        .unwrap_or((1.0, 10.0));

    let y_range = chart
        .y_range
        .or_else(|| {
            let visible = points(chart)
                .filter(|(x, _)| *x >= x_range.0 && *x <= x_range.1)
                .map(|p| p.1);
            positive_extent(visible).map(|(lo, hi)| (lo / 1.5, hi * 1.5))
        })
        .map(log_span)
        .unwrap_or((1.0, 10.0));

    (x_range, y_range)
}

/// Pixel area of a panel placed in figure fractions from the bottom-left
fn panel_area<DB: DrawingBackend>(figure: &DrawingArea<DB, Shift>, rect: &PanelRect) -> DrawingArea<DB, Shift> {
    let (width, height) = figure.dim_in_pixel();
    let (w, h) = (width as f64, height as f64);

    let left = (rect.left * w).round() as i32;
    let top = (h - (rect.bottom + rect.size) * h).round() as i32;
    let side_w = (rect.size * w).round() as u32;
    let side_h = (rect.size * h).round() as u32;

    figure.clone().shrink((left, top), (side_w, side_h))
}

fn draw_triangle<DB>(
    root: &DrawingArea<DB, Shift>,
    chart: &TriangleChart,
    descriptor: &PlotDescriptor,
) -> Result<usize>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let figure = root.titled(descriptor.title, (FONT_FAMILY, 24))?;

    for panel in &chart.panels {
        let area = panel_area(&figure, &panel.rect);
        draw_panel(&area, panel, chart, descriptor)?;
    }

    Ok(chart.panels.len())
}

fn draw_panel<DB>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    chart: &TriangleChart,
    descriptor: &PlotDescriptor,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    // Only the corner panel gets tick labels and axis names
    let labelled = panel.rect.is_corner();
    let (x_area, y_area): (i32, i32) = if labelled { (40, 60) } else { (0, 0) };

    let (x_range, y_range) = (chart.x_range, chart.y_range);
    let mut ctx = ChartBuilder::on(area)
        .margin(2)
        .x_label_area_size(x_area)
        .y_label_area_size(y_area)
        .build_cartesian_2d(
            (x_range.0..x_range.1).log_scale(),
            (y_range.0..y_range.1).log_scale(),
        )?;

    {
        let mut mesh = ctx.configure_mesh();
        mesh.x_labels(4)
            .y_labels(4)
            .x_label_formatter(&exp_label)
            .y_label_formatter(&exp_label)
            .label_style((FONT_FAMILY, 10));
        if labelled {
            mesh.x_desc(descriptor.x_label).y_desc(descriptor.y_label);
        }
        if !chart.annotate {
            mesh.disable_mesh();
        }
        mesh.draw()?;
    }

    let curves: Vec<Series> = panel
        .curves
        .iter()
        .map(|points| Series {
            label: None,
            points: points.clone(),
        })
        .collect();
    draw_series_set(&mut ctx, &curves, |x, y| {
        in_log_window(x, x_range) && in_log_window(y, y_range)
    })?;

    if chart.annotate {
        area.draw(&Text::new(
            format!("({},{})", panel.rect.i, panel.rect.j),
            (y_area + 8, 6),
            (FONT_FAMILY, 12).into_font().color(&RED),
        ))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CATALOG;
    use crate::prepare::triangle_layout;
    use std::fs;
    use tempfile::TempDir;

    fn descriptor(filename: &str) -> &'static PlotDescriptor {
        CATALOG.iter().find(|d| d.filename == filename).unwrap()
    }

    fn line_chart(axes: Axes, points: Vec<(f64, f64)>) -> LineChart {
        LineChart {
            series: vec![Series {
                label: Some("Linear".to_string()),
                points,
            }],
            axes,
            x_range: None,
            y_range: None,
            legend: true,
        }
    }

    fn triangle(nbin: usize) -> TriangleChart {
        let curve = vec![(10.0, 1e-5), (100.0, 2e-5), (1000.0, 1e-6)];
        TriangleChart {
            nbin,
            panels: triangle_layout(nbin)
                .into_iter()
                .map(|rect| Panel {
                    rect,
                    curves: vec![curve.clone()],
                })
                .collect(),
            x_range: (10.0, 1000.0),
            y_range: (1e-8, 1e-3),
            annotate: true,
        }
    }

    #[test]
    fn test_segments_split_on_rejected_points() {
        let points = [(1.0, 1.0), (2.0, -1.0), (3.0, 2.0), (4.0, 3.0), (5.0, 0.0)];
        let runs = segments(&points, |_, y| y > 0.0);
        assert_eq!(runs, vec![vec![(1.0, 1.0)], vec![(3.0, 2.0), (4.0, 3.0)]]);
    }

    #[test]
    fn test_linear_ranges_pad_and_widen() {
        let chart = line_chart(Axes::Linear, vec![(0.0, 5.0), (2.0, 5.0)]);
        let (x, y) = linear_ranges(&chart);
        assert_eq!(x, (0.0, 2.0));
        assert!(y.0 < 5.0 && y.1 > 5.0);
    }

    #[test]
    fn test_linear_ranges_follow_x_cap() {
        let mut chart = line_chart(Axes::Linear, vec![(100.0, 1.0), (300.0, 2.0), (2000.0, 50.0)]);
        chart.x_range = Some((0.0, 400.0));
        let (x, y) = linear_ranges(&chart);
        assert_eq!(x, (0.0, 400.0));
        assert!(y.1 < 50.0);
    }

    #[test]
    fn test_log_ranges_ignore_non_positive() {
        let chart = line_chart(Axes::LogLog, vec![(0.0, 1.0), (0.1, -2.0), (1.0, 10.0), (10.0, 100.0)]);
        let (x, y) = log_ranges(&chart);
        assert_eq!(x, (0.1, 10.0));
        assert!(y.0 > 0.0 && y.0 < 10.0);
        assert!(y.1 > 100.0);
    }

    #[test]
    fn test_render_line_chart_svg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matter_power.svg");
        let figure = Figure::Lines(line_chart(Axes::LogLog, vec![(0.01, 1e4), (0.1, 5e3), (1.0, 1e2)]));

        let panels = render(&figure, descriptor("matter_power"), ImageFormat::Svg, &path).unwrap();

        assert_eq!(panels, 1);
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Matter Power Spectrum"));
        assert!(svg.contains("Linear"));
    }

    #[test]
    fn test_render_triangle_three_bins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shear_power.svg");
        let figure = Figure::Triangle(triangle(3));

        let panels = render(&figure, descriptor("shear_power"), ImageFormat::Svg, &path).unwrap();

        assert_eq!(panels, 3 * (3 + 1) / 2);
        let svg = fs::read_to_string(&path).unwrap();
        for tag in ["(1,1)", "(2,1)", "(2,2)", "(3,1)", "(3,2)", "(3,3)"] {
            assert!(svg.contains(tag), "missing panel {}", tag);
        }
        assert!(!svg.contains("(1,2)"));

        // Axis names only on the corner panel
        let d = descriptor("shear_power");
        for label in [d.x_label, d.y_label] {
            assert_eq!(svg.lines().filter(|l| *l == label).count(), 1, "label {}", label);
        }
    }

    #[test]
    fn test_render_png_with_labels() {
        let dir = TempDir::new().unwrap();

        let triangle_path = dir.path().join("shear_power.png");
        let panels = render(
            &Figure::Triangle(triangle(2)),
            descriptor("shear_power"),
            ImageFormat::Png,
            &triangle_path,
        )
        .unwrap();
        assert_eq!(panels, 3);

        let lines_path = dir.path().join("growth.png");
        let mut chart = line_chart(Axes::Linear, vec![(0.0, 1.0), (1.0, 0.6), (2.0, 0.4)]);
        chart.series[0].label = Some("d(z)".to_string());
        render(&Figure::Lines(chart), descriptor("growth"), ImageFormat::Png, &lines_path).unwrap();

        for path in [triangle_path, lines_path] {
            let bytes = fs::read(&path).unwrap();
            assert_eq!(&bytes[1..4], b"PNG");
        }
    }
}
