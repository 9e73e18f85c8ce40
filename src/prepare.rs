//! Turns a catalog entry plus a sample directory into render-ready series.
//!
//! Every file a plot needs is read here, before any output exists, so a plot
//! whose data is missing fails without leaving a partial image behind.

use crate::catalog::{PlotDescriptor, PlotKind, TriangleSpec, CMB_SPECTRA, POWER_SOURCES};
use crate::sample::{SampleDirectory, SampleError};
use std::f64::consts::PI;

/// Largest bin index probed when counting tomographic bins
pub const MAX_BINS: usize = 99;

/// One labelled line
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    fn new(label: Option<&str>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.map(str::to_string),
            points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axes {
    Linear,
    LogLog,
}

/// A single chart of overlaid lines
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub series: Vec<Series>,
    pub axes: Axes,
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    pub legend: bool,
}

/// Placement of the `(i, j)` panel, as fractions of the figure measured from
/// the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelRect {
    pub i: usize,
    pub j: usize,
    pub left: f64,
    pub bottom: f64,
    pub size: f64,
}

impl PanelRect {
    /// The corner panel is the only one that carries axis labels
    pub fn is_corner(&self) -> bool {
        self.i == 1 && self.j == 1
    }
}

/// Curves for one bin pair
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub rect: PanelRect,
    /// First curve comes from the primary section, the rest from overlays
    pub curves: Vec<Vec<(f64, f64)>>,
}

/// Lower-triangular grid of bin-pair panels
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleChart {
    pub nbin: usize,
    pub panels: Vec<Panel>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub annotate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Figure {
    Lines(LineChart),
    Triangle(TriangleChart),
}

/// Load everything `descriptor` needs from `sample`
pub fn prepare(descriptor: &PlotDescriptor, sample: &SampleDirectory) -> Result<Figure, SampleError> {
    match descriptor.kind {
        PlotKind::Distance { array, scaling } => {
            let z = sample.load_vec("distances", "z")?;
            let d: Vec<f64> = sample
                .load_vec("distances", array)?
                .into_iter()
                .map(|v| v * scaling)
                .collect();
            let points = zip_points(sample, "distances", array, &z, &d)?;
            Ok(Figure::Lines(linear(vec![Series::new(None, points)], false)))
        }
        PlotKind::CmbSpectrum { spectrum, ell_max } => {
            let ell = sample.load_vec("cmb_cl", "ell")?;
            let c_ell = sample.load_vec("cmb_cl", spectrum)?;
            let points = zip_points(sample, "cmb_cl", spectrum, &ell, &c_ell)?;
            let mut chart = linear(vec![Series::new(None, points)], false);
            chart.x_range = ell_max.map(|max| (0.0, max));
            Ok(Figure::Lines(chart))
        }
        PlotKind::GrandCmb => {
            let ell = sample.load_vec("cmb_cl", "ell")?;
            let mut series = Vec::with_capacity(CMB_SPECTRA.len());
            for name in CMB_SPECTRA {
                let c_ell: Vec<f64> = sample.load_vec("cmb_cl", name)?.iter().map(|v| v.abs()).collect();
                let points = zip_points(sample, "cmb_cl", name, &ell, &c_ell)?;
                series.push(Series::new(Some(&name.to_uppercase()), points));
            }
            Ok(Figure::Lines(loglog(series, true)))
        }
        PlotKind::MatterPower => prepare_matter_power(sample),
        PlotKind::Triangle(spec) => prepare_triangle(&spec, sample).map(Figure::Triangle),
        PlotKind::Growth => {
            let section = "growth_parameters";
            let z = sample.load_vec(section, "z")?;
            let d_z = sample.load_vec(section, "d_z")?;
            let f_z = sample.load_vec(section, "f_z")?;
            let series = vec![
                Series::new(Some("d(z)"), zip_points(sample, section, "d_z", &z, &d_z)?),
                Series::new(Some("f(z)"), zip_points(sample, section, "f_z", &z, &f_z)?),
            ];
            Ok(Figure::Lines(linear(series, true)))
        }
        PlotKind::LuminositySlope => {
            let section = "galaxy_luminosity_function";
            let z = sample.load_vec(section, "z")?;
            let alpha = sample.load_vec(section, "alpha")?;
            let points = zip_points(sample, section, "alpha", &z, &alpha)?;
            Ok(Figure::Lines(linear(vec![Series::new(None, points)], false)))
        }
    }
}

fn linear(series: Vec<Series>, legend: bool) -> LineChart {
    LineChart {
        series,
        axes: Axes::Linear,
        x_range: None,
        y_range: None,
        legend,
    }
}

fn loglog(series: Vec<Series>, legend: bool) -> LineChart {
    LineChart {
        axes: Axes::LogLog,
        ..linear(series, legend)
    }
}

/// Pair up x and y values, which must have the same length
fn zip_points(
    sample: &SampleDirectory,
    section: &str,
    y_name: &str,
    x: &[f64],
    y: &[f64],
) -> Result<Vec<(f64, f64)>, SampleError> {
    if x.len() != y.len() {
        return Err(SampleError::unavailable(
            &sample.array_path(section, y_name),
            format!("{} values against {} x values", y.len(), x.len()),
        ));
    }
    Ok(x.iter().copied().zip(y.iter().copied()).collect())
}

/// Negate `values` in place when none of them is positive, so spectra stored
/// with a negative sign can still go on a log axis. Returns whether it flipped.
pub fn flip_if_non_positive(values: &mut [f64]) -> bool {
    if values.is_empty() || values.iter().any(|v| *v > 0.0) {
        return false;
    }
    values.iter_mut().for_each(|v| *v = -*v);
    true
}

fn prepare_matter_power(sample: &SampleDirectory) -> Result<Figure, SampleError> {
    let mut series = Vec::new();

    for source in POWER_SOURCES {
        let available = ["k_h", "z", source.power]
            .iter()
            .all(|name| sample.has_array(source.section, name));
        if !available {
            continue;
        }

        let k_h = sample.load_vec(source.section, "k_h")?;
        let z = sample.load_vec(source.section, "z")?;
        let mut power = sample.load_array(source.section, source.power)?.into_2d();
        if let Some(values) = power.as_slice_memory_order_mut() {
            flip_if_non_positive(values);
        }

        // Stored either as (nk, nz) or (nz, nk); the first redshift is drawn
        if power.dim() == (z.len(), k_h.len()) {
            power = power.reversed_axes();
        }
        if power.nrows() != k_h.len() || power.ncols() == 0 {
            return Err(SampleError::unavailable(
                &sample.array_path(source.section, source.power),
                format!(
                    "power grid {:?} does not match {} k values and {} redshifts",
                    power.dim(),
                    k_h.len(),
                    z.len()
                ),
            ));
        }

        let points = k_h.iter().copied().zip(power.column(0).iter().copied()).collect();
        log::debug!("matter power: {} from {}", source.label, source.section);
        series.push(Series::new(Some(source.label), points));
    }

    if series.is_empty() {
        return Err(SampleError::unavailable(sample.root(), "no matter power sections"));
    }
    Ok(Figure::Lines(loglog(series, true)))
}

/// Count consecutive `bin_i_i.txt` files starting from bin 1
pub fn count_bins(sample: &SampleDirectory, section: &str) -> usize {
    (1..=MAX_BINS)
        .take_while(|i| sample.has_array(section, &bin_name(*i, *i)))
        .count()
}

fn bin_name(i: usize, j: usize) -> String {
    format!("bin_{}_{}", i, j)
}

/// Panels `(i, j)` with `1 <= j <= i <= nbin`, each a square of side
/// `1 / (nbin + 2)` placed at `(i, j)` times that side
pub fn triangle_layout(nbin: usize) -> Vec<PanelRect> {
    let size = 1.0 / (nbin as f64 + 2.0);
    (1..=nbin)
        .flat_map(|i| (1..=i).map(move |j| (i, j)))
        .map(|(i, j)| PanelRect {
            i,
            j,
            left: i as f64 * size,
            bottom: j as f64 * size,
            size,
        })
        .collect()
}

/// Curves of every bin pair of one section, in layout order
fn load_bin_curves(
    spec: &TriangleSpec,
    sample: &SampleDirectory,
    section: &str,
    nbin: usize,
) -> Result<Vec<Vec<(f64, f64)>>, SampleError> {
    let x = sample.load_vec(section, spec.x_array)?;

    triangle_layout(nbin)
        .iter()
        .map(|rect| {
            let name = bin_name(rect.i, rect.j);
            let mut values = sample.load_vec(section, &name)?;
            if spec.flip_sign {
                flip_if_non_positive(&mut values);
            }
            if spec.ell_weighted {
                for (v, ell) in values.iter_mut().zip(x.iter()) {
                    *v *= ell * (ell + 1.0) / (2.0 * PI);
                }
            }
            zip_points(sample, section, &name, &x, &values)
        })
        .collect()
}

fn prepare_triangle(spec: &TriangleSpec, sample: &SampleDirectory) -> Result<TriangleChart, SampleError> {
    let nbin = count_bins(sample, spec.section);
    if nbin == 0 {
        return Err(SampleError::unavailable(
            &sample.section_path(spec.section),
            "no tomographic bins",
        ));
    }

    let mut panels: Vec<Panel> = triangle_layout(nbin)
        .into_iter()
        .zip(load_bin_curves(spec, sample, spec.section, nbin)?)
        .map(|(rect, curve)| Panel {
            rect,
            curves: vec![curve],
        })
        .collect();

    for overlay in spec.overlays.iter().filter(|s| sample.has_section(s)) {
        let overlay_bins = count_bins(sample, overlay).min(nbin);
        let curves = load_bin_curves(spec, sample, overlay, overlay_bins)?;
        // Both lists follow layout order; an overlay with fewer bins covers a prefix
        for (rect, curve) in triangle_layout(overlay_bins).into_iter().zip(curves) {
            if let Some(panel) = panels.iter_mut().find(|p| p.rect.i == rect.i && p.rect.j == rect.j) {
                panel.curves.push(curve);
            }
        }
        log::debug!("{}: overlaid {} with {} bins", spec.section, overlay, overlay_bins);
    }

    let x_range = match spec.x_range {
        Some(range) => range,
        None => positive_extent(panels.iter().flat_map(|p| p.curves.iter().flatten()).map(|(x, _)| *x))
            .ok_or_else(|| {
                SampleError::unavailable(
                    &sample.array_path(spec.section, spec.x_array),
                    "no positive values for a log axis",
                )
            })?,
    };

    Ok(TriangleChart {
        nbin,
        panels,
        x_range,
        y_range: spec.y_range,
        annotate: spec.annotate,
    })
}

/// Smallest and largest finite positive value
pub fn positive_extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
