//! Plot generation from a sample directory.

use crate::catalog::{PlotDescriptor, CATALOG};
use crate::prepare::prepare;
use crate::render::render;
use crate::sample::SampleDirectory;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Image encoding behind an output suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Bmp,
    Svg,
}

/// The `--type` argument: the suffix as given plus the format it selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageType {
    pub suffix: String,
    pub format: ImageFormat,
}

impl FromStr for ImageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let suffix = s.trim_start_matches('.');
        let format = match suffix.to_ascii_lowercase().as_str() {
            "png" => ImageFormat::Png,
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "bmp" => ImageFormat::Bmp,
            "svg" => ImageFormat::Svg,
            other => {
                return Err(format!(
                    "unsupported image type '{}' (expected png, jpg, jpeg, bmp or svg)",
                    other
                ))
            }
        };
        Ok(Self {
            suffix: suffix.to_string(),
            format,
        })
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.suffix)
    }
}

/// Where and how plots are written
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub output_dir: PathBuf,
    pub prefix: String,
    pub image_type: ImageType,
}

impl PlotOptions {
    /// `<output_dir>/<prefix_><filename>.<suffix>`
    pub fn output_path(&self, filename: &str) -> PathBuf {
        let name = if self.prefix.is_empty() {
            format!("{}.{}", filename, self.image_type.suffix)
        } else {
            format!("{}_{}.{}", self.prefix, filename, self.image_type.suffix)
        };
        self.output_dir.join(name)
    }
}

/// Result of one catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PlotOutcome {
    Rendered {
        filename: String,
        path: PathBuf,
        panels: usize,
    },
    Skipped {
        filename: String,
        reason: String,
    },
}

impl PlotOutcome {
    pub fn filename(&self) -> &str {
        match self {
            PlotOutcome::Rendered { filename, .. } | PlotOutcome::Skipped { filename, .. } => filename,
        }
    }
}

/// Render one plot, turning missing data into a skip
pub fn make_plot(
    descriptor: &PlotDescriptor,
    sample: &SampleDirectory,
    options: &PlotOptions,
) -> Result<PlotOutcome> {
    let figure = match prepare(descriptor, sample) {
        Ok(figure) => figure,
        Err(e) if e.is_data_absence() => {
            warn!("Not making plot: {} (no data in this sample)", descriptor.filename);
            debug!("{}: {}", descriptor.filename, e);
            return Ok(PlotOutcome::Skipped {
                filename: descriptor.filename.to_string(),
                reason: e.to_string(),
            });
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load data for plot '{}'", descriptor.filename))
        }
    };

    let path = options.output_path(descriptor.filename);
    info!("Saving {}", path.display());
    let panels = render(&figure, descriptor, options.image_type.format, &path)
        .with_context(|| format!("Failed to render {}", path.display()))?;

    Ok(PlotOutcome::Rendered {
        filename: descriptor.filename.to_string(),
        path,
        panels,
    })
}

/// Generate every catalog plot the sample has data for
pub fn generate_plots(sample: &SampleDirectory, options: &PlotOptions) -> Result<Vec<PlotOutcome>> {
    std::fs::create_dir_all(&options.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            options.output_dir.display()
        )
    })?;

    CATALOG
        .iter()
        .map(|descriptor| make_plot(descriptor, sample, options))
        .collect()
}
