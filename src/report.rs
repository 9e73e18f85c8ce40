//! JSON report of a plotting run.

use crate::plot::{PlotOptions, PlotOutcome};
use crate::sample::{SampleDirectory, ScalarValue};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// What a run produced, plus the scalar parameters of the sample it read
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub sample_dir: PathBuf,
    pub output_dir: PathBuf,
    pub image_type: String,
    pub plots: Vec<PlotOutcome>,
    pub sections: BTreeMap<String, BTreeMap<String, ScalarValue>>,
}

impl RunReport {
    pub fn new(sample: &SampleDirectory, options: &PlotOptions, outcomes: &[PlotOutcome]) -> Self {
        Self {
            generated_at: Utc::now(),
            sample_dir: sample.root().to_path_buf(),
            output_dir: options.output_dir.clone(),
            image_type: options.image_type.suffix.clone(),
            plots: outcomes.to_vec(),
            sections: collect_values(sample),
        }
    }

    pub fn rendered(&self) -> usize {
        self.plots
            .iter()
            .filter(|p| matches!(p, PlotOutcome::Rendered { .. }))
            .count()
    }

    /// Write the report as pretty-printed JSON
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// `values.txt` of every section; sections without one are left out
fn collect_values(sample: &SampleDirectory) -> BTreeMap<String, BTreeMap<String, ScalarValue>> {
    let sections = match sample.sections() {
        Ok(sections) => sections,
        Err(e) => {
            warn!("Cannot list sections for the report: {}", e);
            return BTreeMap::new();
        }
    };

    let mut values = BTreeMap::new();
    for section in sections {
        match sample.load_values(&section) {
            Ok(v) => {
                values.insert(section, v);
            }
            Err(e) if e.is_data_absence() => {}
            Err(e) => warn!("Leaving {} out of the report: {}", section, e),
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_report_lists_outcomes_and_values() {
        let sample_dir = TempDir::new().unwrap();
        let root = sample_dir.path();
        fs::create_dir_all(root.join("cosmological_parameters")).unwrap();
        fs::write(root.join("cosmological_parameters/values.txt"), "h0 = 0.7\nname = lcdm\n").unwrap();
        fs::create_dir_all(root.join("distances")).unwrap();
        fs::create_dir_all(root.join("broken")).unwrap();
        fs::write(root.join("broken/values.txt"), "no separator\n").unwrap();

        let out = TempDir::new().unwrap();
        let options = PlotOptions {
            output_dir: out.path().to_path_buf(),
            prefix: String::new(),
            image_type: "svg".parse().unwrap(),
        };
        let outcomes = vec![
            PlotOutcome::Rendered {
                filename: "growth".to_string(),
                path: out.path().join("growth.svg"),
                panels: 1,
            },
            PlotOutcome::Skipped {
                filename: "hubble".to_string(),
                reason: "file is missing".to_string(),
            },
        ];

        let report = RunReport::new(&SampleDirectory::new(root), &options, &outcomes);
        assert_eq!(report.rendered(), 1);
        assert_eq!(report.sections.len(), 1);
        assert_eq!(
            report.sections["cosmological_parameters"]["h0"],
            ScalarValue::Float(0.7)
        );

        let path = out.path().join("report.json");
        report.write(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(json["image_type"], "svg");
        assert_eq!(json["plots"][0]["status"], "rendered");
        assert_eq!(json["plots"][1]["status"], "skipped");
        assert_eq!(json["plots"][1]["filename"], "hubble");
        assert_eq!(json["sections"]["cosmological_parameters"]["name"], "lcdm");
        assert_eq!(json["sections"]["cosmological_parameters"]["h0"], 0.7);
    }
}
