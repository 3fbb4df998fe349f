// ============================================================
// Layer 6: Metrics Logger
// ============================================================
// Appends one CSV row per training iteration:
//
//   iteration,training_cost,validation_cost
//   0,0.693512,0.694003
//   1,0.688120,
//   ...
//
// validation_cost is blank on iterations that did not validate.
// The header is written only when the file is new, so restarted
// runs keep appending to the same log.

use anyhow::{Context, Result};
use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
};

use crate::ml::supervisor::{IterationReport, TrainingObserver};

const HEADER: &str = "iteration,training_cost,validation_cost";

/// Logs iteration costs to a CSV file for later plotting.
pub struct MetricsLogger {
    csv_path: PathBuf,
    writer:   BufWriter<File>,
}

impl MetricsLogger {
    /// Open `csv_path` for appending, writing the header if new.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        if let Some(dir) = csv_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;
        }

        let is_new = !csv_path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&csv_path)
            .with_context(|| format!("Cannot open metrics file '{}'", csv_path.display()))?;
        let mut writer = BufWriter::new(file);

        if is_new {
            writeln!(writer, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path, writer })
    }

    /// Append one row.
    pub fn log(&mut self, report: &IterationReport) -> Result<()> {
        let validation = report
            .validation_cost
            .map(|c| format!("{c:.6}"))
            .unwrap_or_default();

        writeln!(
            self.writer,
            "{},{:.6},{}",
            report.iteration, report.training_cost, validation
        )?;

        if report.validation_cost.is_some() {
            self.writer.flush()?;
        }
        Ok(())
    }
}

impl TrainingObserver for MetricsLogger {
    fn on_iteration(&mut self, report: &IterationReport) -> Result<()> {
        self.log(report)
            .with_context(|| format!("Cannot write metrics to '{}'", self.csv_path.display()))
    }
}

impl Drop for MetricsLogger {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!("Failed to flush metrics CSV: {}", e);
        }
    }
}
