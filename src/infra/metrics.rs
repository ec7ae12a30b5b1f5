// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: mean cross-entropy over training batches
//   - train_acc:  fraction of training rows predicted correctly
//   - val_loss:   mean cross-entropy over validation batches
//   - val_acc:    fraction of validation rows predicted correctly
//
// Output file: <run dir>/metrics.csv
//
//   epoch,train_loss,train_acc,val_loss,val_acc
//   1,1.012300,0.481000,0.953100,0.522000
//   2,0.911700,0.560000,0.884200,0.571000

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

const HEADER: [&str; 5] = ["epoch", "train_loss", "train_acc", "val_loss", "val_acc"];

/// Loss and accuracy of both phases of one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,

    /// NaN when the training set produced no batches
    pub train_loss: f64,

    /// Range: [0.0, 1.0]
    pub train_acc: f64,

    /// NaN when the validation set is empty
    pub val_loss: f64,

    pub val_acc: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, train_acc: f64, val_loss: f64, val_acc: f64) -> Self {
        Self { epoch, train_loss, train_acc, val_loss, val_acc }
    }

    fn to_record(&self) -> [String; 5] {
        [
            self.epoch.to_string(),
            format!("{:.6}", self.train_loss),
            format!("{:.6}", self.train_acc),
            format!("{:.6}", self.val_loss),
            format!("{:.6}", self.val_acc),
        ]
    }
}

/// Appends one row per epoch to `metrics.csv` in the run directory.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Starts a fresh file; a previous run's metrics are replaced.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create run directory '{}'", dir.display()))?;

        let csv_path   = dir.join("metrics.csv");
        let mut writer = csv::Writer::from_path(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writer.write_record(HEADER)?;
        writer.flush()?;

        Ok(Self { csv_path })
    }

    /// Append one row for `m`.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(m.to_record())?;
        writer.flush()?;

        tracing::debug!("metrics.csv <- epoch {}", m.epoch);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
