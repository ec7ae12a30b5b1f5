// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists a finished training run so it can be evaluated or
// used for inference later.
//
// Run directory layout:
//   runs/
//     train_config.json   ← variables, architecture, hyperparameters
//     scaler.json         ← fitted column means / standard deviations
//     model.mpk.gz        ← weights (Burn CompactRecorder)
//     evaluation.json     ← test-set report
//     metrics.csv         ← per-epoch metrics (MetricsLogger)
//
// CompactRecorder stores MessagePack compressed with gzip at half
// precision; loading fails if the architecture does not match.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::scaler::StandardScaler;
use crate::ml::evaluator::EvaluationReport;
use crate::ml::model::{TrackClassifier, TrackClassifierRecord};

const CONFIG_FILE: &str = "train_config.json";
const SCALER_FILE: &str = "scaler.json";
const REPORT_FILE: &str = "evaluation.json";
const MODEL_STEM:  &str = "model";

/// Reads and writes the files of one run directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Nothing is created until the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create run directory '{}'", self.dir.display()))
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read '{}'. Have you run 'train' first?", path.display())
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }

    /// Write the weights to `model.mpk.gz`.
    pub fn save_model<B: Backend>(&self, model: &TrackClassifier<B>) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(MODEL_STEM);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;
        tracing::info!("Saved model weights to '{}'", path.display());
        Ok(())
    }

    /// Load weights into a freshly initialised model of the same architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  TrackClassifier<B>,
        device: &B::Device,
    ) -> Result<TrackClassifier<B>> {
        let path = self.dir.join(MODEL_STEM);
        let record: TrackClassifierRecord<B> = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load model '{}'. Have you run 'train' first?", path.display())
            })?;
        Ok(model.load_record(record))
    }

    /// Write `train_config.json`.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)
    }

    /// Read `train_config.json` back; the variable list and layer
    /// sizes come from here at inference time.
    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(CONFIG_FILE)
    }

    /// Write the fitted column statistics to `scaler.json`.
    pub fn save_scaler(&self, scaler: &StandardScaler) -> Result<()> {
        self.write_json(SCALER_FILE, scaler)
    }

    /// Read `scaler.json` back.
    pub fn load_scaler(&self) -> Result<StandardScaler> {
        self.read_json(SCALER_FILE)
    }

    /// Write the test-set report to `evaluation.json`.
    pub fn save_report(&self, report: &EvaluationReport) -> Result<()> {
        self.write_json(REPORT_FILE, report)
    }
}
