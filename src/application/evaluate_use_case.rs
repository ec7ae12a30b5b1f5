// ============================================================
// Layer 2 — Evaluate / Predict Use Cases
// ============================================================
// Both reload a finished run through the Inferencer:
//
//   evaluate  → accuracy, confusion matrix, per-class AUC on all
//               valid tracks of a file (no balancing)
//   predict   → one CSV row of class probabilities per track

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::data::loader::open_source;
use crate::domain::origin::TrackOrigin;
use crate::domain::traits::LoadRequest;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::evaluator::EvaluationReport;
use crate::ml::inferencer::Inferencer;

/// A trained run reloaded from disk, plus how much of each input to read.
pub struct EvaluateUseCase {
    inferencer: Inferencer,
    request:    LoadRequest,
}

impl EvaluateUseCase {
    /// Fails when `run_dir` does not hold a complete run written by `train`.
    pub fn new(run_dir: impl Into<PathBuf>, num_events: Option<usize>) -> Result<Self> {
        let ckpt       = CheckpointManager::new(run_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt)?;
        let request    = LoadRequest { num_events, ..LoadRequest::default() };
        Ok(Self { inferencer, request })
    }

    /// Report over every usable track of `input`, without balancing.
    pub fn evaluate(&self, input: impl AsRef<Path>) -> Result<EvaluationReport> {
        let tracks = open_source(input.as_ref())?.load(&self.request)?;
        self.inferencer.evaluate(&tracks)
    }

    /// Score every track of `input` and write the probabilities to `output`.
    /// Returns the number of rows written.
    pub fn predict(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<usize> {
        let output = output.as_ref();
        let tracks = open_source(input.as_ref())?.load(&self.request)?;
        let predictions = self.inferencer.predict(&tracks)?;

        let mut writer = csv::Writer::from_path(output)
            .with_context(|| format!("Cannot create '{}'", output.display()))?;

        let mut header = vec!["eventNumber".to_string()];
        header.extend(TrackOrigin::ALL.iter().map(|o| format!("p_{}", o.name())));
        header.extend(["predicted".to_string(), "truth".to_string()]);
        writer.write_record(&header)?;

        for p in &predictions {
            let mut row = vec![p.event_number.to_string()];
            row.extend(p.probs.iter().map(|x| format!("{x:.6}")));
            row.push(p.predicted.map_or("unpredictable", TrackOrigin::name).to_string());
            row.push(p.truth.name().to_string());
            writer.write_record(&row)?;
        }
        writer.flush()?;

        tracing::info!("Wrote {} predictions to '{}'", predictions.len(), output.display());
        Ok(predictions.len())
    }
}
