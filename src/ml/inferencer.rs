// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds a trained run from its directory and scores new
// tracks with it:
//
//   train_config.json → variable list + layer dims → empty model
//   model.mpk.gz      → weights loaded into that model
//   scaler.json       → same standardisation as during training
//
// Tracks go through the same extraction (same column order) and
// scaling as the training data, but are NOT balanced.

use anyhow::{ensure, Result};
use serde::Serialize;

use crate::data::{
    dataset::{extract_indexed, extract_samples, TrackSample},
    scaler::StandardScaler,
};
use crate::domain::origin::{TrackOrigin, NUM_CLASSES};
use crate::domain::track::{TrackRecord, TrackVariable};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::evaluator::{self, EvaluationReport};
use crate::ml::model::TrackClassifier;

type InferBackend = burn::backend::NdArray;

/// Scores for one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Event the scored track came from
    pub event_number: u64,
    /// prompt, pileup, other
    pub probs:        [f32; NUM_CLASSES],
    /// None when the model output was not finite
    pub predicted:    Option<TrackOrigin>,
    /// Class from the truth label stored with the track
    pub truth:        TrackOrigin,
}

/// A trained run ready to score tracks.
pub struct Inferencer {
    model:      TrackClassifier<InferBackend>,
    scaler:     StandardScaler,
    variables:  Vec<TrackVariable>,
    batch_size: usize,
    device:     burn::backend::ndarray::NdArrayDevice,
}

impl Inferencer {
    /// Rebuild config, scaler and weights from a run directory.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device = burn::backend::ndarray::NdArrayDevice::default();
        let cfg    = ckpt_manager.load_config()?;
        let scaler = ckpt_manager.load_scaler()?;

        let model_cfg = cfg.model_config();
        ensure!(
            scaler.num_features() == cfg.variables.len(),
            "scaler has {} columns but the run uses {} variables",
            scaler.num_features(),
            cfg.variables.len()
        );

        let model: TrackClassifier<InferBackend> = model_cfg.init(&device)?;
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!(
            "Model loaded from '{}' ({} input variables)",
            ckpt_manager.dir().display(),
            cfg.variables.len()
        );

        Ok(Self {
            model,
            scaler,
            variables: cfg.variables,
            batch_size: cfg.batch_size,
            device,
        })
    }

    /// Extract and scale features exactly as during training.
    pub fn prepare(&self, tracks: &[TrackRecord]) -> Result<Vec<TrackSample>> {
        let mut samples = extract_samples(tracks, &self.variables);
        self.scaler.transform(&mut samples)?;
        Ok(samples)
    }

    /// Class probabilities for every track whose selected variables are
    /// all finite; other tracks are skipped.
    pub fn predict(&self, tracks: &[TrackRecord]) -> Result<Vec<Prediction>> {
        let (kept, mut samples) = extract_indexed(tracks, &self.variables);
        self.scaler.transform(&mut samples)?;

        let probs = evaluator::predict_probabilities(&self.model, &samples, self.batch_size, &self.device)?;
        Ok(kept
            .into_iter()
            .zip(probs)
            .map(|(i, probs)| Prediction {
                event_number: tracks[i].event_number,
                probs,
                predicted: evaluator::argmax(&probs).and_then(TrackOrigin::from_index),
                truth: tracks[i].origin(),
            })
            .collect())
    }

    /// Accuracy, confusion matrix and ROC over every usable track.
    pub fn evaluate(&self, tracks: &[TrackRecord]) -> Result<EvaluationReport> {
        let samples = self.prepare(tracks)?;
        evaluator::evaluate(&self.model, &samples, self.batch_size, &self.device)
    }
}
