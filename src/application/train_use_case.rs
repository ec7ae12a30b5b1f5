// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load tracks from the event store   (Layer 4 - data)
//   Step 2: Extract selected variables         (Layer 4 - data)
//   Step 3: Balance the three classes          (Layer 4 - data)
//   Step 4: Fit + apply the feature scaler     (Layer 4 - data)
//   Step 5: Split train / validation / test    (Layer 4 - data)
//   Step 6: Save config                        (Layer 6 - infra)
//   Step 7: Run training loop                  (Layer 5 - ml)
//   Step 8: Evaluate on the test set           (Layer 5 - ml)
//   Step 9: Save weights, scaler, report       (Layer 6 - infra)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    balancer::balance_classes,
    dataset::{class_counts, extract_samples, TrackDataset, TrackSample},
    loader::open_source,
    scaler::StandardScaler,
    splitter::{split_dataset, DataSplit},
};
use crate::domain::track::TrackVariable;
use crate::domain::traits::LoadRequest;
use crate::infra::{checkpoint::CheckpointManager, metrics::{EpochMetrics, MetricsLogger}};
use crate::ml::evaluator::{self, EvaluationReport};
use crate::ml::model::TrackClassifierConfig;
use crate::ml::trainer::{run_training, TrainerSettings};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings of a training run. Saved next to the weights so
// `evaluate` and `predict` rebuild the same columns and network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Track file (.jsonl events or flat .csv)
    pub input:           String,
    /// Run directory, created if missing
    pub output_dir:      String,
    /// Feature columns, in network input order
    pub variables:       Vec<TrackVariable>,
    /// Read at most this many events (None = whole file)
    pub num_events:      Option<usize>,
    pub load_batch_size: usize,
    /// Tracks per mini-batch, also used for evaluation batches
    pub batch_size:      usize,
    /// Always run exactly this many epochs
    pub epochs:          usize,
    /// Adam learning rate
    pub lr:              f64,
    pub hidden_size:     usize,
    /// 0 gives a single linear layer
    pub hidden_layers:   usize,
    pub dropout:         f64,
    /// Each fraction in [0, 1), together at most 1
    pub test_fraction:   f64,
    pub val_fraction:    f64,
    /// Seeds balancing, splitting and batch shuffling
    pub seed:            u64,
}

/// Input variables used when none are given on the command line.
pub const DEFAULT_VARIABLES: &str =
    "pt,eta,phi,d0,z0SinTheta,d0Uncertainty,z0SinThetaUncertainty,numberOfPixelHits,numberOfSCTHits";

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            input:           "data/tracks.jsonl".to_string(),
            output_dir:      "runs".to_string(),
            variables:       TrackVariable::parse_list(DEFAULT_VARIABLES).unwrap_or_default(),
            num_events:      None,
            load_batch_size: 1_000,
            batch_size:      256,
            epochs:          20,
            lr:              1e-3,
            hidden_size:     64,
            hidden_layers:   3,
            dropout:         0.0,
            test_fraction:   0.1,
            val_fraction:    0.1,
            seed:            42,
        }
    }
}

impl TrainConfig {
    /// Network shape for the selected variables.
    pub fn model_config(&self) -> TrackClassifierConfig {
        TrackClassifierConfig::uniform(self.variables.len(), self.hidden_size, self.hidden_layers)
            .with_dropout(self.dropout)
    }

    pub fn trainer_settings(&self) -> TrainerSettings {
        TrainerSettings {
            epochs:     self.epochs,
            batch_size: self.batch_size,
            lr:         self.lr,
            seed:       self.seed,
        }
    }

    /// How much of the input file to read.
    pub fn load_request(&self) -> LoadRequest {
        LoadRequest { num_events: self.num_events, batch_size: self.load_batch_size }
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct TrainSummary {
    pub history: Vec<EpochMetrics>,
    pub report:  EvaluationReport,
}

/// Balance, scale and split extracted samples (Steps 3–5).
pub fn prepare_splits(
    samples: Vec<TrackSample>,
    cfg:     &TrainConfig,
) -> Result<(DataSplit<TrackSample>, StandardScaler)> {
    let mut balanced = balance_classes(samples, cfg.seed)?;

    // The scaler is fitted on the whole balanced matrix, before splitting
    let scaler = StandardScaler::fit_transform(&mut balanced)?;

    let split = split_dataset(balanced, cfg.test_fraction, cfg.val_fraction, cfg.seed)?;
    tracing::info!(
        "Split: {} train, {} validation, {} test",
        split.train.len(),
        split.val.len(),
        split.test.len()
    );
    Ok((split, scaler))
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
/// Runs the whole training pipeline for one `TrainConfig`.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Runs Steps 1–9 and returns the epoch history and the test-set report.
    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;
        cfg.model_config().validate().context("Invalid network configuration")?;

        // ── Step 1: Load tracks ───────────────────────────────────────────────
        tracing::info!("Loading tracks from '{}'", cfg.input);
        let source = open_source(&cfg.input)?;
        let tracks = source.load(&cfg.load_request())?;

        // ── Step 2: Feature extraction ────────────────────────────────────────
        let samples = extract_samples(&tracks, &cfg.variables);
        drop(tracks);
        let counts = class_counts(&samples);
        tracing::info!(
            "Extracted {} samples over {} variables (prompt={}, pileup={}, other={})",
            samples.len(),
            cfg.variables.len(),
            counts[0],
            counts[1],
            counts[2]
        );

        // ── Steps 3-5: Balance, scale, split ──────────────────────────────────
        let (split, scaler) = prepare_splits(samples, cfg)?;
        let test_samples    = split.test;
        let train_dataset   = TrackDataset::non_empty(split.train, "training")?;
        let val_dataset     = TrackDataset::new(split.val)?;

        // ── Step 6: Save config ───────────────────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.output_dir);
        ckpt_manager.save_config(cfg)?;
        let metrics_logger = MetricsLogger::new(&cfg.output_dir)?;

        // ── Step 7: Training loop (Layer 5) ───────────────────────────────────
        let outcome = run_training(
            &cfg.trainer_settings(),
            &cfg.model_config(),
            train_dataset,
            val_dataset,
            Some(&metrics_logger),
        )?;

        // ── Step 8: Held-out evaluation ───────────────────────────────────────
        let device = burn::backend::ndarray::NdArrayDevice::default();
        let report = evaluator::evaluate(&outcome.model, &test_samples, cfg.batch_size, &device)?;

        // ── Step 9: Persist the run ───────────────────────────────────────────
        ckpt_manager.save_model(&outcome.model)?;
        ckpt_manager.save_scaler(&scaler)?;
        ckpt_manager.save_report(&report)?;
        tracing::info!("Epoch metrics written to '{}'", metrics_logger.csv_path().display());

        Ok(TrainSummary { history: outcome.history, report })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::origin::TrackOrigin;
    use std::io::Write;

    /// 100 rows per class, 5 numeric features.
    fn synthetic_samples() -> Vec<TrackSample> {
        let mut out = Vec::new();
        for origin in TrackOrigin::ALL {
            let shift = origin.index() as f32;
            for i in 0..100 {
                let x = i as f32 / 100.0;
                out.push(TrackSample::new(
                    vec![shift + x, shift * 2.0 - x, x * x, shift, 10.0 + x],
                    origin,
                ));
            }
        }
        out
    }

    #[test]
    fn test_end_to_end_split_sizes() {
        let cfg = TrainConfig { test_fraction: 0.1, val_fraction: 0.1, ..TrainConfig::default() };
        let (split, scaler) = prepare_splits(synthetic_samples(), &cfg).unwrap();

        assert_eq!(split.test.len(),  30);
        assert_eq!(split.val.len(),   30);
        assert_eq!(split.train.len(), 240);
        assert_eq!(scaler.num_features(), 5);

        let mut all = split.train.clone();
        all.extend(split.val.iter().cloned());
        all.extend(split.test.iter().cloned());
        assert_eq!(class_counts(&all), [100, 100, 100]);
    }

    #[test]
    fn test_default_model_config_is_valid() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.variables.len(), 9);
        assert!(cfg.model_config().validate().is_ok());
    }

    /// Writes a small JSONL event file with separable classes.
    pub(crate) fn write_events(path: &std::path::Path, events: usize) {
        let mut f = std::fs::File::create(path).unwrap();
        for e in 0..events {
            let mut tracks = Vec::new();
            for (k, label) in [2, 0, 5].iter().enumerate() {
                let x = ((e * 3 + k) as f32 * 0.37).sin() * 0.1;
                tracks.push(format!(
                    r#"{{"pt": {}, "eta": {}, "phi": {}, "d0": {}, "z0SinTheta": {}, "valid": true, "ftagTruthOriginLabel": {}}}"#,
                    5.0 + k as f32 * 5.0 + x,
                    x,
                    -x,
                    k as f32 * 0.5 + x,
                    if k == 1 { 3.0 } else { 0.0 } + x,
                    label
                ));
            }
            // One padding track per event
            tracks.push(r#"{"pt": 0, "valid": false}"#.to_string());
            writeln!(f, r#"{{"eventNumber": {}, "tracks": [{}]}}"#, e, tracks.join(",")).unwrap();
        }
    }

    pub(crate) fn small_config(input: &std::path::Path, out: &std::path::Path) -> TrainConfig {
        TrainConfig {
            input:         input.display().to_string(),
            output_dir:    out.display().to_string(),
            variables:     TrackVariable::parse_list("pt,eta,phi,d0,z0SinTheta").unwrap(),
            batch_size:    16,
            epochs:        3,
            lr:            1e-2,
            hidden_size:   8,
            hidden_layers: 2,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_execute_writes_run_directory() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("events.jsonl");
        let out   = dir.path().join("run");
        write_events(&input, 60);

        let summary = TrainUseCase::new(small_config(&input, &out)).execute().unwrap();
        assert_eq!(summary.history.len(), 3);
        // 60 events x 3 valid tracks, balanced 60 per class, 10% test
        assert_eq!(summary.report.samples, 18);

        for file in ["train_config.json", "scaler.json", "model.mpk.gz", "metrics.csv", "evaluation.json"] {
            assert!(out.join(file).exists(), "missing {file}");
        }
    }

    #[test]
    fn test_missing_class_fails_cleanly() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("events.jsonl");
        std::fs::write(
            &input,
            "{\"tracks\": [{\"pt\": 1, \"valid\": true, \"ftagTruthOriginLabel\": 2}]}\n",
        )
        .unwrap();
        let err = TrainUseCase::new(small_config(&input, &dir.path().join("run")))
            .execute()
            .unwrap_err();
        assert!(err.to_string().contains("cannot balance classes"));
    }
}
