// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fixed-epoch train + validation loop using Burn's DataLoader
// and Adam.
//
// Every epoch has two phases:
//   TRAIN     forward → cross-entropy → backward → Adam step,
//             once per mini-batch (shuffled, seeded)
//   VALIDATE  forward only, on model.valid() (inner backend,
//             dropout disabled, no gradients)
//
// Batches are produced on the calling thread (no loader workers).
// The loop always runs `epochs` epochs. A non-finite loss is
// reported but training carries on.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::data::{batcher::TrackBatcher, dataset::TrackDataset};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{TrackClassifier, TrackClassifierConfig};

/// CPU backend with gradient tracking, used for the TRAIN phase.
pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
/// Same backend without autodiff, for validation and inference.
pub type EvalBackend  = burn::backend::NdArray;

/// Loop hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct TrainerSettings {
    /// Fixed number of passes over the training set
    pub epochs:     usize,
    pub batch_size: usize,
    pub lr:         f64,
    /// Seed of the DataLoader shuffle
    pub seed:       u64,
}

/// Result of `run_training`.
pub struct TrainingOutcome {
    /// Trained weights on the inference backend
    pub model:   TrackClassifier<EvalBackend>,
    /// One entry per epoch, in order
    pub history: Vec<EpochMetrics>,
}

fn mean_or_nan(sum: f64, count: usize) -> f64 {
    if count > 0 { sum / count as f64 } else { f64::NAN }
}

fn fraction(correct: usize, total: usize) -> f64 {
    if total > 0 { correct as f64 / total as f64 } else { 0.0 }
}

/// Number of rows whose argmax logit equals the target class.
fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns shape [batch, 1] — flatten to [batch]
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predicted
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as usize
}

/// Train a fresh network for `settings.epochs` epochs and return it on
/// the inference backend together with the per-epoch metrics. Each
/// epoch is printed and, when a logger is given, appended to its CSV.
pub fn run_training(
    settings:      &TrainerSettings,
    model_cfg:     &TrackClassifierConfig,
    train_dataset: TrackDataset,
    val_dataset:   TrackDataset,
    logger:        Option<&MetricsLogger>,
) -> Result<TrainingOutcome> {
    ensure!(
        train_dataset.num_features() == model_cfg.num_features(),
        "training rows have {} features but the network expects {}",
        train_dataset.num_features(),
        model_cfg.num_features()
    );

    let device = burn::backend::ndarray::NdArrayDevice::default();
    tracing::info!("Using NdArray device: {:?}", device);

    let mut model: TrackClassifier<TrainBackend> = model_cfg.init(&device)?;
    tracing::info!(
        "Model ready: {} hidden layers, layer dims {:?}",
        model_cfg.hidden_layers,
        model_cfg.layer_dims
    );

    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let batch_size = settings.batch_size.max(1);

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = TrackBatcher::<TrainBackend>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(batch_size)
        .shuffle(settings.seed)
        .build(train_dataset);

    // ── Validation data loader (inner backend, no autodiff overhead) ──────────
    let val_batcher = TrackBatcher::<EvalBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(batch_size)
        .build(val_dataset);

    let mut history = Vec::with_capacity(settings.epochs);

    for epoch in 1..=settings.epochs {
        // ── TRAIN phase ───────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;
        let mut train_correct  = 0usize;
        let mut train_total    = 0usize;

        for batch in train_loader.iter() {
            let (loss, logits) = model.forward_loss(batch.features, batch.targets.clone());

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                tracing::warn!("Non-finite training loss ({}) in epoch {}", loss_val, epoch);
            }
            train_loss_sum += loss_val;
            train_batches  += 1;
            train_total    += batch.targets.dims()[0];
            train_correct  += count_correct(logits, batch.targets);

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(settings.lr, model, grads);
        }

        // ── VALIDATE phase ────────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut val_correct  = 0usize;
        let mut val_total    = 0usize;

        for batch in val_loader.iter() {
            let (loss, logits) = model_valid.forward_loss(batch.features, batch.targets.clone());
            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;
            val_total    += batch.targets.dims()[0];
            val_correct  += count_correct(logits, batch.targets);
        }

        let metrics = EpochMetrics::new(
            epoch,
            mean_or_nan(train_loss_sum, train_batches),
            fraction(train_correct, train_total),
            mean_or_nan(val_loss_sum, val_batches),
            fraction(val_correct, val_total),
        );

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
            epoch,
            settings.epochs,
            metrics.train_loss,
            metrics.train_acc * 100.0,
            metrics.val_loss,
            metrics.val_acc * 100.0,
        );

        if let Some(logger) = logger {
            logger.log(&metrics)?;
        }
        history.push(metrics);
    }

    tracing::info!("Training complete after {} epochs", settings.epochs);
    Ok(TrainingOutcome { model: model.valid(), history })
}
