// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Network, training loop and evaluation metrics.
//
//   model.rs      — fully connected classifier
//                   Linear → ReLU → Dropout per hidden layer,
//                   three output logits (prompt, pileup, other)
//
//   trainer.rs    — the training loop
//                   Adam + cross-entropy, shuffled mini-batches,
//                   per-epoch validation loss and accuracy
//
//   evaluator.rs  — accuracy, confusion matrix and one-vs-rest
//                   ROC curves with AUC on held-out tracks
//
//   inferencer.rs — reloads a saved run (weights + scaler +
//                   config) and scores new tracks

pub mod model;

pub mod trainer;

pub mod evaluator;

/// Inference engine: loads a run directory and predicts origins
pub mod inferencer;
