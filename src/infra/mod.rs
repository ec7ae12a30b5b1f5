// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything a run leaves on disk:
//
//   checkpoint.rs — run directory layout
//                   model weights via Burn's CompactRecorder,
//                   TrainConfig, fitted scaler and evaluation
//                   report as JSON
//
//   metrics.rs    — per-epoch loss / accuracy CSV log

/// Run directory: weights, config, scaler, report
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
