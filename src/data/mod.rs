// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the event store file to tensor batches:
//
//   event store (.jsonl / .csv)
//       │
//       ▼
//   TrackSource       → reads events, flattens tracks, drops invalid
//       │
//       ▼
//   extract_samples   → selected variables + origin class per track
//       │
//       ▼
//   balance_classes   → equal count per class (down-sampling)
//       │
//       ▼
//   StandardScaler    → zero mean, unit variance per column
//       │
//       ▼
//   split_dataset     → train / validation / test
//       │
//       ▼
//   TrackDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   TrackBatcher      → stacks samples into tensor batches

/// Reads track records from JSON-lines events or flat CSV
pub mod loader;

/// Feature rows, class counts, Burn Dataset implementation
pub mod dataset;

/// Down-samples classes to equal size
pub mod balancer;

/// Standardises feature columns
pub mod scaler;

/// Seeded train/validation/test partitioning
pub mod splitter;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Per-class counts, statistics and histograms
pub mod summary;
