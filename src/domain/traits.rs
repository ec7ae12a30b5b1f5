// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to track stores only through
// TrackSource, so the JSON-lines event loader and the flat CSV
// loader are interchangeable.

use anyhow::Result;
use crate::domain::track::TrackRecord;

/// How much to read from a track source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    /// Stop after this many events (None = read everything)
    pub num_events: Option<usize>,

    /// Progress is logged every `batch_size` events; records are
    /// still read one event at a time
    pub batch_size: usize,
}

impl Default for LoadRequest {
    fn default() -> Self {
        Self { num_events: None, batch_size: 1_000 }
    }
}

// ─── TrackSource ──────────────────────────────────────────────────────────────
/// Any component that can produce flattened, valid track records.
///
/// Implementations:
///   - EventFileLoader → JSON lines, one event with nested tracks per line
///   - CsvTrackLoader  → flat CSV table, one track per row
pub trait TrackSource {
    /// Read tracks from the source. Nested per-event arrays are
    /// flattened and tracks with `valid == false` are dropped.
    fn load(&self, request: &LoadRequest) -> Result<Vec<TrackRecord>>;
}
