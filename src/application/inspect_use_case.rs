// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Loads tracks and renders the per-class summary: counts,
// mean ± std of every selected variable, and a histogram of one
// variable split by class.

use anyhow::Result;

use crate::data::{loader::open_source, summary};
use crate::domain::track::TrackVariable;
use crate::domain::traits::LoadRequest;

/// Settings of one `inspect` invocation.
pub struct InspectUseCase {
    /// Track file (.jsonl or .csv)
    pub input:     String,
    pub variables: Vec<TrackVariable>,
    /// Variable whose per-class distribution is binned
    pub histogram: TrackVariable,
    pub bins:      usize,
    pub request:   LoadRequest,
}

impl InspectUseCase {
    /// Returns the rendered text table.
    pub fn execute(&self) -> Result<String> {
        let tracks = open_source(&self.input)?.load(&self.request)?;
        let summaries = summary::summarize(&tracks, &self.variables);
        let hist = summary::histogram(&tracks, self.histogram, self.bins);
        if hist.is_none() {
            tracing::warn!("No finite '{}' values to histogram", self.histogram);
        }
        Ok(summary::render(&summaries, hist.as_ref()))
    }
}
