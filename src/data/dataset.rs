use anyhow::{ensure, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::origin::{TrackOrigin, NUM_CLASSES};
use crate::domain::track::{TrackRecord, TrackVariable};

/// One feature row with its class label.
/// `features` follows the column order of the variable list it was
/// extracted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    pub features: Vec<f32>,
    pub origin:   TrackOrigin,
}

impl TrackSample {
    pub fn new(features: Vec<f32>, origin: TrackOrigin) -> Self {
        Self { features, origin }
    }

    pub fn one_hot(&self) -> [f32; NUM_CLASSES] {
        self.origin.one_hot()
    }
}

/// Extract the selected variables from every track.
///
/// Rows with a non-finite value in any selected column are dropped.
pub fn extract_samples(tracks: &[TrackRecord], variables: &[TrackVariable]) -> Vec<TrackSample> {
    extract_indexed(tracks, variables).1
}

/// Like `extract_samples`, but also returns the position in `tracks`
/// of every kept row, so results can be matched back to their track.
pub fn extract_indexed(
    tracks:    &[TrackRecord],
    variables: &[TrackVariable],
) -> (Vec<usize>, Vec<TrackSample>) {
    let mut kept    = Vec::with_capacity(tracks.len());
    let mut samples = Vec::with_capacity(tracks.len());

    for (i, track) in tracks.iter().enumerate() {
        let features: Vec<f32> = variables.iter().map(|v| v.value(track)).collect();
        if features.iter().all(|x| x.is_finite()) {
            kept.push(i);
            samples.push(TrackSample::new(features, track.origin()));
        }
    }

    let dropped = tracks.len() - samples.len();
    if dropped > 0 {
        tracing::warn!("Dropped {} tracks with non-finite feature values", dropped);
    }
    (kept, samples)
}

/// Number of samples per class, indexed by `TrackOrigin::index`.
pub fn class_counts(samples: &[TrackSample]) -> [usize; NUM_CLASSES] {
    let mut counts = [0usize; NUM_CLASSES];
    for s in samples {
        counts[s.origin.index()] += 1;
    }
    counts
}

/// Every row must have exactly `width` columns.
pub fn check_feature_width(samples: &[TrackSample], width: usize) -> Result<()> {
    if let Some((i, bad)) = samples
        .iter()
        .enumerate()
        .find(|(_, s)| s.features.len() != width)
    {
        anyhow::bail!(
            "sample {} has {} features, expected {}",
            i,
            bad.features.len(),
            width
        );
    }
    Ok(())
}

/// In-memory feature rows served to Burn's DataLoader.
pub struct TrackDataset {
    samples:      Vec<TrackSample>,
    num_features: usize,
}

impl TrackDataset {
    /// Empty input is allowed; ragged rows are not.
    pub fn new(samples: Vec<TrackSample>) -> Result<Self> {
        let num_features = samples.first().map_or(0, |s| s.features.len());
        check_feature_width(&samples, num_features)?;
        Ok(Self { samples, num_features })
    }

    /// Like `new`, but an empty sample list is an error.
    pub fn non_empty(samples: Vec<TrackSample>, what: &str) -> Result<Self> {
        ensure!(!samples.is_empty(), "the {what} set has no samples");
        Self::new(samples)
    }

    pub fn num_features(&self) -> usize { self.num_features }
}

impl Dataset<TrackSample> for TrackDataset {
    fn get(&self, index: usize) -> Option<TrackSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(pt: f32, eta: f32, origin_label: i32) -> TrackRecord {
        TrackRecord {
            pt,
            eta,
            valid: true,
            ftag_truth_origin_label: origin_label,
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_uses_variable_order() {
        let tracks  = vec![track(10.0, 0.5, 2), track(20.0, -1.0, 0)];
        let samples = extract_samples(&tracks, &[TrackVariable::Eta, TrackVariable::Pt]);
        assert_eq!(samples[0].features, vec![0.5, 10.0]);
        assert_eq!(samples[1].origin, TrackOrigin::PileUp);
    }

    #[test]
    fn test_extract_drops_non_finite_rows() {
        let tracks  = vec![track(f32::NAN, 0.5, 2), track(1.0, f32::INFINITY, 0), track(1.0, 1.0, 4)];
        let samples = extract_samples(&tracks, &[TrackVariable::Pt, TrackVariable::Eta]);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].origin, TrackOrigin::Other);
    }

    #[test]
    fn test_extract_indexed_points_back_to_tracks() {
        let tracks = vec![track(1.0, 0.0, 2), track(f32::NAN, 0.0, 0), track(3.0, 0.0, 5)];
        let (kept, samples) = extract_indexed(&tracks, &[TrackVariable::Pt]);
        assert_eq!(kept, vec![0, 2]);
        assert_eq!(samples[1].features, vec![3.0]);
        assert_eq!(samples[1].origin, TrackOrigin::Other);
    }

    #[test]
    fn test_class_counts() {
        let samples = vec![
            TrackSample::new(vec![0.0], TrackOrigin::Prompt),
            TrackSample::new(vec![0.0], TrackOrigin::Other),
            TrackSample::new(vec![0.0], TrackOrigin::Other),
        ];
        assert_eq!(class_counts(&samples), [1, 0, 2]);
    }

    #[test]
    fn test_dataset_rejects_ragged_rows() {
        let samples = vec![
            TrackSample::new(vec![0.0, 1.0], TrackOrigin::Prompt),
            TrackSample::new(vec![0.0], TrackOrigin::Prompt),
        ];
        assert!(TrackDataset::new(samples).is_err());
    }

    #[test]
    fn test_dataset_get_and_len() {
        let samples = vec![
            TrackSample::new(vec![1.0, 2.0], TrackOrigin::Prompt),
            TrackSample::new(vec![3.0, 4.0], TrackOrigin::PileUp),
        ];
        let ds = TrackDataset::new(samples).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.num_features(), 2);
        assert_eq!(ds.get(1).unwrap().features, vec![3.0, 4.0]);
        assert!(ds.get(2).is_none());
    }
}
