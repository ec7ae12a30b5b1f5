// ============================================================
// Layer 3 — Track Origin Classes
// ============================================================
// The three classes the network distinguishes, derived from
// the truth origin label stored with every track:
//
//   origin label 2  → Prompt   (primary collision vertex)
//   origin label 0  → PileUp   (unrelated simultaneous collision)
//   anything else   → Other    (secondary decays, fakes, ...)
//
// The mapping is an external labelling convention. Only the two
// values above are special-cased.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of output classes of the classifier.
pub const NUM_CLASSES: usize = 3;

/// Origin label value that marks a prompt track.
pub const PROMPT_ORIGIN_LABEL: i32 = 2;

/// Origin label value that marks a pile-up track.
pub const PILEUP_ORIGIN_LABEL: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrackOrigin {
    Prompt,
    PileUp,
    Other,
}

impl TrackOrigin {
    /// All classes in one-hot column order.
    pub const ALL: [TrackOrigin; NUM_CLASSES] =
        [TrackOrigin::Prompt, TrackOrigin::PileUp, TrackOrigin::Other];

    /// Map a truth origin label: 2 is prompt, 0 is pile-up, anything
    /// else is other.
    pub fn from_origin_label(label: i32) -> Self {
        match label {
            PROMPT_ORIGIN_LABEL => TrackOrigin::Prompt,
            PILEUP_ORIGIN_LABEL => TrackOrigin::PileUp,
            _ => TrackOrigin::Other,
        }
    }

    /// Column index in the one-hot encoding and in model outputs.
    pub fn index(self) -> usize {
        match self {
            TrackOrigin::Prompt => 0,
            TrackOrigin::PileUp => 1,
            TrackOrigin::Other => 2,
        }
    }

    /// Inverse of `index`; None past the last class.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// One-hot row: exactly one entry is 1.0.
    pub fn one_hot(self) -> [f32; NUM_CLASSES] {
        let mut row = [0.0; NUM_CLASSES];
        row[self.index()] = 1.0;
        row
    }

    /// Short lowercase name used in CSV headers and reports.
    pub fn name(self) -> &'static str {
        match self {
            TrackOrigin::Prompt => "prompt",
            TrackOrigin::PileUp => "pileup",
            TrackOrigin::Other => "other",
        }
    }
}

impl fmt::Display for TrackOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(TrackOrigin::from_origin_label(2), TrackOrigin::Prompt);
        assert_eq!(TrackOrigin::from_origin_label(0), TrackOrigin::PileUp);
        // Every other value falls into the catch-all class
        for label in [-1, 1, 3, 4, 5, 6, 7, 42] {
            assert_eq!(TrackOrigin::from_origin_label(label), TrackOrigin::Other);
        }
    }

    #[test]
    fn test_one_hot_has_single_one() {
        for origin in TrackOrigin::ALL {
            let row = origin.one_hot();
            assert_eq!(row.iter().sum::<f32>(), 1.0);
            assert_eq!(row[origin.index()], 1.0);
        }
    }

    #[test]
    fn test_index_round_trip() {
        for origin in TrackOrigin::ALL {
            assert_eq!(TrackOrigin::from_index(origin.index()), Some(origin));
        }
        assert_eq!(TrackOrigin::from_index(3), None);
    }
}
