// ============================================================
// Layer 4 — Class Balancer
// ============================================================
// Equalises the three origin classes by down-sampling:
//
//   1. Partition samples into prompt / pile-up / other
//   2. n = size of the smallest partition
//   3. Draw n samples from each partition (seeded, no replacement)
//   4. Concatenate and shuffle
//
// Example: 500 prompt, 120 pile-up, 300 other → 120 of each,
// 360 samples in total, classes interleaved after the shuffle.

use anyhow::{bail, Result};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::data::dataset::TrackSample;
use crate::domain::origin::{TrackOrigin, NUM_CLASSES};

/// Down-sample every class to the size of the smallest one.
///
/// Returns an error if any class has no samples at all.
pub fn balance_classes(samples: Vec<TrackSample>, seed: u64) -> Result<Vec<TrackSample>> {
    let mut partitions: [Vec<TrackSample>; NUM_CLASSES] = Default::default();
    for sample in samples {
        partitions[sample.origin.index()].push(sample);
    }

    let counts: Vec<usize> = partitions.iter().map(Vec::len).collect();
    tracing::info!(
        "Class counts before balancing: prompt={}, pileup={}, other={}",
        counts[0],
        counts[1],
        counts[2]
    );

    if let Some(empty) = TrackOrigin::ALL
        .iter()
        .find(|o| partitions[o.index()].is_empty())
    {
        bail!("cannot balance classes: no '{}' tracks in the input", empty);
    }

    let per_class = counts.iter().copied().min().unwrap_or(0);
    let mut rng   = ChaCha8Rng::seed_from_u64(seed);

    let mut balanced = Vec::with_capacity(per_class * NUM_CLASSES);
    for mut partition in partitions {
        // Shuffle then truncate: a uniform sample without replacement
        partition.shuffle(&mut rng);
        partition.truncate(per_class);
        balanced.extend(partition);
    }
    balanced.shuffle(&mut rng);

    tracing::info!("Balanced dataset: {} samples per class, {} total", per_class, balanced.len());
    Ok(balanced)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::class_counts;

    fn samples(prompt: usize, pileup: usize, other: usize) -> Vec<TrackSample> {
        let mut out = Vec::new();
        for (origin, n) in [
            (TrackOrigin::Prompt, prompt),
            (TrackOrigin::PileUp, pileup),
            (TrackOrigin::Other, other),
        ] {
            for i in 0..n {
                out.push(TrackSample::new(vec![i as f32], origin));
            }
        }
        out
    }

    #[test]
    fn test_counts_equal_after_balancing() {
        for (p, u, o) in [(500, 120, 300), (7, 7, 7), (1, 50, 9), (30, 2, 30)] {
            let balanced = balance_classes(samples(p, u, o), 42).unwrap();
            let min      = p.min(u).min(o);
            assert_eq!(class_counts(&balanced), [min, min, min]);
        }
    }

    #[test]
    fn test_already_balanced_keeps_everything() {
        let balanced = balance_classes(samples(100, 100, 100), 1).unwrap();
        assert_eq!(balanced.len(), 300);
        assert_eq!(class_counts(&balanced), [100, 100, 100]);
    }

    #[test]
    fn test_same_seed_same_result() {
        let a = balance_classes(samples(40, 10, 25), 7).unwrap();
        let b = balance_classes(samples(40, 10, 25), 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_is_shuffled() {
        // Input is ordered by class; the first 20 rows of the output
        // should not all be the same class
        let balanced = balance_classes(samples(20, 20, 20), 3).unwrap();
        assert!(balanced[..20].iter().any(|s| s.origin != TrackOrigin::Prompt));
    }

    #[test]
    fn test_empty_class_is_an_error() {
        let err = balance_classes(samples(10, 0, 10), 42).unwrap_err();
        assert!(err.to_string().contains("pileup"));
    }
}
