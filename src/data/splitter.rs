// ============================================================
// Layer 4 — Train/Validation/Test Split Manager
// ============================================================
// Shuffles sample indices with a seeded RNG and cuts them into
// three disjoint partitions:
//
//   test  = round(n * test_fraction)
//   val   = round(n * val_fraction)
//   train = n - test - val            (the remainder)
//
// The three sizes always add up to n exactly.
//
// Example: 300 samples, 10% test, 10% val → 30 / 30 / 240

use anyhow::{ensure, Result};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Index partitions into the dataset that was split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub val:   Vec<usize>,
    pub test:  Vec<usize>,
}

impl SplitIndices {
    /// Sum of the three partition sizes.
    pub fn total(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }
}

/// The three subsets after applying a SplitIndices.
#[derive(Debug, Clone)]
pub struct DataSplit<T> {
    pub train: Vec<T>,
    pub val:   Vec<T>,
    pub test:  Vec<T>,
}

fn check_fraction(name: &str, f: f64) -> Result<()> {
    ensure!(
        (0.0..1.0).contains(&f),
        "{name} fraction must be in [0, 1), got {f}"
    );
    Ok(())
}

/// Compute shuffled train/val/test index partitions for `n` samples.
pub fn split_indices(
    n:             usize,
    test_fraction: f64,
    val_fraction:  f64,
    seed:          u64,
) -> Result<SplitIndices> {
    check_fraction("test", test_fraction)?;
    check_fraction("validation", val_fraction)?;
    ensure!(
        test_fraction + val_fraction <= 1.0,
        "test + validation fractions exceed 1 ({test_fraction} + {val_fraction})"
    );

    let n_test = ((n as f64) * test_fraction).round() as usize;
    let n_val  = ((n as f64) * val_fraction).round() as usize;
    // Rounding both up can overshoot n on tiny datasets
    let n_test = n_test.min(n);
    let n_val  = n_val.min(n - n_test);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut rest = indices.split_off(n_test);
    let test     = indices;
    let train    = rest.split_off(n_val);
    let val      = rest;

    Ok(SplitIndices { train, val, test })
}

/// Split `samples` into train/val/test subsets.
pub fn split_dataset<T>(
    samples:       Vec<T>,
    test_fraction: f64,
    val_fraction:  f64,
    seed:          u64,
) -> Result<DataSplit<T>> {
    let idx = split_indices(samples.len(), test_fraction, val_fraction, seed)?;
    tracing::debug!(
        "Split {} samples: {} train, {} validation, {} test",
        idx.total(),
        idx.train.len(),
        idx.val.len(),
        idx.test.len()
    );

    // Move samples out by index without cloning
    let mut slots: Vec<Option<T>> = samples.into_iter().map(Some).collect();
    let mut take = |ids: &[usize]| -> Vec<T> {
        ids.iter().filter_map(|&i| slots[i].take()).collect()
    };

    Ok(DataSplit {
        train: take(&idx.train),
        val:   take(&idx.val),
        test:  take(&idx.test),
    })
}
