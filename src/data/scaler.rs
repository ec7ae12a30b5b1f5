// ============================================================
// Layer 4 — Feature Scaler
// ============================================================
// Standardises every feature column:
//
//   x' = (x - mean) / std
//
// mean and std are fitted once on the full feature matrix and
// stored with the trained model, so inference applies exactly
// the same transform in the same column order.
//
// Statistics are accumulated in f64; std is the population
// standard deviation. A constant column has std 0 and is only
// centred (scale 1.0).

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::data::dataset::{check_feature_width, TrackSample};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Column means of the fitted data
    pub means: Vec<f64>,
    /// Column standard deviations; 1.0 for constant columns
    pub stds:  Vec<f64>,
}

impl StandardScaler {
    /// Fit column means and standard deviations.
    pub fn fit(samples: &[TrackSample]) -> Result<Self> {
        ensure!(!samples.is_empty(), "cannot fit a scaler on zero samples");
        let width = samples[0].features.len();
        check_feature_width(samples, width)?;

        let n = samples.len() as f64;
        let mut means = vec![0.0f64; width];
        for s in samples {
            for (m, &x) in means.iter_mut().zip(&s.features) {
                *m += x as f64;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut vars = vec![0.0f64; width];
        for s in samples {
            for ((v, &x), m) in vars.iter_mut().zip(&s.features).zip(&means) {
                let d = x as f64 - m;
                *v += d * d;
            }
        }
        let stds = vars
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > f64::EPSILON { std } else { 1.0 }
            })
            .collect();

        tracing::debug!("Fitted scaler on {} samples x {} features", samples.len(), width);
        Ok(Self { means, stds })
    }

    pub fn num_features(&self) -> usize {
        self.means.len()
    }

    /// `(x - mean) / std` for every column, in place.
    pub fn transform_row(&self, features: &mut [f32]) {
        for ((x, m), s) in features.iter_mut().zip(&self.means).zip(&self.stds) {
            *x = ((*x as f64 - m) / s) as f32;
        }
    }

    /// Scale every sample in place. Errors if a row has the wrong width.
    pub fn transform(&self, samples: &mut [TrackSample]) -> Result<()> {
        check_feature_width(samples, self.num_features())?;
        for s in samples.iter_mut() {
            self.transform_row(&mut s.features);
        }
        Ok(())
    }

    /// Fit on `samples` and scale them with the result.
    pub fn fit_transform(samples: &mut [TrackSample]) -> Result<Self> {
        let scaler = Self::fit(samples)?;
        scaler.transform(samples)?;
        Ok(scaler)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::origin::TrackOrigin;

    fn column_stats(samples: &[TrackSample], col: usize) -> (f64, f64) {
        let n    = samples.len() as f64;
        let mean = samples.iter().map(|s| s.features[col] as f64).sum::<f64>() / n;
        let var  = samples
            .iter()
            .map(|s| (s.features[col] as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        (mean, var)
    }

    fn fixture() -> Vec<TrackSample> {
        (0..200)
            .map(|i| {
                let x = i as f32;
                TrackSample::new(vec![x * 3.0 + 100.0, (x * 0.37).sin() * 0.01, -x], TrackOrigin::Prompt)
            })
            .collect()
    }

    #[test]
    fn test_scaled_columns_have_zero_mean_unit_variance() {
        let mut samples = fixture();
        StandardScaler::fit_transform(&mut samples).unwrap();
        for col in 0..3 {
            let (mean, var) = column_stats(&samples, col);
            assert!(mean.abs() < 1e-4, "column {col} mean {mean}");
            assert!((var - 1.0).abs() < 1e-3, "column {col} variance {var}");
        }
    }

    #[test]
    fn test_constant_column_is_centred_not_divided_by_zero() {
        let mut samples: Vec<TrackSample> = (0..10)
            .map(|i| TrackSample::new(vec![5.0, i as f32], TrackOrigin::Other))
            .collect();
        let scaler = StandardScaler::fit_transform(&mut samples).unwrap();
        assert_eq!(scaler.stds[0], 1.0);
        assert!(samples.iter().all(|s| s.features[0] == 0.0));
    }

    #[test]
    fn test_width_mismatch_is_an_error() {
        let scaler = StandardScaler::fit(&fixture()).unwrap();
        let mut wrong = vec![TrackSample::new(vec![1.0], TrackOrigin::Prompt)];
        assert!(scaler.transform(&mut wrong).is_err());
    }

    #[test]
    fn test_empty_fit_is_an_error() {
        assert!(StandardScaler::fit(&[]).is_err());
    }
}
