// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Forward-only pass over a held-out set, then:
//
//   accuracy   fraction of rows whose argmax probability is the
//              true class
//   confusion  3x3 counts, rows = true class, columns = predicted
//   ROC / AUC  per class, one-vs-rest: the class probability is the
//              score, rows of that class are the positives
//
// ROC points are taken at every distinct score, from (0,0) to
// (1,1); AUC is the trapezoidal area under those points.
//
// A diverged model can emit NaN probabilities. Such rows have no
// prediction: they are counted as `unpredictable`, count as wrong
// for accuracy, and are left out of the confusion matrix and ROC.

use anyhow::Result;
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{
    batcher::TrackBatcher,
    dataset::TrackSample,
};
use crate::domain::origin::{TrackOrigin, NUM_CLASSES};
use crate::ml::model::TrackClassifier;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    /// False positive rate
    pub fpr: f64,
    /// True positive rate
    pub tpr: f64,
    /// Score threshold; None for the (0,0) starting point
    pub threshold: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    /// Class treated as positive
    pub origin: TrackOrigin,
    pub points: Vec<RocPoint>,
    /// None when the set has no positives or no negatives for this class
    pub auc:    Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Rows evaluated, including unpredictable ones
    pub samples:       usize,
    /// Correct predictions over `samples`
    pub accuracy:      f64,
    /// Rows whose probabilities were not all finite
    pub unpredictable: usize,
    /// confusion[true class][predicted class]
    pub confusion:     [[usize; NUM_CLASSES]; NUM_CLASSES],
    /// One curve per class, in `TrackOrigin::ALL` order
    pub roc:           Vec<RocCurve>,
}

/// Index of the largest probability (first one on ties), or None
/// when any entry of the row is NaN or infinite.
pub fn argmax(row: &[f32; NUM_CLASSES]) -> Option<usize> {
    if !row.iter().all(|p| p.is_finite()) {
        return None;
    }
    Some(
        row.iter()
            .enumerate()
            .fold(0usize, |best, (i, &p)| if p > row[best] { i } else { best }),
    )
}

/// One-vs-rest ROC curve for `scores` against boolean `positives`.
/// Rows with a non-finite score are ignored.
pub fn roc_curve(scores: &[f32], positives: &[bool]) -> (Vec<RocPoint>, Option<f64>) {
    let mut order: Vec<usize> = (0..scores.len().min(positives.len()))
        .filter(|&i| scores[i].is_finite())
        .collect();

    let n_pos = order.iter().filter(|&&i| positives[i]).count();
    let n_neg = order.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return (Vec::new(), None);
    }

    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = vec![RocPoint { fpr: 0.0, tpr: 0.0, threshold: None }];
    let (mut tp, mut fp) = (0usize, 0usize);

    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        // Consume every row tied at this score before emitting a point
        while i < order.len() && scores[order[i]].total_cmp(&threshold).is_eq() {
            if positives[order[i]] { tp += 1 } else { fp += 1 }
            i += 1;
        }
        points.push(RocPoint {
            fpr: fp as f64 / n_neg as f64,
            tpr: tp as f64 / n_pos as f64,
            threshold: Some(threshold),
        });
    }

    let auc = points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
        .sum();

    (points, Some(auc))
}

impl EvaluationReport {
    /// Build the report from per-row class probabilities and true labels.
    pub fn from_scores(probs: &[[f32; NUM_CLASSES]], labels: &[TrackOrigin]) -> Self {
        let mut confusion     = [[0usize; NUM_CLASSES]; NUM_CLASSES];
        let mut correct       = 0usize;
        let mut unpredictable = 0usize;

        for (row, label) in probs.iter().zip(labels) {
            let Some(predicted) = argmax(row) else {
                unpredictable += 1;
                continue;
            };
            confusion[label.index()][predicted] += 1;
            if predicted == label.index() {
                correct += 1;
            }
        }
        if unpredictable > 0 {
            tracing::warn!("{} rows have non-finite class probabilities", unpredictable);
        }

        let samples  = probs.len().min(labels.len());
        let accuracy = if samples > 0 { correct as f64 / samples as f64 } else { 0.0 };

        let roc = TrackOrigin::ALL
            .iter()
            .map(|&origin| {
                // Unpredictable rows get a NaN score, which roc_curve skips
                let scores: Vec<f32> = probs
                    .iter()
                    .map(|r| if argmax(r).is_some() { r[origin.index()] } else { f32::NAN })
                    .collect();
                let positives: Vec<bool> = labels.iter().map(|&l| l == origin).collect();
                let (points, auc) = roc_curve(&scores, &positives);
                RocCurve { origin, points, auc }
            })
            .collect();

        Self { samples, accuracy, unpredictable, confusion, roc }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Samples:  {}", self.samples)?;
        writeln!(f, "Accuracy: {:.2}%", self.accuracy * 100.0)?;
        if self.unpredictable > 0 {
            writeln!(f, "Unpredictable (non-finite output): {}", self.unpredictable)?;
        }
        writeln!(f)?;
        writeln!(f, "Confusion matrix (rows = true, columns = predicted)")?;
        write!(f, "{:>10}", "")?;
        for origin in TrackOrigin::ALL {
            write!(f, " {:>10}", origin.name())?;
        }
        writeln!(f)?;
        for origin in TrackOrigin::ALL {
            write!(f, "{:>10}", origin.name())?;
            for count in self.confusion[origin.index()] {
                write!(f, " {:>10}", count)?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;
        for curve in &self.roc {
            match curve.auc {
                Some(auc) => writeln!(f, "AUC {:<8} {:.4}", curve.origin.name(), auc)?,
                None => writeln!(f, "AUC {:<8} undefined", curve.origin.name())?,
            }
        }
        Ok(())
    }
}

/// Softmax probabilities for every sample, in input order.
pub fn predict_probabilities<B: Backend>(
    model:      &TrackClassifier<B>,
    samples:    &[TrackSample],
    batch_size: usize,
    device:     &B::Device,
) -> Result<Vec<[f32; NUM_CLASSES]>> {
    use burn::data::dataloader::batcher::Batcher;

    let batcher   = TrackBatcher::<B>::new(device.clone());
    let mut probs = Vec::with_capacity(samples.len());

    for chunk in samples.chunks(batch_size.max(1)) {
        let batch  = batcher.batch(chunk.to_vec());
        let values = model
            .forward_probs(batch.features)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read model output: {e:?}"))?;

        probs.extend(values.chunks_exact(NUM_CLASSES).map(|row| [row[0], row[1], row[2]]));
    }

    Ok(probs)
}

/// Forward pass over `samples` and the full report.
pub fn evaluate<B: Backend>(
    model:      &TrackClassifier<B>,
    samples:    &[TrackSample],
    batch_size: usize,
    device:     &B::Device,
) -> Result<EvaluationReport> {
    let probs  = predict_probabilities(model, samples, batch_size, device)?;
    let labels: Vec<TrackOrigin> = samples.iter().map(|s| s.origin).collect();
    let report = EvaluationReport::from_scores(&probs, &labels);
    tracing::info!("Evaluated {} samples: accuracy {:.4}", report.samples, report.accuracy);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::TrackClassifierConfig;

    type TestBackend = burn::backend::NdArray;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_auc_known_example() {
        let (points, auc) = roc_curve(&[0.1, 0.4, 0.35, 0.8], &[false, false, true, true]);
        assert!(approx(auc.unwrap(), 0.75));
        assert_eq!(points.first().map(|p| (p.fpr, p.tpr)), Some((0.0, 0.0)));
        assert_eq!(points.last().map(|p| (p.fpr, p.tpr)), Some((1.0, 1.0)));
    }

    #[test]
    fn test_auc_perfect_and_inverted() {
        let labels = [true, true, false, false];
        let (_, auc) = roc_curve(&[0.9, 0.8, 0.2, 0.1], &labels);
        assert!(approx(auc.unwrap(), 1.0));
        let (_, auc) = roc_curve(&[0.1, 0.2, 0.8, 0.9], &labels);
        assert!(approx(auc.unwrap(), 0.0));
    }

    #[test]
    fn test_tied_scores_give_diagonal() {
        let (points, auc) = roc_curve(&[0.5; 6], &[true, false, true, false, false, true]);
        assert_eq!(points.len(), 2);
        assert!(approx(auc.unwrap(), 0.5));
    }

    #[test]
    fn test_auc_undefined_without_negatives() {
        let (points, auc) = roc_curve(&[0.3, 0.7], &[true, true]);
        assert!(points.is_empty());
        assert!(auc.is_none());
    }

    #[test]
    fn test_nan_scores_are_ignored() {
        let (points, auc) = roc_curve(&[f32::NAN, 0.2, 0.7], &[true, false, true]);
        assert!(approx(auc.unwrap(), 1.0));
        assert_eq!(points.len(), 3);

        let (points, auc) = roc_curve(&[f32::NAN, f32::NAN], &[true, false]);
        assert!(points.is_empty());
        assert!(auc.is_none());
    }

    #[test]
    fn test_non_finite_rows_are_unpredictable() {
        assert_eq!(argmax(&[f32::NAN, f32::NAN, f32::NAN]), None);
        assert_eq!(argmax(&[0.2, 0.5, 0.3]), Some(1));

        let probs  = [[f32::NAN; 3], [0.1, 0.8, 0.1], [0.7, 0.2, 0.1]];
        let labels = [TrackOrigin::Prompt, TrackOrigin::PileUp, TrackOrigin::Prompt];
        let report = EvaluationReport::from_scores(&probs, &labels);

        assert_eq!(report.samples, 3);
        assert_eq!(report.unpredictable, 1);
        assert!(approx(report.accuracy, 2.0 / 3.0));
        assert_eq!(report.confusion.iter().flatten().sum::<usize>(), 2);
        assert!(report.to_string().contains("Unpredictable"));
    }

    #[test]
    fn test_report_accuracy_and_confusion() {
        let probs = [
            [0.8, 0.1, 0.1], // prompt → prompt
            [0.2, 0.7, 0.1], // pileup → pileup
            [0.6, 0.3, 0.1], // other  → prompt (wrong)
            [0.1, 0.1, 0.8], // other  → other
        ];
        let labels = [TrackOrigin::Prompt, TrackOrigin::PileUp, TrackOrigin::Other, TrackOrigin::Other];
        let report = EvaluationReport::from_scores(&probs, &labels);

        assert_eq!(report.samples, 4);
        assert!(approx(report.accuracy, 0.75));
        assert_eq!(report.confusion[2][0], 1);
        assert_eq!(report.confusion[2][2], 1);
        assert_eq!(report.confusion.iter().flatten().sum::<usize>(), 4);
        assert_eq!(report.roc.len(), 3);
        // Prompt scores rank the single prompt row highest
        assert!(approx(report.roc[0].auc.unwrap(), 1.0));
    }

    #[test]
    fn test_empty_report() {
        let report = EvaluationReport::from_scores(&[], &[]);
        assert_eq!(report.accuracy, 0.0);
        assert!(report.roc.iter().all(|c| c.auc.is_none()));
        // Display never fails
        assert!(report.to_string().contains("undefined"));
    }

    #[test]
    fn test_predict_probabilities_preserves_order_and_count() {
        let device = Default::default();
        let model: TrackClassifier<TestBackend> = TrackClassifierConfig::uniform(2, 4, 1)
            .init(&device)
            .unwrap();
        let samples: Vec<TrackSample> = (0..7)
            .map(|i| TrackSample::new(vec![i as f32, -(i as f32)], TrackOrigin::Prompt))
            .collect();

        let probs = predict_probabilities(&model, &samples, 3, &device).unwrap();
        assert_eq!(probs.len(), 7);
        for row in &probs {
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }

        let report = evaluate(&model, &samples, 3, &device).unwrap();
        assert_eq!(report.samples, 7);
    }
}
