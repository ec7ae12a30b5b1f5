// ============================================================
// Layer 4 — Per-Class Summary
// ============================================================
// Numeric view of how the classes differ before any training:
// sample counts, per-variable mean / standard deviation, and an
// equal-width histogram of one variable for every class.
//
// Histogram bins span the pooled [min, max] of the variable over
// all classes, so the per-class counts are directly comparable.
// The last bin is closed on the right so `max` is counted.

use std::fmt::Write as _;

use crate::domain::origin::{TrackOrigin, NUM_CLASSES};
use crate::domain::track::{TrackRecord, TrackVariable};

#[derive(Debug, Clone, PartialEq)]
pub struct VariableStats {
    pub variable: TrackVariable,
    pub mean:     f64,
    pub std:      f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassSummary {
    pub origin: TrackOrigin,
    pub count:  usize,
    pub stats:  Vec<VariableStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub variable: TrackVariable,
    pub min:      f64,
    pub max:      f64,
    /// counts[class index][bin]
    pub counts:   [Vec<usize>; NUM_CLASSES],
}

impl Histogram {
    /// Width of one of the equal-width bins.
    pub fn bin_width(&self) -> f64 {
        let bins = self.counts[0].len().max(1);
        (self.max - self.min) / bins as f64
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n    = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var  = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn values_for(tracks: &[&TrackRecord], variable: TrackVariable) -> Vec<f64> {
    tracks
        .iter()
        .map(|t| variable.value(t) as f64)
        .filter(|x| x.is_finite())
        .collect()
}

fn group_by_origin(tracks: &[TrackRecord]) -> [Vec<&TrackRecord>; NUM_CLASSES] {
    let mut groups: [Vec<&TrackRecord>; NUM_CLASSES] = Default::default();
    for t in tracks {
        groups[t.origin().index()].push(t);
    }
    groups
}

/// Per-class count and mean / std of each variable, in `TrackOrigin::ALL` order.
pub fn summarize(tracks: &[TrackRecord], variables: &[TrackVariable]) -> Vec<ClassSummary> {
    let groups = group_by_origin(tracks);
    TrackOrigin::ALL
        .iter()
        .map(|&origin| {
            let group = &groups[origin.index()];
            let stats = variables
                .iter()
                .map(|&variable| {
                    let (mean, std) = mean_std(&values_for(group, variable));
                    VariableStats { variable, mean, std }
                })
                .collect();
            ClassSummary { origin, count: group.len(), stats }
        })
        .collect()
}

/// Returns None when there are no finite values to bin.
pub fn histogram(tracks: &[TrackRecord], variable: TrackVariable, bins: usize) -> Option<Histogram> {
    let bins   = bins.max(1);
    let groups = group_by_origin(tracks);
    let per_class: Vec<Vec<f64>> = groups.iter().map(|g| values_for(g, variable)).collect();

    let (min, max) = per_class
        .iter()
        .flatten()
        .fold(None, |acc: Option<(f64, f64)>, &x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
        })?;

    let span = max - min;
    let mut counts: [Vec<usize>; NUM_CLASSES] = Default::default();
    for (class, values) in per_class.iter().enumerate() {
        let mut row = vec![0usize; bins];
        for &x in values {
            let bin = if span > 0.0 {
                (((x - min) / span) * bins as f64) as usize
            } else {
                0
            };
            row[bin.min(bins - 1)] += 1;
        }
        counts[class] = row;
    }

    Some(Histogram { variable, min, max, counts })
}

/// Plain-text rendering used by the `inspect` command.
pub fn render(summaries: &[ClassSummary], hist: Option<&Histogram>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{:<10} {:>10}", "class", "tracks");
    for s in summaries {
        let _ = writeln!(out, "{:<10} {:>10}", s.origin.name(), s.count);
    }

    if let Some(first) = summaries.first() {
        let _ = writeln!(out);
        let _ = write!(out, "{:<34}", "variable");
        for s in summaries {
            let _ = write!(out, " {:>24}", format!("{} mean ± std", s.origin.name()));
        }
        let _ = writeln!(out);
        for (i, stat) in first.stats.iter().enumerate() {
            let _ = write!(out, "{:<34}", stat.variable.name());
            for s in summaries {
                let v = &s.stats[i];
                let _ = write!(out, " {:>24}", format!("{:.4} ± {:.4}", v.mean, v.std));
            }
            let _ = writeln!(out);
        }
    }

    if let Some(h) = hist {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Histogram of {} ({} bins, width {:.4})",
            h.variable.name(),
            h.counts[0].len(),
            h.bin_width()
        );
        let _ = writeln!(
            out,
            "{:>12} {:>12} {:>10} {:>10} {:>10}",
            "low", "high", "prompt", "pileup", "other"
        );
        let width = h.bin_width();
        for bin in 0..h.counts[0].len() {
            let lo = h.min + width * bin as f64;
            let _ = writeln!(
                out,
                "{:>12.4} {:>12.4} {:>10} {:>10} {:>10}",
                lo,
                lo + width,
                h.counts[0][bin],
                h.counts[1][bin],
                h.counts[2][bin]
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(pt: f32, label: i32) -> TrackRecord {
        TrackRecord { pt, valid: true, ftag_truth_origin_label: label, ..Default::default() }
    }

    #[test]
    fn test_summary_counts_and_means() {
        let tracks = vec![track(10.0, 2), track(20.0, 2), track(5.0, 0), track(1.0, 4)];
        let s = summarize(&tracks, &[TrackVariable::Pt]);
        assert_eq!(s[0].count, 2);
        assert_eq!(s[0].stats[0].mean, 15.0);
        assert_eq!(s[0].stats[0].std, 5.0);
        assert_eq!(s[1].count, 1);
        assert_eq!(s[2].count, 1);
    }

    #[test]
    fn test_empty_class_has_nan_stats() {
        let s = summarize(&[track(1.0, 2)], &[TrackVariable::Pt]);
        assert_eq!(s[1].count, 0);
        assert!(s[1].stats[0].mean.is_nan());
    }

    #[test]
    fn test_histogram_bins_cover_range() {
        let tracks: Vec<TrackRecord> = (0..=10).map(|i| track(i as f32, if i < 5 { 2 } else { 0 })).collect();
        let h = histogram(&tracks, TrackVariable::Pt, 5).unwrap();
        assert_eq!(h.min, 0.0);
        assert_eq!(h.max, 10.0);
        let total: usize = h.counts.iter().flatten().sum();
        assert_eq!(total, 11);
        // Maximum value lands in the last bin
        assert_eq!(h.counts[1][4], 3);
        assert!(h.counts[2].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_histogram_of_nothing() {
        assert!(histogram(&[], TrackVariable::Pt, 10).is_none());
    }

    #[test]
    fn test_render_mentions_every_class() {
        let tracks = vec![track(1.0, 2), track(2.0, 0), track(3.0, 3)];
        let text = render(
            &summarize(&tracks, &[TrackVariable::Pt]),
            histogram(&tracks, TrackVariable::Pt, 3).as_ref(),
        );
        for name in ["prompt", "pileup", "other", "Histogram of pt"] {
            assert!(text.contains(name), "missing '{name}'");
        }
    }
}
