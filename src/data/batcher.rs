// ============================================================
// Layer 4 — Track Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<TrackSample>
// into tensors:
//
//   Input:  N samples, each with F scaled features
//   Output: features [N, F] (float), targets [N] (int class index)
//
// Features are flattened row by row and reshaped. Labels are
// stacked as one-hot rows [N, 3] and reduced to their class
// index, which is what the cross-entropy loss takes.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TrackSample;
use crate::domain::origin::NUM_CLASSES;

/// A batch of scaled track features ready for the forward pass.
#[derive(Debug, Clone)]
pub struct TrackBatch<B: Backend> {
    /// shape: [batch_size, num_features]
    pub features: Tensor<B, 2>,

    /// Class index per row (prompt=0, pileup=1, other=2) — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct TrackBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TrackBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<TrackSample, TrackBatch<B>> for TrackBatcher<B> {
    fn batch(&self, items: Vec<TrackSample>) -> TrackBatch<B> {
        let batch_size   = items.len();
        let num_features = items.first().map_or(0, |s| s.features.len());

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        let labels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.one_hot())
            .collect();

        let features = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([batch_size, num_features]);

        // [N, 3] one-hot → [N] class index
        let targets = Tensor::<B, 1>::from_floats(labels.as_slice(), &self.device)
            .reshape([batch_size, NUM_CLASSES])
            .argmax(1)
            .flatten::<1>(0, 1);

        TrackBatch { features, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::origin::TrackOrigin;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_targets() {
        let batcher = TrackBatcher::<TestBackend>::new(Default::default());
        let items = vec![
            TrackSample::new(vec![1.0, 2.0, 3.0], TrackOrigin::Prompt),
            TrackSample::new(vec![4.0, 5.0, 6.0], TrackOrigin::Other),
        ];
        let batch = batcher.batch(items);

        assert_eq!(batch.features.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2]);

        let values = batch.features.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let targets = batch.targets.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(targets, vec![0, 2]);
    }
}
