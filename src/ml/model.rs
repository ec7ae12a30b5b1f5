use anyhow::{ensure, Result};
use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{relu, softmax},
};

use crate::domain::origin::NUM_CLASSES;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct TrackClassifierConfig {
    /// (input size, output size) of every linear layer, in order
    pub layer_dims:    Vec<(usize, usize)>,
    pub hidden_layers: usize,
    #[config(default = 0.0)]
    pub dropout:       f64,
}

impl TrackClassifierConfig {
    /// `num_features → hidden → ... → hidden → 3` with `hidden_layers`
    /// hidden layers of width `hidden_size`.
    pub fn uniform(num_features: usize, hidden_size: usize, hidden_layers: usize) -> Self {
        let mut dims = Vec::with_capacity(hidden_layers + 1);
        if hidden_layers == 0 {
            dims.push((num_features, NUM_CLASSES));
        } else {
            dims.push((num_features, hidden_size));
            for _ in 1..hidden_layers {
                dims.push((hidden_size, hidden_size));
            }
            dims.push((hidden_size, NUM_CLASSES));
        }
        Self::new(dims, hidden_layers)
    }

    /// Input width of the first layer (0 when no layers are set).
    pub fn num_features(&self) -> usize {
        self.layer_dims.first().map_or(0, |&(input, _)| input)
    }

    /// The layer chain must connect and end in the three origin classes.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.layer_dims.is_empty(), "classifier needs at least one layer");
        ensure!(
            self.layer_dims.len() == self.hidden_layers + 1,
            "{} layer pairs given for {} hidden layers (expected {})",
            self.layer_dims.len(),
            self.hidden_layers,
            self.hidden_layers + 1
        );
        ensure!(
            self.layer_dims.iter().all(|&(i, o)| i > 0 && o > 0),
            "layer sizes must be positive: {:?}",
            self.layer_dims
        );
        for (k, pair) in self.layer_dims.windows(2).enumerate() {
            ensure!(
                pair[0].1 == pair[1].0,
                "layer {} outputs {} but layer {} expects {} inputs",
                k,
                pair[0].1,
                k + 1,
                pair[1].0
            );
        }
        let last = self.layer_dims[self.layer_dims.len() - 1].1;
        ensure!(last == NUM_CLASSES, "last layer must output {NUM_CLASSES} classes, got {last}");
        ensure!((0.0..1.0).contains(&self.dropout), "dropout must be in [0, 1), got {}", self.dropout);
        Ok(())
    }

    /// Validate the layer chain and build a freshly initialised network.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<TrackClassifier<B>> {
        self.validate()?;
        let layers = self
            .layer_dims
            .iter()
            .map(|&(input, output)| LinearConfig::new(input, output).init(device))
            .collect();
        let dropout = DropoutConfig::new(self.dropout).init();
        Ok(TrackClassifier { layers, dropout })
    }
}

/// Fully connected network: Linear → ReLU → Dropout → ... → Linear.
#[derive(Module, Debug)]
pub struct TrackClassifier<B: Backend> {
    pub layers:  Vec<Linear<B>>,
    pub dropout: Dropout,
}

impl<B: Backend> TrackClassifier<B> {
    /// features: [batch, num_features] → logits: [batch, 3]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let n = self.layers.len();
        let mut x = features;
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(x);
            if i + 1 < n {
                x = self.dropout.forward(relu(x));
            }
        }
        x
    }

    /// Class probabilities, each row sums to 1.
    pub fn forward_probs(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.forward(features), 1)
    }

    /// Mean cross-entropy over the batch plus the logits.
    pub fn forward_loss(
        &self,
        features: Tensor<B, 2>,
        targets:  Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(features);
        let ce     = CrossEntropyLossConfig::new().init(&logits.device());
        let loss   = ce.forward(logits.clone(), targets);
        (loss, logits)
    }
}
