// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands and all their configurable flags.
// clap's derive macros generate help text, error messages for
// missing args and type conversion.

use clap::{Args, Subcommand};
use std::str::FromStr;

use crate::application::train_use_case::{TrainConfig, DEFAULT_VARIABLES};
use crate::domain::track::TrackVariable;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Balance, scale, split, train and evaluate on a track file
    Train(TrainArgs),

    /// Evaluate a trained run on a track file
    Evaluate(EvaluateArgs),

    /// Write per-track class probabilities of a trained run to CSV
    Predict(PredictArgs),

    /// Print per-class counts, variable statistics and a histogram
    Inspect(InspectArgs),
}

/// A comma-separated variable list such as `pt,eta,d0`, parsed as
/// one argument value.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableList(pub Vec<TrackVariable>);

impl FromStr for VariableList {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        TrackVariable::parse_list(s).map(VariableList)
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Track file (.jsonl events with nested tracks, or flat .csv)
    #[arg(long)]
    pub input: String,

    /// Run directory for weights, scaler, config, metrics and report
    #[arg(long, default_value = "runs")]
    pub output_dir: String,

    /// Comma-separated input variables, in network input order
    #[arg(long, default_value = DEFAULT_VARIABLES)]
    pub variables: VariableList,

    /// Read at most this many events
    #[arg(long)]
    pub num_events: Option<usize>,

    /// Events read per loader batch
    #[arg(long, default_value_t = 1_000)]
    pub load_batch_size: usize,

    /// Tracks per training mini-batch
    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,

    /// Number of training epochs (always run in full)
    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Width of every hidden layer
    #[arg(long, default_value_t = 64)]
    pub hidden_size: usize,

    /// Number of hidden layers (0 = linear classifier)
    #[arg(long, default_value_t = 3)]
    pub hidden_layers: usize,

    /// Dropout probability after each hidden layer
    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    /// Fraction of the balanced set held out for the final test
    #[arg(long, default_value_t = 0.1)]
    pub test_fraction: f64,

    /// Fraction of the balanced set used for per-epoch validation
    #[arg(long, default_value_t = 0.1)]
    pub val_fraction: f64,

    /// Seed for balancing, splitting and batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            input:           a.input,
            output_dir:      a.output_dir,
            variables:       a.variables.0,
            num_events:      a.num_events,
            load_batch_size: a.load_batch_size,
            batch_size:      a.batch_size,
            epochs:          a.epochs,
            lr:              a.lr,
            hidden_size:     a.hidden_size,
            hidden_layers:   a.hidden_layers,
            dropout:         a.dropout,
            test_fraction:   a.test_fraction,
            val_fraction:    a.val_fraction,
            seed:            a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Labelled track file (.jsonl or .csv)
    #[arg(long)]
    pub input: String,

    /// Run directory written by `train`
    #[arg(long, default_value = "runs")]
    pub output_dir: String,

    /// Read at most this many events
    #[arg(long)]
    pub num_events: Option<usize>,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Labelled track file (.jsonl or .csv)
    #[arg(long)]
    pub input: String,

    /// Run directory written by `train`
    #[arg(long, default_value = "runs")]
    pub output_dir: String,

    /// CSV file to write
    #[arg(long, default_value = "predictions.csv")]
    pub output: String,

    /// Read at most this many events
    #[arg(long)]
    pub num_events: Option<usize>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Labelled track file (.jsonl or .csv)
    #[arg(long)]
    pub input: String,

    /// Variables to summarise
    #[arg(long, default_value = DEFAULT_VARIABLES)]
    pub variables: VariableList,

    /// Variable to histogram per class
    #[arg(long, default_value = "pt")]
    pub variable: TrackVariable,

    /// Number of equal-width histogram bins
    #[arg(long, default_value_t = 20)]
    pub bins: usize,

    /// Read at most this many events
    #[arg(long)]
    pub num_events: Option<usize>,
}
