// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to its
// use case in Layer 2. Printing of results happens here only.
//
//   1. `train`    — balance, scale, split, train, evaluate, save
//   2. `evaluate` — reload a run and score a labelled file
//   3. `predict`  — reload a run and write class probabilities
//   4. `inspect`  — per-class counts, statistics and a histogram

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, InspectArgs, PredictArgs, TrainArgs};

use crate::domain::traits::LoadRequest;

// Top-level parser; clap builds `--help` from the field and variant docs.
#[derive(Parser, Debug)]
#[command(
    name = "track-origin",
    version = "0.1.0",
    about = "Classify reconstructed tracks as prompt, pile-up or other."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch the parsed subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
            Commands::Inspect(args)  => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on tracks in: {}", args.input);
    let output_dir = args.output_dir.clone();

    let summary = TrainUseCase::new(args.into()).execute()?;

    println!("\n=== Test set ===\n{}", summary.report);
    println!("Training complete. Run saved to '{}'.", output_dir);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(&args.output_dir, args.num_events)?;
    let report   = use_case.evaluate(&args.input)?;
    println!("{}", report);
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(&args.output_dir, args.num_events)?;
    let rows     = use_case.predict(&args.input, &args.output)?;
    println!("Wrote {} predictions to '{}'.", rows, args.output);
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let use_case = InspectUseCase {
        input:     args.input,
        variables: args.variables.0,
        histogram: args.variable,
        bins:      args.bins,
        request:   LoadRequest { num_events: args.num_events, ..LoadRequest::default() },
    };
    print!("{}", use_case.execute()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::track::TrackVariable;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["track-origin", "train", "--input", "t.jsonl"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(args.output_dir, "runs");
        assert_eq!(args.epochs, 20);
        assert_eq!(args.variables.0.len(), 9);
        assert_eq!(args.num_events, None);
    }

    #[test]
    fn test_inspect_variable_list() {
        let cli = Cli::try_parse_from([
            "track-origin", "inspect", "--input", "t.csv",
            "--variables", "pt,D0", "--variable", "eta", "--bins", "5",
        ])
        .unwrap();
        let Commands::Inspect(args) = cli.command else { panic!("expected inspect") };
        assert_eq!(args.variables.0, vec![TrackVariable::Pt, TrackVariable::D0]);
        assert_eq!(args.variable, TrackVariable::Eta);
        assert_eq!(args.bins, 5);
    }

    #[test]
    fn test_unknown_variable_is_rejected() {
        let res = Cli::try_parse_from([
            "track-origin", "train", "--input", "t.jsonl", "--variables", "pt,mass",
        ]);
        assert!(res.is_err());
    }
}
