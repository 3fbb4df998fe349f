// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates to Layer 2 (application).
//
//   train    train a fingerprint model until Ctrl+C
//   compare  score two text files with a saved model

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{CompareArgs, Commands, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "textprint",
    version,
    about = "Train byte-level authorship fingerprints from a directory of authors' articles."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Compare(args) => run_compare(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training on samples in: {}", args.samples);
    let model_file = args.file.clone();

    let summary = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Stopped after {} iterations. Model saved to '{}'.",
        summary.iterations, model_file
    );
    Ok(())
}

fn run_compare(args: CompareArgs) -> Result<()> {
    use crate::application::compare_use_case::CompareUseCase;

    let use_case = CompareUseCase::new(&args.file, args.maxlen)?;
    let outcome = use_case.compare_files(&args.left, &args.right, args.metric.map(Into::into))?;

    match outcome.same_author_probability {
        Some(p) => println!("score={:.6}\tsame_author={:.4}", outcome.score, p),
        None => println!("distance={:.6}", outcome.score),
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::ml::{comparator::DistanceMetric, objective::Objective, trainer::PairPolicy};

    fn train_config(args: &[&str]) -> TrainConfig {
        let cli = Cli::try_parse_from(["textprint", "train"].iter().chain(args)).unwrap();
        match cli.command {
            Commands::Train(args) => args.into(),
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn test_train_defaults() {
        let cfg = train_config(&["--samples", "corpus"]);
        assert_eq!(cfg.samples_dir, "corpus");
        assert_eq!(cfg.model_file, "out_net");
        assert_eq!(cfg.batch_size, 1);
        assert_eq!(cfg.step_size, 0.001);
        assert_eq!(cfg.validation_fraction, 0.1);
        assert_eq!(cfg.log_interval, 4);
        assert_eq!(cfg.max_article_len, 1024);
        assert_eq!(cfg.objective, Objective::CrossEntropy);
        assert_eq!(cfg.pairing, PairPolicy::CoinFlip);
        assert_eq!(cfg.max_iterations, None);
    }

    #[test]
    fn test_distance_objective_with_margin() {
        let cfg = train_config(&[
            "--samples", "corpus",
            "--objective", "cosine",
            "--margin", "2.5",
            "--pairing", "balanced",
        ]);
        assert_eq!(
            cfg.objective,
            Objective::Distance {
                metric: DistanceMetric::NegativeCosine,
                margin: Some(2.5),
            }
        );
        assert_eq!(cfg.pairing, PairPolicy::Balanced);
    }

    #[test]
    fn test_samples_is_required() {
        assert!(Cli::try_parse_from(["textprint", "train"]).is_err());
    }

    #[test]
    fn test_compare_takes_two_paths() {
        let cli = Cli::try_parse_from(["textprint", "compare", "--metric", "euclidean", "a.txt", "b.txt"]).unwrap();
        match cli.command {
            Commands::Compare(args) => {
                assert_eq!(args.left, std::path::PathBuf::from("a.txt"));
                assert_eq!(args.metric, Some(commands::MetricArg::Euclidean));
                assert_eq!(args.file, "out_net");
            }
            other => panic!("expected compare, got {other:?}"),
        }
    }
}
