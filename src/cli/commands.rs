// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `compare`, and all
// their flags. Flag names and defaults follow the historical
// command line (`-samples`, `-file out_net`, `-batch 1`, ...).
//
// clap's derive macros generate help text, error messages for
// missing args and type conversion.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::ml::{comparator::DistanceMetric, objective::Objective, trainer::PairPolicy};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train (or keep training) a fingerprint model until Ctrl+C
    Train(TrainArgs),

    /// Score two text files with a trained model
    Compare(CompareArgs),
}

/// Cost to train with.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectiveArg {
    /// Learned comparator with binary cross-entropy
    CrossEntropy,
    /// Euclidean distance between fingerprints
    Euclidean,
    /// Negative cosine similarity between fingerprints
    Cosine,
}

/// How compare and contrast pairs are mixed in a batch.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairingArg {
    /// A fair coin per pair
    CoinFlip,
    /// `batch` compare pairs followed by `batch` contrast pairs
    Balanced,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricArg {
    Euclidean,
    Cosine,
}

impl From<MetricArg> for DistanceMetric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::Euclidean => DistanceMetric::Euclidean,
            MetricArg::Cosine => DistanceMetric::NegativeCosine,
        }
    }
}

impl From<PairingArg> for PairPolicy {
    fn from(p: PairingArg) -> Self {
        match p {
            PairingArg::CoinFlip => PairPolicy::CoinFlip,
            PairingArg::Balanced => PairPolicy::Balanced,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Corpus directory: one sub-directory of .txt articles per author
    #[arg(long)]
    pub samples: String,

    /// Model file, read at startup if present and written on exit
    #[arg(long, default_value = "out_net")]
    pub file: String,

    /// Pairs per batch (per label with --pairing balanced)
    #[arg(long, default_value_t = 1)]
    pub batch: usize,

    /// Optimizer step size
    #[arg(long, default_value_t = 0.001)]
    pub step: f64,

    /// Fraction of authors held out for validation
    #[arg(long, default_value_t = 0.1)]
    pub validation: f64,

    /// Validate and log every this many iterations
    #[arg(long, default_value_t = 4)]
    pub logint: usize,

    /// Maximum article length in bytes
    #[arg(long, default_value_t = 1024)]
    pub maxlen: usize,

    #[arg(long, value_enum, default_value_t = ObjectiveArg::CrossEntropy)]
    pub objective: ObjectiveArg,

    /// Cap on different-author distances (distance objectives only)
    #[arg(long)]
    pub margin: Option<f32>,

    #[arg(long, value_enum, default_value_t = PairingArg::CoinFlip)]
    pub pairing: PairingArg,

    /// Seed for pair sampling; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also checkpoint every N iterations
    #[arg(long)]
    pub save_every: Option<usize>,

    /// Stop after N iterations instead of waiting for Ctrl+C
    #[arg(long)]
    pub max_iters: Option<usize>,

    /// Append per-iteration costs to this CSV file
    #[arg(long)]
    pub metrics_csv: Option<String>,

    /// Fingerprint width for a new model
    #[arg(long, default_value_t = 384)]
    pub fingerprint_size: usize,

    /// First LSTM layer width for a new model
    #[arg(long, default_value_t = 384)]
    pub hidden_size: usize,
}

impl TrainArgs {
    fn objective(&self) -> Objective {
        let metric = match self.objective {
            ObjectiveArg::CrossEntropy => return Objective::CrossEntropy,
            ObjectiveArg::Euclidean => DistanceMetric::Euclidean,
            ObjectiveArg::Cosine => DistanceMetric::NegativeCosine,
        };
        Objective::Distance {
            metric,
            margin: self.margin,
        }
    }
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        if a.margin.is_some() && a.objective == ObjectiveArg::CrossEntropy {
            tracing::warn!("--margin only applies to distance objectives; ignoring it");
        }
        TrainConfig {
            objective:           a.objective(),
            samples_dir:         a.samples,
            model_file:          a.file,
            batch_size:          a.batch,
            step_size:           a.step,
            validation_fraction: a.validation,
            log_interval:        a.logint,
            max_article_len:     a.maxlen,
            pairing:             a.pairing.into(),
            seed:                a.seed,
            save_interval:       a.save_every,
            max_iterations:      a.max_iters,
            metrics_csv:         a.metrics_csv,
            fingerprint_size:    a.fingerprint_size,
            hidden_size:         a.hidden_size,
        }
    }
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Trained model file
    #[arg(long, default_value = "out_net")]
    pub file: String,

    /// Maximum bytes read from each text
    #[arg(long, default_value_t = 1024)]
    pub maxlen: usize,

    /// Score with a distance instead of the learned comparator
    #[arg(long, value_enum)]
    pub metric: Option<MetricArg>,

    /// First text file
    pub left: PathBuf,

    /// Second text file
    pub right: PathBuf,
}
