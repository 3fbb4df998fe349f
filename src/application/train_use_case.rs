// ============================================================
// Layer 2: TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Load or build the model      (Layer 6 - infra)
//   Step 2: Check model vs objective     (Layer 5 - ml)
//   Step 3: Load the corpus              (Layer 4 - data)
//   Step 4: Split validation/training    (Layer 4 - data)
//   Step 5: Seed the random source
//   Step 6: Run the supervised loop      (Layer 5 - ml)
//
// The loop always ends with a checkpoint at `model_file`, whether
// it stopped on Ctrl+C, the iteration cap, or an error.

use anyhow::{ensure, Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{loader::CorpusLoader, sampler::PairSampler};
use crate::domain::traits::CorpusSource;
use crate::infra::{
    cancel::{cancel_on_interrupt, CancellationToken},
    checkpoint::CheckpointStore,
    metrics::MetricsLogger,
};
use crate::ml::{
    default_device,
    model::{TextprintModel, TextprintModelConfig},
    objective::Objective,
    optimizer::MomentTransformConfig,
    supervisor::{RunSummary, SupervisorConfig, TrainingSupervisor},
    trainer::{ensure_compatible, PairPolicy, Trainer},
    TrainBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a training run needs. Serialisable so the effective
// settings can be logged as JSON at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub samples_dir:         String,
    pub model_file:          String,
    pub batch_size:          usize,
    pub step_size:           f64,
    pub validation_fraction: f64,
    pub log_interval:        usize,
    pub max_article_len:     usize,
    pub objective:           Objective,
    pub pairing:             PairPolicy,
    pub seed:                Option<u64>,
    pub save_interval:       Option<usize>,
    pub max_iterations:      Option<usize>,
    pub metrics_csv:         Option<String>,
    pub fingerprint_size:    usize,
    pub hidden_size:         usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            samples_dir:         String::new(),
            model_file:          "out_net".to_string(),
            batch_size:          1,
            step_size:           0.001,
            validation_fraction: 0.1,
            log_interval:        4,
            max_article_len:     1024,
            objective:           Objective::CrossEntropy,
            pairing:             PairPolicy::CoinFlip,
            seed:                None,
            save_interval:       None,
            max_iterations:      None,
            metrics_csv:         None,
            fingerprint_size:    384,
            hidden_size:         384,
        }
    }
}

impl TrainConfig {
    /// Reject settings no run could make progress with.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.samples_dir.is_empty(), "Missing required `samples` directory");
        ensure!(self.batch_size >= 1, "batch size must be at least 1");
        ensure!(self.log_interval >= 1, "log interval must be at least 1");
        ensure!(self.max_article_len >= 1, "max article length must be at least 1");
        ensure!(
            (0.0..=1.0).contains(&self.validation_fraction),
            "validation fraction must be within [0, 1], got {}",
            self.validation_fraction
        );
        ensure!(self.save_interval != Some(0), "save interval must be at least 1");
        ensure!(
            self.fingerprint_size >= 1 && self.hidden_size >= 1,
            "layer sizes must be at least 1"
        );
        Ok(())
    }

    /// Architecture for a fresh model.
    pub fn model_config(&self) -> TextprintModelConfig {
        TextprintModelConfig::new()
            .with_fingerprint_size(self.fingerprint_size)
            .with_hidden_size(self.hidden_size)
            .with_learned_comparator(self.objective.needs_learned_comparator())
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            batch_size:     self.batch_size,
            step_size:      self.step_size,
            log_interval:   self.log_interval,
            save_interval:  self.save_interval,
            max_iterations: self.max_iterations,
            moments:        MomentTransformConfig::new(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train on the configured corpus directory until Ctrl+C.
    pub fn execute(&self) -> Result<RunSummary> {
        let cfg = &self.config;
        cfg.validate()?;
        tracing::info!("Training config: {}", serde_json::to_string(cfg)?);

        let cancel = cancel_on_interrupt()?;
        let loader = CorpusLoader::new(&cfg.samples_dir, cfg.max_article_len);
        self.run(&loader, cancel)
    }

    /// Train on any corpus source, stopping when `cancel` fires.
    pub fn run(&self, source: &dyn CorpusSource, cancel: CancellationToken) -> Result<RunSummary> {
        let cfg = &self.config;
        let device = default_device();

        // ── Step 1: Load or build the model ──────────────────────────────────
        let store = CheckpointStore::new(&cfg.model_file);
        let model: TextprintModel<TrainBackend> = store
            .load_or_init(&cfg.model_config(), &device)
            .with_context(|| format!("Failed to read model '{}'", cfg.model_file))?;

        // ── Step 2: The objective must match the model's parameters ──────────
        ensure_compatible(&cfg.objective, &model)
            .with_context(|| format!("Model '{}' does not fit the chosen objective", cfg.model_file))?;

        // ── Step 3: Load the corpus ──────────────────────────────────────────
        tracing::info!("Loading samples...");
        let corpus = source.load().context("Failed to read samples")?;
        ensure!(!corpus.is_empty(), "No authors with articles found in the samples");
        tracing::info!("Loaded {}", corpus);

        // ── Step 4: Split by author ──────────────────────────────────────────
        let (validation, training) = PairSampler::new(corpus).split(cfg.validation_fraction);
        tracing::info!(
            "Split: {} training authors ({} comparable), {} validation authors ({} comparable)",
            training.corpus().author_count(),
            training.comparable_authors(),
            validation.corpus().author_count(),
            validation.comparable_authors()
        );
        training
            .check_drawable()
            .context("The training partition cannot supply pairs")?;
        validation
            .check_drawable()
            .context("The validation partition cannot supply pairs")?;

        // ── Step 5: One random source for training and validation draws ──────
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // ── Step 6: Supervised loop ──────────────────────────────────────────
        let mut training_trainer = Trainer::new(&training, cfg.objective, cfg.pairing);
        let validation_trainer = Trainer::new(&validation, cfg.objective, cfg.pairing);

        let mut supervisor = TrainingSupervisor::<TrainBackend>::new(cfg.supervisor_config(), device, cancel);
        if let Some(path) = &cfg.metrics_csv {
            supervisor = supervisor.with_observer(MetricsLogger::new(path)?);
        }

        supervisor.run(model, &mut training_trainer, &validation_trainer, &mut rng, &store)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::corpus::{Author, Corpus};
    use crate::ml::comparator::DistanceMetric;
    use crate::ml::supervisor::StopReason;
    use tempfile::TempDir;

    fn corpus() -> Corpus {
        Corpus::new(
            (0..6)
                .map(|a| {
                    Author::new(
                        format!("author {a}"),
                        (0..3).map(|i| format!("article {i} by {a}").into_bytes()).collect(),
                    )
                })
                .collect(),
        )
    }

    fn config(dir: &TempDir) -> TrainConfig {
        TrainConfig {
            samples_dir:         "unused".into(),
            model_file:          dir.path().join("out_net").to_string_lossy().into_owned(),
            validation_fraction: 0.34,
            log_interval:        2,
            seed:                Some(42),
            max_iterations:      Some(3),
            fingerprint_size:    4,
            hidden_size:         5,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_defaults_are_valid_once_samples_are_set() {
        let cfg = TrainConfig {
            samples_dir: "samples".into(),
            ..TrainConfig::default()
        };
        assert!(cfg.validate().is_ok());
        assert!(TrainConfig::default().validate().is_err());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let base = TrainConfig {
            samples_dir: "samples".into(),
            ..TrainConfig::default()
        };
        assert!(TrainConfig { batch_size: 0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { validation_fraction: 1.5, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { save_interval: Some(0), ..base }.validate().is_err());
    }

    #[test]
    fn test_run_writes_checkpoint_and_resumes() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);

        let first = TrainUseCase::new(cfg.clone())
            .run(&corpus(), CancellationToken::new())
            .unwrap();
        assert_eq!(first.iterations, 3);
        assert_eq!(first.stop, StopReason::IterationLimit);
        assert!(dir.path().join("out_net").exists());

        // The saved architecture wins over the requested one.
        let resumed = TrainUseCase::new(TrainConfig { fingerprint_size: 9, ..cfg })
            .run(&corpus(), CancellationToken::new())
            .unwrap();
        assert_eq!(resumed.iterations, 3);

        let model = CheckpointStore::new(dir.path().join("out_net"))
            .load::<TrainBackend>(&Default::default())
            .unwrap()
            .unwrap();
        assert_eq!(model.config().fingerprint_size, 4);
    }

    #[test]
    fn test_distance_objective_rejects_learned_comparator_model() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        TrainUseCase::new(cfg.clone())
            .run(&corpus(), CancellationToken::new())
            .unwrap();

        let distance = TrainConfig {
            objective: Objective::Distance {
                metric: DistanceMetric::Euclidean,
                margin: None,
            },
            ..cfg
        };
        assert!(TrainUseCase::new(distance)
            .run(&corpus(), CancellationToken::new())
            .is_err());
    }

    #[test]
    fn test_single_author_corpus_is_fatal() {
        let dir = TempDir::new().unwrap();
        let lonely = Corpus::new(vec![Author::new("solo", vec![b"a".to_vec(), b"b".to_vec()])]);

        let result = TrainUseCase::new(config(&dir)).run(&lonely, CancellationToken::new());
        assert!(result.is_err());
    }
}
