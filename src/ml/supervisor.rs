// ============================================================
// Layer 5: Training Supervisor
// ============================================================
// Owns the iteration loop:
//
//   loop {
//       cancelled?  ──yes──▶ stop
//       cap reached? ─yes──▶ stop
//       fetch training batch → gradient          (records cost)
//       every log_interval:
//           fetch validation batch → cost on model.valid() → log
//       observers.on_iteration(report)
//       optimizer step
//       every save_interval: checkpoint
//   }
//   final checkpoint (always, whatever ended the loop)
//
// Cancellation is only polled at the top of an iteration, so an
// interrupt never splits a forward/backward pass. A loop error is
// returned only after the final checkpoint has been written.

use anyhow::{Context, Result};
use burn::{
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::Rng;

use crate::infra::cancel::CancellationToken;
use crate::ml::capability::ContrastiveModel;
use crate::ml::optimizer::MomentTransformConfig;
use crate::ml::trainer::Trainer;

/// Loop settings; see `TrainConfig` for their command-line origin.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Pair units per fetch
    pub batch_size:     usize,
    pub step_size:      f64,
    /// Validate and log every this many iterations
    pub log_interval:   usize,
    /// Checkpoint every this many iterations, in addition to the
    /// final checkpoint
    pub save_interval:  Option<usize>,
    pub max_iterations: Option<usize>,
    pub moments:        MomentTransformConfig,
}

/// What happened in one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// Zero-based
    pub iteration:       usize,
    pub training_cost:   f32,
    /// Present on logging iterations only
    pub validation_cost: Option<f32>,
}

/// Receives a report after every iteration's gradient.
pub trait TrainingObserver {
    fn on_iteration(&mut self, report: &IterationReport) -> Result<()>;
}

/// Persists the model when the supervisor asks it to.
pub trait CheckpointWriter<M> {
    fn write(&self, model: &M) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    IterationLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations:          usize,
    pub checkpoints_written: usize,
    pub stop:                StopReason,
}

pub struct TrainingSupervisor<'a, B: AutodiffBackend> {
    config:    SupervisorConfig,
    device:    B::Device,
    cancel:    CancellationToken,
    observers: Vec<Box<dyn TrainingObserver + 'a>>,
}

impl<'a, B: AutodiffBackend> TrainingSupervisor<'a, B> {
    pub fn new(config: SupervisorConfig, device: B::Device, cancel: CancellationToken) -> Self {
        Self {
            config,
            device,
            cancel,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: impl TrainingObserver + 'a) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Train `model` until cancelled or the iteration cap is hit.
    ///
    /// Exactly one final checkpoint is written on every exit path,
    /// including errors raised inside the loop.
    pub fn run<M, R, W>(
        &mut self,
        mut model:   M,
        training:    &mut Trainer<'_>,
        validation:  &Trainer<'_>,
        rng:         &mut R,
        checkpoints: &W,
    ) -> Result<RunSummary>
    where
        M: ContrastiveModel<B> + AutodiffModule<B>,
        M::InnerModule: ContrastiveModel<B::InnerBackend>,
        R: Rng + ?Sized,
        W: CheckpointWriter<M>,
    {
        let mut optimizer = self.config.moments.init::<B, M>();
        let mut iterations = 0usize;
        let mut checkpoints_written = 0usize;

        tracing::info!("Training...");

        let outcome: Result<StopReason> = loop {
            if self.cancel.is_cancelled() {
                break Ok(StopReason::Cancelled);
            }
            if self.config.max_iterations.is_some_and(|cap| iterations >= cap) {
                break Ok(StopReason::IterationLimit);
            }

            let grads = match self.iteration(iterations, &model, training, validation, rng) {
                Ok(grads) => grads,
                Err(err) => break Err(err),
            };
            model = optimizer.step(self.config.step_size, model, grads);
            iterations += 1;

            // ── Periodic checkpoint ──────────────────────────────────────────
            if self.config.save_interval.is_some_and(|every| every > 0 && iterations % every == 0) {
                if let Err(err) = checkpoints.write(&model) {
                    break Err(err.context(format!("Periodic checkpoint at iteration {iterations} failed")));
                }
                checkpoints_written += 1;
                tracing::debug!("Checkpoint written after {} iterations", iterations);
            }
        };

        // ── Final checkpoint ──────────────────────────────────────────────────
        if let Err(err) = &outcome {
            tracing::error!("Training stopped on error: {:#}", err);
        }
        checkpoints
            .write(&model)
            .context("Failed to write the final checkpoint")?;
        checkpoints_written += 1;

        let stop = outcome?;
        tracing::info!("Stopped after {} iterations ({:?})", iterations, stop);

        Ok(RunSummary {
            iterations,
            checkpoints_written,
            stop,
        })
    }

    fn iteration<M, R>(
        &mut self,
        index:      usize,
        model:      &M,
        training:   &mut Trainer<'_>,
        validation: &Trainer<'_>,
        rng:        &mut R,
    ) -> Result<GradientsParams>
    where
        M: ContrastiveModel<B> + AutodiffModule<B>,
        M::InnerModule: ContrastiveModel<B::InnerBackend>,
        R: Rng + ?Sized,
    {
        let batch = training.fetch(rng, self.config.batch_size)?;
        let grads = training.gradient(model, &batch, &self.device)?;
        let training_cost = training.last_cost().unwrap_or(f32::NAN);

        let validation_cost = if index % self.config.log_interval.max(1) == 0 {
            let batch = validation.fetch(rng, self.config.batch_size)?;
            let valid = model.valid();
            let cost = validation
                .cost::<B::InnerBackend, _>(&valid, &batch, &self.device)?
                .into_scalar()
                .elem::<f32>();
            tracing::info!("iter {}:\tvalidation={:.6}\ttraining={:.6}", index, cost, training_cost);
            Some(cost)
        } else {
            None
        };

        let report = IterationReport {
            iteration: index,
            training_cost,
            validation_cost,
        };
        for observer in &mut self.observers {
            observer.on_iteration(&report)?;
        }

        Ok(grads)
    }
}
