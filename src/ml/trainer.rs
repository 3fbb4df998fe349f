// ============================================================
// Layer 5: Trainer
// ============================================================
// Three operations, driven once per iteration by the supervisor:
//
//   fetch     sampler + rng        → PairBatch (raw bytes + labels)
//   cost      model + PairBatch    → one-element cost tensor
//   gradient  cost → backward()    → GradientsParams
//
// The trainer is generic over any `ContrastiveModel`, so it never
// depends on the encoder being an LSTM. It picks the comparator
// from the objective:
//
//   CrossEntropy      → the model's learned comparator
//   Distance{metric}  → the metric itself (no parameters)
//
// `gradient` takes `&mut self` because it records the cost it just
// computed; the borrow checker then guarantees no two gradient
// computations on one trainer overlap.

use burn::{
    module::AutodiffModule,
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::batcher::SequenceBatcher;
use crate::data::sampler::{InsufficientData, PairSampler};
use crate::domain::pair::PairBatch;
use crate::ml::capability::ContrastiveModel;
use crate::ml::objective::{pair_cost, Objective};

#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Sampling(#[from] InsufficientData),

    #[error("the cross-entropy objective needs a model with a learned comparator")]
    MissingComparator,

    #[error("a model with a learned comparator cannot be trained with a distance objective")]
    UnusedComparator,
}

/// How `fetch` chooses between compare and contrast draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairPolicy {
    /// Fair coin per pair; `units` pairs in total
    #[default]
    CoinFlip,
    /// `units` compare pairs followed by `units` contrast pairs
    Balanced,
}

/// Reject model/objective combinations that would train the wrong
/// parameters.
pub fn ensure_compatible<B, M>(objective: &Objective, model: &M) -> Result<(), TrainError>
where
    B: Backend,
    M: ContrastiveModel<B> + ?Sized,
{
    match (objective.needs_learned_comparator(), model.learned_comparator().is_some()) {
        (true, false) => Err(TrainError::MissingComparator),
        (false, true) => Err(TrainError::UnusedComparator),
        _ => Ok(()),
    }
}

pub struct Trainer<'c> {
    sampler:   &'c PairSampler,
    objective: Objective,
    policy:    PairPolicy,
    last_cost: Option<f32>,
}

impl<'c> Trainer<'c> {
    pub fn new(sampler: &'c PairSampler, objective: Objective, policy: PairPolicy) -> Self {
        Self {
            sampler,
            objective,
            policy,
            last_cost: None,
        }
    }

    /// Cost recorded by the most recent `gradient` call.
    pub fn last_cost(&self) -> Option<f32> {
        self.last_cost
    }

    /// Draw a labelled batch.
    ///
    /// `units` is the pair count under `CoinFlip` and the pairs per
    /// label under `Balanced`.
    pub fn fetch<R: Rng + ?Sized>(
        &self,
        rng:   &mut R,
        units: usize,
    ) -> Result<PairBatch<'c>, TrainError> {
        let sampler: &'c PairSampler = self.sampler;

        let batch = match self.policy {
            PairPolicy::CoinFlip => {
                let mut batch = PairBatch::with_capacity(units);
                for _ in 0..units {
                    let pair = if rng.gen_bool(0.5) {
                        sampler.compare(rng)?
                    } else {
                        sampler.contrast(rng)?
                    };
                    batch.push(pair);
                }
                batch
            }
            PairPolicy::Balanced => {
                let mut batch = PairBatch::with_capacity(units * 2);
                for _ in 0..units {
                    batch.push(sampler.compare(rng)?);
                }
                for _ in 0..units {
                    batch.push(sampler.contrast(rng)?);
                }
                batch
            }
        };

        let (same, different) = batch.label_counts();
        tracing::trace!(
            "Fetched {} pairs ({} same, {} different)",
            batch.pair_count(),
            same,
            different
        );
        Ok(batch)
    }

    /// Scalar cost of `batch` under this trainer's objective.
    pub fn cost<B, M>(
        &self,
        model:  &M,
        batch:  &PairBatch<'_>,
        device: &B::Device,
    ) -> Result<Tensor<B, 1>, TrainError>
    where
        B: Backend,
        M: ContrastiveModel<B>,
    {
        let sequences = SequenceBatcher::<B>::new(device.clone()).batch(&batch.sequences);

        let cost = match &self.objective {
            Objective::CrossEntropy => {
                let comparator = model
                    .learned_comparator()
                    .ok_or(TrainError::MissingComparator)?;
                pair_cost(model, comparator, &self.objective, sequences, &batch.labels)
            }
            Objective::Distance { metric, .. } => {
                pair_cost(model, metric, &self.objective, sequences, &batch.labels)
            }
        };

        Ok(cost)
    }

    /// Cost of `batch`, back-propagated with a unit seed.
    pub fn gradient<B, M>(
        &mut self,
        model:  &M,
        batch:  &PairBatch<'_>,
        device: &B::Device,
    ) -> Result<GradientsParams, TrainError>
    where
        B: AutodiffBackend,
        M: ContrastiveModel<B> + AutodiffModule<B>,
    {
        let cost = self.cost(model, batch, device)?;
        self.last_cost = Some(cost.clone().into_scalar().elem::<f32>());

        let grads = cost.backward();
        Ok(GradientsParams::from_grads(grads, model))
    }
}
