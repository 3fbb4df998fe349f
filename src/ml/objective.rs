// ============================================================
// Layer 5: Contrastive Objectives
// ============================================================
// Turns a labelled batch of sequence pairs into one scalar cost.
//
// Pipeline (shared by both objectives):
//
//   SequenceBatch [2n sequences]
//        │ encoder.encode   (one pass over the whole batch)
//        ▼
//   fingerprints [2n, F] ── reshape ──▶ [n, 2F] = [left | right]
//        │ comparator.score
//        ▼
//   scores [n] ── objective ──▶ cost [1]
//
// Objectives:
//
//   CrossEntropy
//     scores are logits; binary cross-entropy against the label
//     (same = 1, different = 0), averaged over the n pairs.
//
//   Distance { metric, margin }
//     scores are distances;
//       cost = (mean_same d − mean_diff d) / 2
//     Each label is averaged on its own, so coin-flip batches weigh
//     both labels equally. A label missing from the batch adds 0.
//     On a balanced batch this is (Σ_same d − Σ_diff d) / (2 × pairsPerLabel).
//     The cost has no lower bound: pushing different-author
//     fingerprints apart lowers it forever. That is kept as is
//     unless a margin is set, in which case each different-pair
//     distance is capped at the margin.

use burn::{nn::loss::BinaryCrossEntropyLossConfig, prelude::*};
use serde::{Deserialize, Serialize};

use crate::data::batcher::SequenceBatch;
use crate::domain::pair::PairLabel;
use crate::ml::capability::{Comparator, Encoder};
use crate::ml::comparator::DistanceMetric;

/// Which contrastive cost to train with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Objective {
    /// Learned comparator + binary cross-entropy
    CrossEntropy,
    /// Geometric distance, no comparator parameters
    Distance {
        metric: DistanceMetric,
        margin: Option<f32>,
    },
}

impl Objective {
    /// Whether this objective trains a learned comparator head.
    pub fn needs_learned_comparator(&self) -> bool {
        matches!(self, Objective::CrossEntropy)
    }
}

/// Encode `sequences`, score consecutive pairs and apply `objective`.
///
/// `sequences` must hold exactly `2 * labels.len()` rows, laid out
/// as `[left_0, right_0, left_1, right_1, ...]`.
///
/// Returns a one-element tensor.
pub fn pair_cost<B, E, C>(
    encoder:    &E,
    comparator: &C,
    objective:  &Objective,
    sequences:  SequenceBatch<B>,
    labels:     &[PairLabel],
) -> Tensor<B, 1>
where
    B: Backend,
    E: Encoder<B> + ?Sized,
    C: Comparator<B> + ?Sized,
{
    let pairs = labels.len();
    assert_eq!(
        sequences.len(),
        pairs * 2,
        "expected two sequences per label"
    );

    let device = sequences.inputs.device();
    let fingerprints = encoder.encode(sequences);
    let [_, width] = fingerprints.dims();

    // Row i of [n, 2F] is [left_i | right_i].
    let joined = fingerprints.reshape([pairs, width * 2]);
    let left   = joined.clone().slice([0..pairs, 0..width]);
    let right  = joined.slice([0..pairs, width..width * 2]);

    let scores = comparator.score(left, right);

    match objective {
        Objective::CrossEntropy => cross_entropy(scores, labels, &device),
        Objective::Distance { margin, .. } => distance_cost(scores, labels, *margin, &device),
    }
}

/// Mean binary cross-entropy of `logits` against the pair labels.
pub fn cross_entropy<B: Backend>(
    logits: Tensor<B, 1>,
    labels: &[PairLabel],
    device: &B::Device,
) -> Tensor<B, 1> {
    let targets: Vec<i32> = labels.iter().map(|l| l.target()).collect();
    let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), device);

    BinaryCrossEntropyLossConfig::new()
        .with_logits(true)
        .init(device)
        .forward(logits, targets)
}

/// Half the gap between the mean same-pair and mean different-pair
/// distance, with an optional cap on different-pair distances.
pub fn distance_cost<B: Backend>(
    distances: Tensor<B, 1>,
    labels:    &[PairLabel],
    margin:    Option<f32>,
    device:    &B::Device,
) -> Tensor<B, 1> {
    let same_count = labels.iter().filter(|l| l.is_same()).count();
    let different_count = labels.len() - same_count;

    // Per-pair weights: +1/(2·same) on same pairs, -1/(2·different) on
    // different pairs, 0 for a label with no pairs.
    let weight = |count: usize| if count == 0 { 0.0 } else { 0.5 / count as f32 };
    let (same_weight, different_weight) = (weight(same_count), weight(different_count));
    let same_mask: Vec<f32> = labels
        .iter()
        .map(|l| if l.is_same() { same_weight } else { 0.0 })
        .collect();
    let different_mask: Vec<f32> = labels
        .iter()
        .map(|l| if l.is_same() { 0.0 } else { different_weight })
        .collect();
    let same = Tensor::<B, 1>::from_floats(same_mask.as_slice(), device);
    let different = Tensor::<B, 1>::from_floats(different_mask.as_slice(), device);

    let different_distances = match margin {
        Some(m) => distances.clone().clamp_max(m),
        None => distances.clone(),
    };

    (same * distances - different * different_distances).sum()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::SequenceBatcher;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    /// Ignores its input and returns the same fingerprint for every row.
    struct ConstantEncoder;

    impl<B: Backend> Encoder<B> for ConstantEncoder {
        fn fingerprint_size(&self) -> usize {
            4
        }

        fn encode(&self, sequences: SequenceBatch<B>) -> Tensor<B, 2> {
            Tensor::ones([sequences.len(), 4], &sequences.inputs.device())
        }
    }

    /// Scores every pair 0.5.
    struct ConstantComparator;

    impl<B: Backend> Comparator<B> for ConstantComparator {
        fn score(&self, left: Tensor<B, 2>, _right: Tensor<B, 2>) -> Tensor<B, 1> {
            let [pairs, _] = left.dims();
            Tensor::full([pairs], 0.5, &left.device())
        }
    }

    fn softplus(x: f64) -> f64 {
        (1.0 + x.exp()).ln()
    }

    fn four_pair_cost(objective: Objective) -> f32 {
        let batcher = SequenceBatcher::<TestBackend>::new(Default::default());
        let sequences = batcher.batch(&[
            &b"a1"[..], &b"a2"[..],
            &b"b1"[..], &b"b2"[..],
            &b"a1"[..], &b"b1"[..],
            &b"b2"[..], &b"c1"[..],
        ]);
        let labels = [
            PairLabel::Same,
            PairLabel::Same,
            PairLabel::Different,
            PairLabel::Different,
        ];

        pair_cost(&ConstantEncoder, &ConstantComparator, &objective, sequences, &labels)
            .into_scalar()
            .elem::<f32>()
    }

    #[test]
    fn test_cross_entropy_closed_form() {
        // Two targets of 1 and two of 0, all with logit 0.5:
        //   same:      -ln σ(0.5)     = softplus(-0.5)
        //   different: -ln(1 - σ(0.5)) = softplus(0.5)
        let expected = (softplus(-0.5) + softplus(0.5)) / 2.0;
        let cost = four_pair_cost(Objective::CrossEntropy);
        assert!((cost as f64 - expected).abs() < 1e-5, "{cost} vs {expected}");
    }

    #[test]
    fn test_distance_closed_form() {
        // (mean(0.5, 0.5) - mean(0.5, 0.5)) / 2
        let cost = four_pair_cost(Objective::Distance {
            metric: DistanceMetric::Euclidean,
            margin: None,
        });
        assert!(cost.abs() < 1e-6);
    }

    #[test]
    fn test_distance_cost_is_unbounded_without_margin() {
        let device = Default::default();
        let labels = [PairLabel::Same, PairLabel::Different];
        let distances = Tensor::<TestBackend, 1>::from_floats([1.0, 1000.0], &device);

        let cost = distance_cost(distances, &labels, None, &device)
            .into_scalar()
            .elem::<f32>();
        assert!((cost - (1.0 - 1000.0) / 2.0).abs() < 1e-3);
    }

    fn cost_of(distances: &[f32], labels: &[PairLabel]) -> f32 {
        let device = Default::default();
        let distances = Tensor::<TestBackend, 1>::from_floats(distances, &device);
        distance_cost(distances, labels, None, &device)
            .into_scalar()
            .elem::<f32>()
    }

    #[test]
    fn test_unbalanced_batch_averages_each_label() {
        use PairLabel::{Different, Same};

        // mean(1, 3) = 2, mean(10) = 10
        let cost = cost_of(&[1.0, 3.0, 10.0], &[Same, Same, Different]);
        assert!((cost - (2.0 - 10.0) / 2.0).abs() < 1e-5, "{cost}");

        // Moving pairs between labels does not change either label's weight.
        let cost = cost_of(&[2.0, 10.0, 10.0, 10.0], &[Same, Different, Different, Different]);
        assert!((cost - (2.0 - 10.0) / 2.0).abs() < 1e-5, "{cost}");
    }

    #[test]
    fn test_missing_label_contributes_nothing() {
        use PairLabel::{Different, Same};

        let cost = cost_of(&[4.0, 6.0], &[Different, Different]);
        assert!((cost - (0.0 - 5.0) / 2.0).abs() < 1e-5, "{cost}");

        let cost = cost_of(&[4.0, 6.0], &[Same, Same]);
        assert!((cost - 5.0 / 2.0).abs() < 1e-5, "{cost}");
    }

    #[test]
    fn test_balanced_batch_matches_summed_form() {
        use PairLabel::{Different, Same};

        // (Σ_same - Σ_diff) / (2 × pairsPerLabel) with two pairs per label
        let cost = cost_of(&[1.0, 2.0, 7.0, 9.0], &[Same, Same, Different, Different]);
        assert!((cost - (3.0 - 16.0) / 4.0).abs() < 1e-5, "{cost}");
    }

    #[test]
    fn test_margin_caps_only_different_pairs() {
        let device = Default::default();
        let labels = [PairLabel::Same, PairLabel::Different];
        let distances = Tensor::<TestBackend, 1>::from_floats([5.0, 1000.0], &device);

        let cost = distance_cost(distances, &labels, Some(2.0), &device)
            .into_scalar()
            .elem::<f32>();
        assert!((cost - (5.0 - 2.0) / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_only_cross_entropy_needs_a_learned_comparator() {
        assert!(Objective::CrossEntropy.needs_learned_comparator());
        assert!(!Objective::Distance {
            metric: DistanceMetric::NegativeCosine,
            margin: None,
        }
        .needs_learned_comparator());
    }
}
