// ============================================================
// Layer 5: Comparators
// ============================================================
// Two families of comparator, matching the two objectives:
//
//   FeedForwardComparator   learned; concat(a, b) → tanh MLP → logit
//   DistanceMetric          fixed; a distance with no parameters
//
// A higher learned score means "more likely the same author".
// A higher distance means "less likely the same author".

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation,
};
use serde::{Deserialize, Serialize};

use crate::ml::capability::Comparator;

/// Floor added under square roots and norms so gradients stay
/// finite when two fingerprints coincide.
const NORM_FLOOR: f64 = 1e-12;

// ─── Learned comparator ───────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct FeedForwardComparatorConfig {
    pub fingerprint_size: usize,
    #[config(default = 128)]
    pub hidden_size:      usize,
}

impl FeedForwardComparatorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> FeedForwardComparator<B> {
        FeedForwardComparator {
            hidden: LinearConfig::new(self.fingerprint_size * 2, self.hidden_size).init(device),
            output: LinearConfig::new(self.hidden_size, 1).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct FeedForwardComparator<B: Backend> {
    pub hidden: Linear<B>,
    pub output: Linear<B>,
}

impl<B: Backend> Comparator<B> for FeedForwardComparator<B> {
    fn score(&self, left: Tensor<B, 2>, right: Tensor<B, 2>) -> Tensor<B, 1> {
        let [pairs, _] = left.dims();
        let joined = Tensor::cat(vec![left, right], 1);
        let hidden = activation::tanh(self.hidden.forward(joined));
        self.output.forward(hidden).reshape([pairs])
    }
}

// ─── Geometric comparators ────────────────────────────────────────────────────

/// A parameter-free distance between fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    /// ‖a − b‖₂
    Euclidean,
    /// −cos(a, b)
    NegativeCosine,
}

impl<B: Backend> Comparator<B> for DistanceMetric {
    fn score(&self, left: Tensor<B, 2>, right: Tensor<B, 2>) -> Tensor<B, 1> {
        let [pairs, _] = left.dims();
        let distance = match self {
            DistanceMetric::Euclidean => (left - right)
                .powf_scalar(2.0)
                .sum_dim(1)
                .add_scalar(NORM_FLOOR)
                .sqrt(),
            DistanceMetric::NegativeCosine => {
                let dot = (left.clone() * right.clone()).sum_dim(1);
                let left_norm = left.powf_scalar(2.0).sum_dim(1).add_scalar(NORM_FLOOR).sqrt();
                let right_norm = right.powf_scalar(2.0).sum_dim(1).add_scalar(NORM_FLOOR).sqrt();
                dot.div(left_norm * right_norm).neg()
            }
        };
        distance.reshape([pairs])
    }
}
