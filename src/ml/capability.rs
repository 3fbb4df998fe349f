// ============================================================
// Layer 5: Model Capabilities
// ============================================================
// The trainer and supervisor never look inside a network. They
// only rely on these capabilities:
//
//   Encoder    : byte sequences        → fingerprints [n, F]
//   Comparator : fingerprint pairs     → one score per pair [n]
//
// Any implementation built from Burn tensor operations is
// differentiable end to end when run on an autodiff backend.

use burn::prelude::*;

use crate::data::batcher::SequenceBatch;

/// Maps variable-length byte sequences to fixed-length fingerprints.
pub trait Encoder<B: Backend> {
    /// Width of every fingerprint this encoder produces.
    fn fingerprint_size(&self) -> usize;

    /// Encode a whole batch at once.
    ///
    /// Returns a tensor of shape `[sequences.len(), fingerprint_size]`.
    fn encode(&self, sequences: SequenceBatch<B>) -> Tensor<B, 2>;
}

/// Scores how likely two fingerprints share an author.
///
/// Row `i` of `left` and `right` is one pair. The result holds one
/// score per row.
pub trait Comparator<B: Backend> {
    fn score(&self, left: Tensor<B, 2>, right: Tensor<B, 2>) -> Tensor<B, 1>;
}

/// A trainable encoder that may carry its own learned comparator.
pub trait ContrastiveModel<B: Backend>: Encoder<B> {
    /// The comparator trained alongside the encoder, if any.
    ///
    /// Models trained with a geometric distance objective have none.
    fn learned_comparator(&self) -> Option<&dyn Comparator<B>>;
}
