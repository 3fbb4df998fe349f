// ============================================================
// Layer 4: Byte Sequence Batcher
// ============================================================
// Turns a list of raw byte sequences into one tensor the encoder
// can consume in a single pass.
//
// Every byte becomes a one-hot vector over the 256-symbol
// alphabet. Sequences have different lengths, so shorter ones
// are padded on the right with all-zero rows:
//
//   Input:  ["ab", "xyz"]
//   Output: inputs  [2, 3, 256]
//             row 0: onehot(a) onehot(b) 0...0
//             row 1: onehot(x) onehot(y) onehot(z)
//           lengths [2, 3]
//
// The true lengths travel with the tensor so the encoder can read
// each sequence's state at its last real byte. A recurrent pass
// only looks backwards, so right padding never changes that state.

use burn::prelude::*;

/// Size of the input alphabet: one symbol per byte value.
pub const ALPHABET_SIZE: usize = 256;

/// A padded, one-hot encoded batch of byte sequences.
#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// One-hot inputs, shape: [batch, max_len, 256]
    pub inputs:  Tensor<B, 3>,
    /// Unpadded length of every sequence (all ≥ 1)
    pub lengths: Vec<usize>,
}

impl<B: Backend> SequenceBatch<B> {
    pub fn len(&self) -> usize {
        self.lengths.len()
    }
}

/// Builds [`SequenceBatch`]es on a fixed device.
#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// One-hot encode and right-pad `sequences`.
    ///
    /// # Panics
    /// Panics if `sequences` is empty or any sequence is empty. The
    /// corpus loader never retains empty articles.
    pub fn batch(&self, sequences: &[&[u8]]) -> SequenceBatch<B> {
        assert!(!sequences.is_empty(), "cannot batch zero sequences");
        assert!(
            sequences.iter().all(|s| !s.is_empty()),
            "cannot batch an empty sequence"
        );

        let batch_size = sequences.len();
        let max_len    = sequences.iter().map(|s| s.len()).max().unwrap_or(0);

        // ── Scatter ones into a zeroed [batch, max_len, 256] buffer ──────────
        let mut one_hot = vec![0.0f32; batch_size * max_len * ALPHABET_SIZE];
        for (row, seq) in sequences.iter().enumerate() {
            for (t, &byte) in seq.iter().enumerate() {
                one_hot[(row * max_len + t) * ALPHABET_SIZE + byte as usize] = 1.0;
            }
        }

        let inputs = Tensor::<B, 1>::from_floats(one_hot.as_slice(), &self.device)
            .reshape([batch_size, max_len, ALPHABET_SIZE]);

        SequenceBatch {
            inputs,
            lengths: sequences.iter().map(|s| s.len()).collect(),
        }
    }
}
