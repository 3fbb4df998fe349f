// ============================================================
// Layer 5: LSTM Encoder
// ============================================================
// Stacked LSTM over one-hot bytes:
//
//   [n, len, 256] ─ LSTM ─▶ [n, len, hidden] ─ LSTM ─▶ [n, len, F]
//                                                        │
//                                 state at t = length-1 ◀┘
//                                                        ▼
//                                                     [n, F]
//
// The fingerprint is the top layer's hidden state at each
// sequence's last real byte, picked out with a gather so padded
// timesteps are never read.
//
// A one-hot byte lights a single input column, so the first
// layer's input weights start 16x larger than the default
// initialisation. Recurrent weights and the second layer keep
// the default.

use burn::{
    nn::{Lstm, LstmConfig},
    prelude::*,
};

use crate::data::batcher::{SequenceBatch, ALPHABET_SIZE};
use crate::ml::capability::Encoder;

/// Factor applied to the first layer's input-to-gate weights at init.
pub const INPUT_WEIGHT_SCALE: f64 = 16.0;

#[derive(Config, Debug)]
pub struct LstmEncoderConfig {
    /// Width of the first recurrent layer
    pub hidden_size:      usize,
    /// Width of the second recurrent layer, i.e. the fingerprint
    pub fingerprint_size: usize,
}

impl LstmEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LstmEncoder<B> {
        let layers = vec![
            scale_input_weights(
                LstmConfig::new(ALPHABET_SIZE, self.hidden_size, true).init(device),
                INPUT_WEIGHT_SCALE,
            ),
            LstmConfig::new(self.hidden_size, self.fingerprint_size, true).init(device),
        ];
        LstmEncoder {
            layers,
            fingerprint_size: self.fingerprint_size,
        }
    }
}

/// Multiply the input-to-gate weights of every gate by `factor`.
///
/// The scaled tensors are detached and re-marked as trainable so
/// they stay leaf parameters on autodiff backends.
fn scale_input_weights<B: Backend>(mut lstm: Lstm<B>, factor: f64) -> Lstm<B> {
    for gate in [
        &mut lstm.input_gate,
        &mut lstm.forget_gate,
        &mut lstm.output_gate,
        &mut lstm.cell_gate,
    ] {
        let weight = gate.input_transform.weight.clone();
        gate.input_transform.weight = weight.map(|w| w.mul_scalar(factor).detach().require_grad());
    }
    lstm
}

#[derive(Module, Debug)]
pub struct LstmEncoder<B: Backend> {
    pub layers:           Vec<Lstm<B>>,
    pub fingerprint_size: usize,
}

impl<B: Backend> Encoder<B> for LstmEncoder<B> {
    fn fingerprint_size(&self) -> usize {
        self.fingerprint_size
    }

    fn encode(&self, sequences: SequenceBatch<B>) -> Tensor<B, 2> {
        let SequenceBatch { inputs, lengths } = sequences;

        let mut hidden = inputs;
        for layer in &self.layers {
            let (outputs, _state) = layer.forward(hidden, None);
            hidden = outputs;
        }

        last_states(hidden, &lengths)
    }
}

/// Select `outputs[i, lengths[i] - 1, :]` for every row `i`.
///
/// outputs: [batch, max_len, width] → [batch, width]
pub fn last_states<B: Backend>(outputs: Tensor<B, 3>, lengths: &[usize]) -> Tensor<B, 2> {
    let [batch, _, width] = outputs.dims();

    let positions: Vec<i32> = lengths
        .iter()
        .flat_map(|&len| std::iter::repeat(len.saturating_sub(1) as i32).take(width))
        .collect();
    let index = Tensor::<B, 1, Int>::from_ints(positions.as_slice(), &outputs.device())
        .reshape([batch, 1, width]);

    outputs.gather(1, index).reshape([batch, width])
}
