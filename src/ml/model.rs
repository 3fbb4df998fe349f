// ============================================================
// Layer 5: Fingerprint Model
// ============================================================
// The trainable unit saved in every checkpoint:
//
//   TextprintModel
//     ├── encoder:    LstmEncoder            (always)
//     └── comparator: FeedForwardComparator  (cross-entropy only)
//
// Models trained with a distance objective carry no comparator,
// so their checkpoints hold encoder weights only.

use burn::prelude::*;

use crate::data::batcher::SequenceBatch;
use crate::ml::capability::{Comparator, ContrastiveModel, Encoder};
use crate::ml::comparator::{FeedForwardComparator, FeedForwardComparatorConfig};
use crate::ml::encoder::{LstmEncoder, LstmEncoderConfig};

/// Architecture of a fingerprint model.
///
/// This is everything needed to rebuild the module tree before
/// loading trained weights into it, so it is stored inside every
/// checkpoint.
#[derive(Config, Debug, PartialEq)]
pub struct TextprintModelConfig {
    /// Width of the first LSTM layer
    #[config(default = 384)]
    pub hidden_size:           usize,
    /// Fingerprint width (second LSTM layer)
    #[config(default = 384)]
    pub fingerprint_size:      usize,
    /// Hidden width of the learned comparator
    #[config(default = 128)]
    pub comparator_hidden:     usize,
    /// Build a learned comparator (cross-entropy objective)
    #[config(default = true)]
    pub learned_comparator:    bool,
}

impl TextprintModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextprintModel<B> {
        let encoder = LstmEncoderConfig::new(self.hidden_size, self.fingerprint_size).init(device);
        let comparator = self.learned_comparator.then(|| {
            FeedForwardComparatorConfig::new(self.fingerprint_size)
                .with_hidden_size(self.comparator_hidden)
                .init(device)
        });

        TextprintModel {
            encoder,
            comparator,
            hidden_size: self.hidden_size,
            comparator_hidden: self.comparator_hidden,
        }
    }
}

/// LSTM encoder plus an optional learned comparator head.
#[derive(Module, Debug)]
pub struct TextprintModel<B: Backend> {
    pub encoder:           LstmEncoder<B>,
    pub comparator:        Option<FeedForwardComparator<B>>,
    pub hidden_size:       usize,
    pub comparator_hidden: usize,
}

impl<B: Backend> TextprintModel<B> {
    /// The architecture this model was built from.
    pub fn config(&self) -> TextprintModelConfig {
        TextprintModelConfig::new()
            .with_hidden_size(self.hidden_size)
            .with_fingerprint_size(self.encoder.fingerprint_size)
            .with_comparator_hidden(self.comparator_hidden)
            .with_learned_comparator(self.comparator.is_some())
    }
}

impl<B: Backend> Encoder<B> for TextprintModel<B> {
    fn fingerprint_size(&self) -> usize {
        self.encoder.fingerprint_size()
    }

    fn encode(&self, sequences: SequenceBatch<B>) -> Tensor<B, 2> {
        self.encoder.encode(sequences)
    }
}

impl<B: Backend> ContrastiveModel<B> for TextprintModel<B> {
    fn learned_comparator(&self) -> Option<&dyn Comparator<B>> {
        self.comparator.as_ref().map(|c| c as &dyn Comparator<B>)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_config_round_trips_through_model() {
        let config = TextprintModelConfig::new()
            .with_hidden_size(6)
            .with_fingerprint_size(4)
            .with_comparator_hidden(3);
        let model = config.init::<TestBackend>(&Default::default());

        assert_eq!(model.config(), config);
        assert_eq!(model.fingerprint_size(), 4);
        assert!(model.learned_comparator().is_some());
    }

    #[test]
    fn test_distance_models_have_no_comparator_parameters() {
        let with = TextprintModelConfig::new()
            .with_hidden_size(6)
            .with_fingerprint_size(4)
            .init::<TestBackend>(&Default::default());
        let without = TextprintModelConfig::new()
            .with_hidden_size(6)
            .with_fingerprint_size(4)
            .with_learned_comparator(false)
            .init::<TestBackend>(&Default::default());

        assert!(without.learned_comparator().is_none());
        assert!(without.num_params() < with.num_params());
    }
}
