// ============================================================
// Layer 2: Compare Use Case
// ============================================================
// Scores two text files with a saved model:
//
//   1. Load the checkpoint (it must exist)
//   2. Read and truncate both files the way the loader does
//   3. Fingerprint both in one batch
//   4. Score with the learned comparator, or with a distance
//      metric when one is requested or the model has none
//
// Runs on the plain compute backend; no gradients are needed.

use anyhow::{anyhow, bail, Context, Result};
use burn::{prelude::*, tensor::activation};
use std::{fs, path::Path};

use crate::data::{batcher::SequenceBatcher, loader::truncate_article};
use crate::infra::checkpoint::CheckpointStore;
use crate::ml::{
    capability::{Comparator, ContrastiveModel, Encoder},
    comparator::DistanceMetric,
    default_device,
    model::TextprintModel,
    ComputeBackend,
};

/// Result of comparing two texts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompareOutcome {
    /// Raw comparator output: a logit, or a distance
    pub score:                   f32,
    /// sigmoid(score), only for the learned comparator
    pub same_author_probability: Option<f32>,
}

pub struct CompareUseCase {
    model:           TextprintModel<ComputeBackend>,
    max_article_len: usize,
    device:          <ComputeBackend as Backend>::Device,
}

impl CompareUseCase {
    pub fn new(model_file: &str, max_article_len: usize) -> Result<Self> {
        let device = default_device();
        let model = CheckpointStore::new(model_file)
            .load::<ComputeBackend>(&device)
            .with_context(|| format!("Failed to read model '{model_file}'"))?
            .ok_or_else(|| anyhow!("No model at '{model_file}'. Have you run 'train' first?"))?;

        Ok(Self {
            model,
            max_article_len,
            device,
        })
    }

    /// Compare the contents of two files.
    pub fn compare_files(
        &self,
        left:   &Path,
        right:  &Path,
        metric: Option<DistanceMetric>,
    ) -> Result<CompareOutcome> {
        let left = self.read_text(left)?;
        let right = self.read_text(right)?;
        self.compare(&left, &right, metric)
    }

    /// Compare two already-truncated texts.
    pub fn compare(&self, left: &[u8], right: &[u8], metric: Option<DistanceMetric>) -> Result<CompareOutcome> {
        let batch = SequenceBatcher::<ComputeBackend>::new(self.device.clone()).batch(&[left, right]);
        let fingerprints = self.model.encode(batch);
        let width = self.model.fingerprint_size();
        let a = fingerprints.clone().slice([0..1, 0..width]);
        let b = fingerprints.slice([1..2, 0..width]);

        let outcome = match (metric, self.model.learned_comparator()) {
            (Some(metric), _) => CompareOutcome {
                score:                   scalar(metric.score(a, b)),
                same_author_probability: None,
            },
            (None, Some(comparator)) => {
                let logit = comparator.score(a, b);
                CompareOutcome {
                    score:                   scalar(logit.clone()),
                    same_author_probability: Some(scalar(activation::sigmoid(logit))),
                }
            }
            (None, None) => bail!("This model has no learned comparator; choose a distance metric"),
        };

        Ok(outcome)
    }

    fn read_text(&self, path: &Path) -> Result<Vec<u8>> {
        let body = fs::read(path).with_context(|| format!("Cannot read '{}'", path.display()))?;
        truncate_article(body, self.max_article_len)
            .ok_or_else(|| anyhow!("'{}' is empty", path.display()))
    }
}

fn scalar(t: Tensor<ComputeBackend, 1>) -> f32 {
    t.into_scalar().elem::<f32>()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::TextprintModelConfig;
    use tempfile::TempDir;

    fn saved_model(dir: &TempDir, learned: bool) -> String {
        let path = dir.path().join("out_net");
        let model = TextprintModelConfig::new()
            .with_hidden_size(5)
            .with_fingerprint_size(3)
            .with_comparator_hidden(2)
            .with_learned_comparator(learned)
            .init::<ComputeBackend>(&Default::default());
        CheckpointStore::new(&path).save(&model).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nothing_here");
        assert!(CompareUseCase::new(&path.to_string_lossy(), 64).is_err());
    }

    #[test]
    fn test_learned_comparator_reports_probability() {
        let dir = TempDir::new().unwrap();
        let use_case = CompareUseCase::new(&saved_model(&dir, true), 64).unwrap();

        let outcome = use_case.compare(b"one text", b"another text", None).unwrap();
        let p = outcome.same_author_probability.unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_identical_texts_have_zero_distance() {
        let dir = TempDir::new().unwrap();
        let use_case = CompareUseCase::new(&saved_model(&dir, false), 64).unwrap();

        let outcome = use_case
            .compare(b"same words", b"same words", Some(DistanceMetric::Euclidean))
            .unwrap();
        assert!(outcome.score.abs() < 1e-4);
        assert!(outcome.same_author_probability.is_none());
    }

    #[test]
    fn test_distance_model_needs_a_metric() {
        let dir = TempDir::new().unwrap();
        let use_case = CompareUseCase::new(&saved_model(&dir, false), 64).unwrap();
        assert!(use_case.compare(b"a", b"b", None).is_err());
    }

    #[test]
    fn test_files_are_truncated_and_empty_files_rejected() {
        let dir = TempDir::new().unwrap();
        let use_case = CompareUseCase::new(&saved_model(&dir, true), 4).unwrap();
        let left = dir.path().join("a.txt");
        let right = dir.path().join("b.txt");
        let empty = dir.path().join("c.txt");
        fs::write(&left, b"abcdXXXX").unwrap();
        fs::write(&right, b"abcdYYYY").unwrap();
        fs::write(&empty, b"").unwrap();

        let outcome = use_case
            .compare_files(&left, &right, Some(DistanceMetric::Euclidean))
            .unwrap();
        assert!(outcome.score.abs() < 1e-4);
        assert!(use_case.compare_files(&left, &empty, None).is_err());
    }
}
