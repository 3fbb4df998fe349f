// ============================================================
// Layer 4: Validation/Training Splitter
// ============================================================
// Splits the authors of a corpus into two disjoint sets:
//   - Validation set: authors whose articles are only used to
//                     measure the cost on unseen writers
//   - Training set:   every other author
//
// The split is made per author, not per article, so no writer
// ever appears on both sides.
//
// Authors are ordered by the SHA-256 digest of their name and the
// first ceil(ratio * count) go to validation. The order depends
// only on the set of names, never on the order authors were
// loaded in, so re-running over the same corpus (on any machine)
// always yields the same partition. Runs started weeks apart can
// therefore be compared on identical validation authors.

use sha2::{Digest, Sha256};

use crate::domain::corpus::{Author, Corpus};

/// The two halves of a split corpus.
#[derive(Debug, Clone)]
pub struct CorpusSplit {
    pub validation: Corpus,
    pub training:   Corpus,
}

/// Deterministically split `corpus` by author.
///
/// # Arguments
/// * `corpus`           - The full corpus (consumed)
/// * `validation_ratio` - Share of authors for validation, clamped to [0, 1]
pub fn split_by_author(corpus: Corpus, validation_ratio: f64) -> CorpusSplit {
    let mut authors = corpus.into_authors();
    authors.sort_by_cached_key(|a| (name_digest(a.name()), a.name().to_owned()));

    let total = authors.len();
    let count = validation_count(total, validation_ratio);
    let training = authors.split_off(count);

    tracing::debug!(
        "Author split: {} validation, {} training",
        authors.len(),
        training.len()
    );

    CorpusSplit {
        validation: Corpus::new(authors),
        training:   Corpus::new(training),
    }
}

/// Number of authors assigned to validation: ceil(ratio * total).
pub fn validation_count(total: usize, ratio: f64) -> usize {
    let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
    ((total as f64 * ratio).ceil() as usize).min(total)
}

fn name_digest(name: &str) -> [u8; 32] {
    Sha256::digest(name.as_bytes()).into()
}
