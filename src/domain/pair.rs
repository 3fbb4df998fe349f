// ============================================================
// Layer 3: Pair Domain Types
// ============================================================
// A Pair is one training example for the contrastive objective:
// two articles plus whether they share an author.
//
//   Compare pair  → same author,      label = Same
//   Contrast pair → different authors, label = Different
//
// Pairs borrow from the Corpus and are thrown away after the
// batch that holds them has been costed.

use std::fmt;

/// Whether the two articles of a pair share an author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairLabel {
    Same,
    Different,
}

impl PairLabel {
    /// Binary target used by the cross-entropy objective.
    pub fn target(self) -> i32 {
        match self {
            PairLabel::Same      => 1,
            PairLabel::Different => 0,
        }
    }

    pub fn is_same(self) -> bool {
        self == PairLabel::Same
    }
}

/// A borrowed reference to one article inside a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleRef<'a> {
    /// Display name of the owning author
    pub author: &'a str,
    /// Position of the article within its author
    pub index:  usize,
    /// Raw article bytes
    pub body:   &'a [u8],
}

/// Two articles and their label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair<'a> {
    pub left:  ArticleRef<'a>,
    pub right: ArticleRef<'a>,
    pub label: PairLabel,
}

impl fmt::Display for ArticleRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.author, self.index)
    }
}

impl fmt::Display for Pair<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.label.is_same() { "same" } else { "different" };
        write!(f, "{} ~ {} ({label})", self.left, self.right)
    }
}

/// An ordered batch of raw sequences with one label per pair.
///
/// `sequences[2 * i]` and `sequences[2 * i + 1]` form pair `i`,
/// whose label is `labels[i]`.
#[derive(Debug, Clone, Default)]
pub struct PairBatch<'a> {
    pub sequences: Vec<&'a [u8]>,
    pub labels:    Vec<PairLabel>,
}

impl<'a> PairBatch<'a> {
    pub fn with_capacity(pairs: usize) -> Self {
        Self {
            sequences: Vec::with_capacity(pairs * 2),
            labels:    Vec::with_capacity(pairs),
        }
    }

    pub fn push(&mut self, pair: Pair<'a>) {
        tracing::trace!("Drew pair {}", pair);
        self.sequences.push(pair.left.body);
        self.sequences.push(pair.right.body);
        self.labels.push(pair.label);
    }

    pub fn pair_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of pairs carrying each label, as (same, different).
    pub fn label_counts(&self) -> (usize, usize) {
        let same = self.labels.iter().filter(|l| l.is_same()).count();
        (same, self.labels.len() - same)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(author: &'static str, body: &'static [u8]) -> ArticleRef<'static> {
        ArticleRef { author, index: 0, body }
    }

    #[test]
    fn test_push_keeps_sequences_parallel_to_labels() {
        let mut batch = PairBatch::with_capacity(2);
        batch.push(Pair {
            left:  article("a", b"x"),
            right: article("a", b"y"),
            label: PairLabel::Same,
        });
        batch.push(Pair {
            left:  article("a", b"x"),
            right: article("b", b"z"),
            label: PairLabel::Different,
        });

        let expected: Vec<&[u8]> = vec![&b"x"[..], &b"y"[..], &b"x"[..], &b"z"[..]];
        assert_eq!(batch.sequences, expected);
        assert_eq!(batch.pair_count(), 2);
        assert_eq!(batch.label_counts(), (1, 1));
    }

    #[test]
    fn test_pair_display_names_articles() {
        let pair = Pair {
            left:  ArticleRef { author: "ada", index: 0, body: b"x" },
            right: ArticleRef { author: "bob", index: 3, body: b"y" },
            label: PairLabel::Different,
        };
        assert_eq!(pair.to_string(), "ada#0 ~ bob#3 (different)");
    }

    #[test]
    fn test_targets() {
        assert_eq!(PairLabel::Same.target(), 1);
        assert_eq!(PairLabel::Different.target(), 0);
    }
}
