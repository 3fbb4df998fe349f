// ============================================================
// Layer 4: Pair Sampler
// ============================================================
// Draws labelled article pairs from a corpus:
//
//   compare()  → two different articles by ONE author   (Same)
//   contrast() → one article each from TWO authors      (Different)
//
// Every draw takes the random source as an explicit argument so
// tests can seed it and the training run can share one source
// between the training and validation samplers.
//
// Preconditions are checked on every draw. A corpus that cannot
// satisfy them is a configuration problem, reported as
// `InsufficientData`, and the caller treats it as fatal.

use rand::Rng;
use thiserror::Error;

use crate::data::splitter::{split_by_author, CorpusSplit};
use crate::domain::corpus::Corpus;
use crate::domain::pair::{ArticleRef, Pair, PairLabel};

/// The corpus cannot satisfy a draw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsufficientData {
    #[error("insufficient data: no author has two or more articles to compare")]
    NoComparableAuthor,

    #[error("insufficient data: need at least two authors to contrast, found {authors}")]
    TooFewAuthors { authors: usize },
}

/// Draws compare and contrast pairs from one corpus.
#[derive(Debug, Clone)]
pub struct PairSampler {
    corpus:     Corpus,
    /// Indices of authors holding at least two articles
    comparable: Vec<usize>,
}

impl PairSampler {
    pub fn new(corpus: Corpus) -> Self {
        let comparable = corpus
            .authors()
            .iter()
            .enumerate()
            .filter(|(_, a)| a.article_count() >= 2)
            .map(|(i, _)| i)
            .collect();
        Self { corpus, comparable }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Number of authors eligible for compare draws.
    pub fn comparable_authors(&self) -> usize {
        self.comparable.len()
    }

    /// Two distinct articles by the same author.
    pub fn compare<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Pair<'_>, InsufficientData> {
        if self.comparable.is_empty() {
            return Err(InsufficientData::NoComparableAuthor);
        }
        let author = self.comparable[rng.gen_range(0..self.comparable.len())];
        let count = self.corpus.authors()[author].article_count();
        let (first, second) = distinct_indices(rng, count);

        Ok(Pair {
            left:  self.article(author, first),
            right: self.article(author, second),
            label: PairLabel::Same,
        })
    }

    /// One article from each of two distinct authors.
    pub fn contrast<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Pair<'_>, InsufficientData> {
        let authors = self.corpus.author_count();
        if authors < 2 {
            return Err(InsufficientData::TooFewAuthors { authors });
        }
        let (first, second) = distinct_indices(rng, authors);
        let first_article = rng.gen_range(0..self.corpus.authors()[first].article_count());
        let second_article = rng.gen_range(0..self.corpus.authors()[second].article_count());

        Ok(Pair {
            left:  self.article(first, first_article),
            right: self.article(second, second_article),
            label: PairLabel::Different,
        })
    }

    /// Split into (validation, training) samplers by author.
    ///
    /// See [`split_by_author`] for the ordering guarantees.
    pub fn split(self, validation_ratio: f64) -> (PairSampler, PairSampler) {
        let CorpusSplit { validation, training } = split_by_author(self.corpus, validation_ratio);
        (PairSampler::new(validation), PairSampler::new(training))
    }

    /// Fail fast when either kind of draw would be impossible.
    pub fn check_drawable(&self) -> Result<(), InsufficientData> {
        if self.comparable.is_empty() {
            return Err(InsufficientData::NoComparableAuthor);
        }
        if self.corpus.author_count() < 2 {
            return Err(InsufficientData::TooFewAuthors {
                authors: self.corpus.author_count(),
            });
        }
        Ok(())
    }

    fn article(&self, author: usize, index: usize) -> ArticleRef<'_> {
        let author = &self.corpus.authors()[author];
        ArticleRef {
            author: author.name(),
            index,
            body: &author.articles()[index],
        }
    }
}

/// Two different indices in `0..n`, uniform over ordered pairs.
///
/// The second index is drawn from the `n - 1` remaining slots and
/// shifted past the first, so no retry loop is needed.
fn distinct_indices<R: Rng + ?Sized>(rng: &mut R, n: usize) -> (usize, usize) {
    debug_assert!(n >= 2);
    let first = rng.gen_range(0..n);
    let mut second = rng.gen_range(0..n - 1);
    if second >= first {
        second += 1;
    }
    (first, second)
}
