// ============================================================
// Layer 3: Corpus Domain Types
// ============================================================
// An in-memory view of the training corpus:
//
//   Corpus
//     └── authors: Vec<Author>
//           ├── name      (unique display name)
//           └── articles  (raw bytes, already truncated)
//
// Articles are kept as bytes rather than String because the
// encoder consumes raw bytes and truncation may split a UTF-8
// character in half.
//
// Once built, a Corpus is never mutated. The sampler and the
// splitter only ever read from it or move whole authors around.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// One author and every article retained for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    name:     String,
    articles: Vec<Vec<u8>>,
}

impl Author {
    /// Build an author, dropping any empty article bodies.
    pub fn new(name: impl Into<String>, articles: Vec<Vec<u8>>) -> Self {
        Self {
            name:     name.into(),
            articles: articles.into_iter().filter(|a| !a.is_empty()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn articles(&self) -> &[Vec<u8>] {
        &self.articles
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }
}

/// The full set of authors for one training run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    authors: Vec<Author>,
}

impl Corpus {
    /// Build a corpus. Authors without any retained article are dropped.
    pub fn new(authors: Vec<Author>) -> Self {
        Self {
            authors: authors
                .into_iter()
                .filter(|a| a.article_count() > 0)
                .collect(),
        }
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    pub fn article_count(&self) -> usize {
        self.authors.iter().map(Author::article_count).sum()
    }

    /// Bytes held in memory across every article.
    pub fn total_bytes(&self) -> usize {
        self.authors
            .iter()
            .flat_map(|a| a.articles.iter())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    pub(crate) fn into_authors(self) -> Vec<Author> {
        self.authors
    }
}

impl fmt::Display for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} authors, {} articles, {} bytes",
            self.author_count(),
            self.article_count(),
            self.total_bytes()
        )
    }
}

/// Failures while reading a corpus from disk. All of them are fatal.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("cannot read corpus root '{path}'")]
    UnreadableRoot {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read '{path}'")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_articles_and_authors_are_dropped() {
        let corpus = Corpus::new(vec![
            Author::new("alice", vec![b"one".to_vec(), Vec::new()]),
            Author::new("bob", vec![Vec::new()]),
        ]);
        assert_eq!(corpus.author_count(), 1);
        assert_eq!(corpus.authors()[0].name(), "alice");
        assert_eq!(corpus.article_count(), 1);
    }

    #[test]
    fn test_totals() {
        let corpus = Corpus::new(vec![
            Author::new("a", vec![b"abc".to_vec(), b"de".to_vec()]),
            Author::new("b", vec![b"f".to_vec()]),
        ]);
        assert_eq!(corpus.total_bytes(), 6);
        assert_eq!(corpus.to_string(), "2 authors, 3 articles, 6 bytes");
    }
}
