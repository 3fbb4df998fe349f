// ============================================================
// Layer 3: Core Traits
// ============================================================
// Abstractions the application layer programs against.
//
// Implementations:
//   - CorpusLoader → reads an author/article directory tree
//   - (tests)      → in-memory corpora

use crate::domain::corpus::{Corpus, CorpusError};

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the full corpus for a run.
///
/// Loading happens exactly once, before training starts.
pub trait CorpusSource {
    fn load(&self) -> Result<Corpus, CorpusError>;
}

impl CorpusSource for Corpus {
    fn load(&self) -> Result<Corpus, CorpusError> {
        Ok(self.clone())
    }
}
