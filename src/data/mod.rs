// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything between the corpus directory and encoder-ready
// tensors:
//
//   corpus directory
//       │
//       ▼
//   CorpusLoader      → reads authors/articles, truncates
//       │
//       ▼
//   split_by_author   → deterministic validation/training split
//       │
//       ▼
//   PairSampler       → compare (same) / contrast (different) pairs
//       │
//       ▼
//   SequenceBatcher   → one-hot, right-padded byte tensors

/// Reads the author/article directory tree
pub mod loader;

/// Deterministic author-level validation split
pub mod splitter;

/// Same-author and different-author pair draws
pub mod sampler;

/// One-hot byte sequence batching
pub mod batcher;
