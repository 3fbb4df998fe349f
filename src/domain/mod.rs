// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing the corpus
// and the pairs drawn from it.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - NO randomness (samplers live in the data layer)

/// Authors, articles and the corpus that owns them
pub mod corpus;

/// Labelled article pairs and the batches that carry them
pub mod pair;

/// Abstractions other layers implement
pub mod traits;
