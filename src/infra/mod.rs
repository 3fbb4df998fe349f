// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Cross-cutting concerns that belong to no single business layer:
//
//   checkpoint.rs  : single-file model persistence. Stores the
//                    architecture config next to the Burn record
//                    so the model can be rebuilt before loading.
//
//   cancel.rs      : Ctrl+C → cancellation token polled by the
//                    training supervisor between iterations.
//
//   metrics.rs     : per-iteration cost rows in a CSV file, fed
//                    through the supervisor's observer hook.

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Interrupt handling for graceful shutdown
pub mod cancel;

/// Training metrics CSV logger
pub mod metrics;
