// ============================================================
// Layer 5: ML / Model Layer (Burn)
// ============================================================
// Everything that builds, evaluates or updates tensors lives here.
//
//   capability.rs  : Encoder / Comparator traits the trainer is
//                    written against
//   encoder.rs     : two-layer LSTM over one-hot bytes
//   comparator.rs  : learned feed-forward head and fixed distances
//   model.rs       : encoder + optional comparator, with the config
//                    stored in every checkpoint
//   objective.rs   : cross-entropy and distance costs
//   trainer.rs     : fetch / cost / gradient
//   optimizer.rs   : Adam-style moment transform for Burn
//   supervisor.rs  : iteration loop, validation logging,
//                    cancellation and checkpoint policy
//
// Backends:
//   default        Autodiff<NdArray>   (CPU)
//   --features wgpu Autodiff<Wgpu>     (GPU)
//   model.valid() drops to the inner backend for validation.
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Encoder and comparator capability traits
pub mod capability;

/// Stacked LSTM fingerprint encoder
pub mod encoder;

/// Learned and geometric comparators
pub mod comparator;

/// The trainable fingerprint model
pub mod model;

/// Contrastive cost formulations
pub mod objective;

/// Batch fetching, cost and gradients
pub mod trainer;

/// Moment-based gradient transform
pub mod optimizer;

/// Training loop with cancellation and checkpoints
pub mod supervisor;

use burn::backend::Autodiff;

#[cfg(not(feature = "wgpu"))]
pub type ComputeBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type ComputeBackend = burn::backend::Wgpu;

pub type TrainBackend = Autodiff<ComputeBackend>;

pub type Device = <ComputeBackend as burn::tensor::backend::Backend>::Device;

pub fn default_device() -> Device {
    let device = Device::default();
    tracing::info!("Using device: {:?}", device);
    device
}
