//! Candle runtime for TensorFlow.js layers models.
//!
//! Loads the `model.json` topology and its binary weight shards into a
//! [`SequentialModel`] that implements [`crate::pipeline::ScoringModel`].

pub mod manifest;
pub mod sequential;

use candle_core::Device;

pub use manifest::LayersModelArtifact;
pub use sequential::SequentialModel;

/// Select the compute device.
///
/// Metal on macOS and CUDA with the `cuda` feature when available, CPU otherwise.
pub fn select_device() -> Device {
    #[cfg(target_os = "macos")]
    {
        if let Ok(device) = Device::new_metal(0) {
            tracing::info!("Using Metal GPU for inference");
            return device;
        }
    }
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            tracing::info!("Using CUDA GPU for inference");
            return device;
        }
    }
    tracing::info!("Using CPU for inference");
    Device::Cpu
}
