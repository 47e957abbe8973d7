pub mod prediction;

pub use prediction::{AssetBackedPredictionService, PredictionService};
