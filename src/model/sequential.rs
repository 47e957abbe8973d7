//! Keras `Sequential` network evaluated with candle.

use std::path::Path;

use anyhow::{bail, Context, Result};
use candle_core::{DType, Device, Tensor, D};

use crate::model::manifest::{LayerSpec, LayersModelArtifact, NamedWeight};
use crate::pipeline::{EncodedSequence, ScoringModel, MAX_LENGTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Linear,
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
}

impl Activation {
    fn parse(name: Option<&str>) -> Result<Self> {
        Ok(match name.unwrap_or("linear") {
            "linear" => Activation::Linear,
            "relu" => Activation::Relu,
            "sigmoid" => Activation::Sigmoid,
            "tanh" => Activation::Tanh,
            "softmax" => Activation::Softmax,
            other => bail!("Unsupported activation '{}'", other),
        })
    }

    fn apply(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            Activation::Linear => Ok(xs.clone()),
            Activation::Relu => xs.relu(),
            Activation::Sigmoid => candle_nn::ops::sigmoid(xs),
            Activation::Tanh => xs.tanh(),
            Activation::Softmax => candle_nn::ops::softmax(xs, D::Minus1),
        }
    }
}

enum Layer {
    Embedding {
        table: Tensor,
    },
    Dense {
        kernel: Tensor,
        bias: Option<Tensor>,
        activation: Activation,
    },
    Activation(Activation),
    GlobalAveragePooling1D,
    GlobalMaxPooling1D,
    Flatten,
    /// Input and dropout layers: no-ops at inference time.
    Identity,
}

impl Layer {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            Layer::Embedding { table } => {
                let (batch, steps) = xs.dims2()?;
                let width = table.dim(1)?;
                table
                    .index_select(&xs.flatten_all()?, 0)?
                    .reshape((batch, steps, width))
            }
            Layer::Dense {
                kernel,
                bias,
                activation,
            } => {
                let ys = xs.broadcast_matmul(kernel)?;
                let ys = match bias {
                    Some(bias) => ys.broadcast_add(bias)?,
                    None => ys,
                };
                activation.apply(&ys)
            }
            Layer::Activation(activation) => activation.apply(xs),
            // Plain mean over time steps; padding positions are not masked out.
            Layer::GlobalAveragePooling1D => xs.mean(1),
            Layer::GlobalMaxPooling1D => xs.max(1),
            Layer::Flatten => xs.flatten_from(1),
            Layer::Identity => Ok(xs.clone()),
        }
    }
}

/// Weights keyed by manifest name; layers take theirs by `<layer>/<param>`.
struct WeightStore {
    weights: Vec<NamedWeight>,
}

impl WeightStore {
    fn take(&mut self, layer: &str, param: &str) -> Option<Tensor> {
        let position = self.weights.iter().position(|w| {
            let name = w.name.trim_end_matches(":0");
            let mut parts = name.rsplit('/');
            parts.next() == Some(param) && parts.next() == Some(layer)
        })?;
        Some(self.weights.remove(position).tensor)
    }

    fn require(&mut self, layer: &str, param: &str) -> Result<Tensor> {
        self.take(layer, param)
            .with_context(|| format!("Missing weight '{}/{}'", layer, param))
    }
}

/// A loaded sequential classifier.
pub struct SequentialModel {
    layers: Vec<Layer>,
    device: Device,
    /// Row count of the leading embedding table, when the model starts with one.
    vocab_size: Option<usize>,
    description: String,
}

impl SequentialModel {
    /// Load `model.json` and the shard files next to it.
    pub fn load(model_json: &Path, device: Device) -> Result<Self> {
        let artifact = LayersModelArtifact::from_file(model_json)?;
        let base_dir = model_json.parent().unwrap_or_else(|| Path::new("."));
        let mut model = Self::from_artifact(&artifact, base_dir, device)?;
        model.description = format!("layers model {}", model_json.display());
        Ok(model)
    }

    pub fn from_artifact(
        artifact: &LayersModelArtifact,
        base_dir: &Path,
        device: Device,
    ) -> Result<Self> {
        let specs = artifact.layers()?;
        let mut store = WeightStore {
            weights: artifact.read_weights(base_dir, &device)?,
        };

        let layers = specs
            .iter()
            .map(|spec| build_layer(spec, &mut store))
            .collect::<Result<Vec<_>>>()?;

        let vocab_size = match layers.iter().find(|l| !matches!(l, Layer::Identity)) {
            Some(Layer::Embedding { table }) => Some(table.dim(0)?),
            _ => None,
        };

        Ok(Self {
            layers,
            device,
            vocab_size,
            description: "layers model".to_string(),
        })
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Run the network over a batch and flatten the output to one value per row.
    pub fn forward_ids(&self, batch: &[EncodedSequence]) -> Result<Vec<f32>> {
        let rows: Vec<u32> = batch
            .iter()
            .flat_map(|seq| seq.ids().iter().copied())
            .collect();

        if let Some(vocab_size) = self.vocab_size {
            if let Some(&id) = rows.iter().find(|&&id| id as usize >= vocab_size) {
                bail!(
                    "Token id {} is outside the embedding table ({} rows)",
                    id,
                    vocab_size
                );
            }
        }

        let ids = Tensor::from_vec(rows, (batch.len(), MAX_LENGTH), &self.device)?;
        let mut xs = match self.vocab_size {
            Some(_) => ids,
            None => ids.to_dtype(DType::F32)?,
        };
        for layer in &self.layers {
            xs = layer.forward(&xs)?;
        }

        let scores = xs.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?;
        Ok(scores)
    }
}

impl ScoringModel for SequentialModel {
    fn predict(&self, batch: &[EncodedSequence]) -> Result<Vec<f32>> {
        self.forward_ids(batch)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

fn build_layer(spec: &LayerSpec, store: &mut WeightStore) -> Result<Layer> {
    let name = spec.name();
    let layer = match spec.class_name.as_str() {
        "InputLayer" | "Dropout" | "SpatialDropout1D" => Layer::Identity,
        "Embedding" => Layer::Embedding {
            table: store.require(name, "embeddings")?,
        },
        "Dense" => {
            let kernel = store.require(name, "kernel")?;
            let bias = if spec.config_bool("use_bias").unwrap_or(true) {
                Some(store.require(name, "bias")?)
            } else {
                None
            };
            Layer::Dense {
                kernel,
                bias,
                activation: Activation::parse(spec.config_str("activation"))?,
            }
        }
        "Activation" => Layer::Activation(Activation::parse(spec.config_str("activation"))?),
        "GlobalAveragePooling1D" => Layer::GlobalAveragePooling1D,
        "GlobalMaxPooling1D" => Layer::GlobalMaxPooling1D,
        "Flatten" => Layer::Flatten,
        other => bail!("Unsupported layer '{}' ({})", other, name),
    };
    Ok(layer)
}
