//! TensorFlow.js layers-model artifact: topology JSON plus binary weight shards.

use std::path::{Component, Path};

use anyhow::{bail, Context, Result};
use candle_core::{Device, Tensor};
use serde::Deserialize;
use serde_json::Value;

/// Parsed `model.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayersModelArtifact {
    #[serde(default)]
    pub format: Option<String>,
    pub model_topology: Value,
    #[serde(default)]
    pub weights_manifest: Vec<WeightsGroup>,
}

/// One group of weights stored across one or more shard files.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightsGroup {
    pub paths: Vec<String>,
    pub weights: Vec<WeightSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightSpec {
    pub name: String,
    pub shape: Vec<usize>,
    #[serde(default = "default_dtype")]
    pub dtype: String,
    #[serde(default)]
    pub quantization: Option<Value>,
}

fn default_dtype() -> String {
    "float32".to_string()
}

/// A layer entry from the Keras topology.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerSpec {
    pub class_name: String,
    #[serde(default)]
    pub config: Value,
}

impl LayerSpec {
    /// Layer name, used to match weights.
    pub fn name(&self) -> &str {
        self.config
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    pub fn config_bool(&self, key: &str) -> Option<bool> {
        self.config.get(key).and_then(Value::as_bool)
    }
}

/// A decoded weight tensor and its manifest name.
pub struct NamedWeight {
    pub name: String,
    pub tensor: Tensor,
}

impl LayersModelArtifact {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Layers of the `Sequential` topology, in order.
    ///
    /// Accepts the topology at the top level or under `model_config`, with
    /// `config` either holding `layers` or being the layer list itself.
    pub fn layers(&self) -> Result<Vec<LayerSpec>> {
        let topology = self
            .model_topology
            .get("model_config")
            .unwrap_or(&self.model_topology);

        let class_name = topology
            .get("class_name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if class_name != "Sequential" {
            bail!(
                "Unsupported model class '{}': only Sequential models can be loaded",
                class_name
            );
        }

        let config = topology
            .get("config")
            .context("Model topology has no config")?;
        let layers = match config {
            Value::Array(_) => config,
            _ => config
                .get("layers")
                .context("Model topology config has no layers")?,
        };

        serde_json::from_value(layers.clone()).context("Failed to parse model layers")
    }

    /// Every shard path referenced by the manifest.
    pub fn shard_paths(&self) -> impl Iterator<Item = &str> {
        self.weights_manifest
            .iter()
            .flat_map(|group| group.paths.iter().map(String::as_str))
    }

    /// Read every weight from the shard files next to `model.json`.
    ///
    /// Shards of a group are concatenated in order and weights are sliced off
    /// sequentially, little-endian.
    pub fn read_weights(&self, base_dir: &Path, device: &Device) -> Result<Vec<NamedWeight>> {
        let mut named = Vec::new();

        for group in &self.weights_manifest {
            let mut buffer = Vec::new();
            for shard in &group.paths {
                let shard_path = base_dir.join(checked_shard_path(shard)?);
                let bytes = std::fs::read(&shard_path)
                    .with_context(|| format!("Failed to read weight shard {}", shard_path.display()))?;
                buffer.extend_from_slice(&bytes);
            }

            let mut offset = 0;
            for spec in &group.weights {
                if spec.quantization.is_some() {
                    bail!("Quantized weight '{}' is not supported", spec.name);
                }
                let count: usize = spec.shape.iter().product();
                let byte_len = count * 4;
                let chunk = buffer.get(offset..offset + byte_len).with_context(|| {
                    format!(
                        "Weight '{}' needs {} bytes at offset {} but the shard data holds {}",
                        spec.name,
                        byte_len,
                        offset,
                        buffer.len()
                    )
                })?;
                offset += byte_len;

                let values = decode_values(chunk, &spec.dtype)
                    .with_context(|| format!("Failed to decode weight '{}'", spec.name))?;
                let tensor = Tensor::from_vec(values, spec.shape.clone(), device)?;
                named.push(NamedWeight {
                    name: spec.name.clone(),
                    tensor,
                });
            }
        }

        Ok(named)
    }
}

/// Reject shard paths that would leave the model directory.
pub fn checked_shard_path(shard: &str) -> Result<&Path> {
    let path = Path::new(shard);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || shard.is_empty() {
        bail!("Weight shard path '{}' is outside the model directory", shard);
    }
    Ok(path)
}

fn decode_values(bytes: &[u8], dtype: &str) -> Result<Vec<f32>> {
    let words = bytes.chunks_exact(4).map(|b| [b[0], b[1], b[2], b[3]]);
    match dtype {
        "float32" => Ok(words.map(f32::from_le_bytes).collect()),
        "int32" => Ok(words.map(|w| i32::from_le_bytes(w) as f32).collect()),
        other => bail!("Unsupported weight dtype '{}'", other),
    }
}
