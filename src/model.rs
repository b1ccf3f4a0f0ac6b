//! Language classifier: frozen BERT encoder + trainable linear head
//!
//! The pretrained encoder is loaded from safetensors as constants and never
//! updated; only the classification head lives in the caller's `VarMap`.
//! Token embeddings are mean-pooled over the attention mask before the head,
//! so padding positions never contribute to the logits.

use candle_core::{DType, Device, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Encoder configuration file inside a base-model or checkpoint directory
pub const ENCODER_CONFIG_FILE: &str = "config.json";
/// Encoder weight file inside a base-model or checkpoint directory
pub const ENCODER_WEIGHTS_FILE: &str = "model.safetensors";

/// Sequence classifier over a fixed label space
pub struct LanguageClassifier {
    encoder: BertModel,
    head: Linear,
    hidden_size: usize,
    num_labels: usize,
}

impl LanguageClassifier {
    /// Build a classifier from a directory holding the encoder files.
    ///
    /// `head_vb` supplies the classification head variables: a fresh `VarMap`
    /// builder at training time (random init), or a builder over saved head
    /// weights at serve time.
    pub fn new(
        encoder_dir: impl AsRef<Path>,
        num_labels: usize,
        head_vb: VarBuilder,
        device: &Device,
    ) -> Result<Self> {
        let dir = encoder_dir.as_ref();
        let config_path = dir.join(ENCODER_CONFIG_FILE);
        let weights_path = dir.join(ENCODER_WEIGHTS_FILE);
        for path in [&config_path, &weights_path] {
            if !path.is_file() {
                return Err(Error::artifact(format!(
                    "missing encoder file {}",
                    path.display()
                )));
            }
        }

        let config: BertConfig =
            serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, device)?
        };
        // Hub exports differ on whether tensors carry the "bert." prefix.
        let encoder = BertModel::load(vb.clone(), &config)
            .or_else(|_| BertModel::load(vb.pp("bert"), &config))?;
        debug!(
            "loaded encoder from {} (hidden size {})",
            dir.display(),
            config.hidden_size
        );

        let head = candle_nn::linear(config.hidden_size, num_labels, head_vb.pp("classifier"))?;

        Ok(Self {
            encoder,
            head,
            hidden_size: config.hidden_size,
            num_labels,
        })
    }

    /// Encoder hidden size
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Size of the label space this head was built for
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Forward pass: `[batch, max_length]` ids and mask to `[batch, num_labels]` logits
    pub fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self
            .encoder
            .forward(input_ids, &token_type_ids, Some(attention_mask))?;
        let pooled = mean_pool(&hidden, attention_mask)?;
        Ok(self.head.forward(&pooled)?)
    }
}

/// Mean-pool `[batch, len, hidden]` states over the attention mask.
///
/// An all-padding row (empty input) pools to zeros rather than NaN.
fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask.to_dtype(DType::F32)?;
    let expanded = mask.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&expanded)?.sum(1)?;
    let counts = mask.sum_keepdim(1)?.clamp(1e-9f32, f32::INFINITY)?;
    Ok(summed.broadcast_div(&counts)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_pool_averages_unmasked_positions() {
        let device = Device::Cpu;
        // batch 1, len 3, hidden 2; third position is padding
        let hidden = Tensor::from_vec(
            vec![1.0f32, 2.0, 3.0, 4.0, 100.0, 100.0],
            (1, 3, 2),
            &device,
        )
        .unwrap();
        let mask = Tensor::new(vec![vec![1u32, 1, 0]], &device).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap();
        let values: Vec<Vec<f32>> = pooled.to_vec2().unwrap();
        assert_eq!(values, vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn mean_pool_of_all_padding_is_finite() {
        let device = Device::Cpu;
        let hidden = Tensor::zeros((1, 4, 2), DType::F32, &device).unwrap();
        let mask = Tensor::zeros((1, 4), DType::U32, &device).unwrap();

        let pooled = mean_pool(&hidden, &mask).unwrap();
        let values: Vec<Vec<f32>> = pooled.to_vec2().unwrap();
        assert!(values[0].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn missing_encoder_files_are_an_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let device = Device::Cpu;
        let varmap = candle_nn::VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let result = LanguageClassifier::new(dir.path(), 3, vb, &device);
        assert!(matches!(result, Err(Error::Artifact(_))));
    }
}
