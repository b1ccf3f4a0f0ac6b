//! Training configuration with documented defaults
//!
//! The configuration is an explicit, versioned structure independent of how it
//! was constructed (CLI flags or a JSON file). The same structure is embedded
//! verbatim in a checkpoint's `metadata.json` as the run's provenance.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Configuration for one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Base model directory (encoder config, weights and tokenizer files)
    pub model: String,
    /// Dataset directory containing `train.jsonl` and `validation.jsonl`
    pub data: String,
    /// Explicit version tag for this run; allocated automatically if unset
    #[serde(default)]
    pub version: Option<String>,
    /// Root directory under which versioned checkpoints are written
    pub output_dir: PathBuf,
    /// Learning rate for the classification head
    pub lr: f64,
    /// Number of training epochs
    pub num_epochs: usize,
    /// Training batch size
    pub train_batch_size: usize,
    /// Evaluation batch size
    pub eval_batch_size: usize,
    /// AdamW weight decay
    pub weight_decay: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model: "google-bert/bert-base-multilingual-cased".to_string(),
            data: "papluca/language-identification".to_string(),
            version: None,
            output_dir: PathBuf::from("./models"),
            lr: 2e-5,
            num_epochs: 3,
            train_batch_size: 16,
            eval_batch_size: 16,
            weight_decay: 0.01,
        }
    }
}

impl TrainingConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(Error::config("model must not be empty"));
        }
        if self.data.is_empty() {
            return Err(Error::config("data must not be empty"));
        }
        if self.lr <= 0.0 {
            return Err(Error::config("lr must be > 0"));
        }
        if self.num_epochs == 0 {
            return Err(Error::config("num_epochs must be >= 1"));
        }
        if self.train_batch_size == 0 || self.eval_batch_size == 0 {
            return Err(Error::config("batch sizes must be >= 1"));
        }
        if self.weight_decay < 0.0 {
            return Err(Error::config("weight_decay must be >= 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TrainingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lr, 2e-5);
        assert_eq!(config.num_epochs, 3);
        assert_eq!(config.train_batch_size, 16);
        assert_eq!(config.eval_batch_size, 16);
        assert_eq!(config.weight_decay, 0.01);
        assert!(config.version.is_none());
    }

    #[test]
    fn rejects_bad_hyperparameters() {
        let mut config = TrainingConfig::default();
        config.lr = 0.0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.num_epochs = 0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.weight_decay = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_json_round_trip() {
        let config = TrainingConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TrainingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
