//! Checkpoint artifacts: layout, run metadata, registry and loader
//!
//! A checkpoint directory holds the encoder files, the trained head weights,
//! the label space, the persisted tokenizer settings and, written last, the
//! `metadata.json` run document. Metadata presence is the completeness
//! signal: a directory without it is an aborted run and is never loaded.

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::TrainingConfig;
use crate::error::{Error, Result};
use crate::labels::LabelSpace;
use crate::model::LanguageClassifier;
use crate::tokenize::TextTokenizer;
use crate::{device, version};

/// Trained head weight file inside a checkpoint directory
pub const HEAD_WEIGHTS_FILE: &str = "head.safetensors";
/// Label space file inside a checkpoint directory
pub const LABELS_FILE: &str = "labels.json";
/// Run metadata file, written last as the completeness marker
pub const METADATA_FILE: &str = "metadata.json";

/// Provenance document for one training run; exactly one per checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRun {
    /// Base model identifier the run started from
    pub model_name: String,
    /// Source dataset identifier
    pub dataset: String,
    /// Version this checkpoint was written under
    pub version: String,
    /// Full configuration the run used
    pub training_args: TrainingConfig,
    /// Final evaluation metrics
    pub metrics: BTreeMap<String, f64>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl TrainingRun {
    /// Write the metadata document into a checkpoint directory.
    ///
    /// Must be the final persistence step of a training run.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.as_ref().join(METADATA_FILE), json)?;
        Ok(())
    }

    /// Read the metadata document of a complete checkpoint
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(METADATA_FILE);
        let content = std::fs::read_to_string(&path).map_err(|_| {
            Error::artifact(format!(
                "{} is not a complete checkpoint: missing {}",
                dir.as_ref().display(),
                METADATA_FILE
            ))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Resolves version identifiers to checkpoint directories under one root
pub struct ModelRegistry {
    root: PathBuf,
}

impl ModelRegistry {
    /// Create a registry over an artifact root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a version identifier to its checkpoint directory.
    ///
    /// Rejects directories without a metadata document (incomplete runs).
    pub fn resolve(&self, version: &str) -> Result<PathBuf> {
        let dir = self.root.join(version);
        if !dir.is_dir() {
            return Err(Error::artifact(format!(
                "no checkpoint directory {}",
                dir.display()
            )));
        }
        if !dir.join(METADATA_FILE).is_file() {
            return Err(Error::artifact(format!(
                "{} is not a complete checkpoint: missing {}",
                dir.display(),
                METADATA_FILE
            )));
        }
        Ok(dir)
    }

    /// The complete checkpoint with the highest version number
    pub fn latest(&self) -> Result<PathBuf> {
        let mut best: Option<(u64, PathBuf)> = None;
        for entry in std::fs::read_dir(&self.root).map_err(|e| {
            Error::artifact(format!("cannot read {}: {}", self.root.display(), e))
        })? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(n) = name.to_str().and_then(version::leading_index) else {
                continue;
            };
            let dir = entry.path();
            if !dir.join(METADATA_FILE).is_file() {
                continue;
            }
            if best.as_ref().map_or(true, |(top, _)| n > *top) {
                best = Some((n, dir));
            }
        }
        best.map(|(_, dir)| dir).ok_or_else(|| {
            Error::artifact(format!(
                "no complete checkpoints under {}",
                self.root.display()
            ))
        })
    }
}

/// Immutable in-memory checkpoint bound to a compute device.
///
/// Loaded exactly once per process lifetime; a load failure must keep the
/// process out of any serving state.
pub struct Checkpoint {
    version: String,
    metadata: TrainingRun,
    labels: LabelSpace,
    tokenizer: TextTokenizer,
    model: LanguageClassifier,
    device: Device,
}

impl Checkpoint {
    /// Load a checkpoint directory into memory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let metadata = TrainingRun::load(dir)?;
        let device = device::probe();

        let labels = LabelSpace::load(dir.join(LABELS_FILE))?;
        let tokenizer = TextTokenizer::from_checkpoint(dir)?;

        let head_path = dir.join(HEAD_WEIGHTS_FILE);
        if !head_path.is_file() {
            return Err(Error::artifact(format!(
                "missing head weights {}",
                head_path.display()
            )));
        }
        let head_vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[head_path], DType::F32, &device)?
        };
        let model = LanguageClassifier::new(dir, labels.len(), head_vb, &device)?;

        info!(
            "loaded checkpoint {} ({} labels) from {}",
            metadata.version,
            labels.len(),
            dir.display()
        );
        Ok(Self {
            version: metadata.version.clone(),
            metadata,
            labels,
            tokenizer,
            model,
            device,
        })
    }

    /// Version this checkpoint was trained under
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Run metadata
    pub fn metadata(&self) -> &TrainingRun {
        &self.metadata
    }

    /// Label space fixed at training time
    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    /// Tokenizer under the persisted contract
    pub fn tokenizer(&self) -> &TextTokenizer {
        &self.tokenizer
    }

    /// The classifier model
    pub fn model(&self) -> &LanguageClassifier {
        &self.model
    }

    /// Device the checkpoint is bound to
    pub fn device(&self) -> &Device {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_run() -> TrainingRun {
        TrainingRun {
            model_name: "bert-base-multilingual-cased".to_string(),
            dataset: "language-identification".to_string(),
            version: "3_20250102_120000".to_string(),
            training_args: TrainingConfig::default(),
            metrics: BTreeMap::from([
                ("eval_accuracy".to_string(), 0.97),
                ("eval_loss".to_string(), 0.12),
            ]),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn metadata_round_trip_is_field_for_field() {
        let dir = tempfile::tempdir().unwrap();
        let run = sample_run();
        run.save(dir.path()).unwrap();
        let loaded = TrainingRun::load(dir.path()).unwrap();
        assert_eq!(loaded, run);
    }

    #[test]
    fn registry_rejects_incomplete_checkpoints() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("1_20250101_000000")).unwrap();

        let registry = ModelRegistry::new(root.path());
        let err = registry.resolve("1_20250101_000000").unwrap_err();
        assert!(matches!(err, Error::Artifact(_)));
        assert!(err.to_string().contains(METADATA_FILE));
    }

    #[test]
    fn registry_rejects_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(root.path());
        assert!(matches!(
            registry.resolve("7_20250101_000000"),
            Err(Error::Artifact(_))
        ));
    }

    #[test]
    fn latest_skips_incomplete_runs() {
        let root = tempfile::tempdir().unwrap();
        for name in ["1_a", "2_b"] {
            let dir = root.path().join(name);
            std::fs::create_dir(&dir).unwrap();
            sample_run().save(&dir).unwrap();
        }
        // higher version but no metadata: an aborted run
        std::fs::create_dir(root.path().join("9_aborted")).unwrap();

        let registry = ModelRegistry::new(root.path());
        let latest = registry.latest().unwrap();
        assert!(latest.ends_with("2_b"));
    }

    #[test]
    fn latest_errors_with_no_complete_checkpoints() {
        let root = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(root.path());
        assert!(matches!(registry.latest(), Err(Error::Artifact(_))));
    }
}
