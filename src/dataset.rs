//! Labeled multilingual corpus loading
//!
//! A dataset is a directory with `train.jsonl` and `validation.jsonl`, each
//! line holding `{"text": ..., "label": ...}`. The original corpus column name
//! `labels` is accepted as an alias. Split order is preserved as read.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};

/// One labeled example
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledText {
    /// Input text
    pub text: String,
    /// Short label code, e.g. an ISO 639-1 language code
    #[serde(alias = "labels")]
    pub label: String,
}

/// Named train/validation splits
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Training split
    pub train: Vec<LabeledText>,
    /// Validation split
    pub validation: Vec<LabeledText>,
}

impl Dataset {
    /// Load both splits from a dataset directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let train = load_split(&dir.join("train.jsonl"))?;
        let validation = load_split(&dir.join("validation.jsonl"))?;
        if train.is_empty() {
            return Err(Error::dataset(format!(
                "training split in {} is empty",
                dir.display()
            )));
        }
        info!(
            "loaded dataset from {}: {} train / {} validation examples",
            dir.display(),
            train.len(),
            validation.len()
        );
        Ok(Self { train, validation })
    }

    /// Label column of the training split, in corpus order
    pub fn train_labels(&self) -> impl Iterator<Item = &str> {
        self.train.iter().map(|example| example.label.as_str())
    }
}

fn load_split(path: &Path) -> Result<Vec<LabeledText>> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::dataset(format!("cannot open {}: {}", path.display(), e)))?;
    let reader = BufReader::new(file);

    let mut examples = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let example: LabeledText = serde_json::from_str(&line).map_err(|e| {
            Error::dataset(format!("{}:{}: {}", path.display(), line_no + 1, e))
        })?;
        examples.push(example);
    }
    Ok(examples)
}
