//! One-shot training pipeline
//!
//! Drives dataset loading, label resolution, tokenization, head fitting,
//! evaluation and artifact persistence for a single versioned run. The
//! persistence order is a two-phase commit: every checkpoint file is written
//! before `metadata.json`, so metadata presence marks a complete artifact and
//! an aborted run leaves a recognizably incomplete directory behind.

use candle_core::{DType, Tensor, D};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use chrono::Utc;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::checkpoint::{TrainingRun, HEAD_WEIGHTS_FILE, LABELS_FILE};
use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::device;
use crate::error::{Error, Result};
use crate::labels::LabelSpace;
use crate::model::{LanguageClassifier, ENCODER_CONFIG_FILE, ENCODER_WEIGHTS_FILE};
use crate::tokenize::{
    batch_tensors, EncodedText, TextTokenizer, TokenizerSettings, TOKENIZER_FILE,
};
use crate::version;

/// Shuffle seed for reproducible batch order
const SHUFFLE_SEED: u64 = 42;

/// Result of a completed training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Allocated version identifier
    pub version: String,
    /// Checkpoint directory the artifact was written to
    pub output_dir: PathBuf,
    /// Final evaluation metrics
    pub metrics: BTreeMap<String, f64>,
}

/// A tokenized example with its resolved label index
struct EncodedExample {
    encoded: EncodedText,
    label: u32,
}

/// Orchestrates one training run end to end
pub struct TrainingOrchestrator {
    config: TrainingConfig,
}

impl TrainingOrchestrator {
    /// Create an orchestrator for the given configuration
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the full pipeline and return the produced artifact's identity
    pub fn run(&self) -> Result<TrainingOutcome> {
        let config = &self.config;
        std::fs::create_dir_all(&config.output_dir)?;
        let version = version::allocate(&config.output_dir, config.version.as_deref())?;
        let out_dir = config.output_dir.join(&version);
        std::fs::create_dir_all(&out_dir)?;
        info!("training run {} -> {}", version, out_dir.display());

        let device = device::probe();
        let dataset = Dataset::load(&config.data)?;
        let labels = LabelSpace::resolve(dataset.train_labels())?;
        info!("resolved {} labels: {:?}", labels.len(), labels.labels());

        let base_dir = Path::new(&config.model);
        let settings = TokenizerSettings::default();
        let tokenizer = TextTokenizer::from_file(base_dir.join(TOKENIZER_FILE), settings.clone())?;

        let train_set = encode_split(&tokenizer, &labels, &dataset.train)?;
        let eval_set = encode_split(&tokenizer, &labels, &dataset.validation)?;

        // Head variables live in the var map; the encoder stays frozen.
        let varmap = VarMap::new();
        let head_vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = LanguageClassifier::new(base_dir, labels.len(), head_vb, &device)?;

        let mut optimizer = AdamW::new(
            varmap.all_vars(),
            ParamsAdamW {
                lr: config.lr,
                weight_decay: config.weight_decay,
                ..Default::default()
            },
        )?;

        let mut rng = StdRng::seed_from_u64(SHUFFLE_SEED);
        let mut order: Vec<usize> = (0..train_set.len()).collect();
        for epoch in 0..config.num_epochs {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0f64;
            let mut num_batches = 0usize;

            for chunk in order.chunks(config.train_batch_size) {
                let batch: Vec<&EncodedExample> = chunk.iter().map(|&i| &train_set[i]).collect();
                let (input_ids, attention_mask, targets) = to_tensors(&batch, &device)?;
                let logits = model.forward(&input_ids, &attention_mask)?;
                let loss = candle_nn::loss::cross_entropy(&logits, &targets)?;
                optimizer.backward_step(&loss)?;

                epoch_loss += loss.to_scalar::<f32>()? as f64;
                num_batches += 1;
            }

            let train_loss = epoch_loss / num_batches.max(1) as f64;
            let (eval_loss, accuracy) =
                evaluate(&model, &eval_set, config.eval_batch_size, &device)?;
            info!(
                "epoch {}/{} - train loss {:.4}, eval loss {:.4}, accuracy {:.4}",
                epoch + 1,
                config.num_epochs,
                train_loss,
                eval_loss,
                accuracy
            );
        }

        // Checkpoint files first; metadata.json goes last.
        for file in [ENCODER_CONFIG_FILE, ENCODER_WEIGHTS_FILE, TOKENIZER_FILE] {
            std::fs::copy(base_dir.join(file), out_dir.join(file))?;
        }
        settings.save(&out_dir)?;
        labels.save(out_dir.join(LABELS_FILE))?;
        varmap.save(out_dir.join(HEAD_WEIGHTS_FILE))?;

        let (eval_loss, accuracy) = evaluate(&model, &eval_set, config.eval_batch_size, &device)?;
        let metrics = BTreeMap::from([
            ("eval_accuracy".to_string(), accuracy),
            ("eval_loss".to_string(), eval_loss),
        ]);

        let run = TrainingRun {
            model_name: config.model.clone(),
            dataset: config.data.clone(),
            version: version.clone(),
            training_args: config.clone(),
            metrics: metrics.clone(),
            timestamp: Utc::now(),
        };
        run.save(&out_dir)?;

        info!("saved checkpoint {} to {}", version, out_dir.display());
        Ok(TrainingOutcome {
            version,
            output_dir: out_dir,
            metrics,
        })
    }
}

/// Tokenize a split and recast its label column to label-space indices
fn encode_split(
    tokenizer: &TextTokenizer,
    labels: &LabelSpace,
    split: &[crate::dataset::LabeledText],
) -> Result<Vec<EncodedExample>> {
    let texts: Vec<&str> = split.iter().map(|e| e.text.as_str()).collect();
    let encodings = tokenizer.encode_batch(&texts)?;
    split
        .iter()
        .zip(encodings)
        .map(|(example, encoded)| {
            let label = labels.index(&example.label).ok_or_else(|| {
                Error::dataset(format!(
                    "label {:?} is not in the training label space",
                    example.label
                ))
            })? as u32;
            Ok(EncodedExample { encoded, label })
        })
        .collect()
}

fn to_tensors(
    batch: &[&EncodedExample],
    device: &candle_core::Device,
) -> Result<(Tensor, Tensor, Tensor)> {
    let encoded: Vec<EncodedText> = batch.iter().map(|e| e.encoded.clone()).collect();
    let (input_ids, attention_mask) = batch_tensors(&encoded, device)?;
    let targets: Vec<u32> = batch.iter().map(|e| e.label).collect();
    let targets = Tensor::new(targets, device)?;
    Ok((input_ids, attention_mask, targets))
}

/// Average loss and accuracy over a validation split
fn evaluate(
    model: &LanguageClassifier,
    eval_set: &[EncodedExample],
    batch_size: usize,
    device: &candle_core::Device,
) -> Result<(f64, f64)> {
    if eval_set.is_empty() {
        warn!("validation split is empty, skipping evaluation");
        return Ok((0.0, 0.0));
    }

    let mut total_loss = 0.0f64;
    let mut num_batches = 0usize;
    let mut correct = 0usize;

    let refs: Vec<&EncodedExample> = eval_set.iter().collect();
    for chunk in refs.chunks(batch_size) {
        let (input_ids, attention_mask, targets) = to_tensors(chunk, device)?;
        let logits = model.forward(&input_ids, &attention_mask)?;
        let loss = candle_nn::loss::cross_entropy(&logits, &targets)?;
        total_loss += loss.to_scalar::<f32>()? as f64;
        num_batches += 1;

        let predictions: Vec<u32> = logits.argmax(D::Minus1)?.to_vec1()?;
        let expected: Vec<u32> = targets.to_vec1()?;
        correct += predictions
            .iter()
            .zip(&expected)
            .filter(|(p, e)| p == e)
            .count();
    }

    let avg_loss = total_loss / num_batches as f64;
    let accuracy = correct as f64 / eval_set.len() as f64;
    Ok((avg_loss, accuracy))
}
