//! langid - versioned language-identification training and serving
//!
//! This crate pairs a one-shot training pipeline that turns a labeled
//! multilingual corpus into a versioned classifier checkpoint with an
//! inference engine serving single-text classification requests against a
//! loaded checkpoint. Both paths share the label-space resolution and the
//! fixed-length tokenization contract; that sharing is the core correctness
//! requirement.

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod device;
pub mod error;
pub mod infer;
pub mod labels;
pub mod languages;
pub mod model;
pub mod serve;
pub mod tokenize;
pub mod train;
pub mod utils;
pub mod version;

// Re-exports
pub use checkpoint::{Checkpoint, ModelRegistry, TrainingRun};
pub use config::TrainingConfig;
pub use error::{Error, Result};
pub use infer::{Classification, InferenceEngine};
pub use labels::LabelSpace;
pub use tokenize::{TextTokenizer, TokenizerSettings};
pub use train::{TrainingOrchestrator, TrainingOutcome};
