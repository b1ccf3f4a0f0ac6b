//! Fixed-length tokenization shared between training and serving
//!
//! The tokenization contract (max length, truncation, padding) is applied
//! identically when a checkpoint is built and when it serves requests. The
//! settings are persisted next to the checkpoint weights and reloaded
//! verbatim; re-deriving them from defaults at serve time would silently skew
//! predictions, so [`TextTokenizer::from_checkpoint`] always reads the
//! persisted file.

use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokenizers::Tokenizer;

use crate::error::{Error, Result};

/// File name the settings are persisted under inside a checkpoint
pub const SETTINGS_FILE: &str = "tokenizer_settings.json";

/// Tokenizer file inside a base-model or checkpoint directory
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Tokenization contract bound to a checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerSettings {
    /// Fixed output length in token positions
    pub max_length: usize,
    /// Truncate inputs longer than `max_length` from the end
    pub truncation: bool,
    /// Padding policy; only `"max_length"` is supported
    pub padding: String,
    /// Token id used for right-padding
    pub pad_id: u32,
}

impl Default for TokenizerSettings {
    fn default() -> Self {
        Self {
            max_length: 128,
            truncation: true,
            padding: "max_length".to_string(),
            pad_id: 0,
        }
    }
}

impl TokenizerSettings {
    /// Persist the settings inside a checkpoint directory
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.as_ref().join(SETTINGS_FILE), json)?;
        Ok(())
    }

    /// Load settings persisted by [`TokenizerSettings::save`]
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(SETTINGS_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::artifact(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Token ids and attention mask for one input, always `max_length` long
#[derive(Debug, Clone)]
pub struct EncodedText {
    /// Token ids, right-padded with the pad id
    pub input_ids: Vec<u32>,
    /// 1 for real tokens, 0 for padding
    pub attention_mask: Vec<u32>,
}

impl EncodedText {
    fn from_parts(ids: &[u32], mask: &[u32], settings: &TokenizerSettings) -> Self {
        let mut encoded = Self {
            input_ids: ids.to_vec(),
            attention_mask: mask.to_vec(),
        };
        encoded.truncate_to(settings.max_length);
        encoded.pad_to(settings.max_length, settings.pad_id);
        encoded
    }

    /// Truncate to a target length (no-op when already shorter)
    fn truncate_to(&mut self, target: usize) {
        if self.input_ids.len() > target {
            self.input_ids.truncate(target);
            self.attention_mask.truncate(target);
        }
    }

    /// Right-pad to a target length
    fn pad_to(&mut self, target: usize, pad_id: u32) {
        while self.input_ids.len() < target {
            self.input_ids.push(pad_id);
            self.attention_mask.push(0);
        }
    }
}

/// Tokenizer wrapper enforcing the fixed-length contract
pub struct TextTokenizer {
    tokenizer: Tokenizer,
    settings: TokenizerSettings,
}

impl TextTokenizer {
    /// Wrap an already-loaded tokenizer with the given settings
    pub fn new(tokenizer: Tokenizer, settings: TokenizerSettings) -> Self {
        Self {
            tokenizer,
            settings,
        }
    }

    /// Load a tokenizer file (`tokenizer.json`) with the given settings
    pub fn from_file(path: impl AsRef<Path>, settings: TokenizerSettings) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path.as_ref()).map_err(|e| {
            Error::tokenizer(format!(
                "failed to load {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(Self::new(tokenizer, settings))
    }

    /// Load a checkpoint's tokenizer together with its persisted settings
    pub fn from_checkpoint(dir: impl AsRef<Path>) -> Result<Self> {
        let settings = TokenizerSettings::load(dir.as_ref())?;
        Self::from_file(dir.as_ref().join(TOKENIZER_FILE), settings)
    }

    /// The contract this tokenizer enforces
    pub fn settings(&self) -> &TokenizerSettings {
        &self.settings
    }

    /// Encode one text to exactly `max_length` token positions.
    ///
    /// Holds for any input, empty strings included (all-padding output).
    pub fn encode(&self, text: &str) -> Result<EncodedText> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::tokenizer(format!("encoding failed: {}", e)))?;
        Ok(EncodedText::from_parts(
            encoding.get_ids(),
            encoding.get_attention_mask(),
            &self.settings,
        ))
    }

    /// Encode a batch of texts, each to exactly `max_length` positions
    pub fn encode_batch(&self, texts: &[&str]) -> Result<Vec<EncodedText>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| Error::tokenizer(format!("batch encoding failed: {}", e)))?;
        Ok(encodings
            .iter()
            .map(|e| EncodedText::from_parts(e.get_ids(), e.get_attention_mask(), &self.settings))
            .collect())
    }
}

/// Stack encoded texts into `[batch, max_length]` id and mask tensors
pub fn batch_tensors(batch: &[EncodedText], device: &Device) -> Result<(Tensor, Tensor)> {
    let ids: Vec<Vec<u32>> = batch.iter().map(|e| e.input_ids.clone()).collect();
    let masks: Vec<Vec<u32>> = batch.iter().map(|e| e.attention_mask.clone()).collect();
    let input_ids = Tensor::new(ids, device)?;
    let attention_mask = Tensor::new(masks, device)?;
    Ok((input_ids, attention_mask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokenizers::models::wordlevel::WordLevel;

    fn fixture(max_length: usize) -> TextTokenizer {
        let mut vocab = HashMap::new();
        vocab.insert("[UNK]".to_string(), 0u32);
        vocab.insert("bonjour".to_string(), 1u32);
        vocab.insert("hello".to_string(), 2u32);
        let model = WordLevel::builder()
            .vocab(vocab)
            .unk_token("[UNK]".to_string())
            .build()
            .unwrap();
        let settings = TokenizerSettings {
            max_length,
            ..TokenizerSettings::default()
        };
        TextTokenizer::new(Tokenizer::new(model), settings)
    }

    #[test]
    fn output_is_exactly_max_length() {
        let tokenizer = fixture(8);
        for text in ["hello", "bonjour", "never seen before"] {
            let encoded = tokenizer.encode(text).unwrap();
            assert_eq!(encoded.input_ids.len(), 8);
            assert_eq!(encoded.attention_mask.len(), 8);
        }
    }

    #[test]
    fn empty_input_is_all_padding() {
        let tokenizer = fixture(8);
        let encoded = tokenizer.encode("").unwrap();
        assert_eq!(encoded.input_ids.len(), 8);
        assert!(encoded.attention_mask.iter().all(|&m| m == 0));
    }

    #[test]
    fn long_inputs_truncate_from_the_end() {
        let settings = TokenizerSettings {
            max_length: 4,
            ..TokenizerSettings::default()
        };
        let encoded = EncodedText::from_parts(&[5, 6, 7, 8, 9, 10], &[1, 1, 1, 1, 1, 1], &settings);
        assert_eq!(encoded.input_ids, vec![5, 6, 7, 8]);
        assert_eq!(encoded.attention_mask, vec![1, 1, 1, 1]);
    }

    #[test]
    fn short_inputs_right_pad() {
        let settings = TokenizerSettings {
            max_length: 5,
            ..TokenizerSettings::default()
        };
        let encoded = EncodedText::from_parts(&[3, 4], &[1, 1], &settings);
        assert_eq!(encoded.input_ids, vec![3, 4, 0, 0, 0]);
        assert_eq!(encoded.attention_mask, vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let settings = TokenizerSettings {
            max_length: 64,
            ..TokenizerSettings::default()
        };
        settings.save(dir.path()).unwrap();
        let loaded = TokenizerSettings::load(dir.path()).unwrap();
        assert_eq!(loaded, settings);
    }
}
