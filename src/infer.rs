//! Stateless per-request classification against a loaded checkpoint
//!
//! `classify` is a pure function of the input text and the checkpoint: no
//! shared state is mutated, so concurrent requests need no coordination. Any
//! well-formed string is accepted, empty input included (it tokenizes to a
//! padding-only sequence and classifies like any other text, with low,
//! roughly uniform confidence).

use serde::Serialize;
use tracing::debug;

use crate::checkpoint::Checkpoint;
use crate::error::{Error, Result};
use crate::languages;
use crate::tokenize::batch_tensors;
use crate::utils::math;

/// One classification answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Human-readable language name (raw label code when unregistered)
    pub language: String,
    /// Probability of the top label as a percentage, in [0, 100]
    pub confidence: f64,
    /// Kind of input that was classified; always `"text"`
    #[serde(rename = "inputType")]
    pub input_type: String,
}

/// Inference engine over one immutable checkpoint
pub struct InferenceEngine {
    checkpoint: Checkpoint,
}

impl InferenceEngine {
    /// Bind the engine to a loaded checkpoint
    pub fn new(checkpoint: Checkpoint) -> Self {
        Self { checkpoint }
    }

    /// The checkpoint backing this engine
    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    /// Classify one text against the loaded checkpoint
    pub fn classify(&self, text: &str) -> Result<Classification> {
        let checkpoint = &self.checkpoint;
        let encoded = checkpoint.tokenizer().encode(text)?;
        let (input_ids, attention_mask) =
            batch_tensors(std::slice::from_ref(&encoded), checkpoint.device())?;

        let logits = checkpoint.model().forward(&input_ids, &attention_mask)?;
        let logits: Vec<f32> = logits.squeeze(0)?.to_vec1()?;

        let probs = math::softmax(&logits);
        let index = math::argmax(&probs)
            .ok_or_else(|| Error::internal("classifier produced no logits"))?;
        let code = checkpoint
            .labels()
            .label(index)
            .ok_or_else(|| Error::internal(format!("no label for index {}", index)))?;
        let confidence = f64::from(probs[index]) * 100.0;
        debug!("classified as {} ({:.2}%)", code, confidence);

        Ok(Classification {
            language: languages::display_name(code).to_string(),
            confidence,
            input_type: "text".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math;

    #[test]
    fn confidence_derivation_stays_in_bounds() {
        for logits in [
            vec![0.0f32, 0.0],
            vec![50.0, -50.0, 3.0],
            vec![-1.0, -2.0, -3.0, -4.0],
        ] {
            let probs = math::softmax(&logits);
            let index = math::argmax(&probs).unwrap();
            let confidence = f64::from(probs[index]) * 100.0;
            assert!((0.0..=100.0).contains(&confidence), "got {}", confidence);
        }
    }

    #[test]
    fn uniform_logits_pick_the_first_label() {
        // Tie-break is first occurrence in label order.
        let probs = math::softmax(&[1.0f32, 1.0, 1.0]);
        assert_eq!(math::argmax(&probs), Some(0));
    }

    #[test]
    fn response_shape_matches_the_wire_contract() {
        let result = Classification {
            language: "French".to_string(),
            confidence: 97.3,
            input_type: "text".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["language"], "French");
        assert_eq!(json["inputType"], "text");
        assert!(json.get("input_type").is_none());
    }
}
