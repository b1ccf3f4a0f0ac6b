//! Deterministic label <-> index mapping
//!
//! The label order is derived solely from the training split: distinct label
//! values sorted lexicographically, indexed 0..N-1. The order never depends on
//! hash-map iteration or appearance order in the source data, so the same
//! corpus always yields the same mapping. The mapping is serialized into the
//! checkpoint and reloaded verbatim at serve time.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::error::{Error, Result};

/// Bidirectional mapping between label strings and contiguous indices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelSpace {
    /// Labels in index order (lexicographic)
    labels: Vec<String>,
    /// Reverse lookup, exact inverse of `labels`
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl LabelSpace {
    /// Resolve a label space from a training split's label column.
    ///
    /// Fails with a configuration error when no labels are present.
    pub fn resolve<'a>(labels: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        // BTreeSet gives dedup + lexicographic order in one pass
        let distinct: BTreeSet<&str> = labels.into_iter().collect();
        if distinct.is_empty() {
            return Err(Error::config("label space is empty"));
        }
        let labels: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        Ok(Self::from_ordered(labels))
    }

    fn from_ordered(labels: Vec<String>) -> Self {
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self { labels, index }
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when the space holds no labels (never for a resolved space)
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for an index
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Index for a label
    pub fn index(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Labels in index order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Write the label space to a JSON file inside a checkpoint
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a label space previously written by [`LabelSpace::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::artifact(format!(
                "cannot read label space {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let loaded: Self = serde_json::from_str(&content)?;
        if loaded.labels.is_empty() {
            return Err(Error::artifact("label space file holds no labels"));
        }
        // rebuild the skipped reverse map
        Ok(Self::from_ordered(loaded.labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_and_deduplicated() {
        let space = LabelSpace::resolve(["fr", "en", "de", "fr", "en"]).unwrap();
        assert_eq!(space.labels(), &["de", "en", "fr"]);
        assert_eq!(space.len(), 3);
    }

    #[test]
    fn deterministic_regardless_of_input_order() {
        let a = LabelSpace::resolve(["zh", "ar", "en"]).unwrap();
        let b = LabelSpace::resolve(["en", "zh", "ar"]).unwrap();
        assert_eq!(a.labels(), b.labels());
    }

    #[test]
    fn maps_are_exact_inverses() {
        let space = LabelSpace::resolve(["it", "ja", "nl", "pl"]).unwrap();
        for label in space.labels() {
            let index = space.index(label).unwrap();
            assert_eq!(space.label(index), Some(label.as_str()));
        }
        for index in 0..space.len() {
            let label = space.label(index).unwrap();
            assert_eq!(space.index(label), Some(index));
        }
    }

    #[test]
    fn out_of_range_lookups_miss() {
        let space = LabelSpace::resolve(["en"]).unwrap();
        assert_eq!(space.label(1), None);
        assert_eq!(space.index("fr"), None);
    }

    #[test]
    fn empty_label_set_is_rejected() {
        let result = LabelSpace::resolve(std::iter::empty());
        assert!(matches!(result, Err(crate::error::Error::Config(_))));
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        let space = LabelSpace::resolve(["fr", "en"]).unwrap();
        space.save(&path).unwrap();

        let loaded = LabelSpace::load(&path).unwrap();
        assert_eq!(loaded.labels(), space.labels());
        assert_eq!(loaded.index("fr"), Some(1));
    }
}
