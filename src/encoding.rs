//! Category encoding with silent fallback
//!
//! Unseen categories never fail a request. They are replaced by the first
//! class the encoder was fitted on and encoded as that class. The default is
//! whatever the first training class happens to be; there is no nearest-match
//! search and no rejection.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};

use crate::models::CategoryCoder;

/// Fitted label encoder: code `i` is `classes[i]`
#[derive(Debug, Clone)]
pub struct LabelCoder {
    classes: Vec<String>,
    index: FxHashMap<String, usize>,
}

#[derive(Deserialize)]
struct LabelCoderFile {
    classes: Vec<String>,
}

impl LabelCoder {
    /// Build from classes in fit order. At least one class is required so a
    /// fallback always exists.
    pub fn new(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            anyhow::bail!("Encoder has no classes");
        }

        let mut index = FxHashMap::default();
        for (code, class) in classes.iter().enumerate() {
            // Duplicates keep their first code
            index.entry(class.clone()).or_insert(code);
        }

        Ok(Self { classes, index })
    }

    pub fn from_classes<S: AsRef<str>>(classes: &[S]) -> Result<Self> {
        Self::new(classes.iter().map(|s| s.as_ref().to_string()).collect())
    }

    /// Load encoder classes from JSON file: `{"classes": [...]}`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read encoder file: {:?}", path))?;

        let file: LabelCoderFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse encoder JSON: {:?}", path))?;

        Self::new(file.classes)
            .with_context(|| format!("Invalid encoder: {:?}", path))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl CategoryCoder for LabelCoder {
    fn encode(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied()
    }

    fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(|s| s.as_str())
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Result of encoding one category value
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedCategory {
    pub code: usize,
    /// The value that was actually encoded (the fallback class when `fell_back`).
    pub value: String,
    pub fell_back: bool,
}

/// Encode `value`, substituting the coder's first class when it is unknown.
///
/// Returns `None` only for a coder with no classes at all, which
/// [`LabelCoder::new`] never produces.
pub fn encode_with_fallback<C>(coder: &C, value: &str) -> Option<EncodedCategory>
where
    C: CategoryCoder + ?Sized,
{
    if let Some(code) = coder.encode(value) {
        return Some(EncodedCategory {
            code,
            value: value.to_string(),
            fell_back: false,
        });
    }

    let first = coder.classes().first()?;
    let code = coder.encode(first)?;

    tracing::debug!("Unknown category '{}', encoding as '{}'", value, first);

    Some(EncodedCategory {
        code,
        value: first.clone(),
        fell_back: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states() -> LabelCoder {
        LabelCoder::from_classes(&["Bihar", "Gujarat", "Punjab"]).unwrap()
    }

    #[test]
    fn test_known_value_uses_trained_code() {
        let enc = encode_with_fallback(&states(), "Punjab").unwrap();
        assert_eq!(enc.code, 2);
        assert_eq!(enc.value, "Punjab");
        assert!(!enc.fell_back);
    }

    #[test]
    fn test_unknown_value_encodes_as_first_class() {
        let coder = states();
        let unknown = encode_with_fallback(&coder, "Atlantis").unwrap();
        let first = encode_with_fallback(&coder, "Bihar").unwrap();
        assert_eq!(unknown.code, first.code);
        assert_eq!(unknown.value, "Bihar");
        assert!(unknown.fell_back);
    }

    #[test]
    fn test_fallback_follows_fit_order_not_alphabet() {
        let coder = LabelCoder::from_classes(&["Zeta", "Alpha"]).unwrap();
        let enc = encode_with_fallback(&coder, "missing").unwrap();
        assert_eq!(enc.code, 0);
        assert_eq!(enc.value, "Zeta");
    }

    #[test]
    fn test_matching_is_exact() {
        let enc = encode_with_fallback(&states(), "punjab").unwrap();
        assert!(enc.fell_back);
        assert_eq!(enc.code, 0);
    }

    #[test]
    fn test_decode_round_trips_code() {
        let coder = states();
        assert_eq!(coder.decode(1), Some("Gujarat"));
        assert_eq!(coder.decode(3), None);
    }

    #[test]
    fn test_empty_encoder_rejected() {
        assert!(LabelCoder::new(Vec::new()).is_err());
    }
}
