//! Tree ensemble evaluation
//!
//! Evaluates decision-tree ensembles exported as JSON node arrays:
//! - `ForestClassifier`: each tree votes a class distribution; probabilities are
//!   the mean of the per-tree normalized distributions.
//! - `BoostedRegressor`: `init + learning_rate * Σ tree(x)`.
//!
//! Split convention: go left when `x[feature] <= threshold`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};

use super::{Predictor, ProbabilisticClassifier};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Node<L> {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: L,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct Tree<L> {
    nodes: Vec<Node<L>>,
}

impl<L> Tree<L> {
    /// Children must point strictly forward, which guarantees traversal terminates.
    fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            anyhow::bail!("Tree has no nodes");
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split { feature, left, right, .. } = node {
                if *feature >= n_features {
                    anyhow::bail!("Node {} splits on feature {} (model has {})", idx, feature, n_features);
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        anyhow::bail!("Node {} has invalid child index {}", idx, child);
                    }
                }
            }
        }

        Ok(())
    }

    fn leaf(&self, features: &[f64]) -> &L {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split { feature, threshold, left, right } => {
                    idx = if features[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file: {:?}", what, path))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {} JSON", what))
}

fn check_width(expected: usize, features: &[f64]) -> Result<()> {
    if features.len() != expected {
        anyhow::bail!("Model expects {} features, got {}", expected, features.len());
    }
    Ok(())
}

/// Random-forest style classifier
#[derive(Debug, Clone, Deserialize)]
pub struct ForestClassifier {
    n_features: usize,
    n_classes: usize,
    trees: Vec<Tree<Vec<f64>>>,
}

impl ForestClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        let model: ForestClassifier = read_json(path, "classifier")?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: ForestClassifier = serde_json::from_str(json)
            .with_context(|| "Failed to parse classifier JSON")?;
        model.validate()?;
        Ok(model)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            anyhow::bail!("Classifier has no trees");
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .with_context(|| format!("Invalid classifier tree {}", t))?;
            for node in &tree.nodes {
                if let Node::Leaf { value } = node {
                    if value.len() != self.n_classes {
                        anyhow::bail!(
                            "Tree {} leaf has {} class weights, expected {}",
                            t,
                            value.len(),
                            self.n_classes
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

impl ProbabilisticClassifier for ForestClassifier {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        check_width(self.n_features, features)?;

        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let weights = tree.leaf(features);
            let total: f64 = weights.iter().sum();
            if total > 0.0 {
                for (p, w) in proba.iter_mut().zip(weights) {
                    *p += w / total;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }
}

/// Gradient-boosted regression ensemble
#[derive(Debug, Clone, Deserialize)]
pub struct BoostedRegressor {
    n_features: usize,
    init: f64,
    learning_rate: f64,
    trees: Vec<Tree<f64>>,
}

impl BoostedRegressor {
    pub fn load(path: &Path) -> Result<Self> {
        let model: BoostedRegressor = read_json(path, "regressor")?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: BoostedRegressor = serde_json::from_str(json)
            .with_context(|| "Failed to parse regressor JSON")?;
        model.validate()?;
        Ok(model)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn validate(&self) -> Result<()> {
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .with_context(|| format!("Invalid regressor tree {}", t))?;
        }
        Ok(())
    }
}

impl Predictor for BoostedRegressor {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        check_width(self.n_features, features)?;

        let boost: f64 = self.trees.iter().map(|tree| *tree.leaf(features)).sum();
        Ok(self.init + self.learning_rate * boost)
    }
}
