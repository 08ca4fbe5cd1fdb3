//! Narrow interfaces over trained artifacts
//!
//! The inference core only ever talks to these traits. The concrete adapters in
//! this module evaluate exported tree ensembles and scalers, but any other
//! inference mechanism can be plugged in behind the same traits.
//!
//! - `scaler`: per-feature mean/variance standardization
//! - `tree_ensemble`: averaged-forest classifier and boosted regressor

pub mod scaler;
pub mod tree_ensemble;

pub use scaler::StandardScaler;
pub use tree_ensemble::{BoostedRegressor, ForestClassifier};

use anyhow::Result;

/// Classifier returning one probability per class, in the fixed class order
/// it was trained with.
pub trait ProbabilisticClassifier: Send + Sync {
    fn n_classes(&self) -> usize;

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>>;
}

/// Regressor producing a single scalar.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64>;
}

/// Numeric feature transform applied before classification.
pub trait Standardizer: Send + Sync {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>>;
}

/// Fitted category encoder: string value <-> integer code.
pub trait CategoryCoder: Send + Sync {
    /// Code for a known value, `None` for anything unseen at fit time.
    fn encode(&self, value: &str) -> Option<usize>;

    fn decode(&self, code: usize) -> Option<&str>;

    /// Classes in fit order; code `i` is `classes()[i]`.
    fn classes(&self) -> &[String];
}
