//! Standard scaler
//!
//! Reproduces the mean/variance standardization the crop classifier was
//! trained with: `z = (x - mean) / scale`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};

use super::Standardizer;

/// Fitted per-feature mean and scale
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Load scaler parameters from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scaler file: {:?}", path))?;

        let scaler: StandardScaler = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse scaler JSON")?;

        scaler.validate()?;
        Ok(scaler)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn validate(&self) -> Result<()> {
        if self.mean.len() != self.scale.len() {
            anyhow::bail!(
                "Scaler mean/scale length mismatch: {} vs {}",
                self.mean.len(),
                self.scale.len()
            );
        }
        Ok(())
    }
}

impl Standardizer for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.mean.len() {
            anyhow::bail!(
                "Scaler expects {} features, got {}",
                self.mean.len(),
                features.len()
            );
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // Constant features were fitted with unit scale
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}
