//! Configuration for the crop advisor.
//!
//! The artifact directory comes from the environment (`MODELS_DIR`); tuning
//! constants have serde defaults so a partial JSON override stays valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

/// Recommendation re-ranking parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationSettings {
    /// Classifier classes considered before re-ranking
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Value for the soil-compatibility feature slot. The true per-crop value is
    /// unknown before a crop is chosen; the classifier was trained expecting this
    /// neutral placeholder at inference time.
    #[serde(default = "default_compat_placeholder")]
    pub compat_placeholder: f64,
    #[serde(default = "default_confidence_cap")]
    pub confidence_cap: f64,
    #[serde(default = "default_soil_type")]
    pub default_soil_type: String,
}

fn default_candidate_pool() -> usize {
    6
}

fn default_top_k() -> usize {
    4
}

fn default_compat_placeholder() -> f64 {
    0.75
}

fn default_confidence_cap() -> f64 {
    99.0
}

fn default_soil_type() -> String {
    "Loamy".to_string()
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            candidate_pool: default_candidate_pool(),
            top_k: default_top_k(),
            compat_placeholder: default_compat_placeholder(),
            confidence_cap: default_confidence_cap(),
            default_soil_type: default_soil_type(),
        }
    }
}

/// Autoregressive price loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSettings {
    #[serde(default = "default_phases")]
    pub phases: u32,
    #[serde(default = "default_days_per_phase")]
    pub days_per_phase: u32,
    /// Half-width of the uniform multiplicative noise band (0.02 = ±2%)
    #[serde(default = "default_noise_amplitude")]
    pub noise_amplitude: f64,
    #[serde(default = "default_price_floor")]
    pub price_floor: f64,
    /// A drop below `current * stable_band` is "down"
    #[serde(default = "default_stable_band")]
    pub stable_band: f64,
    #[serde(default = "default_base_confidence")]
    pub base_confidence: i32,
    /// Confidence lost per phase. No lower bound is applied.
    #[serde(default = "default_confidence_decay")]
    pub confidence_decay: i32,
}

fn default_phases() -> u32 {
    4
}

fn default_days_per_phase() -> u32 {
    15
}

fn default_noise_amplitude() -> f64 {
    0.02
}

fn default_price_floor() -> f64 {
    500.0
}

fn default_stable_band() -> f64 {
    0.99
}

fn default_base_confidence() -> i32 {
    90
}

fn default_confidence_decay() -> i32 {
    5
}

impl ForecastSettings {
    /// Reject values the forecast loop cannot run with: a non-finite or
    /// out-of-range noise band, and schedules whose day labels or
    /// confidences overflow.
    pub fn validate(&self) -> Result<()> {
        if !self.noise_amplitude.is_finite() || !(0.0..1.0).contains(&self.noise_amplitude) {
            anyhow::bail!("noise_amplitude must be finite and in [0, 1), got {}", self.noise_amplitude);
        }
        if !self.price_floor.is_finite() {
            anyhow::bail!("price_floor must be finite, got {}", self.price_floor);
        }
        if !self.stable_band.is_finite() {
            anyhow::bail!("stable_band must be finite, got {}", self.stable_band);
        }
        if self.phases.checked_mul(self.days_per_phase).is_none() {
            anyhow::bail!(
                "{} phases of {} days overflow the day labels",
                self.phases,
                self.days_per_phase
            );
        }

        let last_phase = i32::try_from(self.phases.saturating_sub(1))
            .with_context(|| format!("Too many phases: {}", self.phases))?;
        let lowest = self
            .confidence_decay
            .checked_mul(last_phase)
            .and_then(|drop| self.base_confidence.checked_sub(drop));
        if lowest.is_none() {
            anyhow::bail!(
                "Confidence schedule {} - {} x phase overflows over {} phases",
                self.base_confidence,
                self.confidence_decay,
                self.phases
            );
        }

        Ok(())
    }
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            phases: default_phases(),
            days_per_phase: default_days_per_phase(),
            noise_amplitude: default_noise_amplitude(),
            price_floor: default_price_floor(),
            stable_band: default_stable_band(),
            base_confidence: default_base_confidence(),
            confidence_decay: default_confidence_decay(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
    #[serde(default)]
    pub recommendation: RecommendationSettings,
    #[serde(default)]
    pub forecast: ForecastSettings,
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models/saved")
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            recommendation: RecommendationSettings::default(),
            forecast: ForecastSettings::default(),
        }
    }
}

impl AdvisorConfig {
    /// Defaults, with `MODELS_DIR` taken from the environment when set
    pub fn from_env() -> Self {
        let models_dir = std::env::var("MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_models_dir());

        Self {
            models_dir,
            ..Self::default()
        }
    }

    /// Read a JSON config file. Omitted fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        config.forecast.validate()
            .with_context(|| format!("Invalid forecast settings in {:?}", path))?;

        Ok(config)
    }

    pub fn with_models_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.models_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn artifact(&self, file_name: &str) -> PathBuf {
        self.models_dir.join(file_name)
    }
}
