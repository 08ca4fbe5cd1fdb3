//! Crop recommendation with soil-compatibility re-ranking
//!
//! Algorithm:
//! 1. Encode state and soil (unknown values fall back to the first fitted class)
//! 2. Assemble N, P, K, temperature, pH, moisture, state, soil, compat-placeholder
//! 3. Standardize and take the classifier's probability vector
//! 4. Keep the `candidate_pool` most probable crops
//! 5. boosted = p × (0.5 + 0.5 × compatibility(crop, soil))
//! 6. Stable sort by boosted score, so exact ties keep classifier rank
//! 7. Return the top `top_k` with confidence = min(boosted × 100, cap)

use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};

use crate::compatibility::{CompatibilityLabel, CompatibilityTable};
use crate::config::RecommendationSettings;
use crate::crop_catalog::{profile_or_default, CropProfile};
use crate::encoding::encode_with_fallback;
use crate::error::{AdvisorError, AdvisorResult};
use crate::models::{CategoryCoder, ProbabilisticClassifier, Standardizer};

/// Width of the crop model's feature vector
pub const CROP_FEATURE_COUNT: usize = 9;

/// Raw field measurements. No range validation is applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SoilReading {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    pub temperature: f64,
    #[serde(rename = "pH")]
    pub ph: f64,
    pub moisture: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(flatten)]
    pub reading: SoilReading,
    pub state: String,
    #[serde(default)]
    pub soil_type: Option<String>,
}

/// Ephemeral ranking entry
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub crop: String,
    pub probability: f64,
    pub boosted: f64,
    pub compatibility: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRecommendation {
    pub crop: String,
    /// Displayed confidence in percent, capped below 100
    pub confidence: f64,
    pub probability: f64,
    pub compatibility_score: f64,
    pub compatibility: CompatibilityLabel,
    #[serde(flatten)]
    pub profile: CropProfile,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationReport {
    pub recommendations: Vec<CropRecommendation>,
    /// State as requested (not the fallback class)
    pub state: String,
    pub soil_type: String,
}

/// Trained artifacts for the crop domain. All encoders must come from the same
/// fit that produced the classifier's feature space.
pub struct CropModels {
    pub classifier: Box<dyn ProbabilisticClassifier>,
    pub scaler: Box<dyn Standardizer>,
    pub state_coder: Box<dyn CategoryCoder>,
    pub soil_coder: Box<dyn CategoryCoder>,
    pub crop_coder: Box<dyn CategoryCoder>,
}

pub struct RecommendationEngine {
    models: CropModels,
    compatibility: CompatibilityTable,
    settings: RecommendationSettings,
}

/// Blend a classifier probability with a compatibility score.
///
/// The multiplier runs from 0.5 (c = 0) to 1.0 (c = 1), so compatibility can
/// never erase the model signal and a best match keeps `p` unchanged.
pub fn boosted_score(probability: f64, compatibility: f64) -> f64 {
    probability * (0.5 + 0.5 * compatibility)
}

/// Percent confidence for display, capped and rounded to one decimal
pub fn display_confidence(boosted: f64, cap: f64) -> f64 {
    let pct = (boosted * 100.0).min(cap);
    (pct * 10.0).round() / 10.0
}

/// Indices of the `pool` most probable classes, most probable first.
/// Equal probabilities put the higher class index first, which is the order a
/// reversed ascending argsort produces.
pub fn top_classes(proba: &[f64], pool: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..proba.len()).collect();
    order.sort_by(|&a, &b| proba[b].total_cmp(&proba[a]).then(b.cmp(&a)));
    order.truncate(pool);
    order
}

/// Stable descending sort by boosted score
pub fn rerank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.boosted.total_cmp(&a.boosted));
}

impl RecommendationEngine {
    pub fn new(models: CropModels, compatibility: CompatibilityTable, settings: RecommendationSettings) -> Self {
        Self {
            models,
            compatibility,
            settings,
        }
    }

    pub fn compatibility(&self) -> &CompatibilityTable {
        &self.compatibility
    }

    pub fn recommend(&self, request: &RecommendRequest) -> AdvisorResult<RecommendationReport> {
        let soil = request
            .soil_type
            .as_deref()
            .unwrap_or(&self.settings.default_soil_type);

        tracing::debug!("Recommending crops for state '{}' on '{}' soil", request.state, soil);

        let candidates = self
            .ranked_candidates(&request.reading, &request.state, soil)
            .map_err(|e| {
                tracing::error!(
                    "Crop scoring failed (state '{}', soil '{}', reading {:?}): {:#}",
                    request.state,
                    soil,
                    request.reading,
                    e
                );
                AdvisorError::computation(e)
            })?;

        let recommendations = candidates
            .into_iter()
            .take(self.settings.top_k)
            .map(|c| CropRecommendation {
                confidence: display_confidence(c.boosted, self.settings.confidence_cap),
                probability: c.probability,
                compatibility_score: c.compatibility,
                compatibility: CompatibilityLabel::from_score(c.compatibility),
                profile: profile_or_default(&c.crop),
                crop: c.crop,
            })
            .collect();

        Ok(RecommendationReport {
            recommendations,
            state: request.state.clone(),
            soil_type: soil.to_string(),
        })
    }

    /// Full candidate pool, re-ranked by boosted score
    pub fn ranked_candidates(&self, reading: &SoilReading, state: &str, soil: &str) -> Result<Vec<Candidate>> {
        let features = self.feature_vector(reading, state, soil)?;

        let scaled = self.models.scaler.transform(&features)
            .context("Failed to standardize crop features")?;

        let proba = self.models.classifier.predict_proba(&scaled)
            .context("Crop classifier failed")?;

        let n_crops = self.models.crop_coder.classes().len();
        if proba.len() != n_crops {
            anyhow::bail!(
                "Classifier returned {} probabilities for {} crop classes",
                proba.len(),
                n_crops
            );
        }

        let mut candidates = top_classes(&proba, self.settings.candidate_pool)
            .into_iter()
            .map(|idx| {
                let crop = self.models.crop_coder.decode(idx)
                    .with_context(|| format!("Crop code {} has no class", idx))?;
                let compatibility = self.compatibility.score(crop, soil);
                Ok(Candidate {
                    crop: crop.to_string(),
                    probability: proba[idx],
                    boosted: boosted_score(proba[idx], compatibility),
                    compatibility,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        rerank(&mut candidates);
        Ok(candidates)
    }

    fn feature_vector(&self, reading: &SoilReading, state: &str, soil: &str) -> Result<[f64; CROP_FEATURE_COUNT]> {
        let state_code = encode_with_fallback(self.models.state_coder.as_ref(), state)
            .context("State encoder has no classes")?;
        let soil_code = encode_with_fallback(self.models.soil_coder.as_ref(), soil)
            .context("Soil encoder has no classes")?;

        Ok([
            reading.nitrogen,
            reading.phosphorus,
            reading.potassium,
            reading.temperature,
            reading.ph,
            reading.moisture,
            state_code.code as f64,
            soil_code.code as f64,
            self.settings.compat_placeholder,
        ])
    }
}
