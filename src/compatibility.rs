//! Crop–soil compatibility table
//!
//! Static configuration: crop → soil types, best match first. The score is
//! determined by position alone.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};

pub const BEST_MATCH_SCORE: f64 = 1.0;
pub const RUNNER_UP_SCORE: f64 = 0.9;
pub const SECONDARY_SCORE: f64 = 0.75;
pub const INCOMPATIBLE_SCORE: f64 = 0.3;

/// Built-in table, used when no `soil_types.json` is shipped with the models.
const DEFAULT_CROP_SOILS: &[(&str, &[&str])] = &[
    ("Rice", &["Clay", "Clay Loam", "Silty Clay", "Silty Loam"]),
    ("Wheat", &["Loamy", "Clay Loam", "Sandy Loam", "Black Cotton"]),
    ("Maize", &["Loamy", "Sandy Loam", "Sandy", "Clay Loam"]),
    ("Cotton", &["Black Cotton", "Clay Loam", "Sandy Clay", "Loamy"]),
    ("Sugarcane", &["Loamy", "Clay Loam", "Silty Loam", "Sandy Loam"]),
    ("Soybean", &["Loamy", "Sandy Loam", "Clay Loam", "Silty Loam"]),
    ("Groundnut", &["Sandy Loam", "Sandy", "Loamy", "Red Soil"]),
    ("Pulses", &["Sandy Loam", "Loamy", "Clay Loam", "Red Soil"]),
    ("Millets", &["Sandy", "Sandy Loam", "Loamy", "Red Soil"]),
    ("Vegetables", &["Loamy", "Silty Loam", "Sandy Loam", "Clay Loam"]),
];

/// Three-tier reading of a compatibility score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompatibilityLabel {
    #[serde(rename = "best match")]
    BestMatch,
    #[serde(rename = "compatible")]
    Compatible,
    #[serde(rename = "sub-optimal")]
    SubOptimal,
}

impl CompatibilityLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= BEST_MATCH_SCORE {
            CompatibilityLabel::BestMatch
        } else if score >= SECONDARY_SCORE {
            CompatibilityLabel::Compatible
        } else {
            CompatibilityLabel::SubOptimal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompatibilityLabel::BestMatch => "best match",
            CompatibilityLabel::Compatible => "compatible",
            CompatibilityLabel::SubOptimal => "sub-optimal",
        }
    }
}

#[derive(Deserialize)]
struct SoilTypesFile {
    crop_soil_map: FxHashMap<String, Vec<String>>,
}

/// Crop → ranked soil list
#[derive(Debug, Clone)]
pub struct CompatibilityTable {
    crop_soils: FxHashMap<String, Vec<String>>,
}

impl Default for CompatibilityTable {
    fn default() -> Self {
        Self::from_entries(
            DEFAULT_CROP_SOILS
                .iter()
                .map(|(crop, soils)| (crop.to_string(), soils.iter().map(|s| s.to_string()).collect())),
        )
    }
}

impl CompatibilityTable {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        Self {
            crop_soils: entries.into_iter().collect(),
        }
    }

    /// Load `{"crop_soil_map": {crop: [soil, ...]}}`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read soil types file: {:?}", path))?;

        let file: SoilTypesFile = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse soil types JSON")?;

        Ok(Self { crop_soils: file.crop_soil_map })
    }

    /// Score a (crop, soil) pair. Total: unknown crops or soils score 0.3.
    pub fn score(&self, crop: &str, soil: &str) -> f64 {
        let Some(soils) = self.crop_soils.get(crop) else {
            return INCOMPATIBLE_SCORE;
        };

        match soils.iter().position(|s| s == soil) {
            Some(0) => BEST_MATCH_SCORE,
            Some(1) => RUNNER_UP_SCORE,
            Some(_) => SECONDARY_SCORE,
            None => INCOMPATIBLE_SCORE,
        }
    }

    pub fn label(&self, crop: &str, soil: &str) -> CompatibilityLabel {
        CompatibilityLabel::from_score(self.score(crop, soil))
    }

    pub fn soils_for(&self, crop: &str) -> Option<&[String]> {
        self.crop_soils.get(crop).map(|s| s.as_slice())
    }

    /// Crops in the table, sorted
    pub fn crops(&self) -> Vec<&str> {
        let mut crops: Vec<&str> = self.crop_soils.keys().map(|s| s.as_str()).collect();
        crops.sort_unstable();
        crops
    }

    /// Sorted, de-duplicated union of every listed soil. This is the vocabulary
    /// the soil encoder is fitted on.
    pub fn soil_types(&self) -> Vec<String> {
        self.crop_soils
            .values()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_position_determines_score() {
        let table = CompatibilityTable::default();
        assert_relative_eq!(table.score("Rice", "Clay"), 1.0);
        assert_relative_eq!(table.score("Rice", "Clay Loam"), 0.9);
        assert_relative_eq!(table.score("Rice", "Silty Clay"), 0.75);
        assert_relative_eq!(table.score("Rice", "Silty Loam"), 0.75);
        assert_relative_eq!(table.score("Rice", "Sandy"), 0.3);
    }

    #[test]
    fn test_unknown_crop_or_soil_scores_incompatible() {
        let table = CompatibilityTable::default();
        assert_relative_eq!(table.score("Quinoa", "Loamy"), 0.3);
        assert_relative_eq!(table.score("Wheat", "Moon Dust"), 0.3);
    }

    #[test]
    fn test_first_listed_soil_is_best_match_for_every_crop() {
        let table = CompatibilityTable::default();
        for crop in table.crops() {
            let soils = table.soils_for(crop).unwrap();
            assert_relative_eq!(table.score(crop, &soils[0]), 1.0);
            assert_eq!(table.label(crop, &soils[0]), CompatibilityLabel::BestMatch);
        }
    }

    #[test]
    fn test_score_independent_of_entry_order() {
        let forward = CompatibilityTable::default();
        let reversed = CompatibilityTable::from_entries(
            DEFAULT_CROP_SOILS
                .iter()
                .rev()
                .map(|(c, s)| (c.to_string(), s.iter().map(|x| x.to_string()).collect())),
        );
        for soil in forward.soil_types() {
            for crop in forward.crops() {
                assert_eq!(forward.score(crop, &soil), reversed.score(crop, &soil));
                assert_eq!(forward.score(crop, &soil), forward.score(crop, &soil));
            }
        }
    }

    #[test]
    fn test_label_tiers() {
        assert_eq!(CompatibilityLabel::from_score(1.0), CompatibilityLabel::BestMatch);
        assert_eq!(CompatibilityLabel::from_score(0.9), CompatibilityLabel::Compatible);
        assert_eq!(CompatibilityLabel::from_score(0.75), CompatibilityLabel::Compatible);
        assert_eq!(CompatibilityLabel::from_score(0.3), CompatibilityLabel::SubOptimal);
        assert_eq!(CompatibilityLabel::SubOptimal.as_str(), "sub-optimal");
    }

    #[test]
    fn test_soil_types_sorted_unique() {
        let soils = CompatibilityTable::default().soil_types();
        assert_eq!(soils.first().map(|s| s.as_str()), Some("Black Cotton"));
        assert_eq!(soils.len(), 10);
        assert!(soils.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parse_soil_types_file() {
        let file: SoilTypesFile = serde_json::from_str(
            r#"{"soil_types": ["Clay"], "crop_soil_map": {"Rice": ["Clay", "Loamy"]}}"#,
        )
        .unwrap();
        let table = CompatibilityTable { crop_soils: file.crop_soil_map };
        assert_relative_eq!(table.score("Rice", "Loamy"), 0.9);
    }
}
