//! Static per-crop agronomic reference data
//!
//! Attached to recommendations after ranking. Crops without an entry get the
//! named defaults below rather than failing.

use serde::Serialize;

pub const DEFAULT_YIELD: &str = "N/A";
pub const DEFAULT_WINDOW: &str = "N/A";
pub const DEFAULT_FERTILIZER: &str = "NPK as recommended";
pub const DEFAULT_MARKET_PRICE: u32 = 2500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Reference metadata for one crop
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropProfile {
    pub expected_yield: &'static str,
    /// Baseline market price, INR per quintal
    pub market_price: u32,
    pub sowing_period: &'static str,
    pub harvest_time: &'static str,
    pub fertilizer: &'static str,
    pub risk_level: RiskLevel,
}

impl Default for CropProfile {
    fn default() -> Self {
        Self {
            expected_yield: DEFAULT_YIELD,
            market_price: DEFAULT_MARKET_PRICE,
            sowing_period: DEFAULT_WINDOW,
            harvest_time: DEFAULT_WINDOW,
            fertilizer: DEFAULT_FERTILIZER,
            risk_level: RiskLevel::Medium,
        }
    }
}

static PROFILES: &[(&str, CropProfile)] = &[
    ("Rice", CropProfile { expected_yield: "45-55 q/acre", market_price: 2800, sowing_period: "Jun-Jul", harvest_time: "Nov-Dec", fertilizer: "Urea 120kg/acre + SSP", risk_level: RiskLevel::Medium }),
    ("Wheat", CropProfile { expected_yield: "18-22 q/acre", market_price: 2275, sowing_period: "Nov-Dec", harvest_time: "Mar-Apr", fertilizer: "DAP 50kg + Urea 65kg", risk_level: RiskLevel::Low }),
    ("Maize", CropProfile { expected_yield: "22-28 q/acre", market_price: 2090, sowing_period: "Jun-Jul", harvest_time: "Sep-Oct", fertilizer: "Urea 100kg + MOP 50kg", risk_level: RiskLevel::Low }),
    ("Cotton", CropProfile { expected_yield: "8-12 q/acre", market_price: 6620, sowing_period: "May-Jun", harvest_time: "Nov-Jan", fertilizer: "NPK 20:20:0 + Urea", risk_level: RiskLevel::High }),
    ("Sugarcane", CropProfile { expected_yield: "350-450 q/acre", market_price: 315, sowing_period: "Feb-Mar", harvest_time: "Dec-Jan", fertilizer: "Urea 180kg + SSP 90kg", risk_level: RiskLevel::Medium }),
    ("Soybean", CropProfile { expected_yield: "10-14 q/acre", market_price: 4892, sowing_period: "Jun-Jul", harvest_time: "Oct-Nov", fertilizer: "DAP 60kg + Rhizobium", risk_level: RiskLevel::Medium }),
    ("Groundnut", CropProfile { expected_yield: "12-16 q/acre", market_price: 6377, sowing_period: "Jun-Jul", harvest_time: "Oct-Nov", fertilizer: "Gypsum 200kg + DAP", risk_level: RiskLevel::Low }),
    ("Pulses", CropProfile { expected_yield: "6-10 q/acre", market_price: 5440, sowing_period: "Oct-Nov", harvest_time: "Feb-Mar", fertilizer: "Rhizobium + DAP 20kg", risk_level: RiskLevel::Low }),
    ("Millets", CropProfile { expected_yield: "8-12 q/acre", market_price: 2500, sowing_period: "Jun-Jul", harvest_time: "Oct-Nov", fertilizer: "Urea 40kg + SSP 20kg", risk_level: RiskLevel::Low }),
    ("Vegetables", CropProfile { expected_yield: "60-90 q/acre", market_price: 2000, sowing_period: "Oct-Nov", harvest_time: "Jan-Feb", fertilizer: "NPK 19:19:19 + FYM", risk_level: RiskLevel::High }),
];

/// Look up the profile for a crop, if catalogued
pub fn find_profile(crop: &str) -> Option<&'static CropProfile> {
    PROFILES
        .iter()
        .find(|(name, _)| *name == crop)
        .map(|(_, profile)| profile)
}

/// Profile for a crop, falling back to the named defaults
pub fn profile_or_default(crop: &str) -> CropProfile {
    find_profile(crop).cloned().unwrap_or_default()
}
