//! Autoregressive market-price forecast
//!
//! Each phase feeds the regressor's previous output back in as the lag-1
//! feature. Lag-3/6/12 stay fixed at the cached values for the whole run.
//!
//! Per phase `i` (0-based), starting from calendar month `m` of year `y`:
//! - month = (m + i) mod 12 + 1, year = y + (m + i) div 12
//! - features = (crop, state, year, month, prev, lag3, lag6, lag12)
//! - price = max(floor, raw × (1 + u)), u ~ U[-a, a)
//! - trend vs the running current price: up if higher, down if below
//!   `stable_band` × current, otherwise stable
//! - confidence = base − decay × i

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};

use crate::config::ForecastSettings;
use crate::encoding::{encode_with_fallback, EncodedCategory};
use crate::error::{AdvisorError, AdvisorResult};
use crate::models::{CategoryCoder, Predictor};

pub const PRICE_FEATURE_COUNT: usize = 8;
pub const CURRENCY: &str = "INR";
pub const PRICE_UNIT: &str = "per quintal";

/// Most recent known price for a (crop, state) pair with its lagged history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagRecord {
    pub crop_name: String,
    pub state: String,
    pub lag1: f64,
    pub lag3: f64,
    pub lag6: f64,
    pub lag12: f64,
    /// Latest observed price (INR per quintal)
    pub price: f64,
}

/// Immutable lag cache indexed by (crop, state) and by crop alone
#[derive(Debug, Clone, Default)]
pub struct LagTable {
    records: Vec<LagRecord>,
    by_pair: FxHashMap<(String, String), usize>,
    first_by_crop: FxHashMap<String, usize>,
}

impl LagTable {
    /// Row order is kept: "first record for a crop" means first in `records`.
    pub fn new(records: Vec<LagRecord>) -> Self {
        let mut by_pair = FxHashMap::default();
        let mut first_by_crop = FxHashMap::default();

        for (idx, record) in records.iter().enumerate() {
            by_pair
                .entry((record.crop_name.clone(), record.state.clone()))
                .or_insert(idx);
            first_by_crop.entry(record.crop_name.clone()).or_insert(idx);
        }

        Self {
            records,
            by_pair,
            first_by_crop,
        }
    }

    /// Exact (crop, state) match, else the first record for the crop
    pub fn lookup(&self, crop: &str, state: &str) -> Option<&LagRecord> {
        self.by_pair
            .get(&(crop.to_string(), state.to_string()))
            .or_else(|| self.first_by_crop.get(crop))
            .map(|&idx| &self.records[idx])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        }
    }
}

/// Asymmetric dead-band: any rise is "up", only a drop below
/// `band × current` is "down".
pub fn classify_trend(predicted: f64, current: f64, band: f64) -> Trend {
    if predicted > current {
        Trend::Up
    } else if predicted < current * band {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Calendar month the forecast starts from (month is 1-12)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastMonth {
    pub year: i32,
    pub month: u32,
}

impl ForecastMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn today() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    /// (year, month) fed to the model for phase `phase`. Phase 0 is already
    /// the month after `self`.
    pub fn for_phase(&self, phase: u32) -> (i32, u32) {
        let shifted = self.month + phase;
        (self.year + (shifted / 12) as i32, shifted % 12 + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPhase {
    /// 1-based
    pub phase: u32,
    pub label: String,
    pub price: i64,
    pub trend: Trend,
    pub confidence: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceForecast {
    /// Crop and state as requested
    pub crop: String,
    pub state: String,
    pub base_price: i64,
    pub phases: Vec<ForecastPhase>,
    pub currency: &'static str,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuery {
    pub crop_name: String,
    pub state: String,
}

/// Trained artifacts for the price domain. These encoders are fitted
/// independently of the crop-recommendation ones.
pub struct PriceModels {
    pub regressor: Box<dyn Predictor>,
    pub crop_coder: Box<dyn CategoryCoder>,
    pub state_coder: Box<dyn CategoryCoder>,
}

pub struct PriceForecaster {
    models: PriceModels,
    lags: LagTable,
    settings: ForecastSettings,
}

fn phase_label(phase: u32, days: u32) -> String {
    format!("Days {}–{}", phase * days + 1, phase * days + days)
}

fn round_price(price: f64) -> i64 {
    price.round_ties_even() as i64
}

impl PriceForecaster {
    pub fn new(models: PriceModels, lags: LagTable, settings: ForecastSettings) -> Self {
        Self {
            models,
            lags,
            settings,
        }
    }

    pub fn lag_table(&self) -> &LagTable {
        &self.lags
    }

    /// Forecast from the current local month using the thread-local RNG
    pub fn forecast(&self, crop: &str, state: &str) -> AdvisorResult<PriceForecast> {
        self.forecast_at(crop, state, ForecastMonth::today(), &mut rand::thread_rng())
    }

    /// Independent forecasts for many pairs, evaluated in parallel
    pub fn forecast_many(&self, queries: &[PriceQuery]) -> Vec<AdvisorResult<PriceForecast>> {
        let start = ForecastMonth::today();
        queries
            .par_iter()
            .map(|q| self.forecast_at(&q.crop_name, &q.state, start, &mut rand::thread_rng()))
            .collect()
    }

    pub fn forecast_at<R: Rng>(
        &self,
        crop: &str,
        state: &str,
        start: ForecastMonth,
        rng: &mut R,
    ) -> AdvisorResult<PriceForecast> {
        let (crop_enc, state_enc) = self.encode(crop, state).map_err(|e| {
            tracing::error!("Price encoding failed for '{}' / '{}': {:#}", crop, state, e);
            AdvisorError::computation(e)
        })?;

        // Lag lookup uses the encoded-as values, so an unknown crop reads the
        // fallback crop's history.
        let record = self
            .lags
            .lookup(&crop_enc.value, &state_enc.value)
            .ok_or_else(|| AdvisorError::NotFound(format!("No data for crop: {}", crop)))?;

        if record.state != state_enc.value {
            tracing::debug!(
                "No lag record for {}/{}, using {}/{}",
                crop_enc.value,
                state_enc.value,
                record.crop_name,
                record.state
            );
        }

        let phases = self
            .run_phases(&crop_enc, &state_enc, record, start, rng)
            .map_err(|e| {
                tracing::error!(
                    "Price forecast failed for '{}' / '{}' from {:?}: {:#}",
                    crop,
                    state,
                    start,
                    e
                );
                AdvisorError::computation(e)
            })?;

        Ok(PriceForecast {
            crop: crop.to_string(),
            state: state.to_string(),
            base_price: round_price(record.price),
            phases,
            currency: CURRENCY,
            unit: PRICE_UNIT,
        })
    }

    fn encode(&self, crop: &str, state: &str) -> Result<(EncodedCategory, EncodedCategory)> {
        let crop_enc = encode_with_fallback(self.models.crop_coder.as_ref(), crop)
            .context("Price crop encoder has no classes")?;
        let state_enc = encode_with_fallback(self.models.state_coder.as_ref(), state)
            .context("Price state encoder has no classes")?;
        Ok((crop_enc, state_enc))
    }

    fn run_phases<R: Rng>(
        &self,
        crop: &EncodedCategory,
        state: &EncodedCategory,
        record: &LagRecord,
        start: ForecastMonth,
        rng: &mut R,
    ) -> Result<Vec<ForecastPhase>> {
        let s = &self.settings;
        let mut current_price = record.price;
        let mut prev_price = record.lag1;
        let mut phases = Vec::with_capacity(s.phases as usize);

        for phase in 0..s.phases {
            let (year, month) = start.for_phase(phase);

            let features: [f64; PRICE_FEATURE_COUNT] = [
                crop.code as f64,
                state.code as f64,
                year as f64,
                month as f64,
                prev_price,
                record.lag3,
                record.lag6,
                record.lag12,
            ];

            let raw = self.models.regressor.predict(&features)
                .with_context(|| format!("Price model failed at phase {}", phase + 1))?;

            let predicted = (raw + raw * self.noise(rng)).max(s.price_floor);
            let trend = classify_trend(predicted, current_price, s.stable_band);

            phases.push(ForecastPhase {
                phase: phase + 1,
                label: phase_label(phase, s.days_per_phase),
                price: round_price(predicted),
                trend,
                confidence: s.base_confidence - s.confidence_decay * phase as i32,
            });

            prev_price = predicted;
            current_price = predicted;
        }

        Ok(phases)
    }

    fn noise<R: Rng>(&self, rng: &mut R) -> f64 {
        let amplitude = self.settings.noise_amplitude;
        if amplitude > 0.0 {
            rng.gen_range(-amplitude..amplitude)
        } else {
            0.0
        }
    }
}
