//! Historical weather summary per (state, month)

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, AdvisorResult};

/// One row of the weather reference table. `recent_*` are 5-year averages
/// and may be missing for sparse stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub state: String,
    pub month: u32,
    pub avg_temp: f64,
    pub avg_rainfall: f64,
    pub avg_humidity: f64,
    pub avg_wind: Option<f64>,
    pub recent_temp: Option<f64>,
    pub recent_rainfall: Option<f64>,
    pub recent_humidity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSummary {
    /// As requested, even when another state's row answered
    pub state: String,
    pub month: u32,
    pub avg_temp: f64,
    pub avg_rainfall: f64,
    pub avg_humidity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_wind: Option<f64>,
    pub recent_temp: f64,
    pub recent_rainfall: f64,
    pub recent_humidity: f64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Default)]
pub struct WeatherSummaryLookup {
    records: Vec<WeatherRecord>,
    by_key: FxHashMap<(String, u32), usize>,
    first_by_month: FxHashMap<u32, usize>,
}

impl WeatherSummaryLookup {
    pub fn new(records: Vec<WeatherRecord>) -> Self {
        let mut by_key = FxHashMap::default();
        let mut first_by_month = FxHashMap::default();

        for (idx, record) in records.iter().enumerate() {
            by_key.entry((record.state.clone(), record.month)).or_insert(idx);
            first_by_month.entry(record.month).or_insert(idx);
        }

        Self {
            records,
            by_key,
            first_by_month,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact (state, month) row, else the first row for the month
    pub fn find(&self, state: &str, month: u32) -> Option<&WeatherRecord> {
        self.by_key
            .get(&(state.to_string(), month))
            .or_else(|| self.first_by_month.get(&month))
            .map(|&idx| &self.records[idx])
    }

    pub fn summarize(&self, state: &str, month: u32) -> AdvisorResult<WeatherSummary> {
        let record = self
            .find(state, month)
            .ok_or_else(|| AdvisorError::NotFound("No weather data found".to_string()))?;

        if record.state != state {
            tracing::debug!(
                "No weather row for {} month {}, using {}",
                state,
                month,
                record.state
            );
        }

        Ok(WeatherSummary {
            state: state.to_string(),
            month,
            avg_temp: round1(record.avg_temp),
            avg_rainfall: round1(record.avg_rainfall),
            avg_humidity: round1(record.avg_humidity),
            avg_wind: record.avg_wind.map(round1),
            recent_temp: round1(record.recent_temp.unwrap_or(record.avg_temp)),
            recent_rainfall: round1(record.recent_rainfall.unwrap_or(record.avg_rainfall)),
            recent_humidity: round1(record.recent_humidity.unwrap_or(record.avg_humidity)),
        })
    }
}
