//! Artifact loading
//!
//! Reads trained artifacts and reference tables from the models directory:
//! JSON for encoders, scaler and tree ensembles, CSV (via Polars) for the
//! price lag cache and the weather lookup table.

use polars::prelude::*;
use std::path::Path;
use anyhow::{Context, Result};

use crate::compatibility::CompatibilityTable;
use crate::config::AdvisorConfig;
use crate::encoding::LabelCoder;
use crate::forecast::{LagRecord, LagTable, PriceModels, PRICE_FEATURE_COUNT};
use crate::models::{BoostedRegressor, ForestClassifier, ProbabilisticClassifier, StandardScaler};
use crate::recommendation::{CropModels, CROP_FEATURE_COUNT};
use crate::weather::{WeatherRecord, WeatherSummaryLookup};

pub const CROP_MODEL_FILE: &str = "crop_model.json";
pub const CROP_SCALER_FILE: &str = "crop_scaler.json";
pub const STATE_ENCODER_FILE: &str = "state_encoder.json";
pub const SOIL_ENCODER_FILE: &str = "soil_encoder.json";
pub const CROP_ENCODER_FILE: &str = "crop_encoder.json";
pub const SOIL_TYPES_FILE: &str = "soil_types.json";

pub const PRICE_MODEL_FILE: &str = "price_model.json";
pub const PRICE_CROP_ENCODER_FILE: &str = "price_crop_encoder.json";
pub const PRICE_STATE_ENCODER_FILE: &str = "price_state_encoder.json";
pub const LAG_CACHE_FILE: &str = "price_lag_cache.csv";

pub const WEATHER_FILE: &str = "weather_lookup.csv";

/// Load classifier, scaler and the three recommendation-side encoders.
///
/// The classifier and crop encoder must agree on the class count, and both
/// model and scaler must match the crop feature layout.
pub fn load_crop_models(config: &AdvisorConfig) -> Result<CropModels> {
    let classifier = ForestClassifier::load(&config.artifact(CROP_MODEL_FILE))?;
    let scaler = StandardScaler::load(&config.artifact(CROP_SCALER_FILE))?;
    let state_coder = LabelCoder::load(&config.artifact(STATE_ENCODER_FILE))?;
    let soil_coder = LabelCoder::load(&config.artifact(SOIL_ENCODER_FILE))?;
    let crop_coder = LabelCoder::load(&config.artifact(CROP_ENCODER_FILE))?;

    if classifier.n_features() != CROP_FEATURE_COUNT {
        anyhow::bail!(
            "Crop model expects {} features, recommendation uses {}",
            classifier.n_features(),
            CROP_FEATURE_COUNT
        );
    }
    if scaler.n_features() != CROP_FEATURE_COUNT {
        anyhow::bail!(
            "Crop scaler has {} features, recommendation uses {}",
            scaler.n_features(),
            CROP_FEATURE_COUNT
        );
    }
    if classifier.n_classes() != crop_coder.len() {
        anyhow::bail!(
            "Crop model has {} classes but crop encoder has {}",
            classifier.n_classes(),
            crop_coder.len()
        );
    }

    tracing::info!(
        "Crop models loaded: {} trees, {} crops, {} states, {} soils",
        classifier.n_trees(),
        crop_coder.len(),
        state_coder.len(),
        soil_coder.len()
    );

    Ok(CropModels {
        classifier: Box::new(classifier),
        scaler: Box::new(scaler),
        state_coder: Box::new(state_coder),
        soil_coder: Box::new(soil_coder),
        crop_coder: Box::new(crop_coder),
    })
}

/// Soil table from `soil_types.json` when shipped, else the built-in table
pub fn load_compatibility(config: &AdvisorConfig) -> Result<CompatibilityTable> {
    let path = config.artifact(SOIL_TYPES_FILE);
    if !path.exists() {
        tracing::debug!("No {:?}, using built-in soil table", path);
        return Ok(CompatibilityTable::default());
    }
    CompatibilityTable::load(&path)
}

pub fn load_price_models(config: &AdvisorConfig) -> Result<PriceModels> {
    let regressor = BoostedRegressor::load(&config.artifact(PRICE_MODEL_FILE))?;
    let crop_coder = LabelCoder::load(&config.artifact(PRICE_CROP_ENCODER_FILE))?;
    let state_coder = LabelCoder::load(&config.artifact(PRICE_STATE_ENCODER_FILE))?;

    if regressor.n_features() != PRICE_FEATURE_COUNT {
        anyhow::bail!(
            "Price model expects {} features, forecaster uses {}",
            regressor.n_features(),
            PRICE_FEATURE_COUNT
        );
    }

    tracing::info!(
        "Price model loaded: {} trees, {} crops, {} states",
        regressor.n_trees(),
        crop_coder.len(),
        state_coder.len()
    );

    Ok(PriceModels {
        regressor: Box::new(regressor),
        crop_coder: Box::new(crop_coder),
        state_coder: Box::new(state_coder),
    })
}

pub fn load_lag_table(path: &Path) -> Result<LagTable> {
    let df = read_csv(path)?;
    let records = lag_records(&df)
        .with_context(|| format!("Invalid lag cache: {:?}", path))?;
    tracing::info!("Lag cache: {} records", records.len());
    Ok(LagTable::new(records))
}

pub fn load_weather_lookup(path: &Path) -> Result<WeatherSummaryLookup> {
    let df = read_csv(path)?;
    let records = weather_records(&df)
        .with_context(|| format!("Invalid weather table: {:?}", path))?;
    tracing::info!("Weather lookup: {} records", records.len());
    Ok(WeatherSummaryLookup::new(records))
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {:?}", path))
}

fn str_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' is not castable to string", name))?;

    let values = column.str()
        .with_context(|| format!("Column '{}' is not string type", name))?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();

    Ok(values)
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))?;

    let values = column.f64()
        .with_context(|| format!("Column '{}' is not f64 type", name))?
        .into_iter()
        .collect();

    Ok(values)
}

/// Nullable column that may also be absent from the file entirely
fn optional_f64_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    if df.get_column_names().iter().any(|c| c.as_str() == name) {
        f64_column(df, name)
    } else {
        Ok(vec![None; df.height()])
    }
}

fn lag_records(df: &DataFrame) -> Result<Vec<LagRecord>> {
    let crops = str_column(df, "crop_name")?;
    let states = str_column(df, "state")?;
    let lag1 = f64_column(df, "lag1")?;
    let lag3 = f64_column(df, "lag3")?;
    let lag6 = f64_column(df, "lag6")?;
    let lag12 = f64_column(df, "lag12")?;
    let prices = f64_column(df, "avg_price_rs_quintal")?;

    let mut records = Vec::with_capacity(df.height());
    let mut skipped = 0usize;

    for i in 0..df.height() {
        match (&crops[i], &states[i], lag1[i], lag3[i], lag6[i], lag12[i], prices[i]) {
            (Some(crop), Some(state), Some(l1), Some(l3), Some(l6), Some(l12), Some(price)) => {
                records.push(LagRecord {
                    crop_name: crop.clone(),
                    state: state.clone(),
                    lag1: l1,
                    lag3: l3,
                    lag6: l6,
                    lag12: l12,
                    price,
                });
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} lag rows with missing values", skipped);
    }

    Ok(records)
}

fn weather_records(df: &DataFrame) -> Result<Vec<WeatherRecord>> {
    let states = str_column(df, "state")?;
    let months = f64_column(df, "month")?;
    let temps = f64_column(df, "avg_temp")?;
    let rainfall = f64_column(df, "avg_rainfall")?;
    let humidity = f64_column(df, "avg_humidity")?;
    let wind = optional_f64_column(df, "avg_wind")?;
    let recent_temp = optional_f64_column(df, "recent_temp")?;
    let recent_rainfall = optional_f64_column(df, "recent_rainfall")?;
    let recent_humidity = optional_f64_column(df, "recent_humidity")?;

    let mut records = Vec::with_capacity(df.height());
    let mut skipped = 0usize;

    for i in 0..df.height() {
        let month = months[i]
            .filter(|m| m.fract() == 0.0 && (1.0..=12.0).contains(m))
            .map(|m| m as u32);

        match (&states[i], month, temps[i], rainfall[i], humidity[i]) {
            (Some(state), Some(month), Some(avg_temp), Some(avg_rainfall), Some(avg_humidity)) => {
                records.push(WeatherRecord {
                    state: state.clone(),
                    month,
                    avg_temp,
                    avg_rainfall,
                    avg_humidity,
                    avg_wind: wind[i],
                    recent_temp: recent_temp[i],
                    recent_rainfall: recent_rainfall[i],
                    recent_humidity: recent_humidity[i],
                });
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} weather rows with missing or invalid values", skipped);
    }

    Ok(records)
}
