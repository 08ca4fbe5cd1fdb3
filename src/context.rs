//! Shared advisory context
//!
//! Built once at startup and never mutated. Each engine loads independently:
//! if its artifacts are missing or invalid the engine is left out, a warning
//! is logged, and its operations report `Unavailable` while the others keep
//! serving.

use serde::Serialize;

use crate::compatibility::CompatibilityTable;
use crate::config::AdvisorConfig;
use crate::data;
use crate::error::{AdvisorError, AdvisorResult};
use crate::forecast::{PriceForecast, PriceForecaster, PriceQuery};
use crate::recommendation::{RecommendRequest, RecommendationEngine, RecommendationReport};
use crate::weather::{WeatherSummary, WeatherSummaryLookup};

#[derive(Debug, Clone, Serialize)]
pub struct AdvisorStatus {
    pub status: &'static str,
    /// Crop recommendation artifacts
    pub models_loaded: bool,
    pub price_model_loaded: bool,
    pub weather_loaded: bool,
    pub version: &'static str,
    pub timestamp: String,
}

pub struct AdvisorContext {
    recommender: Option<RecommendationEngine>,
    forecaster: Option<PriceForecaster>,
    weather: Option<WeatherSummaryLookup>,
    compatibility: CompatibilityTable,
}

impl AdvisorContext {
    /// Assemble from already-built parts
    pub fn new(
        recommender: Option<RecommendationEngine>,
        forecaster: Option<PriceForecaster>,
        weather: Option<WeatherSummaryLookup>,
        compatibility: CompatibilityTable,
    ) -> Self {
        Self {
            recommender,
            forecaster,
            weather,
            compatibility,
        }
    }

    /// Load every component from `config.models_dir`
    pub fn load(config: &AdvisorConfig) -> Self {
        tracing::info!("Loading artifacts from {:?}", config.models_dir);

        let compatibility = data::load_compatibility(config).unwrap_or_else(|e| {
            tracing::warn!("Soil table unreadable, using built-in table: {:#}", e);
            CompatibilityTable::default()
        });

        let recommender = match data::load_crop_models(config) {
            Ok(models) => Some(RecommendationEngine::new(
                models,
                compatibility.clone(),
                config.recommendation.clone(),
            )),
            Err(e) => {
                tracing::warn!("Crop recommendation unavailable: {:#}", e);
                None
            }
        };

        let forecaster = data::load_price_models(config).and_then(|models| {
            config.forecast.validate()?;
            let lags = data::load_lag_table(&config.artifact(data::LAG_CACHE_FILE))?;
            Ok(PriceForecaster::new(models, lags, config.forecast.clone()))
        });
        let forecaster = match forecaster {
            Ok(f) => Some(f),
            Err(e) => {
                tracing::warn!("Price forecasting unavailable: {:#}", e);
                None
            }
        };

        let weather = match data::load_weather_lookup(&config.artifact(data::WEATHER_FILE)) {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::warn!("Weather lookup unavailable: {:#}", e);
                None
            }
        };

        let context = Self::new(recommender, forecaster, weather, compatibility);
        let status = context.status();
        tracing::info!(
            "Advisor ready (crop: {}, price: {}, weather: {})",
            status.models_loaded,
            status.price_model_loaded,
            status.weather_loaded
        );
        context
    }

    pub fn recommend(&self, request: &RecommendRequest) -> AdvisorResult<RecommendationReport> {
        self.recommender
            .as_ref()
            .ok_or(AdvisorError::Unavailable("Crop recommendation models"))?
            .recommend(request)
    }

    pub fn forecast_price(&self, crop: &str, state: &str) -> AdvisorResult<PriceForecast> {
        self.price_forecaster()?.forecast(crop, state)
    }

    /// One result per query, in query order
    pub fn forecast_prices(&self, queries: &[PriceQuery]) -> AdvisorResult<Vec<AdvisorResult<PriceForecast>>> {
        Ok(self.price_forecaster()?.forecast_many(queries))
    }

    pub fn summarize_weather(&self, state: &str, month: u32) -> AdvisorResult<WeatherSummary> {
        self.weather
            .as_ref()
            .ok_or(AdvisorError::Unavailable("Weather data"))?
            .summarize(state, month)
    }

    /// Soil vocabulary accepted by the recommender
    pub fn soil_types(&self) -> Vec<String> {
        self.compatibility.soil_types()
    }

    pub fn status(&self) -> AdvisorStatus {
        AdvisorStatus {
            status: "ok",
            models_loaded: self.recommender.is_some(),
            price_model_loaded: self.forecaster.is_some(),
            weather_loaded: self.weather.is_some(),
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn price_forecaster(&self) -> AdvisorResult<&PriceForecaster> {
        self.forecaster
            .as_ref()
            .ok_or(AdvisorError::Unavailable("Price model"))
    }
}
