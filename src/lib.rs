//! Crop Advisor inference core
//!
//! Turns field measurements and market history into advice using trained
//! artifacts loaded once at startup:
//! - `recommendation`: classifier scoring re-ranked by crop–soil compatibility
//! - `forecast`: four-phase autoregressive market-price forecast
//! - `weather`: per (state, month) historical weather summary
//!
//! Supporting modules:
//! - `encoding`: category codes with a silent first-class fallback
//! - `compatibility`: crop → ranked soil table
//! - `crop_catalog`: static agronomic metadata per crop
//! - `models/`: narrow model traits and tree-ensemble adapters
//! - `data`: artifact loading (JSON + Polars CSV)
//! - `context`: the shared, immutable service context

pub mod compatibility;
pub mod config;
pub mod context;
pub mod crop_catalog;
pub mod data;
pub mod encoding;
pub mod error;
pub mod forecast;
pub mod models;
pub mod recommendation;
pub mod weather;

// Re-export commonly used types
pub use compatibility::{CompatibilityLabel, CompatibilityTable};
pub use config::{AdvisorConfig, ForecastSettings, RecommendationSettings};
pub use context::{AdvisorContext, AdvisorStatus};
pub use crop_catalog::{CropProfile, RiskLevel};
pub use encoding::{encode_with_fallback, EncodedCategory, LabelCoder};
pub use error::{AdvisorError, AdvisorResult};
pub use forecast::{ForecastMonth, ForecastPhase, LagRecord, LagTable, PriceForecast, PriceForecaster, PriceQuery, Trend};
pub use recommendation::{CropRecommendation, RecommendRequest, RecommendationEngine, RecommendationReport, SoilReading};
pub use weather::{WeatherRecord, WeatherSummary, WeatherSummaryLookup};
