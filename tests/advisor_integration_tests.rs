//! Advisor Integration Tests
//!
//! Writes a small but complete artifact set to a temp directory, loads it
//! through `AdvisorContext::load`, and drives every operation end-to-end.

use approx::assert_relative_eq;
use crop_advisor::{
    AdvisorConfig, AdvisorContext, AdvisorError, CompatibilityLabel, ForecastMonth, ForecastSettings,
    PriceQuery, RecommendRequest, SoilReading, Trend,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;

const CROPS: &[&str] = &[
    "Cotton", "Groundnut", "Maize", "Millets", "Pulses", "Rice", "Soybean", "Sugarcane", "Vegetables", "Wheat",
];

/// One tree splitting on raw nitrogen. High-N readings land on a leaf where
/// Wheat (0.31) narrowly beats Rice (0.30).
const CROP_MODEL: &str = r#"{
    "n_features": 9,
    "n_classes": 10,
    "trees": [{"nodes": [
        {"feature": 0, "threshold": 50.0, "left": 1, "right": 2},
        {"value": [0, 0, 0, 60, 40, 0, 0, 0, 0, 0]},
        {"value": [5, 3, 10, 2, 4, 30, 6, 8, 1, 31]}
    ]}]
}"#;

const CROP_SCALER: &str = r#"{
    "mean": [0, 0, 0, 0, 0, 0, 0, 0, 0],
    "scale": [1, 1, 1, 1, 1, 1, 1, 1, 1]
}"#;

/// Predicts 2100 whenever the previous price is above 1000
const PRICE_MODEL: &str = r#"{
    "n_features": 8,
    "init": 2000.0,
    "learning_rate": 1.0,
    "trees": [{"nodes": [
        {"feature": 4, "threshold": 1000.0, "left": 1, "right": 2},
        {"value": 0.0},
        {"value": 100.0}
    ]}]
}"#;

const LAG_CACHE: &str = "\
crop_name,state,lag1,lag3,lag6,lag12,avg_price_rs_quintal
Rice,Punjab,2050,2030,2010,1950,2100
Rice,Bihar,1950,1930,1910,1850,2000
Wheat,Punjab,2390,2370,2340,2280,2400
";

const WEATHER: &str = "\
state,month,avg_temp,avg_rainfall,avg_humidity,avg_wind,recent_temp,recent_rainfall,recent_humidity
Kerala,7,27.1,600.0,88.0,,,,
Punjab,7,31.27,180.44,72.0,3.2,32.04,170.0,74.0
Punjab,1,12.5,20.0,60.0,,,,
";

fn encoder(classes: &[&str]) -> String {
    serde_json::json!({ "classes": classes }).to_string()
}

fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("crop_advisor_{}_{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let soils = crop_advisor::CompatibilityTable::default().soil_types();
    let soils: Vec<&str> = soils.iter().map(|s| s.as_str()).collect();

    let files: Vec<(&str, String)> = vec![
        ("crop_model.json", CROP_MODEL.to_string()),
        ("crop_scaler.json", CROP_SCALER.to_string()),
        ("state_encoder.json", encoder(&["Bihar", "Kerala", "Punjab"])),
        ("soil_encoder.json", encoder(&soils)),
        ("crop_encoder.json", encoder(CROPS)),
        ("price_model.json", PRICE_MODEL.to_string()),
        ("price_crop_encoder.json", encoder(&["Cotton", "Rice", "Wheat"])),
        ("price_state_encoder.json", encoder(&["Bihar", "Punjab"])),
        ("price_lag_cache.csv", LAG_CACHE.to_string()),
        ("weather_lookup.csv", WEATHER.to_string()),
    ];
    for (file, contents) in files {
        fs::write(dir.join(file), contents).unwrap();
    }

    dir
}

fn load(name: &str) -> AdvisorContext {
    let config = AdvisorConfig {
        forecast: ForecastSettings {
            noise_amplitude: 0.0,
            ..ForecastSettings::default()
        },
        ..AdvisorConfig::default()
    }
    .with_models_dir(fixture_dir(name));

    AdvisorContext::load(&config)
}

fn canonical_request(soil: Option<&str>) -> RecommendRequest {
    RecommendRequest {
        reading: SoilReading {
            nitrogen: 90.0,
            phosphorus: 40.0,
            potassium: 40.0,
            temperature: 25.0,
            ph: 6.5,
            moisture: 60.0,
        },
        state: "Punjab".to_string(),
        soil_type: soil.map(|s| s.to_string()),
    }
}

#[test]
fn test_all_components_load() {
    let status = load("status").status();
    assert!(status.models_loaded);
    assert!(status.price_model_loaded);
    assert!(status.weather_loaded);
}

#[test]
fn test_canonical_recommendation() {
    let ctx = load("canonical");
    let report = ctx.recommend(&canonical_request(Some("Loamy"))).unwrap();

    assert_eq!(report.recommendations.len(), 4);
    assert_eq!(report.soil_type, "Loamy");
    for rec in &report.recommendations {
        assert!(rec.confidence >= 0.0 && rec.confidence <= 99.0);
    }

    let crops: Vec<&str> = report.recommendations.iter().map(|r| r.crop.as_str()).collect();
    assert_eq!(crops, vec!["Wheat", "Rice", "Maize", "Sugarcane"]);

    let wheat = &report.recommendations[0];
    assert_relative_eq!(wheat.confidence, 31.0);
    assert_eq!(wheat.compatibility, CompatibilityLabel::BestMatch);
    assert_eq!(wheat.profile.market_price, 2275);

    // Loamy is not listed for Rice: 0.30 × 0.65
    let rice = &report.recommendations[1];
    assert_relative_eq!(rice.confidence, 19.5);
    assert_eq!(rice.compatibility, CompatibilityLabel::SubOptimal);
}

#[test]
fn test_soil_defaults_to_loamy() {
    let ctx = load("default_soil");
    let report = ctx.recommend(&canonical_request(None)).unwrap();
    assert_eq!(report.soil_type, "Loamy");
    assert_eq!(report.recommendations[0].crop, "Wheat");
}

#[test]
fn test_clay_soil_promotes_rice() {
    let ctx = load("clay");
    let report = ctx.recommend(&canonical_request(Some("Clay"))).unwrap();
    assert_eq!(report.recommendations[0].crop, "Rice");
    assert_relative_eq!(report.recommendations[0].confidence, 30.0);
    assert_eq!(report.recommendations[1].crop, "Wheat");
}

#[test]
fn test_unknown_state_and_soil_fall_back() {
    let ctx = load("fallback");
    let mut request = canonical_request(Some("Volcanic Ash"));
    request.state = "Atlantis".to_string();

    let report = ctx.recommend(&request).unwrap();
    assert_eq!(report.recommendations.len(), 4);
    assert_eq!(report.state, "Atlantis");
    assert_eq!(report.soil_type, "Volcanic Ash");
}

#[test]
fn test_flat_price_forecast_is_stable() {
    let ctx = load("price_flat");
    let forecast = ctx.forecast_price("Rice", "Punjab").unwrap();

    assert_eq!(forecast.base_price, 2100);
    assert_eq!(forecast.currency, "INR");
    assert_eq!(forecast.unit, "per quintal");
    assert_eq!(forecast.phases.len(), 4);
    for phase in &forecast.phases {
        assert_eq!(phase.price, 2100);
        assert_eq!(phase.trend, Trend::Stable);
    }
}

#[test]
fn test_price_drop_then_stable() {
    let ctx = load("price_drop");
    let forecast = ctx.forecast_price("Wheat", "Punjab").unwrap();
    assert_eq!(forecast.phases[0].trend, Trend::Down);
    assert!(forecast.phases[1..].iter().all(|p| p.trend == Trend::Stable));
}

#[test]
fn test_price_lookup_fallbacks() {
    let ctx = load("price_fallback");

    // Unknown crop encodes as Cotton, which has no history
    let err = ctx.forecast_price("Saffron", "Punjab").unwrap_err();
    assert!(matches!(err, AdvisorError::NotFound(_)));
    assert_eq!(err.to_string(), "No data for crop: Saffron");

    // Unknown state encodes as Bihar
    let forecast = ctx.forecast_price("Rice", "Kerala").unwrap();
    assert_eq!(forecast.base_price, 2000);
    assert_eq!(forecast.state, "Kerala");

    // No (Wheat, Bihar) row: first Wheat record answers
    let forecast = ctx.forecast_price("Wheat", "Bihar").unwrap();
    assert_eq!(forecast.base_price, 2400);
}

#[test]
fn test_seeded_forecast_with_noise_stays_in_band() {
    let ctx = AdvisorContext::load(&AdvisorConfig::default().with_models_dir(fixture_dir("noise")));
    let forecaster = ctx.price_forecaster().unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    let forecast = forecaster
        .forecast_at("Rice", "Punjab", ForecastMonth::new(2025, 12), &mut rng)
        .unwrap();
    for phase in &forecast.phases {
        assert!((2058..=2142).contains(&phase.price), "price {} outside ±2%", phase.price);
    }
}

#[test]
fn test_batch_forecast_keeps_query_order() {
    let ctx = load("batch");
    let queries = vec![
        PriceQuery { crop_name: "Wheat".into(), state: "Punjab".into() },
        PriceQuery { crop_name: "Saffron".into(), state: "Punjab".into() },
        PriceQuery { crop_name: "Rice".into(), state: "Bihar".into() },
    ];

    let results = ctx.forecast_prices(&queries).unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().base_price, 2400);
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().base_price, 2000);
}

#[test]
fn test_weather_summary_and_fallback() {
    let ctx = load("weather");

    let summary = ctx.summarize_weather("Punjab", 7).unwrap();
    assert_relative_eq!(summary.avg_temp, 31.3);
    assert_relative_eq!(summary.avg_rainfall, 180.4);
    assert_relative_eq!(summary.recent_temp, 32.0);
    assert_eq!(summary.avg_wind, Some(3.2));

    // Unknown state: first row for the month, recent fields default to averages
    let summary = ctx.summarize_weather("Goa", 7).unwrap();
    assert_relative_eq!(summary.avg_temp, 27.1);
    assert_relative_eq!(summary.recent_rainfall, 600.0);

    let err = ctx.summarize_weather("Punjab", 3).unwrap_err();
    assert!(matches!(err, AdvisorError::NotFound(_)));
}

#[test]
fn test_missing_price_artifacts_leave_other_components() {
    let dir = fixture_dir("partial");
    fs::remove_file(dir.join("price_model.json")).unwrap();

    let ctx = AdvisorContext::load(&AdvisorConfig::default().with_models_dir(&dir));
    let status = ctx.status();
    assert!(status.models_loaded);
    assert!(!status.price_model_loaded);
    assert!(status.weather_loaded);

    let err = ctx.forecast_price("Rice", "Punjab").unwrap_err();
    assert!(matches!(err, AdvisorError::Unavailable(_)));
    assert!(ctx.recommend(&canonical_request(Some("Loamy"))).is_ok());
}

#[test]
fn test_mismatched_class_count_disables_recommender() {
    let dir = fixture_dir("mismatch");
    fs::write(dir.join("crop_encoder.json"), encoder(&["Rice", "Wheat"])).unwrap();

    let ctx = AdvisorContext::load(&AdvisorConfig::default().with_models_dir(&dir));
    let err = ctx.recommend(&canonical_request(None)).unwrap_err();
    assert!(matches!(err, AdvisorError::Unavailable(_)));
}

#[test]
fn test_invalid_noise_band_disables_forecaster_only() {
    let mut config = AdvisorConfig::default().with_models_dir(fixture_dir("bad_noise"));
    config.forecast.noise_amplitude = f64::INFINITY;

    let ctx = AdvisorContext::load(&config);
    let status = ctx.status();
    assert!(!status.price_model_loaded);
    assert!(status.models_loaded);

    let err = ctx.forecast_price("Rice", "Punjab").unwrap_err();
    assert!(matches!(err, AdvisorError::Unavailable(_)));
}
