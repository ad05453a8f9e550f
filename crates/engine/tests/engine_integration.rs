//! End-to-end requests against a file-backed registry.

use engine::{
    AnomalyRequest, DetectorKind, Engine, EngineConfig, ForecastRequest, ModelKind, TimeSeries,
};
use forecast_facade::{ConvolutionalConfig, ModelsConfig, RecurrentConfig, TrainingConfig};
use registry_facade::RegistryConfig;

fn config(root: &std::path::Path) -> EngineConfig {
    EngineConfig::default()
        .with_registry(RegistryConfig::file(root))
        .with_models(
            ModelsConfig::default()
                .with_recurrent(RecurrentConfig::default().with_units(vec![4]))
                .with_convolutional(
                    ConvolutionalConfig::default()
                        .with_filters(vec![4], vec![2])
                        .with_dense_units(vec![4]),
                )
                .with_training(TrainingConfig::default().with_epochs(5)),
        )
}

fn weekly(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            1.0 + 0.002 * i as f64
                + 0.1 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin()
                + ((i * 17) % 5) as f64 * 0.004
        })
        .collect()
}

fn seasonal(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 50.0 + 0.1 * i as f64 + 5.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin())
        .collect()
}

#[test]
fn test_forecast_response_json_shape() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::from_config(config(dir.path())).unwrap();
    let request = ForecastRequest::new(ModelKind::ALL.to_vec(), 12, 2);
    let response = engine
        .forecast(&TimeSeries::univariate(seasonal(150)), &request)
        .unwrap();

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["ensemble_prediction"].as_array().unwrap().len(), 2);
    assert!(json["per_model_predictions"]["lstm"].is_array());
    assert!(json["per_model_predictions"]["cnn"].is_array());
    assert_eq!(json["uncertainty"].as_array().unwrap().len(), 2);
    assert!(json.get("saved").is_none());

    let sum: f64 = response.result.weights.values().sum();
    assert!((sum - 1.0).abs() < 1e-9);
}

#[test]
fn test_explicit_weights_override_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::from_config(config(dir.path())).unwrap();
    let weights = [("lstm".to_string(), 3.0), ("cnn".to_string(), 1.0)]
        .into_iter()
        .collect();
    let request = ForecastRequest::new(ModelKind::ALL.to_vec(), 12, 1).with_weights(weights);
    let response = engine
        .forecast(&TimeSeries::univariate(seasonal(120)), &request)
        .unwrap();
    assert_eq!(response.result.weights["lstm"], 0.75);
    assert_eq!(response.result.weights["cnn"], 0.25);
}

#[test]
fn test_saved_models_survive_a_new_engine() {
    let dir = tempfile::tempdir().unwrap();
    let series = TimeSeries::univariate(seasonal(120));
    let request = ForecastRequest::new(vec![ModelKind::Convolutional], 12, 1)
        .with_persist_as("monthly");
    let response = Engine::from_config(config(dir.path()))
        .unwrap()
        .forecast(&series, &request)
        .unwrap();
    assert!(dir.path().join("monthly_cnn.json").exists());

    let reopened = Engine::from_config(config(dir.path())).unwrap();
    assert_eq!(reopened.list_models().unwrap(), vec!["monthly_cnn"]);
    let forecast = reopened.forecast_with("monthly_cnn", &series, 1).unwrap();
    assert!((forecast[0] - response.result.ensemble_prediction[0]).abs() < 1e-6);

    let ahead = reopened.forecast_with("monthly_cnn", &series, 4).unwrap();
    assert_eq!(ahead.len(), 4);
}

#[test]
fn test_anomaly_report_json_shape() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::from_config(config(dir.path())).unwrap();
    // Small-magnitude weekly pattern; the band deviation is measured
    // relative to each value.
    let mut values = weekly(120);
    values[60] = 3.0;
    let response = engine
        .detect(&values, &AnomalyRequest::new(DetectorKind::ALL.to_vec()))
        .unwrap();

    let json = serde_json::to_value(&response).unwrap();
    assert!(json.get("saved").is_none());
    for method in ["hmm", "trend"] {
        let series = &json["per_method"][method];
        assert_eq!(series["scores"].as_array().unwrap().len(), 120);
        assert_eq!(series["flags"].as_array().unwrap().len(), 120);
        assert!(series["threshold"].is_number());
        let confidence = json["method_confidence"][method].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
    }
    assert!(response.report.is_anomaly(60));
}

#[test]
fn test_error_payload_for_unknown_model() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::from_config(config(dir.path())).unwrap();
    let series = TimeSeries::univariate(seasonal(40));
    let payload = engine
        .forecast_with("nope", &series, 1)
        .unwrap_err()
        .to_payload();
    assert_eq!(payload.kind, "model_not_found");
}

#[test]
fn test_saved_detectors_survive_a_new_engine() {
    let dir = tempfile::tempdir().unwrap();
    let data = weekly(140);
    let request =
        AnomalyRequest::new(vec![DetectorKind::TrendDecomposition]).with_persist_as("weekly");
    let fitted = Engine::from_config(config(dir.path()))
        .unwrap()
        .detect(&data[..112], &request)
        .unwrap();
    assert!(dir.path().join("weekly_trend.json").exists());
    let threshold = fitted.report.per_method[&DetectorKind::TrendDecomposition].threshold;

    let reopened = Engine::from_config(config(dir.path())).unwrap();
    let mut tail = data[112..].to_vec();
    tail[10] = 4.0;
    let report = reopened.detect_with(&["weekly_trend"], &tail).unwrap();
    let reloaded = report.per_method[&DetectorKind::TrendDecomposition].threshold;
    assert!((reloaded - threshold).abs() < 1e-12);
    assert!(report.is_anomaly(10));

    let mut labels = vec![false; tail.len()];
    labels[10] = true;
    let metrics = reopened
        .evaluate_detector("weekly_trend", &tail, &labels)
        .unwrap();
    assert_eq!(metrics.true_positives, 1);
}

#[test]
fn test_recommendation_json_shape() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::from_config(config(dir.path())).unwrap();
    let recommendation = engine
        .recommend(&TimeSeries::univariate(seasonal(150)), 12)
        .unwrap();
    let json = serde_json::to_value(&recommendation).unwrap();
    assert_eq!(json["forecaster"], "cnn");
    assert_eq!(json["samples"], 150);
    assert!(json["has_trend"].is_boolean());
    assert!(json["has_seasonality"].is_boolean());
    assert!(["hmm", "trend"].contains(&json["detector"].as_str().unwrap()));
}
