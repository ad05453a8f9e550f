//! Integration tests: preprocessing through ensemble combination.

use std::collections::BTreeMap;

use forecast_facade::*;
use pipeline_facade::{PreprocessConfig, Preprocessor, TimeSeries};

fn seasonal(n: usize) -> TimeSeries {
    TimeSeries::univariate(
        (0..n)
            .map(|i| 50.0 + 0.2 * i as f64 + 5.0 * (i as f64 * std::f64::consts::PI / 6.0).sin())
            .collect(),
    )
}

fn small_models() -> ModelsConfig {
    ModelsConfig::default()
        .with_recurrent(RecurrentConfig::default().with_units(vec![8]))
        .with_convolutional(
            ConvolutionalConfig::default()
                .with_filters(vec![8, 8], vec![2, 2])
                .with_dense_units(vec![8]),
        )
        .with_training(
            TrainingConfig::default()
                .with_epochs(30)
                .with_learning_rate(0.01)
                .with_batch_size(16),
        )
}

#[test]
fn test_models_feed_ensemble() {
    let series = seasonal(160);
    let prepared = Preprocessor::new(PreprocessConfig::new(12, 2))
        .prepare(&series)
        .unwrap();
    let validation = &prepared.split.validation;
    assert!(!validation.is_empty());

    let mut outcomes = Vec::new();
    for kind in ModelKind::ALL {
        let mut model = AnyForecaster::new(kind, &small_models());
        let history = model
            .fit(&prepared.split.train, Some(validation))
            .unwrap();
        assert_eq!(history.val_loss.len(), history.epochs_run);

        let predicted = model.predict(validation.inputs()).unwrap();
        let mut actual_units = Vec::new();
        let mut predicted_units = Vec::new();
        for (p, t) in predicted.iter().zip(validation.targets()) {
            predicted_units.extend(prepared.inverse_targets(p).unwrap());
            actual_units.extend(prepared.inverse_targets(t).unwrap());
        }
        let error = rmse(&actual_units, &predicted_units);
        assert!(error.is_finite());

        let future = model.predict_future(&prepared.last_window(), 1).unwrap();
        let values = prepared.inverse_targets(&future[0]).unwrap();
        outcomes.push(ModelOutcome::prediction(kind.as_str(), values, error));
    }

    let result = InverseErrorCombiner::default()
        .combine(&outcomes, None)
        .unwrap();
    assert_eq!(result.horizon(), 2);
    let total: f64 = result.weights.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert_eq!(result.uncertainty.as_ref().map(Vec::len), Some(2));
    for step in 0..2 {
        let low = result
            .per_model_predictions
            .values()
            .map(|p| p[step])
            .fold(f64::INFINITY, f64::min);
        let high = result
            .per_model_predictions
            .values()
            .map(|p| p[step])
            .fold(f64::NEG_INFINITY, f64::max);
        let value = result.ensemble_prediction[step];
        assert!(value >= low - 1e-9 && value <= high + 1e-9);
    }
}

#[test]
fn test_fixed_seed_gives_identical_forecast() {
    let series = seasonal(100);
    let prepared = Preprocessor::new(PreprocessConfig::new(12, 1))
        .prepare(&series)
        .unwrap();
    let run = || {
        let mut model = AnyForecaster::new(ModelKind::Convolutional, &small_models());
        model.fit(&prepared.split.train, None).unwrap();
        model.predict_future(&prepared.last_window(), 3).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_inverse_error_scenario() {
    let outcomes = [
        ModelOutcome::prediction("lstm", vec![1.0], 0.1),
        ModelOutcome::prediction("cnn", vec![2.0], 0.2),
    ];
    let result = InverseErrorCombiner::default()
        .combine(&outcomes, None)
        .unwrap();
    assert!((result.weights["lstm"] - 0.667).abs() < 1e-3);
    assert!((result.weights["cnn"] - 0.333).abs() < 1e-3);
}

#[test]
fn test_explicit_weights_override() {
    let outcomes = [
        ModelOutcome::prediction("lstm", vec![10.0], 0.1),
        ModelOutcome::prediction("cnn", vec![20.0], 0.2),
    ];
    let weights = BTreeMap::from([("cnn".to_string(), 1.0)]);
    let result = InverseErrorCombiner::default()
        .combine(&outcomes, Some(&weights))
        .unwrap();
    assert_eq!(result.ensemble_prediction, vec![20.0]);
    assert_eq!(result.weights["lstm"], 0.0);
}

#[test]
fn test_predict_before_fit_is_not_fitted() {
    for kind in ModelKind::ALL {
        let model = AnyForecaster::new(kind, &ModelsConfig::default());
        assert_eq!(model.predict(&[vec![0.0; 24]]), Err(ForecastError::NotFitted));
        assert_eq!(
            model.predict_future(&[0.0; 24], 3),
            Err(ForecastError::NotFitted)
        );
    }
}

#[test]
fn test_persisted_model_keeps_forecast() {
    let series = seasonal(80);
    let prepared = Preprocessor::new(PreprocessConfig::new(8, 1))
        .prepare(&series)
        .unwrap();
    let mut model = AnyForecaster::new(ModelKind::Recurrent, &small_models());
    model.fit(&prepared.split.train, None).unwrap();

    let blob = serde_json::to_string(&model).unwrap();
    let restored: AnyForecaster = serde_json::from_str(&blob).unwrap();
    assert_eq!(
        restored.predict_future(&prepared.last_window(), 2).unwrap(),
        model.predict_future(&prepared.last_window(), 2).unwrap()
    );
    assert!(restored.summary().contains("lstm"));
}

#[test]
fn test_trend_model_band_and_metrics() {
    let values: Vec<f64> = seasonal(96).values().to_vec();
    let mut model = TrendSeasonalModel::new(TrendModelConfig::default().with_period(12));
    model.fit(&values).unwrap();

    let band = model.fitted().unwrap();
    let summary = MetricsSummary::compute(&values, &band.forecast);
    assert!(summary.r2 > 0.9);
    assert!(summary.rmse < 2.0);

    let ahead = model.forecast(values.len(), 12).unwrap();
    assert_eq!(ahead.len(), 12);
    assert!(ahead.upper.iter().zip(&ahead.lower).all(|(u, l)| u > l));
}
