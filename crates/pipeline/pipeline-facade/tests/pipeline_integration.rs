//! Integration tests for the preprocessing facade.

use pipeline_facade::*;
use proptest::prelude::*;

fn seasonal(n: usize) -> TimeSeries {
    TimeSeries::univariate(
        (0..n)
            .map(|i| 100.0 + 10.0 * (i as f64 * std::f64::consts::PI / 6.0).sin())
            .collect(),
    )
}

#[test]
fn test_prepare_then_invert_targets() {
    let series = seasonal(120);
    let prepared = Preprocessor::new(PreprocessConfig::new(12, 3))
        .prepare(&series)
        .unwrap();

    let total = prepared.split.train.len() + prepared.split.validation.len() + prepared.split.test.len();
    assert_eq!(total, 120 - 12 - 3 + 1);

    let first = prepared.split.train.get(0).unwrap();
    let restored = prepared.inverse_targets(first.target).unwrap();
    for (k, value) in restored.iter().enumerate() {
        assert!((value - series.values()[12 + k]).abs() < 1e-9);
    }
}

#[test]
fn test_multivariate_preparation() {
    let rows: Vec<Vec<f64>> = (0..60)
        .map(|i| vec![i as f64, (i as f64).sqrt(), 5.0])
        .collect();
    let series = TimeSeries::multivariate(&rows).unwrap();
    let prepared = Preprocessor::new(PreprocessConfig::new(6, 2).with_target_column(1))
        .prepare(&series)
        .unwrap();

    assert_eq!(prepared.split.train.width(), 3);
    assert_eq!(prepared.split.train.get(0).unwrap().input.len(), 18);
    assert_eq!(prepared.last_window().len(), 18);
    // Constant third feature scales to zero.
    assert_eq!(prepared.scaled.column(2).unwrap(), vec![0.0; 60]);
}

#[test]
fn test_stationarity_advisory_does_not_block() {
    let series = TimeSeries::univariate((0..300).map(|i| i as f64 * 2.0).collect());
    let prepared = Preprocessor::new(PreprocessConfig::new(5, 1))
        .prepare(&series)
        .unwrap();
    assert!(!prepared.stationarity.is_stationary);
    let diffed = make_stationary(series.values(), StationarityMethod::Diff).unwrap();
    assert!(check_stationarity(&diffed).is_stationary);
}

#[test]
fn test_window_longer_than_series() {
    let result = Preprocessor::new(PreprocessConfig::new(30, 1)).prepare(&seasonal(20));
    assert!(matches!(result, Err(PipelineError::InsufficientData { .. })));
}

proptest! {
    #[test]
    fn prop_scaling_round_trip(
        values in prop::collection::vec(-1.0e6f64..1.0e6, 2..200),
        standard in any::<bool>(),
    ) {
        let kind = if standard { ScalerKind::Standard } else { ScalerKind::MinMax };
        let series = TimeSeries::univariate(values.clone());
        let mut scaler = ScalingTransform::new(kind);
        let scaled = scaler.fit_transform(&series).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();
        let span = values.iter().cloned().fold(0.0f64, |m, x| m.max(x.abs())).max(1.0);
        for (a, b) in restored.values().iter().zip(&values) {
            prop_assert!((a - b).abs() <= 1e-9 * span);
        }
    }
}
