//! Integration tests: both detectors feeding the consensus report.

use anomaly_facade::*;

/// Daily-ish pattern around 2.0 with a slow rise and deterministic jitter.
fn signal(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            2.0 + 0.001 * i as f64
                + 0.2 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin()
                + ((i * 7) % 5) as f64 * 0.01
        })
        .collect()
}

fn quick_config() -> DetectorsConfig {
    DetectorsConfig {
        state_transition: StateTransitionConfig::default()
            .with_components(3)
            .with_iterations(200, 0.01),
        trend: TrendDetectorConfig::default(),
    }
}

fn run_all(data: &[f64], config: &DetectorsConfig) -> AnomalyReport {
    let series = DetectorKind::ALL
        .iter()
        .map(|&kind| {
            let mut detector = detector_for(kind, config);
            detector.fit(data).unwrap();
            detector.detect_fitted().unwrap()
        })
        .collect();
    UnionConsensus.merge(series).unwrap()
}

#[test]
fn test_spike_enters_consensus() {
    let mut data = signal(150);
    data[90] = 6.0;
    let report = run_all(&data, &quick_config());

    assert!(report.is_anomaly(90));
    assert_eq!(report.per_method.len(), 2);
    for (kind, series) in &report.per_method {
        assert_eq!(series.len(), data.len());
        assert_eq!(report.method_confidence[kind], series.confidence());
        for i in series.anomaly_indices() {
            assert!(report.consensus_indices.contains(&i));
        }
    }
    let mut sorted = report.consensus_indices.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted, report.consensus_indices);
}

#[test]
fn test_constant_series_under_state_transition() {
    let mut detector = StateTransitionDetector::new(
        StateTransitionConfig::default().with_sensitivity(0.95),
    );
    detector.fit(&[3.5; 50]).unwrap();
    let series = detector.detect_fitted().unwrap();
    assert!(series.anomaly_count() <= 5);
}

#[test]
fn test_sensitivity_shapes_both_detectors() {
    let config = quick_config().with_sensitivity(0.8).unwrap();
    let data = signal(120);

    let mut hmm = detector_for(DetectorKind::StateTransition, &config);
    hmm.fit(&data).unwrap();
    let strict = hmm.detect_fitted().unwrap();

    let loose_config = quick_config().with_sensitivity(0.99).unwrap();
    let mut loose = detector_for(DetectorKind::StateTransition, &loose_config);
    loose.fit(&data).unwrap();
    assert!(strict.anomaly_count() >= loose.detect_fitted().unwrap().anomaly_count());
}

#[test]
fn test_thresholds_survive_new_data() {
    let data = signal(120);
    let config = quick_config();
    for kind in DetectorKind::ALL {
        let mut detector = detector_for(kind, &config);
        let summary = detector.fit(&data).unwrap();
        let fresh = detector.detect(&signal(24)).unwrap();
        assert_eq!(fresh.threshold, summary.threshold, "{}", kind);
        assert_eq!(fresh.len(), 24);
    }
}

#[test]
fn test_labelled_evaluation() {
    let mut data = signal(150);
    let mut labels = vec![false; 150];
    for &i in &[40, 100] {
        data[i] += 5.0;
        labels[i] = true;
    }
    let report = run_all(&data, &quick_config());
    let metrics = evaluate(&report.consensus_mask(150), &labels).unwrap();
    assert_eq!(metrics.true_positives, 2);
    assert_eq!(metrics.recall, 1.0);
}

#[test]
fn test_report_json_shape() {
    let mut data = signal(100);
    data[60] = 5.0;
    let report = run_all(&data, &quick_config());
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["per_method"]["hmm"]["scores"].is_array());
    assert!(json["per_method"]["trend"]["flags"].is_array());
    assert!(json["method_confidence"]["trend"].is_number());
    assert!(json["consensus_indices"].is_array());
}

#[test]
fn test_recommendations() {
    assert_eq!(recommend_detector(false, true), DetectorKind::TrendDecomposition);
    assert_eq!(recommend_detector(false, false), DetectorKind::StateTransition);
}
