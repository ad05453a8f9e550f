//! Scoring detections against known labels.

use anomaly_spi::{AnomalyError, AnomalyMetrics, Result};

/// Confusion-matrix metrics of `predicted` flags against `actual` labels.
pub fn evaluate(predicted: &[bool], actual: &[bool]) -> Result<AnomalyMetrics> {
    if predicted.len() != actual.len() {
        return Err(AnomalyError::invalid(
            "labels",
            format!(
                "{} predictions for {} labels",
                predicted.len(),
                actual.len()
            ),
        ));
    }
    let (mut tp, mut fp, mut fn_, mut tn) = (0, 0, 0, 0);
    for (&p, &a) in predicted.iter().zip(actual) {
        match (p, a) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => tn += 1,
        }
    }
    Ok(AnomalyMetrics::from_counts(tp, fp, fn_, tn))
}
