//! Trend-decomposition anomaly detector.
//!
//! Points outside the trend + seasonal prediction band are candidates. The
//! deviation past the band, relative to the point's own magnitude, must
//! also exceed `range_fraction` of the fitting data's value range.

use anomaly_api::TrendDetectorConfig;
use anomaly_spi::{
    AnomalyDetector, AnomalyError, AnomalyScoreSeries, DetectorKind, FitSummary, Result,
};
use forecast_core::TrendSeasonalModel;
use forecast_spi::ConfidenceInterval;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Fewest observations the detector accepts.
pub const MIN_OBSERVATIONS: usize = 10;

/// Relative excess at or below this is rounding in the band arithmetic. A
/// flat fitting series has a zero threshold and a collapsed band.
pub const MIN_RELATIVE_EXCESS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Fitted {
    model: TrendSeasonalModel,
    values: Vec<f64>,
    threshold: f64,
}

/// Band detector on a [`TrendSeasonalModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendDetector {
    config: TrendDetectorConfig,
    fitted: Option<Fitted>,
}

/// Deviation past the band relative to `value`; 0 inside the band. A zero
/// value uses the absolute deviation.
pub fn band_importance(value: f64, lower: f64, upper: f64) -> f64 {
    let excess = if value > upper {
        value - upper
    } else if value < lower {
        lower - value
    } else {
        return 0.0;
    };
    if value == 0.0 {
        excess
    } else {
        excess / value.abs()
    }
}

impl TrendDetector {
    pub fn new(config: TrendDetectorConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &TrendDetectorConfig {
        &self.config
    }

    fn fitted(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or(AnomalyError::NotFitted)
    }

    /// The decomposition fitted by the last call to `fit`.
    pub fn model(&self) -> Option<&TrendSeasonalModel> {
        self.fitted.as_ref().map(|f| &f.model)
    }

    /// Band over `len` points following the fitting window.
    fn continuation(&self, fitted: &Fitted, len: usize) -> Result<ConfidenceInterval> {
        Ok(fitted.model.forecast(fitted.values.len(), len)?)
    }

    fn flag(values: &[f64], band: &ConfidenceInterval, threshold: f64) -> AnomalyScoreSeries {
        let cutoff = threshold.max(MIN_RELATIVE_EXCESS);
        let scores: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| band_importance(v, band.lower[i], band.upper[i]))
            .collect();
        let flags = values
            .iter()
            .zip(&scores)
            .enumerate()
            .map(|(i, (&v, &s))| band.is_outside(i, v) && s > cutoff)
            .collect();
        AnomalyScoreSeries::new(DetectorKind::TrendDecomposition, scores, flags, threshold)
    }
}

impl Default for TrendDetector {
    fn default() -> Self {
        Self::new(TrendDetectorConfig::default())
    }
}

impl AnomalyDetector for TrendDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::TrendDecomposition
    }

    fn fit(&mut self, data: &[f64]) -> Result<FitSummary> {
        self.config.validate()?;
        if data.len() < MIN_OBSERVATIONS {
            return Err(AnomalyError::InsufficientData {
                required: MIN_OBSERVATIONS,
                actual: data.len(),
            });
        }
        let mut model = TrendSeasonalModel::new(self.config.model.clone());
        model.fit(data)?;

        let (min, max) = data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let threshold = self.config.range_fraction * (max - min);
        info!(
            observations = data.len(),
            period = ?model.period(),
            threshold,
            "Trend detector fitted"
        );
        self.fitted = Some(Fitted {
            model,
            values: data.to_vec(),
            threshold,
        });
        Ok(FitSummary {
            method: DetectorKind::TrendDecomposition,
            observations: data.len(),
            threshold,
            converged: true,
            iterations: 1,
            log_likelihood: None,
        })
    }

    fn score(&self, data: &[f64]) -> Result<Vec<f64>> {
        let fitted = self.fitted()?;
        let band = self.continuation(fitted, data.len())?;
        Ok(data
            .iter()
            .enumerate()
            .map(|(i, &v)| band_importance(v, band.lower[i], band.upper[i]))
            .collect())
    }

    fn detect_fitted(&self) -> Result<AnomalyScoreSeries> {
        let fitted = self.fitted()?;
        let band = fitted.model.fitted()?;
        Ok(Self::flag(&fitted.values, &band, fitted.threshold))
    }

    fn detect(&self, data: &[f64]) -> Result<AnomalyScoreSeries> {
        let fitted = self.fitted()?;
        if data.iter().any(|v| !v.is_finite()) {
            return Err(AnomalyError::invalid("data", "values must be finite"));
        }
        let band = self.continuation(fitted, data.len())?;
        Ok(Self::flag(data, &band, fitted.threshold))
    }

    fn threshold(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.threshold)
    }

    fn min_observations(&self) -> usize {
        MIN_OBSERVATIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_api::{SeasonalityMode, TrendModelConfig};

    /// Gently rising weekly pattern around 1.0 with deterministic jitter.
    fn weekly(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                1.0 + 0.002 * i as f64
                    + 0.1 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin()
                    + ((i * 17) % 5) as f64 * 0.004
            })
            .collect()
    }

    #[test]
    fn test_band_importance() {
        assert_eq!(band_importance(5.0, 4.0, 6.0), 0.0);
        assert_eq!(band_importance(8.0, 4.0, 6.0), 0.25);
        assert_eq!(band_importance(2.0, 4.0, 6.0), 1.0);
        assert_eq!(band_importance(0.0, 1.0, 2.0), 1.0);
        assert_eq!(band_importance(-2.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_spike_is_flagged() {
        let mut data = weekly(140);
        data[100] = 3.0;
        let mut detector = TrendDetector::default();
        let summary = detector.fit(&data).unwrap();
        assert!(summary.threshold > 0.0);

        let series = detector.detect_fitted().unwrap();
        assert_eq!(series.len(), 140);
        assert!(series.flags[100]);
        assert_eq!(series.anomaly_indices(), vec![100]);
    }

    #[test]
    fn test_flag_requires_range_fraction() {
        let mut data = weekly(140);
        data[100] = 3.0;
        let mut detector = TrendDetector::new(TrendDetectorConfig::default().with_range_fraction(1.0));
        detector.fit(&data).unwrap();
        let series = detector.detect_fitted().unwrap();
        assert_eq!(series.anomaly_count(), 0);
        assert!(series.scores[100] > 0.0);
    }

    #[test]
    fn test_new_data_is_a_continuation() {
        let data = weekly(140);
        let mut detector = TrendDetector::new(
            TrendDetectorConfig::default().with_model(
                TrendModelConfig::default().with_seasonality_mode(SeasonalityMode::Additive),
            ),
        );
        detector.fit(&data[..112]).unwrap();
        let threshold = detector.threshold().unwrap();

        let mut tail = data[112..].to_vec();
        let clean = detector.detect(&tail).unwrap();
        assert_eq!(clean.anomaly_count(), 0);

        tail[5] = 4.0;
        let spiked = detector.detect(&tail).unwrap();
        assert_eq!(spiked.threshold, threshold);
        assert_eq!(spiked.anomaly_indices(), vec![5]);
    }

    #[test]
    fn test_constant_series_flags_nothing() {
        for v in [3.5, 0.1, 1234.5678] {
            let mut detector = TrendDetector::default();
            let summary = detector.fit(&vec![v; 50]).unwrap();
            assert_eq!(summary.threshold, 0.0);
            let series = detector.detect_fitted().unwrap();
            assert_eq!(series.anomaly_count(), 0, "flat at {}", v);

            let mut next = vec![v; 10];
            next[3] = 2.0 * v;
            assert_eq!(detector.detect(&next).unwrap().anomaly_indices(), vec![3]);
        }
    }

    #[test]
    fn test_minimum_observations() {
        let mut detector = TrendDetector::default();
        assert_eq!(
            detector.fit(&[1.0; 9]),
            Err(AnomalyError::InsufficientData {
                required: 10,
                actual: 9
            })
        );
    }

    #[test]
    fn test_not_fitted() {
        let detector = TrendDetector::default();
        assert_eq!(detector.score(&[1.0]), Err(AnomalyError::NotFitted));
        assert!(detector.threshold().is_none());
    }

    #[test]
    fn test_invalid_model_config_surfaces() {
        let config = TrendDetectorConfig::default()
            .with_model(TrendModelConfig::default().with_interval_width(1.5));
        let mut detector = TrendDetector::new(config);
        assert!(matches!(
            detector.fit(&weekly(20)),
            Err(AnomalyError::Forecast(_))
        ));
    }
}
