//! State-transition anomaly detector.
//!
//! Fits a [`GaussianHmm`] on the first differences of the series and
//! scores every step by its surprise under the model. The threshold is a
//! percentile of the fitting scores.

use anomaly_api::StateTransitionConfig;
use anomaly_spi::{
    AnomalyDetector, AnomalyError, AnomalyScoreSeries, DetectorKind, FitSummary, Result,
};
use pipeline_core::difference;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::hmm::GaussianHmm;

/// Fewest observations the detector accepts.
pub const MIN_OBSERVATIONS: usize = 50;

/// Linear-interpolation percentile of `values`, `q` in `[0, 100]`.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Fitted {
    model: GaussianHmm,
    scores: Vec<f64>,
    hidden_states: Vec<usize>,
    threshold: f64,
    summary: FitSummary,
}

/// Hidden Markov model detector over first differences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransitionDetector {
    config: StateTransitionConfig,
    fitted: Option<Fitted>,
}

impl StateTransitionDetector {
    pub fn new(config: StateTransitionConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &StateTransitionConfig {
        &self.config
    }

    /// One observation per difference: `[d]`, or `[d, |d|]` with the
    /// absolute-difference feature.
    fn features(&self, data: &[f64]) -> Vec<Vec<f64>> {
        difference(data, 1)
            .into_iter()
            .map(|d| {
                if self.config.use_abs_diff {
                    vec![d, d.abs()]
                } else {
                    vec![d]
                }
            })
            .collect()
    }

    fn fitted(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or(AnomalyError::NotFitted)
    }

    /// Scores of the differences only, one shorter than `data`.
    fn difference_scores(&self, model: &GaussianHmm, data: &[f64]) -> Result<Vec<f64>> {
        if data.len() < 2 {
            return Err(AnomalyError::InsufficientData {
                required: 2,
                actual: data.len(),
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(AnomalyError::invalid("data", "values must be finite"));
        }
        model.point_scores(&self.features(data))
    }

    /// The model fitted by the last call to `fit`.
    pub fn model(&self) -> Option<&GaussianHmm> {
        self.fitted.as_ref().map(|f| &f.model)
    }

    /// Viterbi state per difference of the fitting data.
    pub fn hidden_states(&self) -> Result<&[usize]> {
        Ok(&self.fitted()?.hidden_states)
    }

    pub fn transition_matrix(&self) -> Result<&[Vec<f64>]> {
        Ok(self.fitted()?.model.transition_matrix())
    }

    pub fn state_means(&self) -> Result<&[Vec<f64>]> {
        Ok(self.fitted()?.model.means())
    }

    pub fn summary(&self) -> Result<&FitSummary> {
        Ok(&self.fitted()?.summary)
    }

    fn flag(&self, scores: Vec<f64>, threshold: f64) -> AnomalyScoreSeries {
        let flags = scores
            .iter()
            .enumerate()
            .map(|(i, &s)| i > 0 && s > threshold)
            .collect();
        AnomalyScoreSeries::new(DetectorKind::StateTransition, scores, flags, threshold)
    }
}

impl Default for StateTransitionDetector {
    fn default() -> Self {
        Self::new(StateTransitionConfig::default())
    }
}

/// Index 0 has no difference; it takes the smallest score so it is never
/// flagged.
fn align_to_series(mut scores: Vec<f64>) -> Vec<f64> {
    let floor = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    scores.insert(0, floor);
    scores
}

impl AnomalyDetector for StateTransitionDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::StateTransition
    }

    fn fit(&mut self, data: &[f64]) -> Result<FitSummary> {
        self.config.validate()?;
        if data.len() < MIN_OBSERVATIONS {
            return Err(AnomalyError::InsufficientData {
                required: MIN_OBSERVATIONS,
                actual: data.len(),
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(AnomalyError::invalid("data", "values must be finite"));
        }

        let features = self.features(data);
        let model = GaussianHmm::fit(&features, &self.config)?;
        let raw = model.point_scores(&features)?;
        let threshold = percentile(&raw, self.config.threshold * 100.0)
            .ok_or_else(|| AnomalyError::DetectionError("no scores to threshold".into()))?;
        let hidden_states = model.viterbi(&features)?;

        let summary = FitSummary {
            method: DetectorKind::StateTransition,
            observations: data.len(),
            threshold,
            converged: model.converged(),
            iterations: model.iterations(),
            log_likelihood: Some(model.fitted_log_likelihood()),
        };
        info!(
            observations = data.len(),
            states = model.n_components(),
            converged = model.converged(),
            iterations = model.iterations(),
            threshold,
            "State-transition detector fitted"
        );
        self.fitted = Some(Fitted {
            model,
            scores: align_to_series(raw),
            hidden_states,
            threshold,
            summary: summary.clone(),
        });
        Ok(summary)
    }

    fn score(&self, data: &[f64]) -> Result<Vec<f64>> {
        let fitted = self.fitted()?;
        Ok(align_to_series(self.difference_scores(&fitted.model, data)?))
    }

    fn detect_fitted(&self) -> Result<AnomalyScoreSeries> {
        let fitted = self.fitted()?;
        Ok(self.flag(fitted.scores.clone(), fitted.threshold))
    }

    fn detect(&self, data: &[f64]) -> Result<AnomalyScoreSeries> {
        let threshold = self.fitted()?.threshold;
        Ok(self.flag(self.score(data)?, threshold))
    }

    fn threshold(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.threshold)
    }

    fn min_observations(&self) -> usize {
        MIN_OBSERVATIONS
    }
}
