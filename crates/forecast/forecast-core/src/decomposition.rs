//! Trend + seasonal decomposition with a prediction band.
//!
//! The trend is piecewise linear with potential changepoints spread over
//! the first `changepoint_range` of the history. Changepoint slopes are
//! shrunk by a ridge penalty whose strength follows from
//! `changepoint_prior_scale`. A per-phase seasonal profile is estimated on
//! the detrended series, either additively or multiplicatively, and the
//! band is `yhat ± z(interval_width)·σ` where `σ` is the residual standard
//! deviation over the fitting window.

use forecast_api::{SeasonalityMode, TrendModelConfig};
use forecast_spi::{
    ConfidenceInterval, DecompositionResult, ForecastError, Result, SeasonalityDetector,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::confidence::{prediction_band, residual_std};
use crate::seasonality::AutocorrelationDetector;

/// Fewest observations the trend fit accepts.
pub const MIN_FIT_OBSERVATIONS: usize = 3;

/// Highest Fourier order used for the seasonal terms.
const MAX_FOURIER_ORDER: usize = 10;

/// Detrended scaled series with less spread than this has no seasonality.
const FLAT_RESIDUAL_STD: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedComponents {
    n: usize,
    scale: f64,
    /// Changepoint positions on the normalised time axis.
    changepoints: Vec<f64>,
    /// Intercept, base slope, then one slope change per changepoint.
    coefficients: Vec<f64>,
    period: Option<usize>,
    /// One value per phase, in original units (additive) or as factors.
    profile: Vec<f64>,
    multiplicative: bool,
    sigma: f64,
    values: Vec<f64>,
    trend: Vec<f64>,
    fitted: Vec<f64>,
}

impl FittedComponents {
    fn trend_at(&self, i: usize) -> f64 {
        let t = i as f64 / (self.n - 1) as f64;
        trend_value(t, &self.changepoints, &self.coefficients) * self.scale
    }

    fn seasonal_at(&self, i: usize) -> f64 {
        match self.period {
            Some(p) => self.profile[i % p],
            None if self.multiplicative => 1.0,
            None => 0.0,
        }
    }

    fn combine(&self, trend: f64, seasonal: f64) -> f64 {
        if self.multiplicative {
            trend * seasonal
        } else {
            trend + seasonal
        }
    }
}

/// Piecewise-linear trend plus seasonal profile, fitted once and queried
/// for in-sample bands or extrapolated forecasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeasonalModel {
    config: TrendModelConfig,
    components: Option<FittedComponents>,
}

impl TrendSeasonalModel {
    pub fn new(config: TrendModelConfig) -> Self {
        Self {
            config,
            components: None,
        }
    }

    pub fn config(&self) -> &TrendModelConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.components.is_some()
    }

    /// Seasonal period in use, if any.
    pub fn period(&self) -> Option<usize> {
        self.components.as_ref().and_then(|c| c.period)
    }

    /// Residual standard deviation over the fitting window.
    pub fn residual_sigma(&self) -> Option<f64> {
        self.components.as_ref().map(|c| c.sigma)
    }

    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        self.config.validate()?;
        let n = values.len();
        if n < MIN_FIT_OBSERVATIONS {
            return Err(ForecastError::InsufficientData {
                required: MIN_FIT_OBSERVATIONS,
                actual: n,
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::invalid("values", "must be finite"));
        }

        let scale = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let y: Vec<f64> = values.iter().map(|v| v / scale).collect();
        let times: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
        let changepoints = changepoint_positions(&times, &self.config);

        // Plain linear detrend drives period detection.
        let linear = Design::new(&[], None);
        let linear_resid = linear.residuals(&times, &y, &linear.solve(&times, &y, 0.0)?);
        let period = self
            .config
            .period
            .or_else(|| {
                (residual_std(&linear_resid) > FLAT_RESIDUAL_STD)
                    .then(|| {
                        AutocorrelationDetector::new().detect(&linear_resid, self.config.max_period)
                    })
                    .flatten()
            })
            .filter(|&p| {
                let fits = n >= 2 * p;
                if !fits {
                    debug!(period = p, n, "Series too short for seasonal profile");
                }
                fits
            });

        // Penalty baseline: residual variance without changepoints.
        let baseline = Design::new(&[], period);
        let baseline_resid = baseline.residuals(&times, &y, &baseline.solve(&times, &y, 0.0)?);
        let variance = residual_std(&baseline_resid).powi(2);
        let penalty = variance.max(1e-6) / self.config.changepoint_prior_scale.powi(2);

        let joint = Design::new(&changepoints, period);
        let beta = joint.solve(&times, &y, penalty)?;
        let trend_terms = changepoints.len() + 2;
        let mut coefficients = beta[..trend_terms].to_vec();
        let mut trend: Vec<f64> = times
            .iter()
            .map(|&t| trend_value(t, &changepoints, &coefficients))
            .collect();

        let mut multiplicative = self.config.seasonality_mode == SeasonalityMode::Multiplicative;
        if multiplicative && trend.iter().any(|&t| t <= 0.0) {
            warn!("Non-positive trend; falling back to additive seasonality");
            multiplicative = false;
        }

        let profile = match period {
            None => Vec::new(),
            Some(p) if !multiplicative => (0..p)
                .map(|phase| {
                    fourier_terms(phase, p)
                        .iter()
                        .zip(&beta[trend_terms..])
                        .map(|(x, b)| x * b)
                        .sum::<f64>()
                        * scale
                })
                .collect(),
            Some(p) => {
                // Alternate: factors from the trend, trend from the
                // deseasonalised series.
                let trend_only = Design::new(&changepoints, None);
                let factors = seasonal_factors(&y, &trend, p);
                let deseasonalised: Vec<f64> = y
                    .iter()
                    .enumerate()
                    .map(|(i, v)| v / factors[i % p])
                    .collect();
                let refit = trend_only.solve(&times, &deseasonalised, penalty)?;
                let refit_trend: Vec<f64> = times
                    .iter()
                    .map(|&t| trend_value(t, &changepoints, &refit))
                    .collect();
                if refit_trend.iter().all(|&t| t > 0.0) {
                    coefficients = refit;
                    trend = refit_trend;
                }
                seasonal_factors(&y, &trend, p)
            }
        };

        let mut components = FittedComponents {
            n,
            scale,
            changepoints,
            coefficients,
            period,
            profile,
            multiplicative,
            sigma: 0.0,
            values: values.to_vec(),
            trend: trend.iter().map(|t| t * scale).collect(),
            fitted: Vec::new(),
        };
        components.fitted = (0..n)
            .map(|i| components.combine(components.trend[i], components.seasonal_at(i)))
            .collect();
        let residuals: Vec<f64> = values
            .iter()
            .zip(&components.fitted)
            .map(|(y, f)| y - f)
            .collect();
        components.sigma = residual_std(&residuals);

        debug!(
            n,
            changepoints = components.changepoints.len(),
            period = components.period,
            multiplicative,
            sigma = components.sigma,
            "Trend model fitted"
        );
        self.components = Some(components);
        Ok(())
    }

    /// In-sample fitted values with the prediction band.
    pub fn fitted(&self) -> Result<ConfidenceInterval> {
        let c = self.components.as_ref().ok_or(ForecastError::NotFitted)?;
        prediction_band(c.fitted.clone(), c.sigma, self.config.interval_width)
    }

    /// Band for `len` steps starting at index `start` of the fitting
    /// timeline; indices past the fitting window extrapolate the trend and
    /// continue the seasonal phase.
    pub fn forecast(&self, start: usize, len: usize) -> Result<ConfidenceInterval> {
        let c = self.components.as_ref().ok_or(ForecastError::NotFitted)?;
        let center = (start..start + len)
            .map(|i| c.combine(c.trend_at(i), c.seasonal_at(i)))
            .collect();
        prediction_band(center, c.sigma, self.config.interval_width)
    }

    /// Trend, seasonal and residual components of the fitting data.
    pub fn components(&self) -> Result<DecompositionResult> {
        let c = self.components.as_ref().ok_or(ForecastError::NotFitted)?;
        let seasonal: Vec<f64> = (0..c.n).map(|i| c.seasonal_at(i)).collect();
        let residual = c
            .values
            .iter()
            .zip(&c.fitted)
            .map(|(y, f)| y - f)
            .collect();
        Ok(DecompositionResult {
            trend: c.trend.clone(),
            seasonal,
            residual,
            period: c.period,
            multiplicative: c.multiplicative,
        })
    }
}

impl Default for TrendSeasonalModel {
    fn default() -> Self {
        Self::new(TrendModelConfig::default())
    }
}

// ============================================================================
// Least squares
// ============================================================================

fn changepoint_positions(times: &[f64], config: &TrendModelConfig) -> Vec<f64> {
    let history = ((times.len() as f64) * config.changepoint_range).floor() as usize;
    let count = config.n_changepoints.min(history.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }
    // Evenly spaced over the history, skipping the first point.
    let last = (history - 1) as f64;
    let mut positions: Vec<f64> = (1..=count)
        .map(|j| times[(j as f64 * last / count as f64).round() as usize])
        .collect();
    positions.dedup();
    positions
}

fn trend_value(t: f64, changepoints: &[f64], coefficients: &[f64]) -> f64 {
    coefficients[0]
        + coefficients[1] * t
        + changepoints
            .iter()
            .zip(&coefficients[2..])
            .map(|(&s, &delta)| delta * (t - s).max(0.0))
            .sum::<f64>()
}

fn fourier_order(period: usize) -> usize {
    (period / 2).min(MAX_FOURIER_ORDER)
}

/// Cosine and sine terms for `phase` of a `period`; the sine at the
/// Nyquist order is identically zero and is left out.
fn fourier_terms(phase: usize, period: usize) -> Vec<f64> {
    let mut terms = Vec::with_capacity(2 * fourier_order(period));
    for k in 1..=fourier_order(period) {
        let angle = 2.0 * std::f64::consts::PI * (k * phase) as f64 / period as f64;
        terms.push(angle.cos());
        if 2 * k != period {
            terms.push(angle.sin());
        }
    }
    terms
}

/// Columns: intercept, slope, one hinge per changepoint, then the Fourier
/// terms of the seasonal period.
struct Design<'a> {
    changepoints: &'a [f64],
    period: Option<usize>,
}

impl<'a> Design<'a> {
    fn new(changepoints: &'a [f64], period: Option<usize>) -> Self {
        Self {
            changepoints,
            period,
        }
    }

    fn row(&self, i: usize, t: f64) -> Vec<f64> {
        let mut row = vec![1.0, t];
        row.extend(self.changepoints.iter().map(|&s| (t - s).max(0.0)));
        if let Some(p) = self.period {
            row.extend(fourier_terms(i % p, p));
        }
        row
    }

    /// Least squares with a ridge penalty on the slope changes only.
    fn solve(&self, times: &[f64], y: &[f64], penalty: f64) -> Result<Vec<f64>> {
        let k = self.row(0, 0.0).len();
        let mut xtx = vec![0.0; k * k];
        let mut xty = vec![0.0; k];
        for (i, (&t, &v)) in times.iter().zip(y).enumerate() {
            let row = self.row(i, t);
            for a in 0..k {
                xty[a] += row[a] * v;
                for b in 0..k {
                    xtx[a * k + b] += row[a] * row[b];
                }
            }
        }
        for j in 0..self.changepoints.len() {
            xtx[(j + 2) * k + j + 2] += penalty;
        }
        gaussian_solve(xtx, xty, k)
            .ok_or_else(|| ForecastError::NumericalError("singular trend design matrix".into()))
    }

    fn residuals(&self, times: &[f64], y: &[f64], beta: &[f64]) -> Vec<f64> {
        times
            .iter()
            .zip(y)
            .enumerate()
            .map(|(i, (&t, &v))| {
                let fit: f64 = self.row(i, t).iter().zip(beta).map(|(x, b)| x * b).sum();
                v - fit
            })
            .collect()
    }
}

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
fn gaussian_solve(mut a: Vec<f64>, mut b: Vec<f64>, k: usize) -> Option<Vec<f64>> {
    for col in 0..k {
        let pivot =
            (col..k).max_by(|&i, &j| a[i * k + col].abs().total_cmp(&a[j * k + col].abs()))?;
        if a[pivot * k + col].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for c in 0..k {
                a.swap(pivot * k + c, col * k + c);
            }
            b.swap(pivot, col);
        }
        for row in col + 1..k {
            let factor = a[row * k + col] / a[col * k + col];
            if factor == 0.0 {
                continue;
            }
            for c in col..k {
                a[row * k + c] -= factor * a[col * k + c];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; k];
    for row in (0..k).rev() {
        let tail: f64 = (row + 1..k).map(|c| a[row * k + c] * x[c]).sum();
        x[row] = (b[row] - tail) / a[row * k + row];
    }
    Some(x)
}

/// Mean ratio to trend per phase, normalised to mean 1.
fn seasonal_factors(y: &[f64], trend: &[f64], period: usize) -> Vec<f64> {
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, (v, t)) in y.iter().zip(trend).enumerate() {
        sums[i % period] += v / t;
        counts[i % period] += 1;
    }
    let raw: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| s / c.max(1) as f64)
        .collect();
    let mean = raw.iter().sum::<f64>() / period as f64;
    if !(mean > 0.0) {
        return vec![1.0; period];
    }
    raw.iter().map(|s| s / mean).collect()
}
