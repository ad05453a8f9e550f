//! Fitted per-feature scalers.

use pipeline_api::ScalerKind;
use pipeline_spi::{PipelineError, Result, Scaler, TimeSeries};
use serde::{Deserialize, Serialize};

fn check_width(fitted: usize, series: &TimeSeries) -> Result<()> {
    if fitted == 0 {
        return Err(PipelineError::NotFitted);
    }
    if series.width() != fitted {
        return Err(PipelineError::shape(
            format!("width {}", fitted),
            format!("width {}", series.width()),
        ));
    }
    Ok(())
}

fn check_feature(fitted: usize, feature: usize) -> Result<()> {
    if fitted == 0 {
        return Err(PipelineError::NotFitted);
    }
    if feature >= fitted {
        return Err(PipelineError::shape(
            format!("feature < {}", fitted),
            format!("feature {}", feature),
        ));
    }
    Ok(())
}

fn map_rows(series: &TimeSeries, f: impl Fn(usize, f64) -> f64) -> Result<TimeSeries> {
    let width = series.width();
    let values = series
        .values()
        .iter()
        .enumerate()
        .map(|(i, &x)| f(i % width, x))
        .collect();
    series.with_values(values)
}

// ============================================================================
// MinMaxScaler
// ============================================================================

/// Maps the fitted range of each feature onto [0, 1].
///
/// A feature with zero range scales to 0 and inverts to its fitted constant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(&self) -> &[f64] {
        &self.min
    }

    pub fn max(&self) -> &[f64] {
        &self.max
    }

    fn range(&self, feature: usize) -> f64 {
        self.max[feature] - self.min[feature]
    }

    fn forward(&self, feature: usize, x: f64) -> f64 {
        let range = self.range(feature);
        if range == 0.0 {
            0.0
        } else {
            (x - self.min[feature]) / range
        }
    }

    fn inverse(&self, feature: usize, x: f64) -> f64 {
        x * self.range(feature) + self.min[feature]
    }
}

impl Scaler for MinMaxScaler {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if series.is_empty() {
            return Err(PipelineError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        let width = series.width();
        let mut min = vec![f64::INFINITY; width];
        let mut max = vec![f64::NEG_INFINITY; width];
        for row in series.values().chunks(width) {
            for (j, &x) in row.iter().enumerate() {
                min[j] = min[j].min(x);
                max[j] = max[j].max(x);
            }
        }
        self.min = min;
        self.max = max;
        Ok(())
    }

    fn transform(&self, series: &TimeSeries) -> Result<TimeSeries> {
        check_width(self.min.len(), series)?;
        map_rows(series, |j, x| self.forward(j, x))
    }

    fn inverse_transform(&self, series: &TimeSeries) -> Result<TimeSeries> {
        check_width(self.min.len(), series)?;
        map_rows(series, |j, x| self.inverse(j, x))
    }

    fn inverse_transform_feature(&self, values: &[f64], feature: usize) -> Result<Vec<f64>> {
        check_feature(self.min.len(), feature)?;
        Ok(values.iter().map(|&x| self.inverse(feature, x)).collect())
    }

    fn is_fitted(&self) -> bool {
        !self.min.is_empty()
    }

    fn name(&self) -> &str {
        "min_max"
    }
}

// ============================================================================
// StandardScaler
// ============================================================================

/// Zero mean, unit population standard deviation per feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    std_dev: Vec<f64>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std_dev(&self) -> &[f64] {
        &self.std_dev
    }
}

impl Scaler for StandardScaler {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if series.is_empty() {
            return Err(PipelineError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        let width = series.width();
        let n = series.len() as f64;
        let mut mean = vec![0.0; width];
        for row in series.values().chunks(width) {
            for (j, &x) in row.iter().enumerate() {
                mean[j] += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; width];
        for row in series.values().chunks(width) {
            for (j, &x) in row.iter().enumerate() {
                var[j] += (x - mean[j]).powi(2);
            }
        }
        self.std_dev = var.into_iter().map(|v| (v / n).sqrt()).collect();
        self.mean = mean;
        Ok(())
    }

    fn transform(&self, series: &TimeSeries) -> Result<TimeSeries> {
        check_width(self.mean.len(), series)?;
        map_rows(series, |j, x| {
            if self.std_dev[j] == 0.0 {
                0.0
            } else {
                (x - self.mean[j]) / self.std_dev[j]
            }
        })
    }

    fn inverse_transform(&self, series: &TimeSeries) -> Result<TimeSeries> {
        check_width(self.mean.len(), series)?;
        map_rows(series, |j, x| x * self.std_dev[j] + self.mean[j])
    }

    fn inverse_transform_feature(&self, values: &[f64], feature: usize) -> Result<Vec<f64>> {
        check_feature(self.mean.len(), feature)?;
        Ok(values
            .iter()
            .map(|&x| x * self.std_dev[feature] + self.mean[feature])
            .collect())
    }

    fn is_fitted(&self) -> bool {
        !self.mean.is_empty()
    }

    fn name(&self) -> &str {
        "standard"
    }
}

// ============================================================================
// ScalingTransform
// ============================================================================

/// Serializable scaler of either kind, as stored alongside fitted models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalingTransform {
    MinMax(MinMaxScaler),
    Standard(StandardScaler),
}

impl ScalingTransform {
    /// Unfitted scaler of the given kind.
    pub fn new(kind: ScalerKind) -> Self {
        match kind {
            ScalerKind::MinMax => Self::MinMax(MinMaxScaler::new()),
            ScalerKind::Standard => Self::Standard(StandardScaler::new()),
        }
    }

    pub fn kind(&self) -> ScalerKind {
        match self {
            Self::MinMax(_) => ScalerKind::MinMax,
            Self::Standard(_) => ScalerKind::Standard,
        }
    }

    fn inner(&self) -> &dyn Scaler {
        match self {
            Self::MinMax(s) => s,
            Self::Standard(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Scaler {
        match self {
            Self::MinMax(s) => s,
            Self::Standard(s) => s,
        }
    }
}

impl Default for ScalingTransform {
    fn default() -> Self {
        Self::new(ScalerKind::default())
    }
}

impl Scaler for ScalingTransform {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.inner_mut().fit(series)
    }

    fn transform(&self, series: &TimeSeries) -> Result<TimeSeries> {
        self.inner().transform(series)
    }

    fn inverse_transform(&self, series: &TimeSeries) -> Result<TimeSeries> {
        self.inner().inverse_transform(series)
    }

    fn inverse_transform_feature(&self, values: &[f64], feature: usize) -> Result<Vec<f64>> {
        self.inner().inverse_transform_feature(values, feature)
    }

    fn is_fitted(&self) -> bool {
        self.inner().is_fitted()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{} != {}", x, y);
        }
    }

    #[test]
    fn test_min_max_maps_to_unit_range() {
        let series = TimeSeries::univariate(vec![2.0, 4.0, 6.0]);
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&series).unwrap();
        assert_close(scaled.values(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_min_max_uses_fitted_range_for_new_data() {
        let mut scaler = MinMaxScaler::new();
        scaler.fit(&TimeSeries::univariate(vec![0.0, 10.0])).unwrap();
        let scaled = scaler.transform(&TimeSeries::univariate(vec![20.0])).unwrap();
        assert_close(scaled.values(), &[2.0]);
    }

    #[test]
    fn test_min_max_per_feature() {
        let series =
            TimeSeries::multivariate(&[vec![0.0, 100.0], vec![1.0, 300.0]]).unwrap();
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&series).unwrap();
        assert_close(scaled.values(), &[0.0, 0.0, 1.0, 1.0]);
        let back = scaler.inverse_transform_feature(&[0.5], 1).unwrap();
        assert_close(&back, &[200.0]);
    }

    #[test]
    fn test_degenerate_feature_scales_to_zero() {
        let series = TimeSeries::univariate(vec![5.0; 4]);
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&series).unwrap();
        assert_close(scaled.values(), &[0.0; 4]);
        let back = scaler.inverse_transform(&scaled).unwrap();
        assert_close(back.values(), &[5.0; 4]);

        let mut standard = StandardScaler::new();
        let scaled = standard.fit_transform(&series).unwrap();
        assert_close(scaled.values(), &[0.0; 4]);
        let back = standard.inverse_transform(&scaled).unwrap();
        assert_close(back.values(), &[5.0; 4]);
    }

    #[test]
    fn test_standard_zero_mean_unit_std() {
        let series = TimeSeries::univariate(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&series).unwrap();
        let mean: f64 = scaled.values().iter().sum::<f64>() / 5.0;
        let var: f64 = scaled.values().iter().map(|x| x * x).sum::<f64>() / 5.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unfitted_transform_fails() {
        let scaler = MinMaxScaler::new();
        let result = scaler.transform(&TimeSeries::univariate(vec![1.0]));
        assert!(matches!(result, Err(PipelineError::NotFitted)));
        assert!(!scaler.is_fitted());
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&TimeSeries::univariate(vec![1.0, 2.0])).unwrap();
        let wide = TimeSeries::multivariate(&[vec![1.0, 2.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&wide),
            Err(PipelineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_fit_empty_series_fails() {
        let mut scaler = ScalingTransform::new(ScalerKind::MinMax);
        assert!(scaler.fit(&TimeSeries::univariate(vec![])).is_err());
    }

    #[test]
    fn test_scaling_transform_serde_keeps_parameters() {
        let mut scaler = ScalingTransform::new(ScalerKind::Standard);
        scaler.fit(&TimeSeries::univariate(vec![1.0, 3.0])).unwrap();
        let json = serde_json::to_string(&scaler).unwrap();
        assert!(json.contains("\"kind\":\"standard\""));
        let back: ScalingTransform = serde_json::from_str(&json).unwrap();
        assert_eq!(scaler, back);
        assert_eq!(back.name(), "standard");
    }
}
