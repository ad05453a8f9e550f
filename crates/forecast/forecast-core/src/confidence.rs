//! Prediction bands around point forecasts.

use forecast_spi::{ConfidenceInterval, ForecastError, Result};

/// Two-sided normal quantile for a central interval of width `level`,
/// e.g. `z_score(0.95) ≈ 1.96`.
pub fn z_score(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(ForecastError::invalid("interval_width", "must be in (0, 1)"));
    }
    Ok(inverse_normal_cdf(0.5 + level / 2.0))
}

/// Acklam's rational approximation of the standard normal quantile
/// (relative error below 1.2e-9).
fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

/// Population standard deviation of `residuals` (0 when empty).
pub fn residual_std(residuals: &[f64]) -> f64 {
    if residuals.is_empty() {
        return 0.0;
    }
    let n = residuals.len() as f64;
    let mean = residuals.iter().sum::<f64>() / n;
    (residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Constant-width band `center ± z·sigma`.
pub fn prediction_band(center: Vec<f64>, sigma: f64, level: f64) -> Result<ConfidenceInterval> {
    let half = z_score(level)? * sigma;
    Ok(ConfidenceInterval {
        lower: center.iter().map(|c| c - half).collect(),
        upper: center.iter().map(|c| c + half).collect(),
        forecast: center,
        confidence_level: level,
    })
}

/// Band for an out-of-sample forecast; the error grows with `sqrt(h)` for
/// step `h`.
pub fn widening_band(
    forecast: Vec<f64>,
    residuals: &[f64],
    level: f64,
) -> Result<ConfidenceInterval> {
    let z = z_score(level)?;
    let sigma = residual_std(residuals);
    let half: Vec<f64> = (1..=forecast.len())
        .map(|h| z * sigma * (h as f64).sqrt())
        .collect();
    Ok(ConfidenceInterval {
        lower: forecast.iter().zip(&half).map(|(f, d)| f - d).collect(),
        upper: forecast.iter().zip(&half).map(|(f, d)| f + d).collect(),
        forecast,
        confidence_level: level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_quantiles() {
        assert!((z_score(0.95).unwrap() - 1.959_964).abs() < 1e-5);
        assert!((z_score(0.99).unwrap() - 2.575_829).abs() < 1e-5);
        assert!((z_score(0.8).unwrap() - 1.281_552).abs() < 1e-5);
        assert!((z_score(0.999).unwrap() - 3.290_527).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_level() {
        assert!(z_score(1.0).is_err());
        assert!(z_score(0.0).is_err());
        assert!(z_score(f64::NAN).is_err());
    }

    #[test]
    fn test_prediction_band() {
        let band = prediction_band(vec![10.0, 20.0], 1.0, 0.95).unwrap();
        assert!((band.upper[0] - 11.96).abs() < 1e-3);
        assert!((band.lower[1] - 18.04).abs() < 1e-3);
        assert!(band.is_outside(0, 12.5));
        assert!(!band.is_outside(1, 20.5));
    }

    #[test]
    fn test_widening_band() {
        let residuals = [-2.0, 1.0, -1.0, 2.0, 0.0];
        let band = widening_band(vec![100.0, 110.0, 120.0], &residuals, 0.95).unwrap();
        assert_eq!(band.forecast, vec![100.0, 110.0, 120.0]);
        assert!(band.upper[2] - band.lower[2] > band.upper[0] - band.lower[0]);
    }

    #[test]
    fn test_residual_std() {
        assert_eq!(residual_std(&[]), 0.0);
        assert!((residual_std(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
    }
}
