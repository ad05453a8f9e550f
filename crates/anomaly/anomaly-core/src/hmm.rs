//! Gaussian hidden Markov model with diagonal covariance.
//!
//! Fitting follows the usual recipe: k-means seeds the state means, every
//! state starts from the pooled variance, then Baum-Welch re-estimates all
//! parameters until the log-likelihood gain drops below `tol`. The forward
//! and backward passes are scaled per step so long series never underflow.

use anomaly_api::StateTransitionConfig;
use anomaly_spi::{AnomalyError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lower bound on start and transition probabilities after re-estimation.
const PROB_FLOOR: f64 = 1e-12;
const KMEANS_MAX_ITER: usize = 100;

/// A fitted Gaussian HMM over fixed-width observation vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianHmm {
    start_prob: Vec<f64>,
    transition: Vec<Vec<f64>>,
    means: Vec<Vec<f64>>,
    variances: Vec<Vec<f64>>,
    converged: bool,
    iterations: usize,
    log_likelihood: f64,
}

/// Scaled forward pass: normalised state distribution per step and the
/// per-step scale factors in log space.
struct Forward {
    alpha: Vec<Vec<f64>>,
    /// `ln P(x_t | x_1..x_{t-1})`
    log_scale: Vec<f64>,
    /// Emission densities divided by their per-step maximum.
    emission: Vec<Vec<f64>>,
    /// Sum of the scaled predicted mass per step.
    scale: Vec<f64>,
}

impl GaussianHmm {
    /// Fit on `observations` (one vector per step, all the same width).
    ///
    /// Fewer observations than `n_components` shrink the state count to the
    /// number of observations.
    pub fn fit(observations: &[Vec<f64>], config: &StateTransitionConfig) -> Result<Self> {
        config.validate()?;
        let width = observations.first().map(Vec::len).unwrap_or(0);
        if observations.len() < 2 || width == 0 {
            return Err(AnomalyError::InsufficientData {
                required: 2,
                actual: observations.len(),
            });
        }
        if observations.iter().any(|o| o.len() != width) {
            return Err(AnomalyError::invalid(
                "observations",
                "every observation must have the same width",
            ));
        }
        if observations.iter().flatten().any(|v| !v.is_finite()) {
            return Err(AnomalyError::invalid("observations", "values must be finite"));
        }

        let k = config.n_components.min(observations.len());
        let mut rng = StdRng::seed_from_u64(config.seed);
        let means = kmeans(observations, k, &mut rng);
        let pooled: Vec<f64> = pooled_variance(observations)
            .into_iter()
            .map(|v| v + config.min_covar)
            .collect();

        let mut model = Self {
            start_prob: vec![1.0 / k as f64; k],
            transition: vec![vec![1.0 / k as f64; k]; k],
            means,
            variances: vec![pooled; k],
            converged: false,
            iterations: 0,
            log_likelihood: f64::NEG_INFINITY,
        };

        let mut previous = f64::NEG_INFINITY;
        for iteration in 0..config.n_iter {
            let forward = model.forward(observations)?;
            let current: f64 = forward.log_scale.iter().sum();
            model.iterations = iteration + 1;
            debug!(iteration, log_likelihood = current, "Baum-Welch step");
            if current - previous < config.tol {
                model.converged = true;
                break;
            }
            previous = current;
            model.reestimate(observations, &forward, config.min_covar);
        }
        model.log_likelihood = model.log_likelihood(observations)?;
        Ok(model)
    }

    pub fn n_components(&self) -> usize {
        self.start_prob.len()
    }

    pub fn width(&self) -> usize {
        self.means.first().map(Vec::len).unwrap_or(0)
    }

    pub fn start_prob(&self) -> &[f64] {
        &self.start_prob
    }

    pub fn transition_matrix(&self) -> &[Vec<f64>] {
        &self.transition
    }

    pub fn means(&self) -> &[Vec<f64>] {
        &self.means
    }

    pub fn variances(&self) -> &[Vec<f64>] {
        &self.variances
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Baum-Welch iterations run (E-steps evaluated).
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Log-likelihood of the fitting data under the final parameters.
    pub fn fitted_log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// `ln P(x_1..x_T)`.
    pub fn log_likelihood(&self, observations: &[Vec<f64>]) -> Result<f64> {
        Ok(self.forward(observations)?.log_scale.iter().sum())
    }

    /// Per-step surprise `-ln P(x_t | x_1..x_{t-1})`.
    pub fn point_scores(&self, observations: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(self
            .forward(observations)?
            .log_scale
            .into_iter()
            .map(|l| -l)
            .collect())
    }

    /// Most likely hidden state sequence.
    pub fn viterbi(&self, observations: &[Vec<f64>]) -> Result<Vec<usize>> {
        self.check_width(observations)?;
        if observations.is_empty() {
            return Ok(Vec::new());
        }
        let k = self.n_components();
        let log_trans: Vec<Vec<f64>> = self
            .transition
            .iter()
            .map(|row| row.iter().map(|p| p.ln()).collect())
            .collect();

        let mut delta: Vec<f64> = (0..k)
            .map(|j| self.start_prob[j].ln() + self.log_emission(j, &observations[0]))
            .collect();
        let mut backpointers = Vec::with_capacity(observations.len());
        for x in &observations[1..] {
            let mut next = vec![f64::NEG_INFINITY; k];
            let mut pointers = vec![0; k];
            for j in 0..k {
                let (best, score) = (0..k)
                    .map(|i| (i, delta[i] + log_trans[i][j]))
                    .fold((0, f64::NEG_INFINITY), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
                next[j] = score + self.log_emission(j, x);
                pointers[j] = best;
            }
            backpointers.push(pointers);
            delta = next;
        }

        let mut state = argmax(&delta);
        let mut path = vec![state; observations.len()];
        for (t, pointers) in backpointers.iter().enumerate().rev() {
            state = pointers[state];
            path[t] = state;
        }
        Ok(path)
    }

    fn check_width(&self, observations: &[Vec<f64>]) -> Result<()> {
        let width = self.width();
        match observations.iter().find(|o| o.len() != width) {
            Some(bad) => Err(AnomalyError::invalid(
                "observations",
                format!("expected width {}, got {}", width, bad.len()),
            )),
            None => Ok(()),
        }
    }

    fn log_emission(&self, state: usize, x: &[f64]) -> f64 {
        x.iter()
            .zip(&self.means[state])
            .zip(&self.variances[state])
            .map(|((x, m), v)| -0.5 * ((2.0 * std::f64::consts::PI * v).ln() + (x - m).powi(2) / v))
            .sum()
    }

    fn forward(&self, observations: &[Vec<f64>]) -> Result<Forward> {
        self.check_width(observations)?;
        let k = self.n_components();
        let t_len = observations.len();
        let mut alpha = Vec::with_capacity(t_len);
        let mut log_scale = Vec::with_capacity(t_len);
        let mut emission = Vec::with_capacity(t_len);
        let mut scale = Vec::with_capacity(t_len);

        for (t, x) in observations.iter().enumerate() {
            let log_b: Vec<f64> = (0..k).map(|j| self.log_emission(j, x)).collect();
            let peak = log_b.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let b: Vec<f64> = log_b.iter().map(|l| (l - peak).exp()).collect();

            let mut a: Vec<f64> = if t == 0 {
                (0..k).map(|j| self.start_prob[j] * b[j]).collect()
            } else {
                let prev: &Vec<f64> = &alpha[t - 1];
                (0..k)
                    .map(|j| (0..k).map(|i| prev[i] * self.transition[i][j]).sum::<f64>() * b[j])
                    .collect()
            };
            let c: f64 = a.iter().sum();
            if !(c > 0.0 && c.is_finite()) {
                return Err(AnomalyError::DetectionError(format!(
                    "observation {} has zero likelihood under every state",
                    t
                )));
            }
            a.iter_mut().for_each(|v| *v /= c);
            alpha.push(a);
            log_scale.push(c.ln() + peak);
            emission.push(b);
            scale.push(c);
        }
        Ok(Forward {
            alpha,
            log_scale,
            emission,
            scale,
        })
    }

    /// One Baum-Welch M-step from a completed forward pass.
    fn reestimate(&mut self, observations: &[Vec<f64>], forward: &Forward, min_covar: f64) {
        let k = self.n_components();
        let t_len = observations.len();
        let width = self.width();

        // backward pass, scaled with the forward factors
        let mut beta = vec![vec![1.0; k]; t_len];
        for t in (0..t_len - 1).rev() {
            let (b, c) = (&forward.emission[t + 1], forward.scale[t + 1]);
            for i in 0..k {
                beta[t][i] = (0..k)
                    .map(|j| self.transition[i][j] * b[j] * beta[t + 1][j])
                    .sum::<f64>()
                    / c;
            }
        }

        let mut gamma = vec![vec![0.0; k]; t_len];
        for t in 0..t_len {
            let row: Vec<f64> = (0..k).map(|i| forward.alpha[t][i] * beta[t][i]).collect();
            let total: f64 = row.iter().sum();
            if total > 0.0 {
                gamma[t] = row.iter().map(|g| g / total).collect();
            }
        }

        let mut xi = vec![vec![0.0; k]; k];
        for t in 0..t_len - 1 {
            let (b, c) = (&forward.emission[t + 1], forward.scale[t + 1]);
            for i in 0..k {
                for j in 0..k {
                    xi[i][j] += forward.alpha[t][i] * self.transition[i][j] * b[j] * beta[t + 1][j] / c;
                }
            }
        }

        self.start_prob = normalise_with_floor(&gamma[0]);
        self.transition = xi.iter().map(|row| normalise_with_floor(row)).collect();

        for j in 0..k {
            let weight: f64 = gamma.iter().map(|g| g[j]).sum();
            if weight <= f64::EPSILON {
                // state unused this round, keep its emission
                continue;
            }
            for d in 0..width {
                let mean = gamma
                    .iter()
                    .zip(observations)
                    .map(|(g, x)| g[j] * x[d])
                    .sum::<f64>()
                    / weight;
                let var = gamma
                    .iter()
                    .zip(observations)
                    .map(|(g, x)| g[j] * (x[d] - mean).powi(2))
                    .sum::<f64>()
                    / weight;
                self.means[j][d] = mean;
                self.variances[j][d] = var + min_covar;
            }
        }
    }
}

fn normalise_with_floor(weights: &[f64]) -> Vec<f64> {
    let floored: Vec<f64> = weights.iter().map(|w| w.max(PROB_FLOOR)).collect();
    let total: f64 = floored.iter().sum();
    floored.iter().map(|w| w / total).collect()
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc })
        .0
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Per-dimension population variance.
fn pooled_variance(observations: &[Vec<f64>]) -> Vec<f64> {
    let n = observations.len() as f64;
    let width = observations[0].len();
    (0..width)
        .map(|d| {
            let mean = observations.iter().map(|x| x[d]).sum::<f64>() / n;
            observations.iter().map(|x| (x[d] - mean).powi(2)).sum::<f64>() / n
        })
        .collect()
}

/// Lloyd's k-means with k-means++ seeding; returns `k` centres.
fn kmeans(observations: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = observations.len();
    let mut centres = vec![observations[rng.gen_range(0..n)].clone()];
    while centres.len() < k {
        let distances: Vec<f64> = observations
            .iter()
            .map(|x| {
                centres
                    .iter()
                    .map(|c| squared_distance(x, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = distances.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            distances
                .iter()
                .position(|&d| {
                    target -= d;
                    target <= 0.0
                })
                .unwrap_or(n - 1)
        } else {
            rng.gen_range(0..n)
        };
        centres.push(observations[pick].clone());
    }

    let width = observations[0].len();
    let mut assignment = vec![usize::MAX; n];
    for _ in 0..KMEANS_MAX_ITER {
        let mut changed = false;
        for (x, slot) in observations.iter().zip(assignment.iter_mut()) {
            let nearest = centres
                .iter()
                .enumerate()
                .map(|(c, centre)| (c, squared_distance(x, centre)))
                .fold((0, f64::INFINITY), |acc, cur| if cur.1 < acc.1 { cur } else { acc })
                .0;
            if *slot != nearest {
                *slot = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }
        for (c, centre) in centres.iter_mut().enumerate() {
            let members: Vec<&Vec<f64>> = observations
                .iter()
                .zip(&assignment)
                .filter(|&(_, &a)| a == c)
                .map(|(x, _)| x)
                .collect();
            if members.is_empty() {
                continue;
            }
            for d in 0..width {
                centre[d] = members.iter().map(|x| x[d]).sum::<f64>() / members.len() as f64;
            }
        }
    }
    centres
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> Vec<Vec<f64>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    /// Two regimes: small steps around 0, then large steps around 5.
    fn regimes() -> Vec<Vec<f64>> {
        let mut values = Vec::new();
        for i in 0..60 {
            values.push(((i * 7) % 5) as f64 * 0.1 - 0.2);
        }
        for i in 0..60 {
            values.push(5.0 + ((i * 3) % 5) as f64 * 0.1 - 0.2);
        }
        column(&values)
    }

    fn config(k: usize) -> StateTransitionConfig {
        StateTransitionConfig::default().with_components(k)
    }

    #[test]
    fn test_two_regimes_recovered() {
        let obs = regimes();
        let model = GaussianHmm::fit(&obs, &config(2)).unwrap();
        let mut means: Vec<f64> = model.means().iter().map(|m| m[0]).collect();
        means.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!(means[0].abs() < 0.3, "means {:?}", means);
        assert!((means[1] - 5.0).abs() < 0.3, "means {:?}", means);

        let states = model.viterbi(&obs).unwrap();
        assert_eq!(states.len(), obs.len());
        assert!(states[..60].iter().all(|&s| s == states[0]));
        assert!(states[60..].iter().all(|&s| s == states[60]));
        assert_ne!(states[0], states[60]);
    }

    #[test]
    fn test_transition_rows_are_distributions() {
        let model = GaussianHmm::fit(&regimes(), &config(3)).unwrap();
        for row in model.transition_matrix() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| p > 0.0));
        }
        assert!((model.start_prob().iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_likelihood_does_not_decrease() {
        let obs = regimes();
        let short = GaussianHmm::fit(&obs, &config(2).with_iterations(1, 0.0)).unwrap();
        let long = GaussianHmm::fit(&obs, &config(2).with_iterations(50, 0.0)).unwrap();
        assert!(long.fitted_log_likelihood() >= short.fitted_log_likelihood() - 1e-9);
    }

    #[test]
    fn test_scores_sum_to_negative_log_likelihood() {
        let obs = regimes();
        let model = GaussianHmm::fit(&obs, &config(2)).unwrap();
        let total: f64 = model.point_scores(&obs).unwrap().iter().sum();
        assert!((total + model.log_likelihood(&obs).unwrap()).abs() < 1e-6);
    }

    #[test]
    fn test_outlier_scores_highest() {
        let clean: Vec<f64> = (0..100).map(|i| ((i * 7) % 11) as f64 * 0.05).collect();
        let model = GaussianHmm::fit(&column(&clean), &config(3)).unwrap();

        let mut spiked = clean[..40].to_vec();
        spiked[25] = 30.0;
        let scores = model.point_scores(&column(&spiked)).unwrap();
        assert_eq!(argmax(&scores), 25);
    }

    #[test]
    fn test_constant_observations_converge() {
        let obs = column(&[0.0; 40]);
        let model = GaussianHmm::fit(&obs, &config(10)).unwrap();
        assert!(model.converged());
        assert!(model.iterations() <= 3);
        let scores = model.point_scores(&obs).unwrap();
        assert!(scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_same_seed_same_model() {
        let obs = regimes();
        let a = GaussianHmm::fit(&obs, &config(4)).unwrap();
        let b = GaussianHmm::fit(&obs, &config(4)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_components_capped_by_observations() {
        let obs = column(&[1.0, 2.0, 4.0]);
        let model = GaussianHmm::fit(&obs, &config(10)).unwrap();
        assert_eq!(model.n_components(), 3);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            GaussianHmm::fit(&column(&[1.0]), &config(2)),
            Err(AnomalyError::InsufficientData { .. })
        ));
        assert!(GaussianHmm::fit(&column(&[1.0, f64::NAN, 2.0]), &config(2)).is_err());
        let ragged = vec![vec![1.0], vec![1.0, 2.0]];
        assert!(GaussianHmm::fit(&ragged, &config(2)).is_err());
    }

    #[test]
    fn test_width_checked_on_scoring() {
        let model = GaussianHmm::fit(&regimes(), &config(2)).unwrap();
        assert!(model.point_scores(&[vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_two_feature_observations() {
        let obs: Vec<Vec<f64>> = regimes().into_iter().map(|x| vec![x[0], x[0].abs()]).collect();
        let model = GaussianHmm::fit(&obs, &config(2)).unwrap();
        assert_eq!(model.width(), 2);
        assert_eq!(model.variances()[0].len(), 2);
    }
}
