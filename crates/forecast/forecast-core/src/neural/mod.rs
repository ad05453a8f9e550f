//! Minimal dense, recurrent and convolutional layers with Adam training.
//!
//! Matrices are row-major `Vec<f64>`; every layer processes one window at a
//! time and accumulates gradients until the optimiser step.

mod conv;
mod dense;
mod lstm;
mod train;

pub(crate) use conv::{max_pool, max_pool_backward, Conv1d};
pub(crate) use dense::Dense;
pub(crate) use lstm::{Lstm, LstmStep};
pub(crate) use train::{fit_network, Network};

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

// ============================================================================
// Parameters
// ============================================================================

/// Trainable block with its gradient and Adam moments.
///
/// Only `value` is persisted; optimiser state is rebuilt on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Param {
    pub value: Vec<f64>,
    #[serde(skip)]
    pub grad: Vec<f64>,
    #[serde(skip)]
    m: Vec<f64>,
    #[serde(skip)]
    v: Vec<f64>,
}

impl Param {
    pub fn new(value: Vec<f64>) -> Self {
        let n = value.len();
        Self {
            value,
            grad: vec![0.0; n],
            m: vec![0.0; n],
            v: vec![0.0; n],
        }
    }

    pub fn zeros(n: usize) -> Self {
        Self::new(vec![0.0; n])
    }

    /// Glorot-uniform initialisation for a `fan_out × fan_in` matrix.
    pub fn glorot(fan_out: usize, fan_in: usize, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
        Self::new(
            (0..fan_out * fan_in)
                .map(|_| rng.gen_range(-limit..limit))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn zero_grad(&mut self) {
        if self.grad.len() != self.value.len() {
            self.grad = vec![0.0; self.value.len()];
        } else {
            self.grad.iter_mut().for_each(|g| *g = 0.0);
        }
    }
}

// ============================================================================
// Optimiser
// ============================================================================

/// Adam with bias correction.
#[derive(Debug, Clone)]
pub(crate) struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            t: 0,
        }
    }

    pub fn step(&mut self, params: Vec<&mut Param>) {
        self.t += 1;
        let bc1 = 1.0 - self.beta1.powi(self.t);
        let bc2 = 1.0 - self.beta2.powi(self.t);
        for p in params {
            if p.m.len() != p.value.len() {
                p.m = vec![0.0; p.value.len()];
                p.v = vec![0.0; p.value.len()];
            }
            for k in 0..p.value.len() {
                let g = p.grad[k];
                p.m[k] = self.beta1 * p.m[k] + (1.0 - self.beta1) * g;
                p.v[k] = self.beta2 * p.v[k] + (1.0 - self.beta2) * g * g;
                let m_hat = p.m[k] / bc1;
                let v_hat = p.v[k] / bc2;
                p.value[k] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            }
        }
    }
}

// ============================================================================
// Linear algebra and activations
// ============================================================================

/// `y = W x` for a `rows × cols` matrix.
pub(crate) fn matvec(w: &[f64], rows: usize, cols: usize, x: &[f64]) -> Vec<f64> {
    (0..rows)
        .map(|r| {
            w[r * cols..(r + 1) * cols]
                .iter()
                .zip(x)
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// `x = Wᵀ y` for a `rows × cols` matrix.
pub(crate) fn matvec_t(w: &[f64], rows: usize, cols: usize, y: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; cols];
    for r in 0..rows {
        let yr = y[r];
        if yr == 0.0 {
            continue;
        }
        for (o, a) in out.iter_mut().zip(&w[r * cols..(r + 1) * cols]) {
            *o += a * yr;
        }
    }
    out
}

/// `G += y xᵀ`.
pub(crate) fn outer_add(grad: &mut [f64], cols: usize, y: &[f64], x: &[f64]) {
    for (r, &yr) in y.iter().enumerate() {
        if yr == 0.0 {
            continue;
        }
        for (g, &xc) in grad[r * cols..(r + 1) * cols].iter_mut().zip(x) {
            *g += yr * xc;
        }
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub(crate) fn relu_in_place(values: &mut [f64]) {
    values.iter_mut().for_each(|v| *v = v.max(0.0));
}

/// Zero the gradient wherever the ReLU output was not positive.
pub(crate) fn relu_backward(grad: &mut [f64], activated: &[f64]) {
    for (g, &a) in grad.iter_mut().zip(activated) {
        if a <= 0.0 {
            *g = 0.0;
        }
    }
}

/// Inverted dropout mask: 0 with probability `rate`, `1 / (1 - rate)` otherwise.
pub(crate) fn dropout_mask(len: usize, rate: f64, rng: &mut StdRng) -> Vec<f64> {
    if rate <= 0.0 {
        return vec![1.0; len];
    }
    let keep = 1.0 / (1.0 - rate);
    (0..len)
        .map(|_| if rng.gen::<f64>() < rate { 0.0 } else { keep })
        .collect()
}

pub(crate) fn apply_mask(values: &mut [f64], mask: &[f64]) {
    values.iter_mut().zip(mask).for_each(|(v, m)| *v *= m);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_matvec_and_transpose() {
        // [[1, 2], [3, 4], [5, 6]]
        let w = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(matvec(&w, 3, 2, &[1.0, 1.0]), vec![3.0, 7.0, 11.0]);
        assert_eq!(matvec_t(&w, 3, 2, &[1.0, 0.0, 1.0]), vec![6.0, 8.0]);
    }

    #[test]
    fn test_outer_add() {
        let mut g = vec![0.0; 4];
        outer_add(&mut g, 2, &[1.0, 2.0], &[3.0, 4.0]);
        assert_eq!(g, vec![3.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_adam_moves_against_gradient() {
        let mut p = Param::new(vec![1.0, -1.0]);
        p.grad = vec![0.5, -0.5];
        Adam::new(0.1).step(vec![&mut p]);
        assert!(p.value[0] < 1.0);
        assert!(p.value[1] > -1.0);
    }

    #[test]
    fn test_dropout_mask_scales_kept_units() {
        let mut rng = StdRng::seed_from_u64(1);
        let mask = dropout_mask(1000, 0.5, &mut rng);
        assert!(mask.iter().all(|&m| m == 0.0 || m == 2.0));
        let kept = mask.iter().filter(|&&m| m > 0.0).count();
        assert!(kept > 400 && kept < 600);
        assert_eq!(dropout_mask(3, 0.0, &mut rng), vec![1.0; 3]);
    }

    #[test]
    fn test_glorot_is_seeded() {
        let a = Param::glorot(4, 3, &mut StdRng::seed_from_u64(7));
        let b = Param::glorot(4, 3, &mut StdRng::seed_from_u64(7));
        assert_eq!(a.value, b.value);
        let limit = (6.0f64 / 7.0).sqrt();
        assert!(a.value.iter().all(|v| v.abs() <= limit));
    }

    #[test]
    fn test_deserialized_param_rebuilds_state() {
        let json = serde_json::to_string(&Param::new(vec![1.0, 2.0])).unwrap();
        let mut p: Param = serde_json::from_str(&json).unwrap();
        assert!(p.grad.is_empty());
        p.zero_grad();
        assert_eq!(p.grad, vec![0.0, 0.0]);
        Adam::new(0.01).step(vec![&mut p]);
        assert_eq!(p.value, vec![1.0, 2.0]);
    }
}
