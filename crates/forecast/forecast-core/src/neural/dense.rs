//! Fully connected layer.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{matvec, matvec_t, outer_add, Param};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Dense {
    inputs: usize,
    outputs: usize,
    w: Param,
    b: Param,
}

impl Dense {
    pub fn new(inputs: usize, outputs: usize, rng: &mut StdRng) -> Self {
        Self {
            inputs,
            outputs,
            w: Param::glorot(outputs, inputs, rng),
            b: Param::zeros(outputs),
        }
    }

    pub fn forward(&self, x: &[f64]) -> Vec<f64> {
        let mut y = matvec(&self.w.value, self.outputs, self.inputs, x);
        y.iter_mut().zip(&self.b.value).for_each(|(v, b)| *v += b);
        y
    }

    /// Accumulate parameter gradients and return `dL/dx`.
    pub fn backward(&mut self, x: &[f64], dy: &[f64]) -> Vec<f64> {
        outer_add(&mut self.w.grad, self.inputs, dy, x);
        self.b.grad.iter_mut().zip(dy).for_each(|(g, d)| *g += d);
        matvec_t(&self.w.value, self.outputs, self.inputs, dy)
    }

    pub fn params_mut(&mut self) -> [&mut Param; 2] {
        [&mut self.w, &mut self.b]
    }

    pub fn param_count(&self) -> usize {
        self.w.len() + self.b.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_gradient_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layer = Dense::new(3, 2, &mut rng);
        layer.params_mut().into_iter().for_each(Param::zero_grad);
        let x = [0.3, -0.2, 0.7];

        // L = sum(y)
        layer.backward(&x, &[1.0, 1.0]);
        let analytic = layer.w.grad[1];

        let eps = 1e-6;
        let mut plus = layer.clone();
        plus.w.value[1] += eps;
        let mut minus = layer.clone();
        minus.w.value[1] -= eps;
        let numeric = (plus.forward(&x).iter().sum::<f64>() - minus.forward(&x).iter().sum::<f64>())
            / (2.0 * eps);
        assert!((analytic - numeric).abs() < 1e-6);
    }
}
