//! One-dimensional convolution (valid padding) and max pooling.
//!
//! Sequences are `steps × channels`, row-major.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::Param;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Conv1d {
    channels: usize,
    filters: usize,
    kernel: usize,
    /// `filters × (kernel × channels)`
    w: Param,
    b: Param,
}

impl Conv1d {
    pub fn new(channels: usize, filters: usize, kernel: usize, rng: &mut StdRng) -> Self {
        Self {
            channels,
            filters,
            kernel,
            w: Param::glorot(filters, kernel * channels, rng),
            b: Param::zeros(filters),
        }
    }

    pub fn filters(&self) -> usize {
        self.filters
    }

    pub fn output_steps(&self, steps: usize) -> usize {
        (steps + 1).saturating_sub(self.kernel)
    }

    pub fn forward(&self, x: &[f64], steps: usize) -> Vec<f64> {
        let out_steps = self.output_steps(steps);
        let span = self.kernel * self.channels;
        let mut y = vec![0.0; out_steps * self.filters];
        for t in 0..out_steps {
            // Kernel window is contiguous in row-major layout.
            let patch = &x[t * self.channels..t * self.channels + span];
            for f in 0..self.filters {
                let weights = &self.w.value[f * span..(f + 1) * span];
                y[t * self.filters + f] = self.b.value[f]
                    + weights.iter().zip(patch).map(|(a, b)| a * b).sum::<f64>();
            }
        }
        y
    }

    /// Accumulate parameter gradients and return `dL/dx`.
    pub fn backward(&mut self, x: &[f64], steps: usize, dy: &[f64]) -> Vec<f64> {
        let out_steps = self.output_steps(steps);
        let span = self.kernel * self.channels;
        let mut dx = vec![0.0; x.len()];
        for t in 0..out_steps {
            let base = t * self.channels;
            for f in 0..self.filters {
                let d = dy[t * self.filters + f];
                if d == 0.0 {
                    continue;
                }
                self.b.grad[f] += d;
                for k in 0..span {
                    self.w.grad[f * span + k] += d * x[base + k];
                    dx[base + k] += d * self.w.value[f * span + k];
                }
            }
        }
        dx
    }

    pub fn params_mut(&mut self) -> [&mut Param; 2] {
        [&mut self.w, &mut self.b]
    }

    pub fn param_count(&self) -> usize {
        self.w.len() + self.b.len()
    }
}

/// Non-overlapping max pooling over time. Returns the pooled sequence and
/// the source index of every pooled value.
pub(crate) fn max_pool(x: &[f64], steps: usize, channels: usize, pool: usize) -> (Vec<f64>, Vec<usize>) {
    let out_steps = steps / pool;
    let mut out = vec![f64::NEG_INFINITY; out_steps * channels];
    let mut source = vec![0; out_steps * channels];
    for t in 0..out_steps {
        for p in 0..pool {
            let row = (t * pool + p) * channels;
            for c in 0..channels {
                let k = t * channels + c;
                if x[row + c] > out[k] {
                    out[k] = x[row + c];
                    source[k] = row + c;
                }
            }
        }
    }
    (out, source)
}

/// Route pooled gradients back to the positions that won the max.
pub(crate) fn max_pool_backward(d_out: &[f64], source: &[usize], input_len: usize) -> Vec<f64> {
    let mut dx = vec![0.0; input_len];
    for (d, &s) in d_out.iter().zip(source) {
        dx[s] += d;
    }
    dx
}
