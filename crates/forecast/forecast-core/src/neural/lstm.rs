//! Long short-term memory layer with backpropagation through time.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{matvec, matvec_t, outer_add, sigmoid, Param};

/// Gate order in the stacked weight matrices: input, forget, cell, output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Lstm {
    inputs: usize,
    hidden: usize,
    /// `4h × inputs`
    w: Param,
    /// `4h × h`
    u: Param,
    /// `4h`
    b: Param,
}

/// Values kept from one forward step for the backward pass.
#[derive(Debug, Clone)]
pub(crate) struct LstmStep {
    x: Vec<f64>,
    h_prev: Vec<f64>,
    c_prev: Vec<f64>,
    i: Vec<f64>,
    f: Vec<f64>,
    g: Vec<f64>,
    o: Vec<f64>,
    tanh_c: Vec<f64>,
}

impl Lstm {
    pub fn new(inputs: usize, hidden: usize, rng: &mut StdRng) -> Self {
        let mut b = vec![0.0; 4 * hidden];
        // Forget gate starts open.
        b[hidden..2 * hidden].iter_mut().for_each(|v| *v = 1.0);
        Self {
            inputs,
            hidden,
            w: Param::glorot(4 * hidden, inputs, rng),
            u: Param::glorot(4 * hidden, hidden, rng),
            b: Param::new(b),
        }
    }

    pub fn hidden(&self) -> usize {
        self.hidden
    }

    /// Run over a sequence from zero state, returning every hidden state.
    pub fn forward(&self, xs: &[Vec<f64>]) -> (Vec<Vec<f64>>, Vec<LstmStep>) {
        let h = self.hidden;
        let mut h_prev = vec![0.0; h];
        let mut c_prev = vec![0.0; h];
        let mut outputs = Vec::with_capacity(xs.len());
        let mut steps = Vec::with_capacity(xs.len());

        for x in xs {
            let mut z = matvec(&self.w.value, 4 * h, self.inputs, x);
            let zu = matvec(&self.u.value, 4 * h, h, &h_prev);
            for k in 0..4 * h {
                z[k] += zu[k] + self.b.value[k];
            }
            let i: Vec<f64> = z[..h].iter().map(|&v| sigmoid(v)).collect();
            let f: Vec<f64> = z[h..2 * h].iter().map(|&v| sigmoid(v)).collect();
            let g: Vec<f64> = z[2 * h..3 * h].iter().map(|v| v.tanh()).collect();
            let o: Vec<f64> = z[3 * h..].iter().map(|&v| sigmoid(v)).collect();

            let c: Vec<f64> = (0..h).map(|k| f[k] * c_prev[k] + i[k] * g[k]).collect();
            let tanh_c: Vec<f64> = c.iter().map(|v| v.tanh()).collect();
            let h_t: Vec<f64> = (0..h).map(|k| o[k] * tanh_c[k]).collect();

            steps.push(LstmStep {
                x: x.clone(),
                h_prev: std::mem::replace(&mut h_prev, h_t.clone()),
                c_prev: std::mem::replace(&mut c_prev, c),
                i,
                f,
                g,
                o,
                tanh_c,
            });
            outputs.push(h_t);
        }
        (outputs, steps)
    }

    /// Accumulate gradients given `dL/dh_t` for every step; returns `dL/dx_t`.
    pub fn backward(&mut self, steps: &[LstmStep], d_outputs: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let h = self.hidden;
        let mut dh_next = vec![0.0; h];
        let mut dc_next = vec![0.0; h];
        let mut dxs = vec![Vec::new(); steps.len()];

        for t in (0..steps.len()).rev() {
            let s = &steps[t];
            let mut dz = vec![0.0; 4 * h];
            for k in 0..h {
                let dh = d_outputs[t][k] + dh_next[k];
                let d_o = dh * s.tanh_c[k];
                let dc = dh * s.o[k] * (1.0 - s.tanh_c[k] * s.tanh_c[k]) + dc_next[k];
                let di = dc * s.g[k];
                let df = dc * s.c_prev[k];
                let dg = dc * s.i[k];
                dc_next[k] = dc * s.f[k];

                dz[k] = di * s.i[k] * (1.0 - s.i[k]);
                dz[h + k] = df * s.f[k] * (1.0 - s.f[k]);
                dz[2 * h + k] = dg * (1.0 - s.g[k] * s.g[k]);
                dz[3 * h + k] = d_o * s.o[k] * (1.0 - s.o[k]);
            }
            outer_add(&mut self.w.grad, self.inputs, &dz, &s.x);
            outer_add(&mut self.u.grad, h, &dz, &s.h_prev);
            self.b.grad.iter_mut().zip(&dz).for_each(|(g, d)| *g += d);

            dxs[t] = matvec_t(&self.w.value, 4 * h, self.inputs, &dz);
            dh_next = matvec_t(&self.u.value, 4 * h, h, &dz);
        }
        dxs
    }

    pub fn params_mut(&mut self) -> [&mut Param; 3] {
        [&mut self.w, &mut self.u, &mut self.b]
    }

    pub fn param_count(&self) -> usize {
        self.w.len() + self.u.len() + self.b.len()
    }
}
