//! Mini-batch training loop with early stopping.

use forecast_api::TrainingConfig;
use forecast_spi::{ForecastError, Result, TrainingHistory};
use pipeline_spi::Windows;
use rand::rngs::StdRng;
use tracing::debug;

use super::{Adam, Param};

/// A network that maps one flattened window to one horizon.
pub(crate) trait Network: Clone {
    /// Intermediate values kept from a training forward pass.
    type Cache;

    /// Inference forward pass (no dropout).
    fn infer(&self, input: &[f64]) -> Vec<f64>;

    /// Training forward pass; draws dropout masks from `rng`.
    fn forward_train(&self, input: &[f64], rng: &mut StdRng) -> (Vec<f64>, Self::Cache);

    /// Accumulate gradients for `dL/d_output`.
    fn backward(&mut self, cache: Self::Cache, d_output: &[f64]);

    fn params_mut(&mut self) -> Vec<&mut Param>;
}

fn evaluate<N: Network>(net: &N, windows: &Windows) -> (f64, f64) {
    let mut se = 0.0;
    let mut ae = 0.0;
    let mut count = 0usize;
    for w in windows.iter() {
        let y = net.infer(w.input);
        for (p, t) in y.iter().zip(w.target) {
            se += (p - t).powi(2);
            ae += (p - t).abs();
            count += 1;
        }
    }
    let n = count.max(1) as f64;
    (se / n, ae / n)
}

/// Train `net` with MSE loss and Adam over chronological mini-batches.
///
/// The monitored loss is the validation MSE when validation windows are
/// given, the training MSE otherwise. Training stops after `patience` epochs
/// without improvement and the best weights are restored.
pub(crate) fn fit_network<N: Network>(
    net: &mut N,
    train: &Windows,
    validation: Option<&Windows>,
    config: &TrainingConfig,
    rng: &mut StdRng,
    label: &str,
) -> Result<TrainingHistory> {
    let validation = validation.filter(|v| !v.is_empty());
    let horizon = train.horizon() as f64;
    let mut adam = Adam::new(config.learning_rate);
    let mut history = TrainingHistory::default();
    let mut best_loss = f64::INFINITY;
    let mut best_net = net.clone();
    let mut wait = 0;

    for epoch in 0..config.epochs {
        let mut se = 0.0;
        let mut ae = 0.0;
        let inputs = train.inputs().chunks(config.batch_size);
        let targets = train.targets().chunks(config.batch_size);
        for (batch_x, batch_y) in inputs.zip(targets) {
            net.params_mut().into_iter().for_each(Param::zero_grad);
            let scale = 2.0 / (batch_x.len() as f64 * horizon);
            for (x, t) in batch_x.iter().zip(batch_y) {
                let (y, cache) = net.forward_train(x, rng);
                let d: Vec<f64> = y.iter().zip(t).map(|(p, t)| (p - t) * scale).collect();
                se += y.iter().zip(t).map(|(p, t)| (p - t).powi(2)).sum::<f64>();
                ae += y.iter().zip(t).map(|(p, t)| (p - t).abs()).sum::<f64>();
                net.backward(cache, &d);
            }
            adam.step(net.params_mut());
        }
        let n = train.len() as f64 * horizon;
        let loss = se / n;
        if !loss.is_finite() {
            return Err(ForecastError::NumericalError(format!(
                "{} training loss diverged at epoch {}",
                label,
                epoch + 1
            )));
        }
        history.loss.push(loss);
        history.mae.push(ae / n);

        let monitored = match validation {
            Some(val) => {
                let (val_loss, val_mae) = evaluate(net, val);
                history.val_loss.push(val_loss);
                history.val_mae.push(val_mae);
                val_loss
            }
            None => loss,
        };
        history.epochs_run = epoch + 1;
        debug!(model = label, epoch = epoch + 1, loss, monitored, "Epoch complete");

        if monitored < best_loss - config.min_delta {
            best_loss = monitored;
            best_net = net.clone();
            history.best_epoch = epoch + 1;
            wait = 0;
        } else {
            wait += 1;
            if wait >= config.patience {
                history.stopped_early = true;
                break;
            }
        }
    }

    *net = best_net;
    Ok(history)
}
