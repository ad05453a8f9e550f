//! Stacked LSTM forecaster.

use forecast_api::{RecurrentConfig, TrainingConfig};
use forecast_spi::{
    ForecastError, ForecastModel, InputShape, ModelKind, Result, TrainingHistory,
};
use pipeline_spi::Windows;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::neural::{
    apply_mask, dropout_mask, fit_network, Dense, Lstm, LstmStep, Network, Param,
};
use crate::validate_batch;

// ============================================================================
// Network
// ============================================================================

/// LSTM layers returning full sequences, a dropout after each, and a dense
/// head reading the final hidden state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RecurrentNetwork {
    width: usize,
    dropout: f64,
    layers: Vec<Lstm>,
    head: Dense,
}

pub(crate) struct RecurrentCache {
    steps: Vec<Vec<LstmStep>>,
    masks: Vec<Vec<Vec<f64>>>,
    last_hidden: Vec<f64>,
}

impl RecurrentNetwork {
    fn new(shape: InputShape, config: &RecurrentConfig, rng: &mut StdRng) -> Self {
        let mut inputs = shape.width;
        let layers = config
            .units
            .iter()
            .map(|&units| {
                let layer = Lstm::new(inputs, units, rng);
                inputs = units;
                layer
            })
            .collect();
        Self {
            width: shape.width,
            dropout: config.dropout,
            layers,
            head: Dense::new(inputs, shape.horizon, rng),
        }
    }

    fn sequence(&self, input: &[f64]) -> Vec<Vec<f64>> {
        input.chunks(self.width).map(<[f64]>::to_vec).collect()
    }

    fn param_count(&self) -> usize {
        self.layers.iter().map(Lstm::param_count).sum::<usize>() + self.head.param_count()
    }
}

impl Network for RecurrentNetwork {
    type Cache = RecurrentCache;

    fn infer(&self, input: &[f64]) -> Vec<f64> {
        let mut xs = self.sequence(input);
        for layer in &self.layers {
            xs = layer.forward(&xs).0;
        }
        let last = xs.last().cloned().unwrap_or_default();
        self.head.forward(&last)
    }

    fn forward_train(&self, input: &[f64], rng: &mut StdRng) -> (Vec<f64>, RecurrentCache) {
        let mut xs = self.sequence(input);
        let mut steps = Vec::with_capacity(self.layers.len());
        let mut masks = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let (mut hs, cache) = layer.forward(&xs);
            let layer_masks: Vec<Vec<f64>> = hs
                .iter_mut()
                .map(|h| {
                    let mask = dropout_mask(h.len(), self.dropout, rng);
                    apply_mask(h, &mask);
                    mask
                })
                .collect();
            steps.push(cache);
            masks.push(layer_masks);
            xs = hs;
        }
        let last_hidden = xs.last().cloned().unwrap_or_default();
        let output = self.head.forward(&last_hidden);
        (
            output,
            RecurrentCache {
                steps,
                masks,
                last_hidden,
            },
        )
    }

    fn backward(&mut self, cache: RecurrentCache, d_output: &[f64]) {
        let d_last = self.head.backward(&cache.last_hidden, d_output);
        let seq_len = cache.steps.first().map_or(0, Vec::len);

        // Only the final step of the top layer feeds the head.
        let top = self.layers.last().map_or(0, Lstm::hidden);
        let mut d_hs = vec![vec![0.0; top]; seq_len];
        if let Some(last) = d_hs.last_mut() {
            *last = d_last;
        }

        for (l, layer) in self.layers.iter_mut().enumerate().rev() {
            for (d, mask) in d_hs.iter_mut().zip(&cache.masks[l]) {
                apply_mask(d, mask);
            }
            d_hs = layer.backward(&cache.steps[l], &d_hs);
        }
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        let mut params: Vec<&mut Param> = self
            .layers
            .iter_mut()
            .flat_map(|l| l.params_mut())
            .collect();
        params.extend(self.head.params_mut());
        params
    }
}

// ============================================================================
// Forecaster
// ============================================================================

/// Recurrent sequence model: maintains LSTM state across the input window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmForecaster {
    config: RecurrentConfig,
    training: TrainingConfig,
    shape: Option<InputShape>,
    network: Option<RecurrentNetwork>,
}

impl LstmForecaster {
    pub fn new(config: RecurrentConfig, training: TrainingConfig) -> Self {
        Self {
            config,
            training,
            shape: None,
            network: None,
        }
    }

    pub fn config(&self) -> &RecurrentConfig {
        &self.config
    }

    pub fn training(&self) -> &TrainingConfig {
        &self.training
    }

    /// Trainable parameter count, once fitted.
    pub fn param_count(&self) -> Option<usize> {
        self.network.as_ref().map(RecurrentNetwork::param_count)
    }
}

impl Default for LstmForecaster {
    fn default() -> Self {
        Self::new(RecurrentConfig::default(), TrainingConfig::default())
    }
}

impl ForecastModel for LstmForecaster {
    fn kind(&self) -> ModelKind {
        ModelKind::Recurrent
    }

    fn fit(&mut self, train: &Windows, validation: Option<&Windows>) -> Result<TrainingHistory> {
        self.config.validate()?;
        self.training.validate()?;
        let shape = validate_batch(train, validation)?;

        let mut rng = StdRng::seed_from_u64(self.training.seed);
        let mut network = RecurrentNetwork::new(shape, &self.config, &mut rng);
        let history = fit_network(&mut network, train, validation, &self.training, &mut rng, "lstm")?;

        info!(
            model = "lstm",
            epochs = history.epochs_run,
            best_epoch = history.best_epoch,
            best_loss = history.best_loss().unwrap_or(f64::NAN),
            "Model fitted"
        );
        self.shape = Some(shape);
        self.network = Some(network);
        Ok(history)
    }

    fn predict(&self, inputs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let (network, shape) = match (&self.network, self.shape) {
            (Some(n), Some(s)) => (n, s),
            _ => return Err(ForecastError::NotFitted),
        };
        inputs
            .iter()
            .map(|x| {
                if x.len() != shape.input_size() {
                    return Err(ForecastError::shape(
                        format!("window of {} values", shape.input_size()),
                        format!("window of {} values", x.len()),
                    ));
                }
                Ok(network.infer(x))
            })
            .collect()
    }

    fn input_shape(&self) -> Option<InputShape> {
        self.shape
    }

    fn summary(&self) -> String {
        let mut lines = vec!["Recurrent forecaster (lstm)".to_string()];
        let mut inputs = self.shape.map_or(0, |s| s.width);
        for (i, &units) in self.config.units.iter().enumerate() {
            lines.push(format!(
                "  lstm_{}: {} units, {} params, dropout {}",
                i,
                units,
                4 * units * (inputs + units + 1),
                self.config.dropout
            ));
            inputs = units;
        }
        match self.shape {
            Some(shape) => {
                lines.push(format!(
                    "  dense: {} outputs, {} params",
                    shape.horizon,
                    (inputs + 1) * shape.horizon
                ));
                lines.push(format!(
                    "  input: {} steps x {} features",
                    shape.input_len, shape.width
                ));
                lines.push(format!(
                    "  total params: {}",
                    self.param_count().unwrap_or_default()
                ));
            }
            None => lines.push("  (not fitted)".to_string()),
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_windows(n: usize, input_len: usize) -> Windows {
        let series: Vec<f64> = (0..n + input_len + 1)
            .map(|i| 0.5 + 0.4 * (i as f64 * 0.3).sin())
            .collect();
        let mut windows = Windows::new(input_len, 1, 1);
        for s in 0..n {
            windows
                .push(series[s..s + input_len].to_vec(), vec![series[s + input_len]])
                .unwrap();
        }
        windows
    }

    fn small() -> LstmForecaster {
        LstmForecaster::new(
            RecurrentConfig::default().with_units(vec![8, 4]),
            TrainingConfig::default().with_epochs(40).with_learning_rate(0.01),
        )
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LstmForecaster::default();
        assert_eq!(model.predict(&[vec![0.0; 4]]), Err(ForecastError::NotFitted));
        assert!(model.predict_future(&[0.0; 4], 2).is_err());
        assert!(model.summary().contains("not fitted"));
    }

    #[test]
    fn test_fit_reduces_loss() {
        let mut model = small();
        let train = sine_windows(80, 6);
        let history = model.fit(&train, None).unwrap();
        assert!(history.best_loss().unwrap() < history.loss[0]);
        let out = model.predict(&train.inputs()[..3]).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].len(), 1);
    }

    #[test]
    fn test_same_seed_same_forecast() {
        let train = sine_windows(40, 5);
        let mut a = small();
        let mut b = small();
        a.fit(&train, None).unwrap();
        b.fit(&train, None).unwrap();
        let window = train.inputs()[0].clone();
        assert_eq!(
            a.predict_future(&window, 3).unwrap(),
            b.predict_future(&window, 3).unwrap()
        );
    }

    #[test]
    fn test_predict_rejects_wrong_window() {
        let mut model = small();
        model.fit(&sine_windows(20, 5), None).unwrap();
        assert!(matches!(
            model.predict(&[vec![0.0; 4]]),
            Err(ForecastError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_serde_round_trip_keeps_predictions() {
        let mut model = small();
        let train = sine_windows(20, 5);
        model.fit(&train, None).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: LstmForecaster = serde_json::from_str(&json).unwrap();
        assert_eq!(
            model.predict(train.inputs()).unwrap(),
            restored.predict(train.inputs()).unwrap()
        );
    }

    #[test]
    fn test_summary_counts_params() {
        let mut model = small();
        model.fit(&sine_windows(20, 5), None).unwrap();
        let expected = 4 * 8 * (1 + 8 + 1) + 4 * 4 * (8 + 4 + 1) + (4 + 1);
        assert_eq!(model.param_count(), Some(expected));
        assert!(model.summary().contains(&format!("total params: {}", expected)));
    }
}
