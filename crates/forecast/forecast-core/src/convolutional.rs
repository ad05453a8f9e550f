//! Conv1D forecaster: convolution and pooling stages, then a dense head.

use forecast_api::{ConvolutionalConfig, TrainingConfig};
use forecast_spi::{
    ForecastError, ForecastModel, InputShape, ModelKind, Result, TrainingHistory,
};
use pipeline_spi::Windows;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::neural::{
    apply_mask, dropout_mask, fit_network, max_pool, max_pool_backward, relu_backward,
    relu_in_place, Conv1d, Dense, Network, Param,
};
use crate::validate_batch;

// ============================================================================
// Network
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ConvolutionalNetwork {
    input_len: usize,
    pool_size: usize,
    dropout: f64,
    convs: Vec<Conv1d>,
    hidden: Vec<Dense>,
    head: Dense,
}

struct ConvStage {
    input: Vec<f64>,
    steps: usize,
    activated: Vec<f64>,
    source: Vec<usize>,
}

struct DenseStage {
    input: Vec<f64>,
    activated: Vec<f64>,
    mask: Vec<f64>,
}

pub(crate) struct ConvolutionalCache {
    convs: Vec<ConvStage>,
    hidden: Vec<DenseStage>,
    head_input: Vec<f64>,
}

impl ConvolutionalNetwork {
    fn new(shape: InputShape, config: &ConvolutionalConfig, rng: &mut StdRng) -> Result<Self> {
        let out_steps = config.output_len(shape.input_len).ok_or_else(|| {
            ForecastError::invalid(
                "window_length",
                format!(
                    "input window of {} steps is too short for the convolution stack",
                    shape.input_len
                ),
            )
        })?;

        let mut channels = shape.width;
        let convs: Vec<Conv1d> = config
            .filters
            .iter()
            .zip(&config.kernel_sizes)
            .map(|(&filters, &kernel)| {
                let conv = Conv1d::new(channels, filters, kernel, rng);
                channels = filters;
                conv
            })
            .collect();

        let mut inputs = out_steps * channels;
        let hidden = config
            .dense_units
            .iter()
            .map(|&units| {
                let layer = Dense::new(inputs, units, rng);
                inputs = units;
                layer
            })
            .collect();

        Ok(Self {
            input_len: shape.input_len,
            pool_size: config.pool_size,
            dropout: config.dropout,
            convs,
            hidden,
            head: Dense::new(inputs, shape.horizon, rng),
        })
    }

    fn param_count(&self) -> usize {
        self.convs.iter().map(Conv1d::param_count).sum::<usize>()
            + self.hidden.iter().map(Dense::param_count).sum::<usize>()
            + self.head.param_count()
    }

    /// Shared forward pass; dropout masks are drawn only when `rng` is given.
    fn run(&self, input: &[f64], mut rng: Option<&mut StdRng>) -> (Vec<f64>, ConvolutionalCache) {
        let mut x = input.to_vec();
        let mut steps = self.input_len;
        let mut conv_stages = Vec::with_capacity(self.convs.len());
        for conv in &self.convs {
            let mut activated = conv.forward(&x, steps);
            relu_in_place(&mut activated);
            let conv_steps = conv.output_steps(steps);
            let (pooled, source) = max_pool(&activated, conv_steps, conv.filters(), self.pool_size);
            conv_stages.push(ConvStage {
                input: std::mem::replace(&mut x, pooled),
                steps,
                activated,
                source,
            });
            steps = conv_steps / self.pool_size;
        }

        let mut dense_stages = Vec::with_capacity(self.hidden.len());
        for layer in &self.hidden {
            let mut activated = layer.forward(&x);
            relu_in_place(&mut activated);
            let mask = match rng.as_deref_mut() {
                Some(rng) => dropout_mask(activated.len(), self.dropout, rng),
                None => vec![1.0; activated.len()],
            };
            let mut out = activated.clone();
            apply_mask(&mut out, &mask);
            dense_stages.push(DenseStage {
                input: std::mem::replace(&mut x, out),
                activated,
                mask,
            });
        }

        let output = self.head.forward(&x);
        (
            output,
            ConvolutionalCache {
                convs: conv_stages,
                hidden: dense_stages,
                head_input: x,
            },
        )
    }
}

impl Network for ConvolutionalNetwork {
    type Cache = ConvolutionalCache;

    fn infer(&self, input: &[f64]) -> Vec<f64> {
        self.run(input, None).0
    }

    fn forward_train(&self, input: &[f64], rng: &mut StdRng) -> (Vec<f64>, ConvolutionalCache) {
        self.run(input, Some(rng))
    }

    fn backward(&mut self, cache: ConvolutionalCache, d_output: &[f64]) {
        let mut d = self.head.backward(&cache.head_input, d_output);

        for (layer, stage) in self.hidden.iter_mut().zip(&cache.hidden).rev() {
            apply_mask(&mut d, &stage.mask);
            relu_backward(&mut d, &stage.activated);
            d = layer.backward(&stage.input, &d);
        }

        for (conv, stage) in self.convs.iter_mut().zip(&cache.convs).rev() {
            let mut d_act = max_pool_backward(&d, &stage.source, stage.activated.len());
            relu_backward(&mut d_act, &stage.activated);
            d = conv.backward(&stage.input, stage.steps, &d_act);
        }
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        let mut params: Vec<&mut Param> = self
            .convs
            .iter_mut()
            .flat_map(|c| c.params_mut())
            .collect();
        params.extend(self.hidden.iter_mut().flat_map(|l| l.params_mut()));
        params.extend(self.head.params_mut());
        params
    }
}

// ============================================================================
// Forecaster
// ============================================================================

/// Convolutional model: learns local patterns in the input window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CnnForecaster {
    config: ConvolutionalConfig,
    training: TrainingConfig,
    shape: Option<InputShape>,
    network: Option<ConvolutionalNetwork>,
}

impl CnnForecaster {
    pub fn new(config: ConvolutionalConfig, training: TrainingConfig) -> Self {
        Self {
            config,
            training,
            shape: None,
            network: None,
        }
    }

    pub fn config(&self) -> &ConvolutionalConfig {
        &self.config
    }

    pub fn training(&self) -> &TrainingConfig {
        &self.training
    }

    pub fn param_count(&self) -> Option<usize> {
        self.network.as_ref().map(ConvolutionalNetwork::param_count)
    }
}

impl Default for CnnForecaster {
    fn default() -> Self {
        Self::new(ConvolutionalConfig::default(), TrainingConfig::default())
    }
}

impl ForecastModel for CnnForecaster {
    fn kind(&self) -> ModelKind {
        ModelKind::Convolutional
    }

    fn fit(&mut self, train: &Windows, validation: Option<&Windows>) -> Result<TrainingHistory> {
        self.config.validate()?;
        self.training.validate()?;
        let shape = validate_batch(train, validation)?;

        let mut rng = StdRng::seed_from_u64(self.training.seed);
        let mut network = ConvolutionalNetwork::new(shape, &self.config, &mut rng)?;
        let history = fit_network(&mut network, train, validation, &self.training, &mut rng, "cnn")?;

        info!(
            model = "cnn",
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
        let mut lines = vec!["Convolutional forecaster (cnn)".to_string()];
        let Some(shape) = self.shape else {
            lines.push(format!(
                "  conv filters {:?}, kernels {:?}, pool {}",
                self.config.filters, self.config.kernel_sizes, self.config.pool_size
            ));
            lines.push("  (not fitted)".to_string());
            return lines.join("\n");
        };

        let mut steps = shape.input_len;
        let mut channels = shape.width;
        for (i, (&filters, &kernel)) in self
            .config
            .filters
            .iter()
            .zip(&self.config.kernel_sizes)
            .enumerate()
        {
            steps = (steps + 1).saturating_sub(kernel) / self.config.pool_size.max(1);
            lines.push(format!(
                "  conv_{}: {} filters, kernel {}, {} params -> {} steps after pooling",
                i,
                filters,
                kernel,
                filters * (kernel * channels + 1),
                steps
            ));
            channels = filters;
        }
        let mut inputs = steps * channels;
        lines.push(format!("  flatten: {} values", inputs));
        for (i, &units) in self.config.dense_units.iter().enumerate() {
            lines.push(format!(
                "  dense_{}: {} units, {} params, dropout {}",
                i,
                units,
                (inputs + 1) * units,
                self.config.dropout
            ));
            inputs = units;
        }
        lines.push(format!(
            "  output: {} values, {} params",
            shape.horizon,
            (inputs + 1) * shape.horizon
        ));
        lines.push(format!(
            "  total params: {}",
            self.param_count().unwrap_or_default()
        ));
        lines.join("\n")
    }
}
