//! Forecast model trait definition

use pipeline_spi::Windows;

use crate::error::{ForecastError, Result};
use crate::model::{InputShape, ModelKind, TrainingHistory};

/// A trainable sequence-to-horizon forecaster.
///
/// Inputs are flattened windows of `input_len × width` values, row-major;
/// outputs are `horizon` values of the target feature. Implementations differ
/// only in how they read the window, so callers never branch on the variant.
pub trait ForecastModel: Send + Sync {
    /// Variant tag.
    fn kind(&self) -> ModelKind;

    /// Train on `train`, monitoring `validation` for early stopping when given.
    fn fit(&mut self, train: &Windows, validation: Option<&Windows>) -> Result<TrainingHistory>;

    /// Predict one horizon per input window.
    ///
    /// Returns [`ForecastError::NotFitted`] before [`ForecastModel::fit`].
    fn predict(&self, inputs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;

    /// Shape the model was fitted on, `None` before fitting.
    fn input_shape(&self) -> Option<InputShape>;

    fn is_fitted(&self) -> bool {
        self.input_shape().is_some()
    }

    /// Human-readable architecture description.
    fn summary(&self) -> String;

    /// Roll the model forward `steps` times from `last_window`.
    ///
    /// Each iteration appends the predicted horizon to the window and drops
    /// the oldest values so the window keeps its length, sliding forward by
    /// `horizon` steps. Only single-feature windows can be extended this way.
    fn predict_future(&self, last_window: &[f64], steps: usize) -> Result<Vec<Vec<f64>>> {
        let shape = self.input_shape().ok_or(ForecastError::NotFitted)?;
        if shape.width != 1 {
            return Err(ForecastError::shape(
                "single-feature window",
                format!("{} features per step", shape.width),
            ));
        }
        if last_window.len() != shape.input_len {
            return Err(ForecastError::shape(
                format!("window of {} values", shape.input_len),
                format!("window of {} values", last_window.len()),
            ));
        }

        let mut window = last_window.to_vec();
        let mut forecasts = Vec::with_capacity(steps);
        for _ in 0..steps {
            let prediction = self
                .predict(std::slice::from_ref(&window))?
                .pop()
                .ok_or_else(|| ForecastError::NumericalError("empty prediction".into()))?;
            window.extend_from_slice(&prediction);
            let excess = window.len() - shape.input_len;
            window.drain(..excess);
            forecasts.push(prediction);
        }
        Ok(forecasts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predicts the last value plus one for every horizon step.
    struct Increment {
        shape: Option<InputShape>,
    }

    impl ForecastModel for Increment {
        fn kind(&self) -> ModelKind {
            ModelKind::Recurrent
        }

        fn fit(&mut self, train: &Windows, _validation: Option<&Windows>) -> Result<TrainingHistory> {
            self.shape = Some(InputShape::new(train.input_len(), train.width(), train.horizon()));
            Ok(TrainingHistory::default())
        }

        fn predict(&self, inputs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
            let shape = self.shape.ok_or(ForecastError::NotFitted)?;
            Ok(inputs
                .iter()
                .map(|w| {
                    let last = w[w.len() - 1];
                    (1..=shape.horizon).map(|k| last + k as f64).collect()
                })
                .collect())
        }

        fn input_shape(&self) -> Option<InputShape> {
            self.shape
        }

        fn summary(&self) -> String {
            "increment".into()
        }
    }

    fn fitted(input_len: usize, width: usize, horizon: usize) -> Increment {
        let mut model = Increment { shape: None };
        model
            .fit(&Windows::new(input_len, horizon, width), None)
            .unwrap();
        model
    }

    #[test]
    fn test_predict_future_before_fit() {
        let model = Increment { shape: None };
        assert_eq!(
            model.predict_future(&[1.0, 2.0], 3),
            Err(ForecastError::NotFitted)
        );
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_predict_future_single_step_horizon() {
        let model = fitted(3, 1, 1);
        let out = model.predict_future(&[1.0, 2.0, 3.0], 3).unwrap();
        assert_eq!(out, vec![vec![4.0], vec![5.0], vec![6.0]]);
    }

    #[test]
    fn test_predict_future_slides_by_horizon() {
        let model = fitted(4, 1, 2);
        let out = model.predict_future(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(out, vec![vec![5.0, 6.0], vec![7.0, 8.0]]);
    }

    #[test]
    fn test_predict_future_rejects_wrong_length() {
        let model = fitted(3, 1, 1);
        assert!(matches!(
            model.predict_future(&[1.0, 2.0], 1),
            Err(ForecastError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_predict_future_rejects_multivariate() {
        let model = fitted(3, 2, 1);
        assert!(model.predict_future(&[0.0; 6], 1).is_err());
    }
}
