//! Picking a forecaster from the amount of data available.

use forecast_spi::ModelKind;

/// Recurrent models need long histories and long windows to pay off; the
/// convolutional model is the default otherwise. Multi-feature series with
/// more than 500 samples also go to the recurrent model.
pub fn recommend_forecaster(n_samples: usize, n_features: usize, sequence_length: usize) -> ModelKind {
    let long = n_samples > 1000 && sequence_length > 20;
    if long || (n_features > 1 && n_samples > 500) {
        ModelKind::Recurrent
    } else {
        ModelKind::Convolutional
    }
}
