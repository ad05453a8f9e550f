//! Contract module containing trait definitions for forecast operations

mod ensemble_combiner;
mod forecast_model;
mod seasonality_detector;

pub use ensemble_combiner::EnsembleCombiner;
pub use forecast_model::ForecastModel;
pub use seasonality_detector::SeasonalityDetector;
