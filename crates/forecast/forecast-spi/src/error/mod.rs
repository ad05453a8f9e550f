//! Error module containing error types and result aliases

mod forecast_error;

pub use forecast_error::{ForecastError, Result};
