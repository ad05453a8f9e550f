//! Forecast model variants

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Which forecast model variant an instance is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Stacked LSTM layers carrying state across the window.
    #[serde(rename = "lstm")]
    Recurrent,
    /// Conv1D feature extractor treating the window as a receptive field.
    #[serde(rename = "cnn")]
    Convolutional,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Recurrent, ModelKind::Convolutional];

    /// Identifier used in requests, responses and registry records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recurrent => "lstm",
            Self::Convolutional => "cnn",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lstm" | "recurrent" => Ok(Self::Recurrent),
            "cnn" | "convolutional" => Ok(Self::Convolutional),
            other => Err(ForecastError::invalid(
                "model",
                format!("unknown model '{}', expected lstm or cnn", other),
            )),
        }
    }
}
