//! Decomposition result model

use serde::{Deserialize, Serialize};

/// Result of trend + seasonal decomposition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionResult {
    /// Trend component
    pub trend: Vec<f64>,
    /// Seasonal component; multiplicative factors when `multiplicative` is set
    pub seasonal: Vec<f64>,
    /// Residual component, in original units
    pub residual: Vec<f64>,
    /// Seasonal period, if one was used
    pub period: Option<usize>,
    pub multiplicative: bool,
}
