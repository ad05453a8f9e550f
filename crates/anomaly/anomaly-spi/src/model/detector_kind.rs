//! Anomaly detector variants

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnomalyError;

/// Which anomaly detection method produced a score series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DetectorKind {
    /// Likelihood under a Gaussian hidden Markov model of the differences.
    #[serde(rename = "hmm")]
    StateTransition,
    /// Deviation from a fitted trend + seasonal prediction band.
    #[serde(rename = "trend")]
    TrendDecomposition,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 2] = [DetectorKind::StateTransition, DetectorKind::TrendDecomposition];

    /// Identifier used in requests and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateTransition => "hmm",
            Self::TrendDecomposition => "trend",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectorKind {
    type Err = AnomalyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hmm" | "state-transition" | "state_transition" => Ok(Self::StateTransition),
            "trend" | "prophet" | "trend-decomposition" | "trend_decomposition" => {
                Ok(Self::TrendDecomposition)
            }
            other => Err(AnomalyError::invalid(
                "method",
                format!("unknown method '{}', expected hmm or trend", other),
            )),
        }
    }
}
