//! Time series container.

use std::ops::Range;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Ordered sequence of observations, each a fixed-width row of features.
///
/// Values are stored row-major: step `i` occupies `values[i * width..(i + 1) * width]`.
/// A series is immutable once built; transformations return new series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    values: Vec<f64>,
    width: usize,
    timestamps: Option<Vec<DateTime<Utc>>>,
}

impl TimeSeries {
    /// Build a single-feature series.
    pub fn univariate(values: Vec<f64>) -> Self {
        Self {
            values,
            width: 1,
            timestamps: None,
        }
    }

    /// Build a multi-feature series from rows. Every row must have the same width.
    pub fn multivariate(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows.first().map(|r| r.len()).unwrap_or(1);
        if width == 0 {
            return Err(PipelineError::invalid("width", "rows must not be empty"));
        }
        let mut values = Vec::with_capacity(rows.len() * width);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(PipelineError::shape(
                    format!("row width {}", width),
                    format!("row {} with width {}", i, row.len()),
                ));
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            values,
            width,
            timestamps: None,
        })
    }

    /// Build from a flat row-major buffer.
    pub fn from_flat(values: Vec<f64>, width: usize) -> Result<Self> {
        if width == 0 {
            return Err(PipelineError::invalid("width", "must be at least 1"));
        }
        if values.len() % width != 0 {
            return Err(PipelineError::shape(
                format!("a multiple of width {}", width),
                format!("{} values", values.len()),
            ));
        }
        Ok(Self {
            values,
            width,
            timestamps: None,
        })
    }

    /// Attach a timestamp per step.
    pub fn with_timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Result<Self> {
        if timestamps.len() != self.len() {
            return Err(PipelineError::shape(
                format!("{} timestamps", self.len()),
                format!("{} timestamps", timestamps.len()),
            ));
        }
        self.timestamps = Some(timestamps);
        Ok(self)
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.values.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Features per step.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Flat row-major values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.timestamps.as_deref()
    }

    /// Row at step `i`.
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        let start = i.checked_mul(self.width)?;
        self.values.get(start..start + self.width)
    }

    /// Copy one feature out as a plain vector.
    pub fn column(&self, feature: usize) -> Result<Vec<f64>> {
        if feature >= self.width {
            return Err(PipelineError::shape(
                format!("feature < {}", self.width),
                format!("feature {}", feature),
            ));
        }
        Ok(self
            .values
            .chunks(self.width)
            .map(|row| row[feature])
            .collect())
    }

    /// Steps in `range` as a new series.
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.len() {
            return Err(PipelineError::shape(
                format!("range within 0..{}", self.len()),
                format!("{}..{}", range.start, range.end),
            ));
        }
        Ok(Self {
            values: self.values[range.start * self.width..range.end * self.width].to_vec(),
            width: self.width,
            timestamps: self
                .timestamps
                .as_ref()
                .map(|ts| ts[range.start..range.end].to_vec()),
        })
    }

    /// Same shape and timestamps, new values.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.values.len() {
            return Err(PipelineError::shape(
                format!("{} values", self.values.len()),
                format!("{} values", values.len()),
            ));
        }
        Ok(Self {
            values,
            width: self.width,
            timestamps: self.timestamps.clone(),
        })
    }
}

impl From<Vec<f64>> for TimeSeries {
    fn from(values: Vec<f64>) -> Self {
        Self::univariate(values)
    }
}
