//! Supervised windows drawn from a series.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Borrowed view of one window: `input_len × width` inputs and `horizon` targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<'a> {
    pub input: &'a [f64],
    pub target: &'a [f64],
}

/// A batch of windows sharing one shape.
///
/// Each input is stored row-major (`input_len` steps of `width` features);
/// each target holds `horizon` values of the target feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Windows {
    input_len: usize,
    horizon: usize,
    width: usize,
    inputs: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
}

impl Windows {
    /// Empty batch with the given shape.
    pub fn new(input_len: usize, horizon: usize, width: usize) -> Self {
        Self {
            input_len,
            horizon,
            width,
            inputs: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Append one window, checking it against the batch shape.
    pub fn push(&mut self, input: Vec<f64>, target: Vec<f64>) -> Result<()> {
        if input.len() != self.input_len * self.width {
            return Err(PipelineError::shape(
                format!("input of {} values", self.input_len * self.width),
                format!("{} values", input.len()),
            ));
        }
        if target.len() != self.horizon {
            return Err(PipelineError::shape(
                format!("target of {} values", self.horizon),
                format!("{} values", target.len()),
            ));
        }
        self.inputs.push(input);
        self.targets.push(target);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Steps per input window (L).
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Target steps per window (H).
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Features per input step.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    pub fn targets(&self) -> &[Vec<f64>] {
        &self.targets
    }

    pub fn get(&self, i: usize) -> Option<Window<'_>> {
        Some(Window {
            input: self.inputs.get(i)?,
            target: self.targets.get(i)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Window<'_>> {
        self.inputs
            .iter()
            .zip(self.targets.iter())
            .map(|(input, target)| Window { input, target })
    }

    /// Contiguous sub-batch, preserving order.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Self {
            input_len: self.input_len,
            horizon: self.horizon,
            width: self.width,
            inputs: self.inputs[start..end].to_vec(),
            targets: self.targets[start..end].to_vec(),
        }
    }
}
