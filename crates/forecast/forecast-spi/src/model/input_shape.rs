//! Window shape a model is built for

use serde::{Deserialize, Serialize};

/// Shape of the windows a model was fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    /// Steps per input window (L).
    pub input_len: usize,
    /// Features per step.
    pub width: usize,
    /// Steps predicted per window (H).
    pub horizon: usize,
}

impl InputShape {
    pub fn new(input_len: usize, width: usize, horizon: usize) -> Self {
        Self {
            input_len,
            width,
            horizon,
        }
    }

    /// Flattened length of one input window.
    pub fn input_size(&self) -> usize {
        self.input_len * self.width
    }
}
