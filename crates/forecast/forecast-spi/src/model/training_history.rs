//! Per-epoch training diagnostics

use serde::{Deserialize, Serialize};

/// Loss curves recorded while fitting a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Training MSE per epoch.
    pub loss: Vec<f64>,
    /// Validation MSE per epoch; empty without validation data.
    pub val_loss: Vec<f64>,
    /// Training MAE per epoch.
    pub mae: Vec<f64>,
    /// Validation MAE per epoch.
    pub val_mae: Vec<f64>,
    pub epochs_run: usize,
    pub stopped_early: bool,
    /// Epoch whose weights were kept.
    pub best_epoch: usize,
}

impl TrainingHistory {
    pub fn final_loss(&self) -> Option<f64> {
        self.loss.last().copied()
    }

    pub fn final_val_loss(&self) -> Option<f64> {
        self.val_loss.last().copied()
    }

    /// Lowest monitored loss: validation when recorded, training otherwise.
    pub fn best_loss(&self) -> Option<f64> {
        let monitored = if self.val_loss.is_empty() {
            &self.loss
        } else {
            &self.val_loss
        };
        monitored.iter().copied().reduce(f64::min)
    }
}
