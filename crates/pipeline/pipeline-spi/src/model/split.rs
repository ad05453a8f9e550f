//! Chronological partitions.

use serde::{Deserialize, Serialize};

/// Train / validation / test partitions, in time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSplit<T> {
    pub train: T,
    pub validation: T,
    pub test: T,
}

impl<T> DataSplit<T> {
    /// Apply `f` to every partition.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> DataSplit<U> {
        DataSplit {
            train: f(self.train),
            validation: f(self.validation),
            test: f(self.test),
        }
    }
}
