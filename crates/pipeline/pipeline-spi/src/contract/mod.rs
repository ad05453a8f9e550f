//! Contract definitions for preprocessing.

mod scaler;

pub use scaler::Scaler;
