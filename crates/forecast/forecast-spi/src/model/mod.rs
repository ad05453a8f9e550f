//! Model module containing data structures

mod confidence_interval;
mod decomposition_result;
mod forecast_result;
mod input_shape;
mod model_kind;
mod training_history;

pub use confidence_interval::ConfidenceInterval;
pub use decomposition_result::DecompositionResult;
pub use forecast_result::{ExcludedModel, ForecastResult, ModelOutcome, Outcome};
pub use input_shape::InputShape;
pub use model_kind::ModelKind;
pub use training_history::TrainingHistory;
