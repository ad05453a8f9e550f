//! Model module containing data structures

mod model_record;
mod record_name;

pub use model_record::{ModelRecord, RecordMetadata, TrainingDiagnostics};
pub use record_name::validate_name;
