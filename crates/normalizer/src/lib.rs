pub mod fields;
pub mod models;
pub mod transform;

pub use crate::models::NormalizedRecord;
pub use crate::transform::{normalize, FieldValue};
