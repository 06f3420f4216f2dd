pub mod errors;
pub mod models;
pub mod pg;
pub mod repositories;

pub use crate::errors::{Result, WarehouseError};
pub use crate::models::{MergeOutcome, TableNames, TargetIssueRow};
pub use crate::pg::PgWarehouse;
pub use crate::repositories::{StagingRepository, TargetRepository, Warehouse};
