pub mod fetch;
pub mod metrics;
pub mod service;

pub use crate::fetch::fetch_updated_since;
pub use crate::service::{RunSummary, SyncService};
