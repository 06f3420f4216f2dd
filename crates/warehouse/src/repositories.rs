use async_trait::async_trait;
use chrono::{DateTime, Utc};
use normalizer::NormalizedRecord;

use crate::errors::Result;
use crate::models::{MergeOutcome, TargetIssueRow};

#[async_trait]
pub trait StagingRepository: Send + Sync {
    /// Bulk-appends one batch. An empty batch returns 0 without issuing a
    /// warehouse call; the whole batch is one unit, there is no per-row retry.
    async fn append(&self, records: &[NormalizedRecord]) -> Result<u64>;
    async fn count(&self) -> Result<i64>;
}

#[async_trait]
pub trait TargetRepository: Send + Sync {
    /// Merge-by-key from staging: overwrite matching rows (stamping
    /// `last_sync` with the supplied instant), insert the rest, then clear
    /// staging unconditionally. One transaction.
    async fn merge_from_staging(&self, synced_at: DateTime<Utc>) -> Result<MergeOutcome>;
    async fn get_by_key(&self, key: &str) -> Result<Option<TargetIssueRow>>;
    async fn count(&self) -> Result<i64>;
}

pub trait Warehouse: Send + Sync {
    fn staging(&self) -> &dyn StagingRepository;
    fn target(&self) -> &dyn TargetRepository;
}
