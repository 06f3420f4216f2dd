use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use jira_client::JiraClient;
use tokio::time::sleep;
use tracing::{info, instrument};
use warehouse::{MergeOutcome, Warehouse};

use common::config::SyncConfig;
use common::time::Clock;

use crate::fetch::fetch_updated_since;
use crate::metrics;

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub since: String,
    pub fetched: usize,
    pub staged: u64,
    pub merge: MergeOutcome,
}

/// Linear run orchestrator: fetch, load to staging, reconcile. Any stage
/// failure fails the whole run; re-running is always safe because the merge is
/// idempotent per key.
pub struct SyncService {
    config: SyncConfig,
    client: Arc<dyn JiraClient>,
    warehouse: Arc<dyn Warehouse>,
    clock: Arc<dyn Clock>,
}

impl SyncService {
    pub fn new(
        config: SyncConfig,
        client: Arc<dyn JiraClient>,
        warehouse: Arc<dyn Warehouse>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            client,
            warehouse,
            clock,
        }
    }

    /// Lower bound for a run with no explicit override: one lookback window
    /// before now, matching the expected run cadence.
    pub fn default_since(&self) -> String {
        let since = self.clock.now() - chrono::Duration::seconds(self.config.lookback_secs as i64);
        since.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub async fn run(&self) -> Result<()> {
        loop {
            self.run_once(None).await?;
            if self.config.run_once {
                break;
            }
            sleep(Duration::from_secs(self.config.interval_secs)).await;
        }
        Ok(())
    }

    #[instrument(skip(self, since_override))]
    pub async fn run_once(&self, since_override: Option<&str>) -> Result<RunSummary> {
        metrics::RUNS_TOTAL.inc();
        metrics::LAST_RUN_TIMESTAMP.set(self.clock.now().timestamp());
        let _timer = metrics::RUN_DURATION.start_timer();

        let result = self.run_stages(since_override).await;
        match &result {
            Ok(summary) => {
                metrics::RUN_SUCCESSES_TOTAL.inc();
                metrics::LAST_SUCCESS_TIMESTAMP.set(self.clock.now().timestamp());
                info!(
                    since = %summary.since,
                    fetched = summary.fetched,
                    staged = summary.staged,
                    updated = summary.merge.updated,
                    inserted = summary.merge.inserted,
                    "sync run completed"
                );
            }
            Err(_) => {
                metrics::RUN_FAILURES_TOTAL.inc();
            }
        }
        result
    }

    async fn run_stages(&self, since_override: Option<&str>) -> Result<RunSummary> {
        let since = since_override
            .map(str::to_string)
            .or_else(|| self.config.since.clone())
            .unwrap_or_else(|| self.default_since());

        let records = fetch_updated_since(self.client.as_ref(), self.config.page_size, &since)
            .await
            .with_context(|| format!("fetching issues updated since {since}"))?;
        metrics::RECORDS_FETCHED_TOTAL.inc_by(records.len() as u64);

        // Empty batch: nothing to stage, and reconciling would only churn an
        // already-empty staging table.
        if records.is_empty() {
            info!(since = %since, "no updated issues; skipping load and reconcile");
            return Ok(RunSummary {
                since,
                ..RunSummary::default()
            });
        }

        let staged = self
            .warehouse
            .staging()
            .append(&records)
            .await
            .with_context(|| format!("staging {} records", records.len()))?;
        metrics::RECORDS_STAGED_TOTAL.inc_by(staged);

        let merge = self
            .warehouse
            .target()
            .merge_from_staging(self.clock.now())
            .await
            .context("merging staging into target")?;
        metrics::ROWS_UPDATED_TOTAL.inc_by(merge.updated);
        metrics::ROWS_INSERTED_TOTAL.inc_by(merge.inserted);

        Ok(RunSummary {
            since,
            fetched: records.len(),
            staged,
            merge,
        })
    }
}
