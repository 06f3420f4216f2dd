use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use common::config::SyncConfig;
use common::time::FixedClock;
use jira_client::{CursorPage, JiraClient, OffsetPage};
use normalizer::NormalizedRecord;
use serde_json::{json, Value};
use syncer::SyncService;
use warehouse::{
    MergeOutcome, StagingRepository, TargetIssueRow, TargetRepository, Warehouse,
};

fn sync_config() -> SyncConfig {
    SyncConfig {
        interval_secs: 0,
        page_size: 200,
        lookback_secs: 3600,
        run_once: true,
        since: Some("2025-03-05T00:00:00Z".to_string()),
    }
}

fn raw_issue(key: Option<&str>, summary: &str, updated: &str) -> Value {
    let mut issue = json!({
        "fields": {
            "summary": summary,
            "status": {"name": "Open"},
            "updated": updated
        }
    });
    if let Some(key) = key {
        issue["key"] = json!(key);
    }
    issue
}

/// Hands out one scripted batch of issues per run, as a single offset page.
struct ScriptedClient {
    batches: Mutex<VecDeque<Vec<Value>>>,
    calls: Mutex<u32>,
}

impl ScriptedClient {
    fn new(batches: Vec<Vec<Value>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl JiraClient for ScriptedClient {
    async fn search_offset(
        &self,
        _jql: &str,
        _fields: &[&str],
        start_at: u32,
        _max_results: u32,
    ) -> Result<OffsetPage> {
        *self.calls.lock().unwrap() += 1;
        let issues = self
            .batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        let total = issues.len() as u32;
        Ok(OffsetPage {
            max_results: total.max(1),
            issues,
            start_at,
            total,
        })
    }

    async fn search_cursor(
        &self,
        _jql: &str,
        _fields: &[&str],
        _page_token: Option<&str>,
        _max_results: u32,
    ) -> Result<CursorPage> {
        bail!("sync path never uses the cursor protocol");
    }
}

#[derive(Default)]
struct WarehouseState {
    staging: Vec<NormalizedRecord>,
    target: HashMap<String, (NormalizedRecord, Option<DateTime<Utc>>)>,
    append_calls: u32,
    merge_calls: u32,
}

struct MemoryStaging {
    state: Arc<Mutex<WarehouseState>>,
}

#[async_trait]
impl StagingRepository for MemoryStaging {
    async fn append(&self, records: &[NormalizedRecord]) -> warehouse::Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.append_calls += 1;
        state.staging.extend_from_slice(records);
        Ok(records.len() as u64)
    }

    async fn count(&self) -> warehouse::Result<i64> {
        Ok(self.state.lock().unwrap().staging.len() as i64)
    }
}

struct MemoryTarget {
    state: Arc<Mutex<WarehouseState>>,
}

fn to_row(record: &NormalizedRecord, last_sync: Option<DateTime<Utc>>) -> TargetIssueRow {
    TargetIssueRow {
        key: record.key.clone(),
        summary: record.summary.clone(),
        description: record.description.clone(),
        issue_type: record.issue_type.clone(),
        status: record.status.clone(),
        priority: record.priority.clone(),
        resolution: record.resolution.clone(),
        created: record.created.clone(),
        updated: record.updated.clone(),
        resolved: record.resolved.clone(),
        assignee: record.assignee.clone(),
        reporter: record.reporter.clone(),
        operational_categorization: record.operational_categorization.clone(),
        linked_intercom_conversation_ids: record.linked_intercom_conversation_ids.clone(),
        team: record.team.clone(),
        filiale: record.filiale.clone(),
        start_date: record.start_date.clone(),
        ttr_raw_json: record.ttr_raw_json.clone(),
        tffr_raw_json: record.tffr_raw_json.clone(),
        sla_breached: None,
        last_sync,
    }
}

#[async_trait]
impl TargetRepository for MemoryTarget {
    async fn merge_from_staging(&self, synced_at: DateTime<Utc>) -> warehouse::Result<MergeOutcome> {
        let mut state = self.state.lock().unwrap();
        state.merge_calls += 1;

        // Latest updated wins per key, mirroring the warehouse merge.
        let mut deduped: HashMap<String, NormalizedRecord> = HashMap::new();
        for record in state.staging.drain(..) {
            match deduped.get(&record.key) {
                Some(existing) if existing.updated >= record.updated => {}
                _ => {
                    deduped.insert(record.key.clone(), record);
                }
            }
        }

        let mut outcome = MergeOutcome::default();
        for (key, record) in deduped {
            if state.target.contains_key(&key) {
                state.target.insert(key, (record, Some(synced_at)));
                outcome.updated += 1;
            } else {
                state.target.insert(key, (record, None));
                outcome.inserted += 1;
            }
        }
        Ok(outcome)
    }

    async fn get_by_key(&self, key: &str) -> warehouse::Result<Option<TargetIssueRow>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .target
            .get(key)
            .map(|(record, last_sync)| to_row(record, *last_sync)))
    }

    async fn count(&self) -> warehouse::Result<i64> {
        Ok(self.state.lock().unwrap().target.len() as i64)
    }
}

struct MemoryWarehouse {
    staging: MemoryStaging,
    target: MemoryTarget,
    state: Arc<Mutex<WarehouseState>>,
}

impl MemoryWarehouse {
    fn new() -> Self {
        let state = Arc::new(Mutex::new(WarehouseState::default()));
        Self {
            staging: MemoryStaging {
                state: state.clone(),
            },
            target: MemoryTarget {
                state: state.clone(),
            },
            state,
        }
    }
}

impl Warehouse for MemoryWarehouse {
    fn staging(&self) -> &dyn StagingRepository {
        &self.staging
    }

    fn target(&self) -> &dyn TargetRepository {
        &self.target
    }
}

fn clock_at(hour: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2025, 3, 5, hour, 0, 0).unwrap(),
    ))
}

#[tokio::test]
async fn keyless_issues_never_reach_staging() -> Result<()> {
    let client = Arc::new(ScriptedClient::new(vec![vec![
        raw_issue(Some("OPS-1"), "keyed", "2025-03-05T09:00:00.000+0000"),
        raw_issue(None, "orphan", "2025-03-05T09:01:00.000+0000"),
    ]]));
    let wh = Arc::new(MemoryWarehouse::new());
    let state = wh.state.clone();
    let service = SyncService::new(sync_config(), client, wh, clock_at(10));

    let summary = service.run_once(None).await?;
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.staged, 1);
    assert_eq!(summary.merge.inserted, 1);
    assert_eq!(state.lock().unwrap().target.len(), 1);
    Ok(())
}

#[tokio::test]
async fn empty_fetch_skips_load_and_reconcile() -> Result<()> {
    let client = Arc::new(ScriptedClient::new(vec![vec![]]));
    let wh = Arc::new(MemoryWarehouse::new());
    let state = wh.state.clone();
    let service = SyncService::new(sync_config(), client, wh, clock_at(10));

    let summary = service.run_once(None).await?;
    assert_eq!(summary.fetched, 0);
    assert_eq!(summary.staged, 0);
    assert_eq!(summary.merge, MergeOutcome::default());

    let state = state.lock().unwrap();
    assert_eq!(state.append_calls, 0);
    assert_eq!(state.merge_calls, 0);
    Ok(())
}

#[tokio::test]
async fn invalid_since_fails_before_any_request() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let wh = Arc::new(MemoryWarehouse::new());
    let service = SyncService::new(sync_config(), client.clone(), wh, clock_at(10));

    let err = service
        .run_once(Some("2025-1-1T00:00:00Z"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("fetching issues"));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn second_run_overwrites_row_for_same_key() -> Result<()> {
    let client = Arc::new(ScriptedClient::new(vec![
        vec![raw_issue(
            Some("OPS-7"),
            "first summary",
            "2025-03-05T09:00:00.000+0000",
        )],
        vec![raw_issue(
            Some("OPS-7"),
            "second summary",
            "2025-03-05T10:30:00.000+0000",
        )],
    ]));
    let wh = Arc::new(MemoryWarehouse::new());
    let sync_time = Utc.with_ymd_and_hms(2025, 3, 5, 11, 0, 0).unwrap();
    let service = SyncService::new(
        sync_config(),
        client,
        wh.clone(),
        Arc::new(FixedClock(sync_time)),
    );

    let first = service.run_once(None).await?;
    assert_eq!(first.merge.inserted, 1);
    let second = service.run_once(None).await?;
    assert_eq!(second.merge.updated, 1);
    assert_eq!(second.merge.inserted, 0);

    assert_eq!(wh.target().count().await?, 1);
    let row = wh.target().get_by_key("OPS-7").await?.expect("row");
    assert_eq!(row.summary.as_deref(), Some("second summary"));
    assert_eq!(row.last_sync, Some(sync_time));
    Ok(())
}

#[tokio::test]
async fn default_since_is_one_lookback_window_before_now() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let wh = Arc::new(MemoryWarehouse::new());
    let config = SyncConfig {
        since: None,
        ..sync_config()
    };
    let service = SyncService::new(config, client, wh, clock_at(10));
    assert_eq!(service.default_since(), "2025-03-05T09:00:00Z");
}
