use anyhow::Result;
use chrono::{DateTime, Utc};
use jira_client::{fetch_all, JiraClient, OffsetPager, SearchQuery};
use normalizer::{fields, normalize, NormalizedRecord};
use tracing::debug;

use common::validate::ensure_utc_timestamp;

/// Fetches every issue updated at or after `since`, ascending by update time,
/// normalized and filtered down to mergeable (keyed) records.
///
/// Ascending order means an interrupted run leaves its unprocessed tail inside
/// the next run's lookback window, so no resume cursor is needed.
pub async fn fetch_updated_since(
    client: &dyn JiraClient,
    page_size: u32,
    since: &str,
) -> Result<Vec<NormalizedRecord>> {
    let jql = jql_updated_since(since)?;
    let query = SearchQuery {
        jql,
        fields: fields::selection(),
        page_size,
    };

    let raw_issues = fetch_all(&OffsetPager, client, &query).await?;
    let mut records = Vec::with_capacity(raw_issues.len());
    for issue in &raw_issues {
        match normalize(issue) {
            Some(record) => records.push(record),
            None => debug!("dropping issue without key"),
        }
    }
    Ok(records)
}

/// Builds the incremental search expression. The timestamp is embedded into
/// the query, so it must pass strict validation first.
pub fn jql_updated_since(since: &str) -> Result<String> {
    ensure_utc_timestamp(since)?;
    let ts: DateTime<Utc> = since.parse()?;
    Ok(format!(
        r#"updated >= "{}" ORDER BY updated ASC"#,
        ts.format("%Y-%m-%d %H:%M")
    ))
}
