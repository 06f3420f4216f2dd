use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use common::{config::AppConfig, logging};
use jira_client::{fetch_all, CursorPager, HttpJiraClient, SearchQuery};
use normalizer::{fields, normalize};
use report::{aggregate, post_message, render_message};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging("info");
    let config = AppConfig::load()?;
    let report_config = config
        .report
        .clone()
        .context("report section missing from configuration")?;

    let client = HttpJiraClient::new(
        &config.jira.base_url,
        config.jira.email.clone(),
        config.jira.api_token.clone(),
        &config.jira.user_agent,
    )?;

    let window_start = Utc::now() - Duration::days(report_config.lookback_days);
    let query = SearchQuery {
        jql: format!(
            r#"updated >= "{}" ORDER BY updated ASC"#,
            window_start.format("%Y-%m-%d %H:%M")
        ),
        fields: fields::selection(),
        page_size: 100,
    };

    let raw_issues = fetch_all(&CursorPager, &client, &query).await?;
    let mut records = Vec::with_capacity(raw_issues.len());
    for issue in &raw_issues {
        match normalize(issue) {
            Some(record) => records.push(record),
            None => debug!("dropping issue without key"),
        }
    }
    info!(count = records.len(), "fetched issues for weekly report");

    let weekly = aggregate(&records, window_start);
    let message = render_message(&weekly, &report_config.team_mentions);

    let http = reqwest::Client::new();
    post_message(&http, &report_config.webhook_url, &message).await?;
    Ok(())
}
