use std::sync::Arc;

use anyhow::Result;
use common::{config::AppConfig, logging, SystemClock};
use jira_client::HttpJiraClient;
use syncer::SyncService;
use tracing::info;
use warehouse::{PgWarehouse, TableNames, Warehouse};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging("info");
    let config = AppConfig::load()?;

    let client = Arc::new(HttpJiraClient::new(
        &config.jira.base_url,
        config.jira.email.clone(),
        config.jira.api_token.clone(),
        &config.jira.user_agent,
    )?);

    let tables = TableNames::new(&config.warehouse.target_table, &config.warehouse.staging_table)?;
    let wh = Arc::new(PgWarehouse::connect(&config.warehouse.url, tables).await?);
    let warehouse: Arc<dyn Warehouse> = wh;

    let service = SyncService::new(
        config.sync.clone(),
        client,
        warehouse,
        Arc::new(SystemClock),
    );
    info!(
        interval = config.sync.interval_secs,
        page_size = config.sync.page_size,
        "syncer started"
    );
    service.run().await?;
    Ok(())
}
