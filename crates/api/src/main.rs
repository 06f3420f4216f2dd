use std::sync::Arc;

use anyhow::Result;
use api::{build_router, ApiState, PgRunLauncher};
use axum::Router;
use common::{config::AppConfig, logging, SystemClock};
use jira_client::HttpJiraClient;
use tracing::info;
use warehouse::{PgWarehouse, TableNames};

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

    // Connect with the configured tables up front so migrations run at boot;
    // each trigger re-resolves the identifiers itself.
    let tables = TableNames::new(&config.warehouse.target_table, &config.warehouse.staging_table)?;
    let wh = PgWarehouse::connect(&config.warehouse.url, tables).await?;

    let launcher = Arc::new(PgRunLauncher::new(
        config.sync.clone(),
        config.warehouse.clone(),
        client,
        wh.pool().clone(),
        Arc::new(SystemClock),
    ));
    let metrics_path: &'static str =
        Box::leak(config.api.metrics_path.clone().into_boxed_str());
    let state = Arc::new(ApiState {
        trigger_token: config.api.trigger_token.clone(),
        metrics_path,
        launcher,
    });
    let app: Router = build_router(state);

    let addr: std::net::SocketAddr = config.api.bind.parse()?;
    info!("api listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
