use std::sync::Arc;

use jira_client::JiraClient;
use sqlx::PgPool;
use syncer::SyncService;
use tracing::{error, info};
use warehouse::{PgWarehouse, TableNames, Warehouse};

use common::config::{SyncConfig, WarehouseConfig};
use common::time::Clock;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("deployment configuration is invalid")]
    Misconfigured,
}

/// Starts sync runs in the background. Behind a trait so the trigger route can
/// be exercised without a warehouse connection.
pub trait RunLauncher: Send + Sync {
    fn launch(&self, since: Option<String>) -> Result<(), LaunchError>;
}

pub struct PgRunLauncher {
    sync_config: SyncConfig,
    warehouse_config: WarehouseConfig,
    client: Arc<dyn JiraClient>,
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgRunLauncher {
    pub fn new(
        sync_config: SyncConfig,
        warehouse_config: WarehouseConfig,
        client: Arc<dyn JiraClient>,
        pool: PgPool,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sync_config,
            warehouse_config,
            client,
            pool,
            clock,
        }
    }
}

impl RunLauncher for PgRunLauncher {
    fn launch(&self, since: Option<String>) -> Result<(), LaunchError> {
        // Deployment identifiers are resolved per trigger; the caller only
        // ever learns that the configuration is invalid, not which part.
        let tables = TableNames::new(
            &self.warehouse_config.target_table,
            &self.warehouse_config.staging_table,
        )
        .map_err(|err| {
            error!(error = %err, "rejecting trigger: invalid deployment identifiers");
            LaunchError::Misconfigured
        })?;

        let warehouse: Arc<dyn Warehouse> =
            Arc::new(PgWarehouse::from_pool(self.pool.clone(), tables));
        let service = SyncService::new(
            self.sync_config.clone(),
            self.client.clone(),
            warehouse,
            self.clock.clone(),
        );

        tokio::spawn(async move {
            info!(since = ?since, "triggered sync run starting");
            if let Err(err) = service.run_once(since.as_deref()).await {
                error!(error = ?err, "triggered sync run failed");
            }
        });
        Ok(())
    }
}
