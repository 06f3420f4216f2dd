use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use normalizer::NormalizedRecord;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use tokio::time::{sleep, Duration};
use tracing::{instrument, warn};

use crate::errors::{Result, WarehouseError};
use crate::models::{MergeOutcome, TableNames, TargetIssueRow};
use crate::repositories::{StagingRepository, TargetRepository, Warehouse};

/// Columns shared by the staging and target tables; everything the ingestion
/// layer writes. `sla_breached` and `last_sync` are deliberately absent.
const RECORD_COLUMNS: &str = "key, summary, description, issue_type, status, priority, \
     resolution, created, updated, resolved, assignee, reporter, \
     operational_categorization, linked_intercom_conversation_ids, team, filiale, \
     start_date, ttr_raw_json, tffr_raw_json";

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(WarehouseError::Migration)
}

#[derive(Clone)]
pub struct PgWarehouse {
    pool: PgPool,
    staging_repo: Arc<PgStagingRepository>,
    target_repo: Arc<PgTargetRepository>,
}

impl PgWarehouse {
    pub async fn connect(database_url: &str, tables: TableNames) -> Result<Self> {
        const MAX_ATTEMPTS: u32 = 5;
        const BASE_DELAY_MS: u64 = 500;

        let mut attempts = 0;
        loop {
            match PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
            {
                Ok(pool) => {
                    run_migrations(&pool).await?;
                    return Ok(Self::from_pool(pool, tables));
                }
                Err(err) => {
                    attempts += 1;
                    if attempts >= MAX_ATTEMPTS {
                        return Err(WarehouseError::Query(err));
                    }

                    let exp = (attempts - 1).min(5);
                    let backoff = Duration::from_millis(BASE_DELAY_MS * (1u64 << exp));
                    warn!(
                        attempts,
                        error = %err,
                        wait_ms = backoff.as_millis(),
                        "warehouse connection failed; retrying"
                    );
                    sleep(backoff).await;
                }
            }
        }
    }

    pub fn from_pool(pool: PgPool, tables: TableNames) -> Self {
        let staging_repo = Arc::new(PgStagingRepository {
            pool: pool.clone(),
            tables: tables.clone(),
        });
        let target_repo = Arc::new(PgTargetRepository {
            pool: pool.clone(),
            tables,
        });

        Self {
            pool,
            staging_repo,
            target_repo,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Warehouse for PgWarehouse {
    fn staging(&self) -> &dyn StagingRepository {
        &*self.staging_repo
    }

    fn target(&self) -> &dyn TargetRepository {
        &*self.target_repo
    }
}

#[derive(Clone)]
struct PgStagingRepository {
    pool: PgPool,
    tables: TableNames,
}

#[async_trait]
impl StagingRepository for PgStagingRepository {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn append(&self, records: &[NormalizedRecord]) -> Result<u64> {
        // A VALUES list with zero tuples is a syntax error, so an empty batch
        // never reaches the warehouse.
        if records.is_empty() {
            return Ok(0);
        }
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} ({RECORD_COLUMNS}) ",
            self.tables.staging()
        ));
        builder.push_values(records, |mut row, record| {
            row.push_bind(record.key.clone())
                .push_bind(record.summary.clone())
                .push_bind(record.description.clone())
                .push_bind(record.issue_type.clone())
                .push_bind(record.status.clone())
                .push_bind(record.priority.clone())
                .push_bind(record.resolution.clone())
                .push_bind(record.created.clone())
                .push_bind(record.updated.clone())
                .push_bind(record.resolved.clone())
                .push_bind(record.assignee.clone())
                .push_bind(record.reporter.clone())
                .push_bind(record.operational_categorization.clone())
                .push_bind(record.linked_intercom_conversation_ids.clone())
                .push_bind(record.team.clone())
                .push_bind(record.filiale.clone())
                .push_bind(record.start_date.clone())
                .push_bind(record.ttr_raw_json.clone())
                .push_bind(record.tffr_raw_json.clone());
        });
        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(WarehouseError::Query)?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {}",
            self.tables.staging()
        ))
        .fetch_one(&self.pool)
        .await
        .map_err(WarehouseError::Query)
    }
}

#[derive(Clone)]
struct PgTargetRepository {
    pool: PgPool,
    tables: TableNames,
}

impl PgTargetRepository {
    /// Staging may hold overlapping batches from concurrent runs; the latest
    /// `updated` value wins per key.
    fn deduped_staging(&self) -> String {
        format!(
            "SELECT DISTINCT ON (key) * FROM {} ORDER BY key, updated DESC NULLS LAST",
            self.tables.staging()
        )
    }
}

#[async_trait]
impl TargetRepository for PgTargetRepository {
    #[instrument(skip(self))]
    async fn merge_from_staging(&self, synced_at: DateTime<Utc>) -> Result<MergeOutcome> {
        let target = self.tables.target();
        let staging = self.tables.staging();
        let deduped = self.deduped_staging();

        let update_sql = format!(
            r#"
            UPDATE {target} AS t
            SET summary = s.summary,
                description = s.description,
                issue_type = s.issue_type,
                status = s.status,
                priority = s.priority,
                resolution = s.resolution,
                created = s.created,
                updated = s.updated,
                resolved = s.resolved,
                assignee = s.assignee,
                reporter = s.reporter,
                operational_categorization = s.operational_categorization,
                linked_intercom_conversation_ids = s.linked_intercom_conversation_ids,
                team = s.team,
                filiale = s.filiale,
                start_date = s.start_date,
                ttr_raw_json = s.ttr_raw_json,
                tffr_raw_json = s.tffr_raw_json,
                last_sync = $1
            FROM ({deduped}) AS s
            WHERE t.key = s.key
            "#
        );
        let insert_sql = format!(
            r#"
            INSERT INTO {target} ({RECORD_COLUMNS})
            SELECT {RECORD_COLUMNS}
            FROM ({deduped}) AS s
            WHERE NOT EXISTS (SELECT 1 FROM {target} AS t WHERE t.key = s.key)
            "#
        );
        let clear_sql = format!("DELETE FROM {staging}");

        let mut tx = self.pool.begin().await.map_err(WarehouseError::Query)?;
        let updated = sqlx::query(&update_sql)
            .bind(synced_at)
            .execute(&mut *tx)
            .await
            .map_err(WarehouseError::Query)?
            .rows_affected();
        let inserted = sqlx::query(&insert_sql)
            .execute(&mut *tx)
            .await
            .map_err(WarehouseError::Query)?
            .rows_affected();
        // Staging is cleared even when the merge touched zero rows, so a
        // re-triggered run can never apply the same batch twice.
        sqlx::query(&clear_sql)
            .execute(&mut *tx)
            .await
            .map_err(WarehouseError::Query)?;
        tx.commit().await.map_err(WarehouseError::Query)?;

        Ok(MergeOutcome { updated, inserted })
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<TargetIssueRow>> {
        sqlx::query_as::<_, TargetIssueRow>(&format!(
            "SELECT * FROM {} WHERE key = $1",
            self.tables.target()
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(WarehouseError::Query)
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", self.tables.target()))
            .fetch_one(&self.pool)
            .await
            .map_err(WarehouseError::Query)
    }
}
