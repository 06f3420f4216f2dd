//! Disposable warehouse databases for integration tests. When no admin
//! connection is configured the fixture constructor fails, and callers skip
//! the test, so the suite stays green on machines without Postgres.

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::postgres::PgConnectOptions;
use sqlx::PgPool;
use uuid::Uuid;
use warehouse::pg::run_migrations;

/// Connection options for the server hosting the throwaway databases, taken
/// from `TEST_ADMIN_URL` (falling back to `DATABASE_URL`).
pub struct WarehouseFixture {
    admin_options: PgConnectOptions,
}

impl WarehouseFixture {
    pub fn from_env() -> Result<Self> {
        let admin_url = env::var("TEST_ADMIN_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .context("TEST_ADMIN_URL or DATABASE_URL must be set for warehouse tests")?;
        let admin_options =
            PgConnectOptions::from_str(&admin_url).context("parsing admin connection url")?;
        Ok(Self { admin_options })
    }

    /// Creates a uniquely named database, runs the schema migrations into it,
    /// and hands back a connected pool plus the means to drop it again.
    pub async fn provision(&self, prefix: &str) -> Result<WarehouseHandle> {
        let db_name = format!("{}_{}", prefix, Uuid::new_v4().simple());

        let admin_pool = PgPool::connect_with(self.admin_options.clone()).await?;
        sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
            .execute(&admin_pool)
            .await
            .with_context(|| format!("creating database {db_name}"))?;

        let pool = PgPool::connect_with(self.admin_options.clone().database(&db_name)).await?;
        run_migrations(&pool).await?;

        Ok(WarehouseHandle {
            pool,
            db_name,
            admin_options: self.admin_options.clone(),
        })
    }
}

/// One provisioned database. Dropping the handle leaks the database; call
/// [`WarehouseHandle::teardown`] at the end of the test.
pub struct WarehouseHandle {
    pool: PgPool,
    db_name: String,
    admin_options: PgConnectOptions,
}

impl WarehouseHandle {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn teardown(self) -> Result<()> {
        self.pool.close().await;
        let admin_pool = PgPool::connect_with(self.admin_options).await?;
        sqlx::query("SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = $1")
            .bind(&self.db_name)
            .execute(&admin_pool)
            .await?;
        sqlx::query(&format!("DROP DATABASE IF EXISTS \"{}\"", self.db_name))
            .execute(&admin_pool)
            .await?;
        Ok(())
    }
}
