use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use common::validate::ensure_sql_identifier;

use crate::errors::{Result, WarehouseError};

/// A merged target row. The breach flag and last-sync columns belong to the
/// warehouse side: ingestion never writes them, the merge stamps `last_sync`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TargetIssueRow {
    pub key: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub issue_type: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub resolution: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub resolved: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub operational_categorization: Option<String>,
    pub linked_intercom_conversation_ids: Option<String>,
    pub team: Option<Vec<String>>,
    pub filiale: Option<Vec<String>>,
    pub start_date: Option<String>,
    pub ttr_raw_json: Option<String>,
    pub tffr_raw_json: Option<String>,
    pub sla_breached: Option<bool>,
    pub last_sync: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub updated: u64,
    pub inserted: u64,
}

/// Validated table names. Both end up interpolated into SQL, so construction
/// goes through the strict identifier pattern.
#[derive(Debug, Clone)]
pub struct TableNames {
    target: String,
    staging: String,
}

impl TableNames {
    pub fn new(target: &str, staging: &str) -> Result<Self> {
        ensure_sql_identifier(target)
            .map_err(|err| WarehouseError::Config(anyhow!("target table: {err}")))?;
        ensure_sql_identifier(staging)
            .map_err(|err| WarehouseError::Config(anyhow!("staging table: {err}")))?;
        Ok(Self {
            target: target.to_string(),
            staging: staging.to_string(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn staging(&self) -> &str {
        &self.staging
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            target: "issues".to_string(),
            staging: "issues_staging".to_string(),
        }
    }
}
