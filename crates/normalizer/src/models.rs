use serde::{Deserialize, Serialize};

/// One flat row derived from exactly one raw issue. Every column except `key`
/// is independently nullable. Timestamps are carried verbatim from the source;
/// only date-only columns are re-rendered. The warehouse-side merge owns the
/// breach flag and last-sync columns, so they do not appear here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedRecord {
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
}
