//! Source field identifiers. Custom field ids are stable per Jira site and are
//! part of the ingestion contract; the selection list below is what every
//! search request asks for.

pub const SUMMARY: &str = "summary";
pub const DESCRIPTION: &str = "description";
pub const ISSUE_TYPE: &str = "issuetype";
pub const STATUS: &str = "status";
pub const PRIORITY: &str = "priority";
pub const RESOLUTION: &str = "resolution";
pub const CREATED: &str = "created";
pub const UPDATED: &str = "updated";
pub const RESOLVED: &str = "resolutiondate";
pub const ASSIGNEE: &str = "assignee";
pub const REPORTER: &str = "reporter";

pub const OPERATIONAL_CATEGORIZATION: &str = "customfield_10045";
pub const INTERCOM_CONVERSATION_IDS: &str = "customfield_10062";
pub const TEAM: &str = "customfield_10001";
pub const FILIALE: &str = "customfield_10071";
pub const START_DATE: &str = "customfield_10015";
/// Time-to-resolution SLA object, stored opaque.
pub const TTR: &str = "customfield_10042";
/// Time-to-first-response SLA object, stored opaque.
pub const TFFR: &str = "customfield_10041";

pub fn selection() -> Vec<&'static str> {
    vec![
        SUMMARY,
        DESCRIPTION,
        ISSUE_TYPE,
        STATUS,
        PRIORITY,
        RESOLUTION,
        CREATED,
        UPDATED,
        RESOLVED,
        ASSIGNEE,
        REPORTER,
        OPERATIONAL_CATEGORIZATION,
        INTERCOM_CONVERSATION_IDS,
        TEAM,
        FILIALE,
        START_DATE,
        TTR,
        TFFR,
    ]
}
