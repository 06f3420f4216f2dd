use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use normalizer::NormalizedRecord;
use serde_json::Value;

pub const UNASSIGNED_TEAM: &str = "Unassigned";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamSummary {
    pub team: String,
    pub created: u64,
    pub resolved: u64,
    pub sla_breached: u64,
}

#[derive(Debug, Clone)]
pub struct WeeklyReport {
    pub window_start: DateTime<Utc>,
    pub total_touched: usize,
    pub teams: Vec<TeamSummary>,
}

/// Interprets the opaque SLA JSON the pipeline deliberately leaves raw: an
/// issue counts as breached when its ongoing cycle or any completed cycle
/// reports `breached: true`.
pub fn sla_breached(raw_json: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(raw_json) else {
        return false;
    };
    let ongoing = value
        .get("ongoingCycle")
        .and_then(|cycle| cycle.get("breached"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let completed = value
        .get("completedCycles")
        .and_then(Value::as_array)
        .is_some_and(|cycles| {
            cycles.iter().any(|cycle| {
                cycle
                    .get("breached")
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
            })
        });
    ongoing || completed
}

/// Source timestamps arrive either RFC 3339 or with a colon-less offset.
fn parse_source_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Buckets records per team. An issue with several teams counts under each;
/// one with none counts under [UNASSIGNED_TEAM]. Created and resolved are
/// counted against the reporting window, breaches against the whole batch.
pub fn aggregate(records: &[NormalizedRecord], window_start: DateTime<Utc>) -> WeeklyReport {
    let mut teams: BTreeMap<String, TeamSummary> = BTreeMap::new();

    for record in records {
        let created_in_window = record
            .created
            .as_deref()
            .and_then(parse_source_timestamp)
            .is_some_and(|ts| ts >= window_start);
        let resolved_in_window = record
            .resolved
            .as_deref()
            .and_then(parse_source_timestamp)
            .is_some_and(|ts| ts >= window_start);
        let breached = record
            .ttr_raw_json
            .as_deref()
            .is_some_and(sla_breached);

        let names: Vec<String> = match &record.team {
            Some(names) if !names.is_empty() => names.clone(),
            _ => vec![UNASSIGNED_TEAM.to_string()],
        };
        for name in names {
            let entry = teams.entry(name.clone()).or_insert_with(|| TeamSummary {
                team: name,
                ..TeamSummary::default()
            });
            if created_in_window {
                entry.created += 1;
            }
            if resolved_in_window {
                entry.resolved += 1;
            }
            if breached {
                entry.sla_breached += 1;
            }
        }
    }

    WeeklyReport {
        window_start,
        total_touched: records.len(),
        teams: teams.into_values().collect(),
    }
}
