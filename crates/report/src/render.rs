use std::collections::HashMap;

use crate::aggregate::WeeklyReport;

/// Renders the chat message. Mentions come from the configuration object
/// passed in by the caller; teams without one fall back to their plain name.
pub fn render_message(report: &WeeklyReport, team_mentions: &HashMap<String, String>) -> String {
    let mut lines = vec![format!(
        "Weekly issue report (since {}): {} issues touched",
        report.window_start.format("%Y-%m-%d"),
        report.total_touched
    )];
    for team in &report.teams {
        let label = team_mentions
            .get(&team.team)
            .cloned()
            .unwrap_or_else(|| team.team.clone());
        lines.push(format!(
            "- {label}: {} created, {} resolved, {} SLA breached",
            team.created, team.resolved, team.sla_breached
        ));
    }
    lines.join("\n")
}
