use crate::progress::catalog::{agent_display_name, step_catalog, AGENT_PROFILES};

pub fn cmd_steps() -> String {
    let mut lines = vec!["Workflow steps:".to_string()];
    lines.extend(step_catalog().iter().enumerate().map(|(index, step)| {
        format!(
            "  {}. {:<26} {:<26} {}",
            index + 1,
            step.id,
            step.name,
            agent_display_name(step.agent)
        )
    }));
    lines.join("\n")
}

pub fn cmd_agents() -> String {
    let mut lines = vec!["Pipeline agents:".to_string()];
    lines.extend(AGENT_PROFILES.iter().map(|profile| {
        format!(
            "  {:<24} {:<30} {}",
            profile.id, profile.display_name, profile.role
        )
    }));
    lines.join("\n")
}
