use crate::channels::ConnectionStatus;
use crate::progress::activity::{AgentActivity, ProgressMessage};
use crate::progress::catalog::agent_display_name;
use crate::progress::steps::{count_with_status, StepStatus, StepView};
use crate::progress::store::WorkflowRun;

pub fn render_step_lines(steps: &[StepView]) -> Vec<String> {
    steps
        .iter()
        .map(|step| {
            format!(
                "  [{:<9}] {} ({})",
                step.status.as_str(),
                step.name,
                agent_display_name(&step.agent)
            )
        })
        .collect()
}

pub fn render_run_summary(run: &WorkflowRun, steps: &[StepView]) -> String {
    let current = run
        .current_step_id
        .as_ref()
        .map(|step| step.as_str())
        .unwrap_or("-");
    let agent = run
        .current_agent
        .as_ref()
        .map(|agent| agent_display_name(agent.as_str()))
        .unwrap_or("-");
    format!(
        "status={} progress={}% current_step={} agent={} completed={}/{}",
        run.status,
        run.progress_percentage,
        current,
        agent,
        count_with_status(steps, StepStatus::Completed),
        steps.len()
    )
}

pub fn render_message(message: &ProgressMessage) -> String {
    let time = message.timestamp.format("%H:%M:%S");
    match &message.agent_id {
        Some(agent) => format!(
            "{time} {}: {}",
            agent_display_name(agent.as_str()),
            message.content
        ),
        None => format!("{time} {}", message.content),
    }
}

pub fn render_activity(activity: &AgentActivity) -> String {
    format!(
        "{} #{} {} [{}] {}",
        activity.timestamp.format("%H:%M:%S"),
        activity.id,
        agent_display_name(activity.agent_id.as_str()),
        activity.status,
        activity.action
    )
}

pub fn render_connection(status: &ConnectionStatus) -> String {
    match &status.reason {
        Some(reason) => format!("connection {}: {reason}", status.state),
        None => format!("connection {}", status.state),
    }
}
