use super::catalog::StepDefinition;
use crate::shared::ids::StepId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub id: String,
    pub name: String,
    pub agent: String,
    pub status: StepStatus,
}

pub fn derive_step_status(
    step_id: &str,
    current_step_id: Option<&StepId>,
    completed_step_ids: &BTreeSet<StepId>,
) -> StepStatus {
    if current_step_id.is_some_and(|current| current.as_str() == step_id) {
        StepStatus::Running
    } else if completed_step_ids.contains(step_id) {
        StepStatus::Completed
    } else {
        StepStatus::Pending
    }
}

pub fn derive_step_statuses(
    catalog: &[StepDefinition],
    current_step_id: Option<&StepId>,
    completed_step_ids: &BTreeSet<StepId>,
) -> Vec<StepView> {
    catalog
        .iter()
        .map(|step| StepView {
            id: step.id.to_string(),
            name: step.name.to_string(),
            agent: step.agent.to_string(),
            status: derive_step_status(step.id, current_step_id, completed_step_ids),
        })
        .collect()
}

pub fn count_with_status(steps: &[StepView], status: StepStatus) -> usize {
    steps.iter().filter(|step| step.status == status).count()
}
