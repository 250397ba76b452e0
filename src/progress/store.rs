use super::activity::{ActivityLog, AgentActivity, NewActivity, ProgressMessage};
use super::catalog::step_catalog;
use super::frame::{FrameKind, InboundFrame, ProgressPatch, RunStatus};
use super::steps::{derive_step_statuses, StepView};
use crate::shared::ids::{AgentId, RunId, StepId};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

pub const FALLBACK_ACTION: &str = "Processing…";
pub const FALLBACK_AGENT: &str = "system";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    #[serde(default)]
    pub run_id: Option<RunId>,
    pub status: RunStatus,
    #[serde(default)]
    pub current_step_id: Option<StepId>,
    #[serde(default)]
    pub completed_step_ids: BTreeSet<StepId>,
    pub progress_percentage: u8,
    #[serde(default)]
    pub current_agent: Option<AgentId>,
    #[serde(default)]
    pub final_result: Option<Value>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl WorkflowRun {
    pub fn for_run(run_id: RunId) -> Self {
        Self {
            run_id: Some(run_id),
            ..Self::default()
        }
    }

    pub fn completed_result(&self) -> Option<&Value> {
        if self.status == RunStatus::Completed {
            self.final_result.as_ref()
        } else {
            None
        }
    }

    fn overwrite_from(&mut self, patch: &ProgressPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(current_step) = &patch.current_step {
            self.current_step_id = current_step.clone();
        }
        if let Some(completed_steps) = &patch.completed_steps {
            self.completed_step_ids = completed_steps.iter().cloned().collect();
        }
        if let Some(progress_percentage) = patch.progress_percentage {
            self.progress_percentage = progress_percentage;
        }
        if let Some(current_agent) = &patch.current_agent {
            self.current_agent = Some(current_agent.clone());
        }
        if let Some(final_result) = &patch.final_result {
            self.final_result = Some(final_result.clone());
        }
        if let Some(start_time) = &patch.start_time {
            self.started_at = Some(start_time.clone());
        }
        if let Some(end_time) = &patch.end_time {
            self.ended_at = Some(end_time.clone());
        }
        if let Some(last_updated) = &patch.last_updated {
            self.last_updated = Some(last_updated.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    pub run: WorkflowRun,
    pub steps: Vec<StepView>,
    pub log: ActivityLog,
}

impl ProgressState {
    pub fn new(run_id: Option<RunId>) -> Self {
        let run = match run_id {
            Some(run_id) => WorkflowRun::for_run(run_id),
            None => WorkflowRun::default(),
        };
        let steps = derive_steps(&run);
        Self {
            run,
            steps,
            log: ActivityLog::new(),
        }
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new(None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub run: WorkflowRun,
    pub steps: Vec<StepView>,
    pub messages: Vec<ProgressMessage>,
    pub activities: Vec<AgentActivity>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Ignored { reason: String },
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

fn derive_steps(run: &WorkflowRun) -> Vec<StepView> {
    derive_step_statuses(
        step_catalog(),
        run.current_step_id.as_ref(),
        &run.completed_step_ids,
    )
}

pub fn frame_scope_mismatch(run: &WorkflowRun, frame: &InboundFrame) -> Option<String> {
    let (Some(run_id), Some(session_id)) = (&run.run_id, &frame.session_id) else {
        return None;
    };
    if run_id.as_str() == session_id.as_str() {
        None
    } else {
        Some(format!(
            "frame for session `{session_id}` does not belong to run `{run_id}`"
        ))
    }
}

pub fn reduce(
    mut state: ProgressState,
    frame: &InboundFrame,
    received_at: DateTime<Utc>,
) -> ProgressState {
    if frame_scope_mismatch(&state.run, frame).is_some() {
        return state;
    }
    match &frame.kind {
        FrameKind::ProgressUpdate(patch) => {
            state.run.overwrite_from(patch);
            append_side_effects(&mut state.log, patch, received_at);
        }
        FrameKind::SessionUpdate(patch) => {
            state.run.overwrite_from(patch);
        }
        FrameKind::Unknown { .. } => return state,
    }
    state.steps = derive_steps(&state.run);
    state
}

fn append_side_effects(log: &mut ActivityLog, patch: &ProgressPatch, received_at: DateTime<Utc>) {
    if let Some(message) = &patch.message {
        log.append_message(ProgressMessage {
            timestamp: message
                .timestamp()
                .and_then(parse_payload_timestamp)
                .unwrap_or(received_at),
            agent_id: message
                .agent()
                .or(patch.current_agent.as_ref())
                .cloned(),
            content: message.content().to_string(),
        });
    }

    if !patch.triggers_activity() {
        return;
    }
    let fragment = patch.agent_activity.as_ref();
    let agent_id = patch
        .current_agent
        .clone()
        .or_else(|| fragment.and_then(|activity| activity.agent.clone()))
        .or_else(|| AgentId::parse(FALLBACK_AGENT).ok());
    let Some(agent_id) = agent_id else {
        return;
    };
    let action = fragment
        .and_then(|activity| activity.action.clone())
        .or_else(|| patch.message.as_ref().map(|m| m.content().to_string()))
        .unwrap_or_else(|| FALLBACK_ACTION.to_string());

    log.append_activity(NewActivity {
        timestamp: received_at,
        agent_id,
        action,
        status: fragment
            .and_then(|activity| activity.status)
            .unwrap_or_default(),
        details: fragment.and_then(|activity| activity.details.clone()),
    });
}

pub fn parse_payload_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Default)]
pub struct ProgressStore {
    state: ProgressState,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_run(run_id: RunId) -> Self {
        Self {
            state: ProgressState::new(Some(run_id)),
        }
    }

    pub fn run_id(&self) -> Option<&RunId> {
        self.state.run.run_id.as_ref()
    }

    pub fn apply_frame(&mut self, frame: &InboundFrame) -> ApplyOutcome {
        self.apply_frame_at(frame, Utc::now())
    }

    pub fn apply_frame_at(
        &mut self,
        frame: &InboundFrame,
        received_at: DateTime<Utc>,
    ) -> ApplyOutcome {
        if let Some(reason) = frame_scope_mismatch(&self.state.run, frame) {
            return ApplyOutcome::Ignored { reason };
        }
        if let FrameKind::Unknown { kind } = &frame.kind {
            return ApplyOutcome::Ignored {
                reason: format!("unrecognized frame type `{kind}`"),
            };
        }
        let current = std::mem::take(&mut self.state);
        self.state = reduce(current, frame, received_at);
        ApplyOutcome::Applied
    }

    pub fn state(&self) -> &WorkflowRun {
        &self.state.run
    }

    pub fn steps(&self) -> &[StepView] {
        &self.state.steps
    }

    pub fn log(&self) -> &ActivityLog {
        &self.state.log
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            run: self.state.run.clone(),
            steps: self.state.steps.clone(),
            messages: self.state.log.messages().to_vec(),
            activities: self.state.log.activities().to_vec(),
        }
    }

    pub fn reset(&mut self, run_id: RunId) {
        self.state = ProgressState::new(Some(run_id));
    }

    pub fn discard(&mut self) {
        self.state = ProgressState::new(None);
    }
}
