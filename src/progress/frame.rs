use crate::shared::ids::{AgentId, StepId};
use crate::shared::serde_ext::{
    lenient_clearable, lenient_list, lenient_option, lenient_percentage,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PROGRESS_UPDATE: &str = "progress_update";
pub const SESSION_UPDATE: &str = "session_update";
pub const GET_STATUS: &str = "get_status";

#[derive(Debug, thiserror::Error)]
pub enum FrameDecodeError {
    #[error("frame is not valid json: {0}")]
    Json(#[source] serde_json::Error),
    #[error("frame must be a json object")]
    NotAnObject,
    #[error("frame is missing a string `type`")]
    MissingType,
    #[error("`{kind}` frame has malformed `data`: {source}")]
    InvalidData {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    #[default]
    Running,
    Completed,
    Error,
}

impl ActivityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MessageFragment {
    Text(String),
    Record {
        #[serde(default)]
        content: String,
        #[serde(default, deserialize_with = "lenient_option")]
        agent: Option<AgentId>,
        #[serde(default, deserialize_with = "lenient_option")]
        timestamp: Option<String>,
    },
}

impl MessageFragment {
    pub fn content(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Record { content, .. } => content,
        }
    }

    pub fn agent(&self) -> Option<&AgentId> {
        match self {
            Self::Text(_) => None,
            Self::Record { agent, .. } => agent.as_ref(),
        }
    }

    pub fn timestamp(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Record { timestamp, .. } => timestamp.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActivityFragment {
    #[serde(default, deserialize_with = "lenient_option")]
    pub agent: Option<AgentId>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub status: Option<ActivityStatus>,
    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProgressPatch {
    #[serde(default, deserialize_with = "lenient_option")]
    pub status: Option<RunStatus>,
    #[serde(default, deserialize_with = "lenient_clearable")]
    pub current_step: Option<Option<StepId>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub completed_steps: Option<Vec<StepId>>,
    #[serde(default, deserialize_with = "lenient_percentage")]
    pub progress_percentage: Option<u8>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub current_agent: Option<AgentId>,
    #[serde(default)]
    pub final_result: Option<Value>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub message: Option<MessageFragment>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub agent_activity: Option<ActivityFragment>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub last_updated: Option<String>,
}

impl ProgressPatch {
    pub fn triggers_activity(&self) -> bool {
        self.current_agent.is_some() || self.agent_activity.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameKind {
    ProgressUpdate(ProgressPatch),
    SessionUpdate(ProgressPatch),
    Unknown { kind: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub session_id: Option<String>,
    pub kind: FrameKind,
}

impl InboundFrame {
    pub fn progress_update(patch: ProgressPatch) -> Self {
        Self {
            session_id: None,
            kind: FrameKind::ProgressUpdate(patch),
        }
    }

    pub fn session_update(patch: ProgressPatch) -> Self {
        Self {
            session_id: None,
            kind: FrameKind::SessionUpdate(patch),
        }
    }

    pub fn kind_name(&self) -> &str {
        match &self.kind {
            FrameKind::ProgressUpdate(_) => PROGRESS_UPDATE,
            FrameKind::SessionUpdate(_) => SESSION_UPDATE,
            FrameKind::Unknown { kind } => kind,
        }
    }
}

pub fn decode_frame(text: &str) -> Result<InboundFrame, FrameDecodeError> {
    let value: Value = serde_json::from_str(text).map_err(FrameDecodeError::Json)?;
    let Value::Object(mut envelope) = value else {
        return Err(FrameDecodeError::NotAnObject);
    };

    let kind = match envelope.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => return Err(FrameDecodeError::MissingType),
    };
    let session_id = match envelope.remove("session_id") {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id),
        _ => None,
    };
    let data = match envelope.remove("data") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(data) => data,
    };

    let kind = match kind.as_str() {
        PROGRESS_UPDATE => FrameKind::ProgressUpdate(decode_patch(&kind, data)?),
        SESSION_UPDATE => FrameKind::SessionUpdate(decode_patch(&kind, data)?),
        _ => FrameKind::Unknown { kind },
    };

    Ok(InboundFrame { session_id, kind })
}

fn decode_patch(kind: &str, data: Value) -> Result<ProgressPatch, FrameDecodeError> {
    serde_json::from_value(data).map_err(|source| FrameDecodeError::InvalidData {
        kind: kind.to_string(),
        source,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundFrame {
    GetStatus,
}

impl OutboundFrame {
    pub fn encode(self) -> String {
        match self {
            Self::GetStatus => serde_json::json!({ "type": GET_STATUS }).to_string(),
        }
    }
}
