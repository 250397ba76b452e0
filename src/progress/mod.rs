pub mod activity;
pub mod catalog;
pub mod frame;
pub mod steps;
pub mod store;

pub use activity::{ActivityLog, AgentActivity, ProgressMessage};
pub use catalog::{agent_display_name, agent_profile, step_catalog, AgentProfile, StepDefinition};
pub use frame::{
    decode_frame, ActivityStatus, FrameDecodeError, FrameKind, InboundFrame, OutboundFrame,
    ProgressPatch, RunStatus,
};
pub use steps::{derive_step_statuses, StepStatus, StepView};
pub use store::{reduce, ApplyOutcome, ProgressSnapshot, ProgressState, ProgressStore, WorkflowRun};
