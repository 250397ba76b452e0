use super::frame::ActivityStatus;
use crate::shared::ids::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentActivity {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    pub action: String,
    pub status: ActivityStatus,
    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMessage {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub agent_id: Option<AgentId>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    pub action: String,
    pub status: ActivityStatus,
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityLog {
    messages: Vec<ProgressMessage>,
    activities: Vec<AgentActivity>,
    last_activity_id: u64,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_message(&mut self, message: ProgressMessage) {
        self.messages.push(message);
    }

    pub fn append_activity(&mut self, activity: NewActivity) -> &AgentActivity {
        self.last_activity_id += 1;
        self.activities.push(AgentActivity {
            id: self.last_activity_id,
            timestamp: activity.timestamp,
            agent_id: activity.agent_id,
            action: activity.action,
            status: activity.status,
            details: activity.details,
        });
        &self.activities[self.activities.len() - 1]
    }

    pub fn messages(&self) -> &[ProgressMessage] {
        &self.messages
    }

    pub fn activities(&self) -> &[AgentActivity] {
        &self.activities
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.activities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("timestamp")
    }

    fn activity(agent: &str, action: &str) -> NewActivity {
        NewActivity {
            timestamp: at(100),
            agent_id: AgentId::parse(agent).expect("agent"),
            action: action.to_string(),
            status: ActivityStatus::Running,
            details: None,
        }
    }

    #[test]
    fn activity_ids_increase_with_every_append() {
        let mut log = ActivityLog::new();
        let first = log.append_activity(activity("case_triage", "classify")).id;
        let second = log.append_activity(activity("case_triage", "classify")).id;
        assert_eq!((first, second), (1, 2));
        assert_eq!(log.activity_count(), 2);
    }

    #[test]
    fn duplicate_entries_are_kept_in_arrival_order() {
        let mut log = ActivityLog::new();
        for secs in [300, 100, 100] {
            log.append_message(ProgressMessage {
                timestamp: at(secs),
                agent_id: None,
                content: "Waiting for doctor responses...".to_string(),
            });
        }
        let stamps: Vec<i64> = log
            .messages()
            .iter()
            .map(|message| message.timestamp.timestamp())
            .collect();
        assert_eq!(stamps, vec![300, 100, 100]);
        assert!(log.activities().is_empty());
        assert!(!log.is_empty());
    }
}
