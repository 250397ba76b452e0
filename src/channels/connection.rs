use super::transport::{Connector, Transport, TransportEvent, WebSocketConnector};
use crate::config::Settings;
use crate::progress::frame::{decode_frame, OutboundFrame};
use crate::progress::store::{ApplyOutcome, ProgressSnapshot, ProgressStore};
use crate::shared::ids::RunId;
use crate::shared::logging::append_progress_log;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const MAX_FRAMES_PER_POLL: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub run_id: Option<RunId>,
    pub frames_applied: usize,
    pub decode_failures: usize,
    #[serde(default)]
    pub last_decode_error: Option<String>,
    #[serde(default)]
    pub last_frame_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    pub applied: usize,
    pub ignored: usize,
    pub decode_failures: usize,
}

impl PollReport {
    pub fn changed_state(&self) -> bool {
        self.applied > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Connected,
    Failed { reason: String },
    Skipped { reason: String },
}

impl OpenOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    StopRequested,
    Disconnected,
    Closed,
}

pub struct ProgressConnection<C: Connector = WebSocketConnector> {
    settings: Settings,
    connector: C,
    transport: Option<Box<dyn Transport>>,
    store: ProgressStore,
    status: ConnectionStatus,
    visible: bool,
}

impl ProgressConnection<WebSocketConnector> {
    pub fn new(settings: Settings) -> Self {
        Self::with_connector(settings, WebSocketConnector)
    }
}

impl<C: Connector> ProgressConnection<C> {
    pub fn with_connector(settings: Settings, connector: C) -> Self {
        Self {
            settings,
            connector,
            transport: None,
            store: ProgressStore::new(),
            status: ConnectionStatus::default(),
            visible: true,
        }
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn state(&self) -> ConnectionState {
        self.status.state
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.store.snapshot()
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.close();
        }
    }

    pub fn open(&mut self, run_id: Option<&RunId>) -> OpenOutcome {
        let Some(run_id) = run_id else {
            return OpenOutcome::Skipped {
                reason: "no run id selected".to_string(),
            };
        };
        let blocked = if self.status.state == ConnectionState::Closed {
            Some("progress view is closed; create a new connection to watch again")
        } else if !self.visible {
            Some("progress view is hidden")
        } else {
            None
        };
        if let Some(blocked) = blocked {
            let reason = blocked.to_string();
            self.log(
                "debug",
                "connection.open_skipped",
                &format!("skipping open for run {run_id}: {reason}"),
            );
            self.status.reason = Some(reason.clone());
            return OpenOutcome::Skipped { reason };
        }

        self.drop_transport();
        self.store.reset(run_id.clone());
        self.status = ConnectionStatus {
            state: ConnectionState::Connecting,
            run_id: Some(run_id.clone()),
            ..ConnectionStatus::default()
        };

        let endpoint = self.settings.endpoint_for(run_id);
        self.log("info", "connection.open", &format!("connecting to {endpoint}"));
        let mut transport = match self.connector.connect(&endpoint) {
            Ok(transport) => transport,
            Err(err) => return self.fail_open(err.to_string()),
        };

        if let Err(err) = transport.send_text(&OutboundFrame::GetStatus.encode()) {
            transport.close();
            return self.fail_open(err.to_string());
        }

        self.transport = Some(transport);
        self.status.state = ConnectionState::Connected;
        self.status.reason = None;
        self.log(
            "info",
            "connection.connected",
            &format!("connected to run {run_id}; requested current status"),
        );
        OpenOutcome::Connected
    }

    pub fn poll(&mut self) -> PollReport {
        let mut report = PollReport::default();
        for _ in 0..MAX_FRAMES_PER_POLL {
            let Some(transport) = self.transport.as_mut() else {
                break;
            };
            match transport.poll() {
                TransportEvent::Text(text) => self.handle_text(&text, &mut report),
                TransportEvent::Undecodable(detail) => {
                    self.record_decode_failure(detail, &mut report)
                }
                TransportEvent::Control => continue,
                TransportEvent::Idle => break,
                TransportEvent::Closed(reason) => {
                    self.drop_transport();
                    self.mark_disconnected("connection.disconnected", reason);
                    break;
                }
            }
        }
        report
    }

    pub fn run_until<F>(&mut self, stop: &AtomicBool, mut on_update: F) -> WatchOutcome
    where
        F: FnMut(&ProgressStore, &ConnectionStatus),
    {
        let idle = Duration::from_millis(self.settings.idle_poll_ms.max(1));
        loop {
            if stop.load(Ordering::Relaxed) {
                return WatchOutcome::StopRequested;
            }
            match self.status.state {
                ConnectionState::Closed => return WatchOutcome::Closed,
                ConnectionState::Disconnected | ConnectionState::Connecting
                    if self.transport.is_none() =>
                {
                    return WatchOutcome::Disconnected;
                }
                _ => {}
            }

            let report = self.poll();
            if report.changed_state() || self.status.state != ConnectionState::Connected {
                on_update(&self.store, &self.status);
            }
            if report.applied == 0 && report.ignored == 0 && report.decode_failures == 0 {
                thread::sleep(idle);
            }
        }
    }

    pub fn close(&mut self) {
        let had_transport = self.transport.is_some();
        self.drop_transport();
        if self.status.state != ConnectionState::Closed {
            self.status.state = ConnectionState::Closed;
            self.store.discard();
            if had_transport {
                self.log("info", "connection.closed", "progress view closed");
            }
        }
    }

    fn handle_text(&mut self, text: &str, report: &mut PollReport) {
        let frame = match decode_frame(text) {
            Ok(frame) => frame,
            Err(err) => {
                self.record_decode_failure(err.to_string(), report);
                return;
            }
        };

        self.status.last_frame_at = Some(Utc::now());
        match self.store.apply_frame(&frame) {
            ApplyOutcome::Applied => {
                report.applied += 1;
                self.status.frames_applied += 1;
            }
            ApplyOutcome::Ignored { reason } => {
                report.ignored += 1;
                self.log("debug", "frame.ignored", &reason);
            }
        }
    }

    fn record_decode_failure(&mut self, detail: String, report: &mut PollReport) {
        report.decode_failures += 1;
        self.status.decode_failures += 1;
        self.log("warn", "frame.decode_failed", &detail);
        self.status.last_decode_error = Some(detail);
    }

    fn fail_open(&mut self, reason: String) -> OpenOutcome {
        self.mark_disconnected("connection.failed", reason.clone());
        OpenOutcome::Failed { reason }
    }

    fn mark_disconnected(&mut self, event: &str, reason: String) {
        self.status.state = ConnectionState::Disconnected;
        self.log("warn", event, &reason);
        self.status.reason = Some(reason);
    }

    fn drop_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }

    fn log(&self, level: &str, event: &str, message: &str) {
        append_progress_log(self.settings.log_path.as_deref(), level, event, message);
    }
}

impl<C: Connector> Drop for ProgressConnection<C> {
    fn drop(&mut self) {
        self.drop_transport();
    }
}
