use std::borrow::Cow;
use std::fs;
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tempfile::tempdir;
use triage_progress::channels::{ConnectionState, ProgressConnection};
use triage_progress::config::Settings;
use triage_progress::progress::StepStatus;
use triage_progress::shared::ids::RunId;
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::protocol::CloseFrame;
use tungstenite::Message;

struct ServerTranscript {
    path: String,
    first_text: Option<String>,
}

fn spawn_progress_server(frames: Vec<Message>) -> (SocketAddr, JoinHandle<ServerTranscript>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind server");
    let addr = listener.local_addr().expect("server addr");
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");
        let mut path = String::new();
        let mut ws = tungstenite::accept_hdr(
            stream,
            |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                path = request.uri().path().to_string();
                Ok(response)
            },
        )
        .expect("handshake");

        let first_text = match ws.read() {
            Ok(Message::Text(text)) => Some(text),
            _ => None,
        };
        for frame in frames {
            ws.send(frame).expect("send frame");
        }
        ws.close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: Cow::Borrowed("run finished"),
        }))
        .expect("close");
        while ws.read().is_ok() {}

        ServerTranscript { path, first_text }
    });
    (addr, handle)
}

fn settings_for(addr: SocketAddr, log_path: Option<std::path::PathBuf>) -> Settings {
    Settings {
        endpoint: format!("ws://{addr}/ws/{{run_id}}"),
        idle_poll_ms: 5,
        log_path,
    }
}

fn logged_events(log_path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(log_path)
        .expect("read progress log")
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("json line");
            value["event"].as_str().unwrap_or_default().to_string()
        })
        .collect()
}

fn poll_until_disconnected(connection: &mut ProgressConnection) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while connection.state() == ConnectionState::Connected && Instant::now() < deadline {
        connection.poll();
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn live_socket_requests_status_applies_frames_and_reports_server_close() {
    let frames = vec![
        r#"{"type":"session_update","data":{"status":"running","current_step":"triage"}}"#
            .to_string(),
        "not json".to_string(),
        r#"{"type":"progress_update","session_id":"case-7","data":{"current_agent":"case_triage","message":{"content":"Case classified as CRITICAL"}}}"#
            .to_string(),
        r#"{"type":"progress_update","session_id":"someone-else","data":{"current_step":"calendar_integration"}}"#
            .to_string(),
        r#"{"type":"progress_update","data":{"completed_steps":["triage"],"current_step":"doctor_matching","progress_percentage":34}}"#
            .to_string(),
    ];
    let (addr, server) = spawn_progress_server(frames.into_iter().map(Message::Text).collect());
    let dir = tempdir().expect("tempdir");
    let log_path = dir.path().join("logs/progress.log");

    let mut connection = ProgressConnection::new(settings_for(addr, Some(log_path.clone())));
    connection.open(Some(&RunId::parse("case-7").expect("run id")));
    assert_eq!(connection.state(), ConnectionState::Connected);

    poll_until_disconnected(&mut connection);
    let status = connection.status().clone();
    assert_eq!(status.state, ConnectionState::Disconnected);
    assert!(
        status
            .reason
            .as_deref()
            .is_some_and(|reason| reason.contains("run finished")),
        "unexpected reason: {:?}",
        status.reason
    );
    assert_eq!(status.frames_applied, 3);
    assert_eq!(status.decode_failures, 1);

    let store = connection.store();
    assert_eq!(store.state().progress_percentage, 34);
    assert_eq!(store.steps()[0].status, StepStatus::Completed);
    assert_eq!(store.steps()[1].status, StepStatus::Running);
    assert_eq!(store.steps()[4].status, StepStatus::Pending);
    assert_eq!(store.log().messages().len(), 1);
    assert_eq!(store.log().activities().len(), 1);
    assert_eq!(store.log().activities()[0].agent_id.as_str(), "case_triage");

    let transcript = server.join().expect("server thread");
    assert_eq!(transcript.path, "/ws/case-7");
    assert_eq!(transcript.first_text.as_deref(), Some(r#"{"type":"get_status"}"#));

    let events = logged_events(&log_path);
    assert!(events.contains(&"connection.open".to_string()));
    assert!(events.contains(&"connection.connected".to_string()));
    assert!(events.contains(&"frame.decode_failed".to_string()));
    assert!(events.contains(&"connection.disconnected".to_string()));

    connection.close();
    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(connection.store().log().is_empty());
}

#[test]
fn binary_frames_that_are_not_utf8_are_counted_and_logged() {
    let frames = vec![
        Message::Binary(vec![0xff, 0xfe, 0x00]),
        Message::Ping(vec![1]),
        Message::Text("not json".to_string()),
        Message::Binary(
            br#"{"type":"progress_update","data":{"current_step":"triage"}}"#.to_vec(),
        ),
    ];
    let (addr, server) = spawn_progress_server(frames);
    let dir = tempdir().expect("tempdir");
    let log_path = dir.path().join("progress.log");

    let mut connection = ProgressConnection::new(settings_for(addr, Some(log_path.clone())));
    connection.open(Some(&RunId::parse("case-11").expect("run id")));
    poll_until_disconnected(&mut connection);
    server.join().expect("server thread");

    let status = connection.status();
    assert_eq!(status.decode_failures, 2);
    assert_eq!(status.frames_applied, 1);
    assert!(status
        .last_decode_error
        .as_deref()
        .is_some_and(|error| error.contains("json")));
    assert_eq!(connection.store().steps()[0].status, StepStatus::Running);

    let decode_failures = logged_events(&log_path)
        .into_iter()
        .filter(|event| event == "frame.decode_failed")
        .count();
    assert_eq!(decode_failures, 2);
}

#[test]
fn refused_connection_leaves_view_idle_with_reason() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let mut connection = ProgressConnection::new(settings_for(addr, None));
    connection.open(Some(&RunId::parse("case-8").expect("run id")));

    assert_eq!(connection.state(), ConnectionState::Disconnected);
    assert!(connection.status().reason.is_some());
    assert!(connection
        .store()
        .steps()
        .iter()
        .all(|step| step.status == StepStatus::Pending));
    assert_eq!(connection.store().state().progress_percentage, 0);
}

#[test]
fn hidden_view_never_dials_the_endpoint() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    listener.set_nonblocking(true).expect("nonblocking");

    let mut connection = ProgressConnection::new(settings_for(addr, None));
    connection.set_visible(false);
    connection.open(Some(&RunId::parse("case-9").expect("run id")));
    connection.open(None);

    assert_eq!(connection.state(), ConnectionState::Closed);
    assert!(listener.accept().is_err());
}
