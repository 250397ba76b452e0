use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;
use tungstenite::Message;

fn run(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_triage-progress"))
        .args(args)
        .env("HOME", home)
        .output()
        .expect("run triage-progress")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn assert_ok(output: &Output) {
    assert!(
        output.status.success(),
        "stdout:\n{}\nstderr:\n{}",
        stdout(output),
        stderr(output)
    );
}

#[test]
fn help_and_catalog_commands_succeed() {
    let home = tempdir().expect("tempdir");

    let help = run(home.path(), &["help"]);
    assert_ok(&help);
    assert!(stdout(&help).contains("watch <run-id>"));

    let steps = run(home.path(), &["steps"]);
    assert_ok(&steps);
    let text = stdout(&steps);
    for id in [
        "triage",
        "doctor_matching",
        "appointment_coordination",
        "doctor_simulation",
        "calendar_integration",
        "health_recommendations",
    ] {
        assert!(text.contains(id), "missing step {id} in:\n{text}");
    }

    let agents = run(home.path(), &["agents"]);
    assert_ok(&agents);
    assert!(stdout(&agents).contains("Case Triage Agent"));
}

#[test]
fn unknown_command_and_bad_run_id_fail() {
    let home = tempdir().expect("tempdir");

    let unknown = run(home.path(), &["launch"]);
    assert!(!unknown.status.success());
    assert!(stderr(&unknown).contains("unknown command `launch`"));

    let bad = run(home.path(), &["watch", "case 1"]);
    assert!(!bad.status.success());
    assert!(stderr(&bad).contains("run id"));
}

#[test]
fn watch_follows_a_run_until_the_server_ends_the_stream() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");
        let mut ws = tungstenite::accept(stream).expect("handshake");
        let _ = ws.read();
        for frame in [
            r#"{"type":"session_update","data":{"status":"running","current_step":"triage","progress_percentage":10}}"#,
            r#"{"type":"progress_update","data":{"current_agent":"case_triage","message":"Case classified as CRITICAL"}}"#,
        ] {
            ws.send(Message::Text(frame.to_string())).expect("send");
        }
        ws.close(None).expect("close");
        while ws.read().is_ok() {}
    });

    let home = tempdir().expect("tempdir");
    let log_path = home.path().join("progress.log");
    let endpoint = format!("ws://{addr}/ws/{{run_id}}");
    let output = run(
        home.path(),
        &[
            "watch",
            "case-42",
            "--endpoint",
            &endpoint,
            "--log",
            log_path.to_str().expect("utf8 path"),
        ],
    );
    server.join().expect("server thread");

    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("Case classified as CRITICAL"), "{text}");
    assert!(text.contains("status=running progress=10%"), "{text}");
    assert!(text.contains("progress stream ended"), "{text}");
    assert!(log_path.exists());
}

#[test]
fn watch_exits_once_the_run_reaches_a_terminal_status() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");
        let mut ws = tungstenite::accept(stream).expect("handshake");
        let _ = ws.read();
        ws.send(Message::Text(
            r#"{"type":"progress_update","data":{"status":"completed","progress_percentage":100,"final_result":{"doctor":"Dr. Rao"}}}"#
                .to_string(),
        ))
        .expect("send");
        while ws.read().is_ok() {}
    });

    let home = tempdir().expect("tempdir");
    let endpoint = format!("ws://{addr}/ws/{{run_id}}");
    let output = run(home.path(), &["watch", "case-43", "--endpoint", &endpoint]);
    server.join().expect("server thread");

    assert_ok(&output);
    let text = stdout(&output);
    assert!(text.contains("status=completed progress=100%"), "{text}");
    assert!(text.trim_end().ends_with("run finished"), "{text}");
}
