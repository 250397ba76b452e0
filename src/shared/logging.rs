use chrono::{SecondsFormat, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const PROGRESS_LOG_FILE: &str = "logs/progress.log";

pub fn progress_log_path(state_root: &Path) -> PathBuf {
    state_root.join(PROGRESS_LOG_FILE)
}

pub fn append_progress_log(path: Option<&Path>, level: &str, event: &str, message: &str) {
    let Some(path) = path else {
        return;
    };

    let payload = serde_json::json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "level": level,
        "event": event,
        "message": message,
    });

    let Ok(line) = serde_json::to_string(&payload) else {
        return;
    };

    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let _ = writeln!(file, "{line}");
}
