use crate::app::cli::parse_watch_args;
use crate::app::render::{
    render_activity, render_connection, render_message, render_run_summary, render_step_lines,
};
use crate::channels::{ConnectionStatus, ProgressConnection, WatchOutcome};
use crate::config::{default_state_root, load_global_settings, Settings};
use crate::progress::steps::StepView;
use crate::progress::store::ProgressStore;
use crate::shared::ids::RunId;
use crate::shared::logging::progress_log_path;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

pub fn cmd_watch(args: &[String]) -> Result<String, String> {
    let settings = load_global_settings().map_err(|err| err.to_string())?;
    let settings = match settings.log_path {
        Some(_) => settings,
        None => Settings {
            log_path: default_state_root().ok().map(|root| progress_log_path(&root)),
            ..settings
        },
    };
    watch_with_settings(args, settings, |line| println!("{line}"))
}

pub fn watch_with_settings<P>(
    args: &[String],
    settings: Settings,
    mut print: P,
) -> Result<String, String>
where
    P: FnMut(&str),
{
    let parsed = parse_watch_args(args)?;
    let run_id = RunId::parse(&parsed.run_id)?;
    let mut settings = settings;
    if let Some(endpoint) = parsed.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(log_path) = parsed.log_path {
        settings.log_path = Some(PathBuf::from(log_path));
    }
    settings.validate().map_err(|err| err.to_string())?;

    let mut connection = ProgressConnection::new(settings);
    connection.open(Some(&run_id));
    print(&render_connection(connection.status()));

    let stop = AtomicBool::new(false);
    let mut printer = WatchPrinter::default();
    let outcome = connection.run_until(&stop, |store, status| {
        printer.emit(store, status, &mut print);
        if store.state().status.is_terminal() {
            stop.store(true, Ordering::Relaxed);
        }
    });

    let snapshot = connection.snapshot();
    let summary = render_run_summary(&snapshot.run, &snapshot.steps);
    let last = render_connection(connection.status());
    connection.close();
    let ending = match outcome {
        WatchOutcome::StopRequested => "run finished",
        WatchOutcome::Closed => "progress view closed",
        WatchOutcome::Disconnected => "progress stream ended",
    };
    Ok(format!("{summary}\n{last}\n{ending}"))
}

#[derive(Debug, Default)]
struct WatchPrinter {
    messages_seen: usize,
    activities_seen: usize,
    last_steps: Vec<StepView>,
    last_connection: Option<ConnectionStatus>,
}

impl WatchPrinter {
    fn emit<P: FnMut(&str)>(
        &mut self,
        store: &ProgressStore,
        status: &ConnectionStatus,
        print: &mut P,
    ) {
        let log = store.log();
        for message in &log.messages()[self.messages_seen.min(log.message_count())..] {
            print(&render_message(message));
        }
        self.messages_seen = log.message_count();

        for activity in &log.activities()[self.activities_seen.min(log.activity_count())..] {
            print(&render_activity(activity));
        }
        self.activities_seen = log.activity_count();

        if self.last_steps != store.steps() {
            print(&render_run_summary(store.state(), store.steps()));
            for line in render_step_lines(store.steps()) {
                print(&line);
            }
            self.last_steps = store.steps().to_vec();
        }

        let connection_changed = self
            .last_connection
            .as_ref()
            .map(|last| last.state != status.state || last.reason != status.reason)
            .unwrap_or(true);
        if connection_changed {
            print(&render_connection(status));
            self.last_connection = Some(status.clone());
        }
    }
}
