#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Watch,
    Steps,
    Agents,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "watch" => CliVerb::Watch,
        "steps" => CliVerb::Steps,
        "agents" => CliVerb::Agents,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  watch <run-id> [--endpoint <url>] [--log <path>]".to_string(),
        "                                       Follow live progress for a triage run".to_string(),
        "  steps                                List the workflow step catalog".to_string(),
        "  agents                               List known pipeline agents".to_string(),
        "  help                                 Show this help".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    cli_help_lines().join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchArgs {
    pub run_id: String,
    pub endpoint: Option<String>,
    pub log_path: Option<String>,
}

pub fn parse_watch_args(args: &[String]) -> Result<WatchArgs, String> {
    let mut parsed = WatchArgs::default();
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--endpoint" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "`--endpoint` requires a value".to_string())?;
                parsed.endpoint = Some(value.clone());
            }
            "--log" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "`--log` requires a value".to_string())?;
                parsed.log_path = Some(value.clone());
            }
            flag if flag.starts_with("--") => {
                return Err(format!("unknown option `{flag}` for `watch`"));
            }
            value => positional.push(value.to_string()),
        }
    }

    match positional.as_slice() {
        [run_id] => {
            parsed.run_id = run_id.clone();
            Ok(parsed)
        }
        [] => Err("usage: watch <run-id> [--endpoint <url>] [--log <path>]".to_string()),
        _ => Err(format!(
            "unexpected arguments for `watch`: {}",
            positional[1..].join(" ")
        )),
    }
}
