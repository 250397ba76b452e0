use crate::app::cli::{help_text, parse_cli_verb, CliVerb};

pub mod catalog;
pub mod watch;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Watch => watch::cmd_watch(&args[1..]),
        CliVerb::Steps => Ok(catalog::cmd_steps()),
        CliVerb::Agents => Ok(catalog::cmd_agents()),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}
