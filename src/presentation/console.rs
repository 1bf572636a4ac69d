//! Line-oriented operator console driving the search form.

use std::str::FromStr;

use thiserror::Error;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::{
    application::{controller::SearchFormController, error::AppError},
    config::cli::parse_field_pair,
    domain::results::ActionKey,
};

use super::terminal::TerminalView;

const HELP: &str = "commands: NAME=VALUE | revoke ACTION | show | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Type `value` into field `name`.
    Edit { name: String, value: String },
    /// Click the revoke control tagged with the action.
    Revoke(ActionKey),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("`revoke` needs an action key")]
    MissingAction,
    #[error("{0}")]
    Invalid(String),
}

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        match line {
            "" => return Err(CommandError::Empty),
            "show" => return Ok(Self::Show),
            "help" | "?" => return Ok(Self::Help),
            "quit" | "exit" => return Ok(Self::Quit),
            _ => {}
        }

        if let Some(rest) = line.strip_prefix("revoke")
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            let action = rest.trim();
            if action.is_empty() {
                return Err(CommandError::MissingAction);
            }
            return Ok(Self::Revoke(ActionKey::new(action)));
        }

        let (name, value) = parse_field_pair(line).map_err(CommandError::Invalid)?;
        Ok(Self::Edit { name, value })
    }
}

/// Reads commands from stdin until `quit` or end of input.
///
/// Must run inside the [`tokio::task::LocalSet`] that drives the controller.
pub async fn run(controller: SearchFormController<TerminalView>) -> Result<(), AppError> {
    controller.start();
    println!("{HELP}");

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(err) => {
                eprintln!("{err}; {HELP}");
                continue;
            }
        };

        match command {
            ConsoleCommand::Edit { name, value } => {
                controller.input(&name, &value);
            }
            ConsoleCommand::Revoke(action) => {
                if !controller.click_revoke(action.clone()) {
                    eprintln!("no revocable control for {action}");
                }
            }
            ConsoleCommand::Show => controller.view().print(),
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => break,
        }
    }

    let pending = controller.pending_revokes();
    if !pending.is_empty() {
        println!("waiting for {} pending revoke(s)", pending.len());
        let unsettled = controller.drain_revokes().await;
        if !unsettled.is_empty() {
            warn!(pending = ?unsettled, "exiting with unsettled revokes");
            for action in &unsettled {
                eprintln!("! revoke {action} did not settle; check the server");
            }
        }
    }

    info!("console closed");
    Ok(())
}
