use std::str::FromStr;

use thiserror::Error;

/// A line typed on stdin.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    Refresh,
    Hide,
    Show,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown command '{0}' (try 'help')")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refresh" | "r" => Ok(Self::Refresh),
            "hide" => Ok(Self::Hide),
            "show" => Ok(Self::Show),
            "status" | "s" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

pub const HELP: &str = "commands: refresh | hide | show | status | help | quit";

/// Parses one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Result<Command, UnknownCommand>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.parse())
    }
}
