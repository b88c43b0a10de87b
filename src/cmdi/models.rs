//! Request and response bodies for the command injection routes.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Body accepted by every free-text command route.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommandRequest {
    #[validate(custom(function = "not_blank"))]
    pub command: String,
}

impl CommandRequest {
    /// The command with surrounding whitespace removed.
    pub fn command(&self) -> &str {
        self.command.trim()
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Command cannot be empty".into());
        return Err(error);
    }
    Ok(())
}

/// Commands a client may pick from instead of typing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Ls,
    Ping,
    Whoami,
}

impl CommandType {
    pub const ALL: [CommandType; 3] = [CommandType::Ls, CommandType::Ping, CommandType::Whoami];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Ls => "ls",
            CommandType::Ping => "ping",
            CommandType::Whoami => "whoami",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

/// Body of the command mapping route.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MappedCommandRequest {
    pub command_type: CommandType,

    #[validate(length(max = 50))]
    pub args: Option<String>,
}

/// Outcome of running a command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_command: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitized_command: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub escaped_command: Option<String>,

    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
}
