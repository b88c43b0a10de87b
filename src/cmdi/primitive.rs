//! Process execution.
//!
//! Runs an [`Invocation`] to completion and captures its output. Spawn and
//! word-splitting failures are reported the way a failed process would be:
//! the message in `stderr` and a return code of -1.

use std::process::Stdio;

use tokio::process::Command;

use crate::cmdi::mitigations::Invocation;

/// Captured result of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
}

impl ExecOutput {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            returncode: -1,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.returncode == 0
    }
}

/// Execute the invocation and wait for it.
pub async fn execute(invocation: &Invocation) -> ExecOutput {
    let argv = match invocation {
        Invocation::Shell(command) => vec!["sh".to_string(), "-c".to_string(), command.clone()],
        Invocation::Words(command) => match shlex::split(command) {
            Some(words) => words,
            None => return ExecOutput::failed("No closing quotation"),
        },
        Invocation::Argv(argv) => argv.clone(),
    };

    let Some((program, args)) = argv.split_first() else {
        return ExecOutput::failed("Empty command");
    };

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await;

    match output {
        Ok(output) => ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            returncode: output.status.code().unwrap_or(-1),
        },
        Err(e) => {
            tracing::error!(program = %program, error = %e, "Failed to spawn process");
            ExecOutput::failed(e.to_string())
        }
    }
}
