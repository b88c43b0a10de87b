//! HTTP handlers for the command injection routes.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::cmdi::mitigations::{CommandPolicy, Invocation, Strategy};
use crate::cmdi::models::{CommandRequest, CommandResponse, MappedCommandRequest};
use crate::cmdi::primitive::{self, ExecOutput};
use crate::error::LabError;
use crate::mitigation::validation::ValidJson;
use crate::observability::metrics::{record_outcome, Outcome};

const MODULE: &str = "cmdi";

/// Shared state of the command injection routes.
#[derive(Debug)]
pub struct CmdiState {
    pub policy: CommandPolicy,
}

/// Run the client's command through `strategy`.
pub async fn run_strategy(
    State(state): State<Arc<CmdiState>>,
    strategy: Strategy,
    request: CommandRequest,
) -> Result<Json<CommandResponse>, LabError> {
    let command = request.command();

    let plan = match state.policy.plan(strategy, command) {
        Ok(plan) => plan,
        Err(rejection) => {
            tracing::warn!(
                strategy = strategy.as_str(),
                command = %command,
                reason = %rejection.reason,
                "Command rejected"
            );
            record_outcome(MODULE, strategy.as_str(), Outcome::Rejected);
            return Err(rejection.into());
        }
    };

    tracing::info!(
        strategy = strategy.as_str(),
        invocation = ?plan.invocation,
        "Executing command"
    );
    let output = primitive::execute(&plan.invocation).await;
    record(strategy.as_str(), &output);

    // Routes that transform the input echo both forms back.
    let transformed = plan.sanitized.is_some() || plan.escaped.is_some();
    Ok(Json(CommandResponse {
        command: (!transformed).then(|| command.to_string()),
        original_command: transformed.then(|| command.to_string()),
        sanitized_command: plan.sanitized,
        escaped_command: plan.escaped,
        stdout: output.stdout,
        stderr: output.stderr,
        returncode: output.returncode,
    }))
}

/// `POST /secure/command_mapping`
pub async fn command_mapping(
    State(state): State<Arc<CmdiState>>,
    ValidJson(request): ValidJson<MappedCommandRequest>,
) -> Json<CommandResponse> {
    let argv = state
        .policy
        .map_command(request.command_type, request.args.as_deref());
    let invocation = Invocation::Argv(argv);

    tracing::info!(command_type = request.command_type.as_str(), "Executing mapped command");
    let output = primitive::execute(&invocation).await;
    record("command_mapping", &output);

    Json(CommandResponse {
        command: Some(invocation.display()),
        original_command: None,
        sanitized_command: None,
        escaped_command: None,
        stdout: output.stdout,
        stderr: output.stderr,
        returncode: output.returncode,
    })
}

fn record(strategy: &str, output: &ExecOutput) {
    let outcome = if output.returncode == -1 {
        Outcome::Failed
    } else {
        Outcome::Allowed
    };
    record_outcome(MODULE, strategy, outcome);
}
