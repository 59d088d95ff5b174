//! Result reporting for the automation host.
//!
//! Exactly one JSON object goes to stdout: `{"changed": .., "meta": ..}` on
//! success, `{"skipped": true, "msg": ..}` when the run was skipped, or
//! `{"failed": true, "msg": ..}` on failure. Logs go to stderr.

use crate::error::ControllerError;
use crate::reconciler::ReconciliationResult;
use serde_json::json;
use std::process::ExitCode;

/// Message reported when the host asks for a dry run
pub const CHECK_MODE_UNSUPPORTED: &str = "check mode not supported";

/// What one invocation did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The catalog was reconciled
    Reconciled(ReconciliationResult),
    /// Nothing was attempted, for the given reason
    Skipped(String),
}

/// Render the outcome and pick the exit status
pub fn render(outcome: &Result<Outcome, ControllerError>) -> (serde_json::Value, u8) {
    match outcome {
        Ok(Outcome::Reconciled(result)) => (json!({ "changed": result.changed, "meta": result.meta }), 0),
        Ok(Outcome::Skipped(reason)) => (json!({ "skipped": true, "changed": false, "msg": reason }), 0),
        Err(err) => (
            json!({ "failed": true, "changed": false, "msg": err.to_string() }),
            err.exit_code(),
        ),
    }
}

/// Print the outcome on stdout and return the process exit code
pub fn emit(outcome: &Result<Outcome, ControllerError>) -> ExitCode {
    let (body, code) = render(outcome);
    println!("{body}");
    ExitCode::from(code)
}
