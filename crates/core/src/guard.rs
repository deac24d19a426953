//! Step guards: run an action and record its outcome in one call

use std::fmt::Display;

use crate::commit::BufferAction;
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::step::StepMode;

impl ExecutionContext {
    /// Record `success_message` when `condition` holds, otherwise record
    /// `failure_message` as a failed step and return an assertion error.
    pub fn validate(
        &mut self,
        condition: bool,
        success_message: &str,
        failure_message: &str,
        mode: StepMode,
    ) -> Result<()> {
        if condition {
            self.record_step(success_message, true, true, mode)
        } else {
            self.record_step(failure_message, false, true, mode)?;
            Err(Error::AssertionFailed(failure_message.to_string()))
        }
    }

    /// Run `action`; if it fails, write a failed step with a screenshot
    /// right away and hand the error back unchanged.
    pub fn run_action<T, E, F>(&mut self, description: &str, action: F) -> std::result::Result<T, E>
    where
        E: Display,
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
    {
        action(self).map_err(|e| {
            self.write_immediate(&format!("Error in {}: {}", description, e), false, true);
            e
        })
    }

    /// Run `action` as one buffered step.
    ///
    /// A blank `description` is rejected with [`Error::EmptyDescription`]
    /// before `action` runs. Otherwise the outer result is `Ok` and holds
    /// the action's own result. On success a passed step with a screenshot
    /// is buffered. On failure the buffer is committed with
    /// [`BufferAction::CommitMergedFailure`] using
    /// `"<failure_prefix>: <error>"`, so the failure lands on the last step
    /// that did succeed.
    pub fn buffered_step<T, E, F>(
        &mut self,
        description: &str,
        failure_prefix: &str,
        action: F,
    ) -> Result<std::result::Result<T, E>>
    where
        E: Display,
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
    {
        if description.trim().is_empty() {
            return Err(Error::EmptyDescription);
        }

        Ok(match action(self) {
            Ok(value) => {
                self.buffer_step(description, true, true);
                Ok(value)
            }
            Err(e) => {
                let failure = format!("{}: {}", failure_prefix, e);
                self.commit(BufferAction::CommitMergedFailure, Some(&failure), true);
                Err(e)
            }
        })
    }
}
