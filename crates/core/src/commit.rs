//! Commit engine: resolves a drained step buffer into report writes
//!
//! A commit happens in two phases. [`plan`] turns the buffered steps and
//! the requested [`BufferAction`] into an ordered list of writes, each
//! knowing where its screenshot comes from. [`execute`] then performs the
//! writes in order, taking fresh captures at the moment they are reached.
//!
//! | action | writes |
//! |---|---|
//! | `CommitSuccess` | every buffered step with its stored screenshot |
//! | `CommitWithFailure` | every buffered step, then the failure with a fresh screenshot |
//! | `CommitMergedFailure` | all but the last step, then `last + separator + failure` with a fresh screenshot |
//! | `DiscardAndFail` | only the failure with a fresh screenshot |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::capture::{capture, ScreenshotSource};
use crate::error::{Error, Result};
use crate::step::PendingStep;
use crate::writer::{ReportWriter, WriteOutcome};

/// Strategy used to resolve the step buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferAction {
    /// Write every buffered step
    CommitSuccess,
    /// Write every buffered step, then a failure step
    CommitWithFailure,
    /// Fold the failure into the last buffered step
    CommitMergedFailure,
    /// Drop the buffered steps and write only the failure
    DiscardAndFail,
}

impl BufferAction {
    pub const ALL: [BufferAction; 4] = [
        BufferAction::CommitSuccess,
        BufferAction::CommitWithFailure,
        BufferAction::CommitMergedFailure,
        BufferAction::DiscardAndFail,
    ];

    /// Whether this action writes a failure step and so needs its text
    pub fn requires_failure(self) -> bool {
        !matches!(self, BufferAction::CommitSuccess)
    }

    /// Check the failure description against what this action needs.
    ///
    /// Returns the text to use (always `None` for `CommitSuccess`).
    pub fn failure_text(self, failure: Option<&str>) -> Result<Option<&str>> {
        if !self.requires_failure() {
            return Ok(None);
        }
        match failure {
            Some(text) if !text.trim().is_empty() => Ok(Some(text)),
            _ => Err(Error::MissingFailureDescription { action: self }),
        }
    }
}

impl std::fmt::Display for BufferAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferAction::CommitSuccess => write!(f, "COMMIT_SUCCESS"),
            BufferAction::CommitWithFailure => write!(f, "COMMIT_WITH_FAILURE"),
            BufferAction::CommitMergedFailure => write!(f, "COMMIT_MERGED_FAILURE"),
            BufferAction::DiscardAndFail => write!(f, "DISCARD_AND_FAIL"),
        }
    }
}

impl FromStr for BufferAction {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "commit_success" => Ok(BufferAction::CommitSuccess),
            "commit_with_failure" => Ok(BufferAction::CommitWithFailure),
            "commit_merged_failure" => Ok(BufferAction::CommitMergedFailure),
            "discard_and_fail" => Ok(BufferAction::DiscardAndFail),
            _ => Err(Error::UnknownAction(s.to_string())),
        }
    }
}

/// Counts of what a commit did. Soft failures end up here, never as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub action: BufferAction,
    pub written: usize,
    pub degraded: usize,
    pub dropped: usize,
    /// Buffered steps that were never written
    pub discarded: usize,
}

impl CommitSummary {
    pub fn new(action: BufferAction) -> Self {
        Self {
            action,
            written: 0,
            degraded: 0,
            dropped: 0,
            discarded: 0,
        }
    }

    pub fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Written => self.written += 1,
            WriteOutcome::Degraded => self.degraded += 1,
            WriteOutcome::Dropped => self.dropped += 1,
        }
    }

    /// Number of steps the commit attempted to write
    pub fn attempted(&self) -> usize {
        self.written + self.degraded + self.dropped
    }

    /// True when every attempted write went through as formatted
    pub fn is_clean(&self) -> bool {
        self.degraded == 0 && self.dropped == 0
    }
}

/// Where a planned write gets its screenshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScreenshotPlan {
    /// Whatever was captured when the step was recorded
    Stored(Option<String>),
    /// Capture when the write is performed
    Fresh,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedWrite {
    pub passed: bool,
    pub description: String,
    pub screenshot: ScreenshotPlan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommitPlan {
    pub action: BufferAction,
    pub writes: Vec<PlannedWrite>,
    pub discarded: usize,
}

/// Lay out the writes for `action` over the drained `steps`.
///
/// `failure` must already be validated with [`BufferAction::failure_text`].
pub(crate) fn plan(
    action: BufferAction,
    mut steps: Vec<PendingStep>,
    failure: Option<&str>,
    wants_screenshot: bool,
    separator: &str,
) -> CommitPlan {
    let failure = failure.unwrap_or_default();
    let fresh = if wants_screenshot {
        ScreenshotPlan::Fresh
    } else {
        ScreenshotPlan::None
    };
    let failure_write = |description: String| PlannedWrite {
        passed: false,
        description,
        screenshot: fresh.clone(),
    };

    let mut discarded = 0;
    let writes = match action {
        BufferAction::CommitSuccess => stored_writes(steps),
        BufferAction::CommitWithFailure => {
            let mut writes = stored_writes(steps);
            writes.push(failure_write(failure.to_string()));
            writes
        }
        BufferAction::CommitMergedFailure => match steps.pop() {
            None => vec![failure_write(failure.to_string())],
            Some(last) => {
                let mut writes = stored_writes(steps);
                let merged = format!("{}{}{}", last.description(), separator, failure);
                writes.push(failure_write(merged));
                writes
            }
        },
        BufferAction::DiscardAndFail => {
            discarded = steps.len();
            vec![failure_write(failure.to_string())]
        }
    };

    CommitPlan {
        action,
        writes,
        discarded,
    }
}

fn stored_writes(steps: Vec<PendingStep>) -> Vec<PlannedWrite> {
    steps
        .into_iter()
        .map(|step| {
            let (description, passed, screenshot) = step.into_stored_write();
            PlannedWrite {
                passed,
                description,
                screenshot: ScreenshotPlan::Stored(screenshot),
            }
        })
        .collect()
}

/// Perform the planned writes in order
pub(crate) fn execute(
    plan: CommitPlan,
    writer: &ReportWriter<'_>,
    source: Option<&dyn ScreenshotSource>,
) -> CommitSummary {
    let mut summary = CommitSummary::new(plan.action);
    summary.discarded = plan.discarded;

    for write in plan.writes {
        let screenshot = match write.screenshot {
            ScreenshotPlan::Stored(stored) => stored,
            ScreenshotPlan::Fresh => capture(source),
            ScreenshotPlan::None => None,
        };
        summary.record(writer.write(write.passed, &write.description, screenshot.as_deref()));
    }

    debug!(
        "Committed buffer with {}: {} written, {} degraded, {} dropped, {} discarded",
        summary.action, summary.written, summary.degraded, summary.dropped, summary.discarded
    );
    summary
}
