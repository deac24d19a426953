//! Step values: report status, recording mode and the buffered step itself

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::capture::{capture, ScreenshotSource};
use crate::error::Error;

/// Status of a line written to the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pass,
    Fail,
    Warning,
}

impl StepStatus {
    /// Map a step's pass flag onto a report status
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            StepStatus::Pass
        } else {
            StepStatus::Fail
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Pass => write!(f, "PASS"),
            StepStatus::Fail => write!(f, "FAIL"),
            StepStatus::Warning => write!(f, "WARNING"),
        }
    }
}

impl FromStr for StepStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass" => Ok(StepStatus::Pass),
            "fail" => Ok(StepStatus::Fail),
            "warning" => Ok(StepStatus::Warning),
            other => Err(Error::InvalidConfig(format!("unknown step status: {}", other))),
        }
    }
}

/// How a recorded step reaches the report.
///
/// `static` is accepted as a second spelling of `buffer` when parsing; both
/// mean the step waits in the buffer until the next commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    #[default]
    #[serde(alias = "static")]
    Buffer,
    Immediate,
}

impl std::fmt::Display for StepMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepMode::Buffer => write!(f, "buffer"),
            StepMode::Immediate => write!(f, "immediate"),
        }
    }
}

impl FromStr for StepMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buffer" | "static" => Ok(StepMode::Buffer),
            "immediate" => Ok(StepMode::Immediate),
            _ => Err(Error::UnknownMode(s.to_string())),
        }
    }
}

/// A recorded step that has not been written to the report yet.
///
/// The screenshot is taken when the step is constructed and never again:
/// committing later shows the state of the page at record time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingStep {
    description: String,
    passed: bool,
    wants_screenshot: bool,
    screenshot: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl PendingStep {
    /// Build a step, capturing from `source` right away when a screenshot is wanted
    pub fn new(
        description: impl Into<String>,
        passed: bool,
        wants_screenshot: bool,
        source: Option<&dyn ScreenshotSource>,
    ) -> Self {
        let screenshot = if wants_screenshot { capture(source) } else { None };
        Self {
            description: description.into(),
            passed,
            wants_screenshot,
            screenshot,
            recorded_at: Utc::now(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn wants_screenshot(&self) -> bool {
        self.wants_screenshot
    }

    /// Screenshot captured at record time, if any
    pub fn screenshot(&self) -> Option<&str> {
        self.screenshot.as_deref()
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Screenshot to show when this step is written with its stored capture
    pub(crate) fn into_stored_write(self) -> (String, bool, Option<String>) {
        let screenshot = if self.wants_screenshot { self.screenshot } else { None };
        (self.description, self.passed, screenshot)
    }
}
