//! Declarative YAML scenario specification

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use steplog_core::{BufferAction, StepMode, StepStatus};

use crate::error::{E2eError, E2eResult};

/// A scenario parsed from YAML: a sequence of engine operations run
/// against one execution context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Directory of screenshot frames; relative paths resolve against the
    /// spec file. Synthetic frames are used when absent.
    #[serde(default)]
    pub frames: Option<PathBuf>,

    /// Operations to execute in order
    pub steps: Vec<ScenarioOp>,

    /// Expected status of every report line, in order
    #[serde(default)]
    pub expect: Option<Vec<StepStatus>>,
}

/// A single operation in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScenarioOp {
    /// Record a step (`mode: static` is accepted as `buffer`)
    Record {
        description: String,
        #[serde(default = "default_passed")]
        passed: bool,
        #[serde(default)]
        screenshot: bool,
        #[serde(default)]
        mode: StepMode,
    },

    /// Resolve the step buffer
    Commit {
        action: BufferAction,
        #[serde(default)]
        failure: Option<String>,
        #[serde(default)]
        screenshot: bool,
    },

    /// Check a condition, recording the matching message
    Validate {
        condition: bool,
        success: String,
        failure: String,
        #[serde(default)]
        mode: StepMode,
    },

    /// Change the screenshot source
    Source { state: SourceState },

    /// Change the report sink
    Sink { state: SinkState },
}

fn default_passed() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    Attached,
    Detached,
    /// Attached, but every capture errors
    Failing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkState {
    Attached,
    Detached,
}

impl ScenarioSpec {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut spec = Self::from_yaml(&content).map_err(|e| match e {
            E2eError::SpecParse(msg) => E2eError::SpecParse(format!("{}: {}", path.display(), msg)),
            other => E2eError::SpecParse(format!("{}: {}", path.display(), other)),
        })?;

        if let Some(parent) = path.parent() {
            spec.frames = spec
                .frames
                .take()
                .map(|frames| if frames.is_relative() { parent.join(frames) } else { frames });
        }
        Ok(spec)
    }

    /// Load all scenarios from a directory
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut paths = Vec::new();
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry?;
            let is_yaml = entry
                .path()
                .extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
            if entry.file_type().is_file() && is_yaml {
                paths.push(entry.into_path());
            }
        }
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    fn validate(&self) -> E2eResult<()> {
        if self.name.trim().is_empty() {
            return Err(E2eError::SpecParse("scenario name must not be empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(E2eError::SpecParse(format!("scenario '{}' has no steps", self.name)));
        }
        Ok(())
    }
}
