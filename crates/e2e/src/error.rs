//! Error types for the scenario runner

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Scenario parse error: {0}")]
    SpecParse(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("No screenshot frames found in {0}")]
    NoFrames(PathBuf),

    #[error("Scenario task failed: {0}")]
    TaskFailed(String),

    #[error("Engine error: {0}")]
    Engine(#[from] steplog_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
