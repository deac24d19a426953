//! steplog scenario runner
//!
//! Drives the steplog engine from declarative YAML scenarios, so commit
//! strategies can be exercised end to end without a browser:
//! - Parses scenario specs (record, commit, validate, capability changes)
//! - Serves screenshots from a directory of frames, or synthetic ones
//! - Runs scenarios concurrently, each with its own execution context
//! - Flushes an HTML/JSON report and a machine-readable result file
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ScenarioRunner (tokio)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  run_specs(specs) -> SuiteResult                            │
//! │    └── per scenario, on a blocking thread:                  │
//! │          ExecutionContext ── FrameSource (screenshots)      │
//! │                          └── ReportTest  (report sink)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioSpec (YAML)                                        │
//! │    ├── name, description, tags, frames                      │
//! │    ├── steps: [ScenarioOp]                                  │
//! │    │     ├── record { description, passed, screenshot, mode}│
//! │    │     ├── commit { action, failure, screenshot }         │
//! │    │     ├── validate { condition, success, failure }       │
//! │    │     ├── source { attached | detached | failing }       │
//! │    │     └── sink { attached | detached }                   │
//! │    └── expect: [pass | fail | warning]                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod frames;
pub mod runner;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use frames::FrameSource;
pub use runner::{RunnerConfig, ScenarioResult, ScenarioRunner, SuiteResult};
pub use spec::{ScenarioOp, ScenarioSpec};
