//! Scenario runner: executes specs concurrently, one execution context each

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use steplog_core::{
    CommitSummary, EngineConfig, Error as EngineError, ExecutionContext, LogEntry, Report,
    ReportPaths, ReportTest, StepStatus,
};

use crate::error::{E2eError, E2eResult};
use crate::frames::FrameSource;
use crate::spec::{ScenarioOp, ScenarioSpec, SinkState, SourceState};

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    /// Every line that reached the report, in order
    pub entries: Vec<LogEntry>,
    pub statuses: Vec<StepStatus>,
    pub summaries: Vec<CommitSummary>,
    /// Steps still buffered when the scenario ended
    pub leftover: usize,
    pub error: Option<String>,
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Configuration for the scenario runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
    pub engine: EngineConfig,
    /// Maximum number of scenarios running at once
    pub jobs: usize,
    pub report_title: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            specs_dir: PathBuf::from("scenarios"),
            output_dir: PathBuf::from("test-results"),
            engine: EngineConfig::default(),
            jobs: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            report_title: "steplog scenarios".to_string(),
        }
    }
}

/// Runs scenario specs and writes the report
pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    /// Create a new runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run all scenarios in the specs directory
    pub async fn run_all(&self) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.specs_dir)?;
        self.run_specs(specs).await
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.specs_dir)?;
        let filtered = ScenarioSpec::filter_by_tag(&specs, tag).into_iter().cloned().collect();
        self.run_specs(filtered).await
    }

    /// Run a specific scenario by name
    pub async fn run_named(&self, name: &str) -> E2eResult<SuiteResult> {
        let spec = ScenarioSpec::load_all(&self.config.specs_dir)?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::ScenarioNotFound(name.to_string()))?;
        self.run_specs(vec![spec]).await
    }

    /// Run scenarios concurrently, flush the report, and return results in spec order
    pub async fn run_specs(&self, specs: Vec<ScenarioSpec>) -> E2eResult<SuiteResult> {
        let start = Instant::now();
        let total = specs.len();
        let report = Arc::new(Report::new(self.config.report_title.clone()));
        let permits = Arc::new(Semaphore::new(self.config.jobs.max(1)));

        info!("Running {} scenario(s)...", total);

        let mut tasks = JoinSet::new();
        for (index, spec) in specs.into_iter().enumerate() {
            let report = Arc::clone(&report);
            let permits = Arc::clone(&permits);
            let engine = self.config.engine.clone();

            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| E2eError::TaskFailed(e.to_string()))?;
                let test = report.create_test(spec.name.clone(), spec.description.clone());
                let result = tokio::task::spawn_blocking(move || run_scenario(&spec, engine, test))
                    .await
                    .map_err(|e| E2eError::TaskFailed(e.to_string()))?;
                Ok::<_, E2eError>((index, result))
            });
        }

        let mut indexed = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| E2eError::TaskFailed(e.to_string()))??;
            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!("✗ {} - {}", result.name, result.error.as_deref().unwrap_or("unexpected report"));
            }
            indexed.push((index, result));
        }
        indexed.sort_by_key(|(index, _)| *index);
        let results: Vec<ScenarioResult> = indexed.into_iter().map(|(_, r)| r).collect();

        self.flush_report(&report)?;

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("Scenario results: {} passed, {} failed ({} ms)", passed, failed, duration_ms);

        Ok(SuiteResult {
            total,
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Write the report files into the output directory
    pub fn flush_report(&self, report: &Report) -> E2eResult<ReportPaths> {
        let paths = report.flush(&self.config.output_dir)?;
        debug!("Flushed report '{}' ({} test(s))", report.title(), report.tests().len());
        Ok(paths)
    }

    /// Write suite results to JSON file
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one scenario against its own execution context, writing into `test`.
///
/// A failed `validate` op ends the scenario the way an assertion ends a
/// test; any other engine error marks the scenario as broken.
pub fn run_scenario(spec: &ScenarioSpec, engine: EngineConfig, test: Arc<ReportTest>) -> ScenarioResult {
    let start = Instant::now();
    debug!("Running scenario: {}", spec.name);

    let source = match &spec.frames {
        Some(dir) => FrameSource::from_dir(dir),
        None => Ok(FrameSource::synthetic()),
    };
    let source = match source {
        Ok(source) => Arc::new(source),
        Err(e) => {
            test.close();
            return ScenarioResult {
                name: spec.name.clone(),
                success: false,
                duration_ms: start.elapsed().as_millis() as u64,
                entries: Vec::new(),
                statuses: Vec::new(),
                summaries: Vec::new(),
                leftover: 0,
                error: Some(e.to_string()),
            };
        }
    };

    let mut ctx = ExecutionContext::with_config(spec.name.clone(), engine);
    ctx.attach_source(source.clone());
    ctx.attach_sink(test.clone());

    let mut summaries = Vec::new();
    let mut error = None;
    let mut broken = false;

    for (i, op) in spec.steps.iter().enumerate() {
        if let Err(e) = apply(&mut ctx, op, &source, &test, &mut summaries) {
            broken = !matches!(e, EngineError::AssertionFailed(_));
            error = Some(format!("op {}: {}", i + 1, e));
            break;
        }
    }

    let leftover = ctx.teardown().len();
    test.close();

    let entries = test.entries();
    let statuses: Vec<StepStatus> = entries.iter().map(|e| e.status).collect();
    let matches_expectation = match &spec.expect {
        Some(expected) => {
            let matches = *expected == statuses;
            if !matches {
                warn!(
                    "Scenario '{}' expected {:?} but the report holds {:?}",
                    spec.name, expected, statuses
                );
            }
            matches
        }
        None => test.status() != StepStatus::Fail,
    };

    ScenarioResult {
        name: spec.name.clone(),
        success: !broken && matches_expectation,
        duration_ms: start.elapsed().as_millis() as u64,
        entries,
        statuses,
        summaries,
        leftover,
        error,
    }
}

fn apply(
    ctx: &mut ExecutionContext,
    op: &ScenarioOp,
    source: &Arc<FrameSource>,
    test: &Arc<ReportTest>,
    summaries: &mut Vec<CommitSummary>,
) -> Result<(), EngineError> {
    match op {
        ScenarioOp::Record { description, passed, screenshot, mode } => {
            ctx.record_step(description, *passed, *screenshot, *mode)
        }
        ScenarioOp::Commit { action, failure, screenshot } => {
            let summary = ctx.process_buffer(*action, failure.as_deref(), *screenshot)?;
            if !summary.is_clean() {
                warn!(
                    "Commit {} in '{}' lost formatting or lines: {} degraded, {} dropped",
                    summary.action,
                    ctx.name(),
                    summary.degraded,
                    summary.dropped
                );
            }
            summaries.push(summary);
            Ok(())
        }
        ScenarioOp::Validate { condition, success, failure, mode } => {
            ctx.validate(*condition, success, failure, *mode)
        }
        ScenarioOp::Source { state } => {
            match state {
                SourceState::Attached | SourceState::Failing => {
                    source.set_failing(*state == SourceState::Failing);
                    ctx.attach_source(source.clone());
                }
                SourceState::Detached => {
                    ctx.detach_source();
                }
            }
            Ok(())
        }
        ScenarioOp::Sink { state } => {
            match state {
                SinkState::Attached => ctx.attach_sink(test.clone()),
                SinkState::Detached => {
                    ctx.detach_sink();
                }
            }
            Ok(())
        }
    }
}
