//! Per-execution context: capabilities plus the step buffer

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::buffer::StepBuffer;
use crate::capture::ScreenshotSource;
use crate::commit::{self, BufferAction, CommitSummary};
use crate::config::EngineConfig;
use crate::embed::{HtmlEmbedder, ImageEmbedder};
use crate::error::{Error, Result};
use crate::sink::ReportSink;
use crate::step::{PendingStep, StepMode};
use crate::writer::{ReportWriter, WriteOutcome};

/// State for one test execution.
///
/// Each concurrently running test owns its own context; nothing in here is
/// shared with other executions. The screenshot source and report sink are
/// owned elsewhere and may be attached or detached at any time.
pub struct ExecutionContext {
    id: Uuid,
    name: String,
    config: EngineConfig,
    source: Option<Arc<dyn ScreenshotSource>>,
    sink: Option<Arc<dyn ReportSink>>,
    embedder: Arc<dyn ImageEmbedder>,
    buffer: StepBuffer,
}

impl ExecutionContext {
    /// Create a context with the default configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, EngineConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: EngineConfig) -> Self {
        let embedder = Arc::new(HtmlEmbedder::new(config.embed.clone()));
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            config,
            source: None,
            sink: None,
            embedder,
            buffer: StepBuffer::new(),
        }
    }

    /// Replace the screenshot embedder
    pub fn with_embedder(mut self, embedder: Arc<dyn ImageEmbedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn attach_source(&mut self, source: Arc<dyn ScreenshotSource>) {
        self.source = Some(source);
    }

    pub fn detach_source(&mut self) -> Option<Arc<dyn ScreenshotSource>> {
        self.source.take()
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn attach_sink(&mut self, sink: Arc<dyn ReportSink>) {
        self.sink = Some(sink);
    }

    pub fn detach_sink(&mut self) -> Option<Arc<dyn ReportSink>> {
        self.sink.take()
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Number of steps waiting for a commit
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn pending_steps(&self) -> &[PendingStep] {
        self.buffer.as_slice()
    }

    /// Record a step, either buffering it or writing it right away.
    ///
    /// A missing screenshot source is not an error; the screenshot is left out.
    pub fn record_step(
        &mut self,
        description: &str,
        passed: bool,
        wants_screenshot: bool,
        mode: StepMode,
    ) -> Result<()> {
        if description.trim().is_empty() {
            return Err(Error::EmptyDescription);
        }

        match mode {
            StepMode::Buffer => self.buffer_step(description, passed, wants_screenshot),
            StepMode::Immediate => {
                self.write_immediate(description, passed, wants_screenshot);
            }
        }
        Ok(())
    }

    /// Resolve the buffer into the report with the given strategy.
    ///
    /// `failure_description` is required by every action except
    /// `CommitSuccess`; a missing one is rejected before anything is
    /// written and leaves the buffer untouched. Once the commit starts the
    /// buffer ends up empty, whatever happens to the individual writes.
    pub fn process_buffer(
        &mut self,
        action: BufferAction,
        failure_description: Option<&str>,
        wants_screenshot: bool,
    ) -> Result<CommitSummary> {
        let failure = action.failure_text(failure_description)?;
        Ok(self.commit(action, failure, wants_screenshot))
    }

    /// End the execution, handing back any steps that were never committed
    pub fn teardown(mut self) -> Vec<PendingStep> {
        let leftover = self.buffer.drain();
        if !leftover.is_empty() {
            warn!(
                "Execution '{}' ended with {} uncommitted step(s)",
                self.name,
                leftover.len()
            );
        }
        debug!("Tearing down execution '{}' ({})", self.name, self.id);
        leftover
    }

    pub(crate) fn buffer_step(&mut self, description: &str, passed: bool, wants_screenshot: bool) {
        let step = PendingStep::new(description, passed, wants_screenshot, self.source.as_deref());
        self.buffer.push(step);
    }

    pub(crate) fn write_immediate(
        &self,
        description: &str,
        passed: bool,
        wants_screenshot: bool,
    ) -> WriteOutcome {
        let screenshot = if wants_screenshot {
            crate::capture::capture(self.source.as_deref())
        } else {
            None
        };
        self.writer().write(passed, description, screenshot.as_deref())
    }

    /// Commit with an already validated failure text
    pub(crate) fn commit(
        &mut self,
        action: BufferAction,
        failure: Option<&str>,
        wants_screenshot: bool,
    ) -> CommitSummary {
        let steps = self.buffer.drain();
        let plan = commit::plan(action, steps, failure, wants_screenshot, &self.config.separator);
        commit::execute(plan, &self.writer(), self.source.as_deref())
    }

    fn writer(&self) -> ReportWriter<'_> {
        ReportWriter::new(self.sink.as_deref(), self.embedder.as_ref(), &self.config)
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("has_source", &self.source.is_some())
            .field("has_sink", &self.sink.is_some())
            .field("pending", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_description_rejected() {
        let mut ctx = ExecutionContext::new("misuse");
        assert!(matches!(
            ctx.record_step("   ", true, false, StepMode::Buffer),
            Err(Error::EmptyDescription)
        ));
        assert_eq!(ctx.pending_len(), 0);
    }

    #[test]
    fn test_missing_failure_leaves_buffer() {
        let mut ctx = ExecutionContext::new("misuse");
        ctx.record_step("fill form", true, false, StepMode::Buffer).unwrap();

        let result = ctx.process_buffer(BufferAction::DiscardAndFail, None, false);
        assert!(matches!(result, Err(Error::MissingFailureDescription { .. })));
        assert_eq!(ctx.pending_len(), 1);
    }

    #[test]
    fn test_commit_without_sink_still_clears() {
        let mut ctx = ExecutionContext::new("no sink");
        ctx.record_step("a", true, false, StepMode::Buffer).unwrap();
        ctx.record_step("b", true, false, StepMode::Buffer).unwrap();

        let summary = ctx.process_buffer(BufferAction::CommitSuccess, None, false).unwrap();
        assert_eq!(summary.dropped, 2);
        assert!(!summary.is_clean());
        assert_eq!(ctx.pending_len(), 0);
    }

    #[test]
    fn test_capabilities_attach_and_detach() {
        let mut ctx = ExecutionContext::new("capabilities");
        assert!(!ctx.has_source());
        assert!(!ctx.has_sink());

        let source = || -> std::result::Result<String, crate::error::CaptureError> { Ok("c2hvdA==".to_string()) };
        ctx.attach_source(Arc::new(source));
        let report = crate::report::Report::new("suite");
        ctx.attach_sink(report.create_test("capabilities", ""));
        assert!(ctx.has_source());
        assert!(ctx.has_sink());

        assert!(ctx.detach_source().is_some());
        assert!(ctx.detach_sink().is_some());
        assert!(!ctx.has_source());
        assert!(!ctx.has_sink());
        assert!(ctx.detach_sink().is_none());
    }

    #[test]
    fn test_teardown_returns_leftovers() {
        let mut ctx = ExecutionContext::new("leftover");
        ctx.record_step("never committed", true, false, StepMode::Buffer).unwrap();
        let leftover = ctx.teardown();
        assert_eq!(leftover.len(), 1);
        assert_eq!(leftover[0].description(), "never committed");
    }
}
