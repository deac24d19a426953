//! Report writer: formats one step and forwards it to the report sink

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::config::EngineConfig;
use crate::embed::ImageEmbedder;
use crate::sink::ReportSink;
use crate::step::StepStatus;

/// What happened to a single step write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The step reached the sink as formatted
    Written,
    /// The bare description reached the sink, followed by a warning note
    Degraded,
    /// Nothing reached the sink
    Dropped,
}

/// Borrowed view over a context's sink, embedder and config
pub struct ReportWriter<'a> {
    sink: Option<&'a dyn ReportSink>,
    embedder: &'a dyn ImageEmbedder,
    config: &'a EngineConfig,
}

impl<'a> ReportWriter<'a> {
    pub fn new(
        sink: Option<&'a dyn ReportSink>,
        embedder: &'a dyn ImageEmbedder,
        config: &'a EngineConfig,
    ) -> Self {
        Self { sink, embedder, config }
    }

    /// Write one step. Never fails; problems are logged and reflected in the outcome.
    pub fn write(&self, passed: bool, description: &str, screenshot: Option<&str>) -> WriteOutcome {
        let Some(sink) = self.sink else {
            error!("No active report test to record step: {}", description);
            return WriteOutcome::Dropped;
        };

        let status = StepStatus::from_passed(passed);

        let Some(screenshot) = screenshot else {
            return match sink.log(status, description) {
                Ok(()) => WriteOutcome::Written,
                Err(e) => {
                    error!("Report sink rejected step '{}': {}", description, e);
                    WriteOutcome::Dropped
                }
            };
        };

        let style = self.config.styles.for_passed(passed);
        let formatted = self
            .embedder
            .embed(screenshot, style, description)
            .map_err(|e| e.to_string())
            .and_then(|markup| {
                let message = format!("{}{}{}", description, self.config.separator, markup);
                sink.log(status, &message).map_err(|e| e.to_string())
            });

        match formatted {
            Ok(()) => WriteOutcome::Written,
            Err(cause) => self.write_fallback(sink, status, description, &cause),
        }
    }

    fn write_fallback(
        &self,
        sink: &dyn ReportSink,
        status: StepStatus,
        description: &str,
        cause: &str,
    ) -> WriteOutcome {
        warn!("Could not attach screenshot to '{}': {}", description, cause);

        if let Err(e) = sink.log(status, description) {
            error!("Report sink rejected step '{}': {}", description, e);
            return WriteOutcome::Dropped;
        }

        let note = format!("Error displaying screenshot: {}", cause);
        if let Err(e) = sink.log(StepStatus::Warning, &note) {
            error!("Report sink rejected warning for '{}': {}", description, e);
        }
        WriteOutcome::Degraded
    }
}
