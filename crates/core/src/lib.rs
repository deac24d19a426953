//! steplog core
//!
//! Step buffering and report commit engine for test executions.
//!
//! A test execution records human-readable steps through an
//! [`ExecutionContext`]. Steps are either written to the report right away
//! or held in the context's buffer and later committed under one of four
//! [`BufferAction`] strategies. Screenshots come from a [`ScreenshotSource`],
//! report lines go to a [`ReportSink`]; both are owned by the caller and may
//! be absent at any time.
//!
//! ```text
//! record_step ──► StepBuffer ──► process_buffer ──► ReportWriter ──► ReportSink
//!      │                              │                  │
//!      └─ capture (record time)       └─ capture (fresh) └─ ImageEmbedder
//! ```

pub mod buffer;
pub mod capture;
pub mod commit;
pub mod config;
pub mod context;
pub mod embed;
pub mod error;
mod guard;
pub mod report;
pub mod sink;
pub mod step;
pub mod writer;

pub use buffer::StepBuffer;
pub use capture::{capture, ScreenshotSource};
pub use commit::{BufferAction, CommitSummary};
pub use config::{EmbedConfig, EngineConfig, StyleConfig};
pub use context::ExecutionContext;
pub use embed::{HtmlEmbedder, ImageEmbedder};
pub use error::{CaptureError, EmbedError, Error, Result, SinkError};
pub use report::{LogEntry, Report, ReportPaths, ReportSnapshot, ReportTest, TestSnapshot};
pub use sink::ReportSink;
pub use step::{PendingStep, StepMode, StepStatus};
pub use writer::{ReportWriter, WriteOutcome};

/// steplog version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
