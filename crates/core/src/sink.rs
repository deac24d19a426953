//! Report sink capability

use crate::error::SinkError;
use crate::step::StepStatus;

/// The system of record that receives report lines for one test
pub trait ReportSink: Send + Sync {
    fn log(&self, status: StepStatus, message: &str) -> Result<(), SinkError>;
}
