//! Screenshot capture with fail-soft semantics

use tracing::{debug, error};

use crate::error::CaptureError;

/// Something able to produce a point-in-time screenshot as text (base64)
pub trait ScreenshotSource: Send + Sync {
    fn capture_as_text(&self) -> Result<String, CaptureError>;
}

impl<F> ScreenshotSource for F
where
    F: Fn() -> Result<String, CaptureError> + Send + Sync,
{
    fn capture_as_text(&self) -> Result<String, CaptureError> {
        self()
    }
}

/// Capture a screenshot, or `None` when no source is attached or capture fails.
///
/// Failures never leave this function; they are logged on the error channel.
pub fn capture(source: Option<&dyn ScreenshotSource>) -> Option<String> {
    let Some(source) = source else {
        debug!("No screenshot source attached, skipping capture");
        return None;
    };

    match source.capture_as_text() {
        Ok(data) => Some(data),
        Err(e) => {
            error!("Error capturing screenshot: {}", e);
            None
        }
    }
}
