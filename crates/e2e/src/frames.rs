//! Screenshot source backed by a directory of image frames

use base64::{engine::general_purpose::STANDARD, Engine as _};
use parking_lot::Mutex;
use std::path::Path;
use tracing::debug;

use steplog_core::{CaptureError, ScreenshotSource};

use crate::error::{E2eError, E2eResult};

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Hands out pre-recorded frames round-robin, one per capture.
///
/// Without a frame directory every capture yields a small synthetic frame
/// (`frame-<n>`, base64 encoded) so scenarios can run with no browser.
pub struct FrameSource {
    frames: Vec<String>,
    state: Mutex<FrameState>,
}

#[derive(Default)]
struct FrameState {
    next: usize,
    failing: bool,
}

impl FrameSource {
    pub fn synthetic() -> Self {
        Self {
            frames: Vec::new(),
            state: Mutex::new(FrameState::default()),
        }
    }

    /// Load every image in `dir` (not recursive), in file name order
    pub fn from_dir(dir: &Path) -> E2eResult<Self> {
        let mut paths = Vec::new();
        for entry in walkdir::WalkDir::new(dir).max_depth(1) {
            let entry = entry?;
            let is_frame = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if entry.file_type().is_file() && is_frame {
                paths.push(entry.into_path());
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(E2eError::NoFrames(dir.to_path_buf()));
        }

        let frames = paths
            .iter()
            .map(|p| std::fs::read(p).map(|bytes| STANDARD.encode(bytes)))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Loaded {} frame(s) from {}", frames.len(), dir.display());

        Ok(Self {
            frames,
            state: Mutex::new(FrameState::default()),
        })
    }

    /// Make subsequent captures fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Number of successful captures so far
    pub fn captured(&self) -> usize {
        self.state.lock().next
    }
}

impl ScreenshotSource for FrameSource {
    fn capture_as_text(&self) -> Result<String, CaptureError> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(CaptureError::Unavailable("browser session is not responding".to_string()));
        }

        let n = state.next;
        state.next += 1;
        if self.frames.is_empty() {
            Ok(STANDARD.encode(format!("frame-{}", n)))
        } else {
            Ok(self.frames[n % self.frames.len()].clone())
        }
    }
}
