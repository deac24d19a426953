//! Ordered per-execution buffer of pending steps

use crate::step::PendingStep;

/// Append-only list of pending steps. Insertion order is commit order.
#[derive(Debug, Default)]
pub struct StepBuffer {
    steps: Vec<PendingStep>,
}

impl StepBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: PendingStep) {
        self.steps.push(step);
    }

    /// Take every buffered step, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<PendingStep> {
        std::mem::take(&mut self.steps)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn as_slice(&self) -> &[PendingStep] {
        &self.steps
    }
}
