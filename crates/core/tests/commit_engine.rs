//! Commit engine behaviour observed through the report sink

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use test_case::test_case;

use steplog_core::{
    BufferAction, CaptureError, EmbedError, ExecutionContext, ImageEmbedder, Report, ReportSink,
    ScreenshotSource, SinkError, StepMode, StepStatus,
};

/// Records every call it receives
#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<(StepStatus, String)>>,
}

impl RecordingSink {
    fn calls(&self) -> Vec<(StepStatus, String)> {
        self.calls.lock().clone()
    }
}

impl ReportSink for RecordingSink {
    fn log(&self, status: StepStatus, message: &str) -> Result<(), SinkError> {
        self.calls.lock().push((status, message.to_string()));
        Ok(())
    }
}

/// Hands out `frame-0`, `frame-1`, ... encoded as base64
#[derive(Default)]
struct CountingSource {
    captures: AtomicUsize,
}

impl CountingSource {
    fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl ScreenshotSource for CountingSource {
    fn capture_as_text(&self) -> Result<String, CaptureError> {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let n = self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(STANDARD.encode(format!("frame-{}", n)))
    }
}

struct FailingSource;

impl ScreenshotSource for FailingSource {
    fn capture_as_text(&self) -> Result<String, CaptureError> {
        Err(CaptureError::Failed("session not created".into()))
    }
}

/// Embedder that only shows which screenshot it was given
struct TagEmbedder;

impl ImageEmbedder for TagEmbedder {
    fn embed(&self, screenshot: &str, style: &str, _description: &str) -> Result<String, EmbedError> {
        Ok(format!("[{}:{}]", style, screenshot))
    }
}

fn frame(n: usize) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    STANDARD.encode(format!("frame-{}", n))
}

fn context() -> (ExecutionContext, Arc<RecordingSink>, Arc<CountingSource>) {
    let sink = Arc::new(RecordingSink::default());
    let source = Arc::new(CountingSource::default());
    let mut ctx = ExecutionContext::new("login").with_embedder(Arc::new(TagEmbedder));
    ctx.attach_sink(sink.clone());
    ctx.attach_source(source.clone());
    (ctx, sink, source)
}

fn bare(status: StepStatus, message: &str) -> (StepStatus, String) {
    (status, message.to_string())
}

#[test_case(0)]
#[test_case(1)]
#[test_case(5)]
fn commit_success_writes_every_step_in_order(n: usize) {
    let (mut ctx, sink, _) = context();
    for i in 0..n {
        ctx.record_step(&format!("step {}", i), i % 2 == 0, false, StepMode::Buffer).unwrap();
    }
    assert!(sink.calls().is_empty(), "buffered steps must not be written before commit");

    let summary = ctx.process_buffer(BufferAction::CommitSuccess, None, false).unwrap();

    let expected: Vec<_> = (0..n)
        .map(|i| bare(StepStatus::from_passed(i % 2 == 0), &format!("step {}", i)))
        .collect();
    assert_eq!(sink.calls(), expected);
    assert_eq!(summary.written, n);
}

#[test]
fn commit_with_failure_appends_fresh_failure() {
    let (mut ctx, sink, source) = context();
    ctx.record_step("enter username", true, false, StepMode::Buffer).unwrap();
    ctx.record_step("enter password", true, false, StepMode::Buffer).unwrap();

    ctx.process_buffer(BufferAction::CommitWithFailure, Some("login rejected"), true)
        .unwrap();

    assert_eq!(
        sink.calls(),
        vec![
            bare(StepStatus::Pass, "enter username"),
            bare(StepStatus::Pass, "enter password"),
            bare(StepStatus::Fail, &format!("login rejected<br>[error:{}]", frame(0))),
        ]
    );
    assert_eq!(source.captures(), 1);
}

#[test]
fn merged_failure_on_single_step() {
    let (mut ctx, sink, _) = context();
    ctx.record_step("click submit", true, false, StepMode::Buffer).unwrap();

    ctx.process_buffer(BufferAction::CommitMergedFailure, Some("timeout waiting for redirect"), false)
        .unwrap();

    assert_eq!(
        sink.calls(),
        vec![bare(StepStatus::Fail, "click submit<br>timeout waiting for redirect")]
    );
}

#[test]
fn merged_failure_keeps_earlier_screenshots_and_recaptures_last() {
    let (mut ctx, sink, source) = context();
    ctx.record_step("open login", true, true, StepMode::Buffer).unwrap(); // frame-0
    ctx.record_step("enter username", true, true, StepMode::Buffer).unwrap(); // frame-1
    ctx.record_step("click login", true, true, StepMode::Buffer).unwrap(); // frame-2, discarded

    ctx.process_buffer(BufferAction::CommitMergedFailure, Some("no redirect"), true)
        .unwrap();

    assert_eq!(
        sink.calls(),
        vec![
            bare(StepStatus::Pass, &format!("open login<br>[success:{}]", frame(0))),
            bare(StepStatus::Pass, &format!("enter username<br>[success:{}]", frame(1))),
            bare(StepStatus::Fail, &format!("click login<br>no redirect<br>[error:{}]", frame(3))),
        ]
    );
    assert_eq!(source.captures(), 4);
}

#[test]
fn merged_failure_on_empty_buffer_matches_discard_and_fail() {
    let (mut merged_ctx, merged_sink, _) = context();
    merged_ctx
        .process_buffer(BufferAction::CommitMergedFailure, Some("page did not load"), true)
        .unwrap();

    let (mut discard_ctx, discard_sink, _) = context();
    discard_ctx
        .process_buffer(BufferAction::DiscardAndFail, Some("page did not load"), true)
        .unwrap();

    assert_eq!(merged_sink.calls().len(), 1);
    assert_eq!(merged_sink.calls(), discard_sink.calls());
}

#[test]
fn discard_and_fail_never_writes_buffered_steps() {
    let (mut ctx, sink, _) = context();
    ctx.record_step("add backpack", true, false, StepMode::Buffer).unwrap();
    ctx.record_step("add bike light", true, false, StepMode::Buffer).unwrap();

    let summary = ctx
        .process_buffer(BufferAction::DiscardAndFail, Some("cart badge missing"), false)
        .unwrap();

    assert_eq!(sink.calls(), vec![bare(StepStatus::Fail, "cart badge missing")]);
    assert_eq!(summary.discarded, 2);
}

#[test_case(BufferAction::CommitSuccess)]
#[test_case(BufferAction::CommitWithFailure)]
#[test_case(BufferAction::CommitMergedFailure)]
#[test_case(BufferAction::DiscardAndFail)]
fn buffer_is_empty_after_every_action(action: BufferAction) {
    let (mut ctx, sink, _) = context();
    ctx.record_step("one", true, true, StepMode::Buffer).unwrap();
    ctx.record_step("two", false, true, StepMode::Buffer).unwrap();

    ctx.process_buffer(action, Some("failure"), true).unwrap();
    assert_eq!(ctx.pending_len(), 0);

    let before = sink.calls().len();
    let summary = ctx.process_buffer(BufferAction::CommitSuccess, None, false).unwrap();
    assert_eq!(summary.attempted(), 0);
    assert_eq!(sink.calls().len(), before);
}

#[test]
fn buffer_is_cleared_even_when_every_write_fails() {
    struct Rejecting;
    impl ReportSink for Rejecting {
        fn log(&self, _: StepStatus, _: &str) -> Result<(), SinkError> {
            Err(SinkError::Rejected("disk full".into()))
        }
    }

    let mut ctx = ExecutionContext::new("rejected");
    ctx.attach_sink(Arc::new(Rejecting));
    ctx.record_step("a", true, false, StepMode::Buffer).unwrap();
    ctx.record_step("b", true, false, StepMode::Buffer).unwrap();

    let summary = ctx
        .process_buffer(BufferAction::CommitWithFailure, Some("c"), false)
        .unwrap();
    assert_eq!(summary.dropped, 3);
    assert_eq!(ctx.pending_len(), 0);
}

#[test]
fn stored_screenshot_is_not_recaptured_on_commit() {
    let (mut ctx, sink, source) = context();
    ctx.record_step("open cart", true, true, StepMode::Buffer).unwrap();
    let stored = ctx.pending_steps()[0].screenshot().map(str::to_string);
    assert_eq!(stored, Some(frame(0)));

    ctx.process_buffer(BufferAction::CommitSuccess, None, true).unwrap();

    assert_eq!(source.captures(), 1);
    assert_eq!(
        sink.calls(),
        vec![bare(StepStatus::Pass, &format!("open cart<br>[success:{}]", frame(0)))]
    );
}

#[test]
fn failing_source_never_breaks_step_creation() {
    let (mut ctx, sink, _) = context();
    ctx.attach_source(Arc::new(FailingSource));

    ctx.record_step("checkout", true, true, StepMode::Buffer).unwrap();
    assert_eq!(ctx.pending_steps()[0].screenshot(), None);

    ctx.record_step("finish", false, true, StepMode::Immediate).unwrap();
    ctx.process_buffer(BufferAction::CommitSuccess, None, false).unwrap();

    assert_eq!(
        sink.calls(),
        vec![bare(StepStatus::Fail, "finish"), bare(StepStatus::Pass, "checkout")]
    );
}

#[test]
fn immediate_mode_writes_now_and_leaves_buffer_alone() {
    let (mut ctx, sink, source) = context();
    ctx.record_step("buffered", true, false, StepMode::Buffer).unwrap();
    ctx.record_step("navigated to inventory", true, true, StepMode::Immediate).unwrap();

    assert_eq!(ctx.pending_len(), 1);
    assert_eq!(
        sink.calls(),
        vec![bare(StepStatus::Pass, &format!("navigated to inventory<br>[success:{}]", frame(0)))]
    );
    assert_eq!(source.captures(), 1);
}

#[test]
fn static_mode_parses_to_buffer() {
    let (mut ctx, sink, _) = context();
    let mode: StepMode = "STATIC".parse().unwrap();
    ctx.record_step("static step", true, false, mode).unwrap();

    assert!(sink.calls().is_empty());
    assert_eq!(ctx.pending_len(), 1);
}

#[test]
fn detached_source_and_sink_are_tolerated() {
    let (mut ctx, sink, _) = context();
    ctx.detach_source();
    ctx.record_step("no browser yet", true, true, StepMode::Buffer).unwrap();

    ctx.detach_sink();
    let summary = ctx
        .process_buffer(BufferAction::CommitWithFailure, Some("still no browser"), true)
        .unwrap();

    assert_eq!(summary.dropped, 2);
    assert!(sink.calls().is_empty());
    assert_eq!(ctx.pending_len(), 0);
}

#[test]
fn commit_into_report_test() {
    let report = Report::new("Sauce demo");
    let test = report.create_test("login rejected", "wrong password");

    let mut ctx = ExecutionContext::new("login rejected");
    ctx.attach_sink(test.clone());
    ctx.attach_source(Arc::new(CountingSource::default()));

    ctx.record_step("enter username", true, true, StepMode::Buffer).unwrap();
    ctx.record_step("enter password", true, true, StepMode::Buffer).unwrap();
    ctx.process_buffer(BufferAction::CommitWithFailure, Some("login rejected"), true)
        .unwrap();

    let statuses: Vec<_> = test.entries().iter().map(|e| e.status).collect();
    assert_eq!(statuses, vec![StepStatus::Pass, StepStatus::Pass, StepStatus::Fail]);
    assert!(test.entries()[2].message.contains("screenshot-error"));
    assert_eq!(test.status(), StepStatus::Fail);

    test.close();
    ctx.record_step("after close", true, false, StepMode::Immediate).unwrap();
    assert_eq!(test.entries().len(), 3);
}
