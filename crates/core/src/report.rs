//! In-memory test report with JSON and HTML output
//!
//! A [`Report`] collects one [`ReportTest`] per test execution. Each test is
//! a [`ReportSink`]: the execution context writes lines into it, and the
//! report is flushed to disk once the suite is done.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::embed::escape_html;
use crate::error::{Result, SinkError};
use crate::sink::ReportSink;
use crate::step::StepStatus;

/// A single line in a test's log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub status: StepStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Suite-level report
pub struct Report {
    id: Uuid,
    title: String,
    created_at: DateTime<Utc>,
    tests: Mutex<Vec<Arc<ReportTest>>>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            created_at: Utc::now(),
            tests: Mutex::new(Vec::new()),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Start a new test in this report
    pub fn create_test(&self, name: impl Into<String>, description: impl Into<String>) -> Arc<ReportTest> {
        let test = Arc::new(ReportTest::new(name.into(), description.into()));
        debug!("Created report test '{}'", test.name);
        self.tests.lock().push(Arc::clone(&test));
        test
    }

    pub fn tests(&self) -> Vec<Arc<ReportTest>> {
        self.tests.lock().clone()
    }

    /// Point-in-time copy of the whole report
    pub fn snapshot(&self) -> ReportSnapshot {
        let tests: Vec<TestSnapshot> = self.tests.lock().iter().map(|t| t.snapshot()).collect();
        let mut totals = Totals::default();
        for test in &tests {
            match test.status {
                StepStatus::Pass => totals.passed += 1,
                StepStatus::Fail => totals.failed += 1,
                StepStatus::Warning => totals.warning += 1,
            }
        }

        ReportSnapshot {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
            generated_at: Utc::now(),
            totals,
            tests,
        }
    }

    /// Write `report.json` and `report.html` into `dir`, creating it if needed
    pub fn flush(&self, dir: &Path) -> Result<ReportPaths> {
        std::fs::create_dir_all(dir)?;
        let snapshot = self.snapshot();

        let json = dir.join("report.json");
        std::fs::write(&json, serde_json::to_string_pretty(&snapshot)?)?;

        let html = dir.join("report.html");
        std::fs::write(&html, render_html(&snapshot))?;

        info!(
            "Report '{}' written to {} ({} passed, {} failed, {} with warnings)",
            self.title,
            dir.display(),
            snapshot.totals.passed,
            snapshot.totals.failed,
            snapshot.totals.warning
        );
        Ok(ReportPaths { json, html })
    }
}

/// Files produced by [`Report::flush`]
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub html: PathBuf,
}

/// One test's log inside a report
pub struct ReportTest {
    id: Uuid,
    name: String,
    description: String,
    started_at: DateTime<Utc>,
    log: Mutex<TestLog>,
}

#[derive(Default)]
struct TestLog {
    entries: Vec<LogEntry>,
    ended_at: Option<DateTime<Utc>>,
}

impl ReportTest {
    fn new(name: String, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            started_at: Utc::now(),
            log: Mutex::new(TestLog::default()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.log.lock().entries.clone()
    }

    /// Worst status logged so far; a test with no entries counts as passed
    pub fn status(&self) -> StepStatus {
        aggregate_status(&self.log.lock().entries)
    }

    /// Stop accepting entries
    pub fn close(&self) {
        let mut log = self.log.lock();
        if log.ended_at.is_none() {
            log.ended_at = Some(Utc::now());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.log.lock().ended_at.is_some()
    }

    pub fn snapshot(&self) -> TestSnapshot {
        let log = self.log.lock();
        TestSnapshot {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            status: aggregate_status(&log.entries),
            started_at: self.started_at,
            ended_at: log.ended_at,
            entries: log.entries.clone(),
        }
    }
}

impl ReportSink for ReportTest {
    fn log(&self, status: StepStatus, message: &str) -> std::result::Result<(), SinkError> {
        let mut log = self.log.lock();
        if log.ended_at.is_some() {
            return Err(SinkError::Closed);
        }
        log.entries.push(LogEntry {
            status,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

fn aggregate_status(entries: &[LogEntry]) -> StepStatus {
    if entries.iter().any(|e| e.status == StepStatus::Fail) {
        StepStatus::Fail
    } else if entries.iter().any(|e| e.status == StepStatus::Warning) {
        StepStatus::Warning
    } else {
        StepStatus::Pass
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub totals: Totals,
    pub tests: Vec<TestSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Totals {
    pub passed: usize,
    pub failed: usize,
    pub warning: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSnapshot {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub entries: Vec<LogEntry>,
}

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2em; color: #222; }
section.test { border: 1px solid #ddd; border-radius: 4px; margin-bottom: 1.5em; padding: 1em; }
table { border-collapse: collapse; width: 100%; }
td { border-top: 1px solid #eee; padding: 0.4em; vertical-align: top; }
.status { font-weight: bold; width: 6em; }
.pass { color: #2e7d32; }
.fail { color: #c62828; }
.warning { color: #ef6c00; }
img.screenshot { display: block; margin-top: 0.5em; border: 3px solid #999; }
img.screenshot-success { border-color: #2e7d32; }
img.screenshot-error { border-color: #c62828; }
"#;

fn status_class(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pass => "pass",
        StepStatus::Fail => "fail",
        StepStatus::Warning => "warning",
    }
}

/// Render a self-contained HTML page.
///
/// Entry messages are inserted as-is: they carry the markup produced when the
/// step was written (line breaks, embedded screenshots).
fn render_html(snapshot: &ReportSnapshot) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(&snapshot.title)));
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&snapshot.title)));
    html.push_str(&format!(
        "<p>Generated {} &middot; <span class=\"pass\">{} passed</span> &middot; <span class=\"fail\">{} failed</span> &middot; <span class=\"warning\">{} with warnings</span></p>\n",
        snapshot.generated_at.to_rfc3339(),
        snapshot.totals.passed,
        snapshot.totals.failed,
        snapshot.totals.warning
    ));

    for test in &snapshot.tests {
        html.push_str("<section class=\"test\">\n");
        html.push_str(&format!(
            "<h2><span class=\"{}\">{}</span> {}</h2>\n",
            status_class(test.status),
            test.status,
            escape_html(&test.name)
        ));
        if !test.description.is_empty() {
            html.push_str(&format!("<p>{}</p>\n", escape_html(&test.description)));
        }
        html.push_str("<table>\n");
        for entry in &test.entries {
            html.push_str(&format!(
                "<tr><td class=\"status {}\">{}</td><td>{}</td><td>{}</td></tr>\n",
                status_class(entry.status),
                entry.status,
                entry.timestamp.format("%H:%M:%S%.3f"),
                entry.message
            ));
        }
        html.push_str("</table>\n</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_aggregation() {
        let report = Report::new("suite");
        let test = report.create_test("login", "");
        assert_eq!(test.status(), StepStatus::Pass);
        assert_eq!(report.title(), "suite");
        assert_eq!(report.tests().len(), 1);
        assert_eq!(report.tests()[0].id(), test.id());

        test.log(StepStatus::Pass, "open").unwrap();
        test.log(StepStatus::Warning, "slow").unwrap();
        assert_eq!(test.status(), StepStatus::Warning);

        test.log(StepStatus::Fail, "rejected").unwrap();
        assert_eq!(test.status(), StepStatus::Fail);
    }

    #[test]
    fn test_closed_test_rejects_entries() {
        let report = Report::new("suite");
        let test = report.create_test("cart", "");
        test.log(StepStatus::Pass, "open cart").unwrap();
        test.close();

        assert_eq!(test.log(StepStatus::Pass, "late"), Err(SinkError::Closed));
        assert_eq!(test.entries().len(), 1);
        assert!(test.is_closed());
    }

    #[test]
    fn test_flush_writes_json_and_html() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::new("Checkout <suite>");
        let test = report.create_test("checkout", "complete the order");
        test.log(StepStatus::Pass, "fill form<br>done").unwrap();
        test.log(StepStatus::Fail, "submit").unwrap();

        let paths = report.flush(&dir.path().join("reports")).unwrap();

        let json: ReportSnapshot = serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(json.totals.failed, 1);
        assert_eq!(json.tests[0].entries.len(), 2);

        let html = std::fs::read_to_string(&paths.html).unwrap();
        assert!(html.contains("<title>Checkout &lt;suite&gt;</title>"));
        assert!(html.contains("fill form<br>done"));
    }
}
