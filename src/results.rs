//! Run summaries: a JSON line for scripts and a Markdown section in RESULTS.md.

use goose::metrics::GooseMetrics;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::tracker::EventSummary;

/// Results file path (relative to the working directory)
pub const RESULTS_FILE: &str = "RESULTS.md";

/// Characters of a failure body kept in RESULTS.md.
const MARKDOWN_ERROR_CHARS: usize = 80;

/// JSON result format for all load binaries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub test: String,
    pub throughput: f64,
    pub total: usize,
    pub errors: usize,
    #[serde(rename = "successRate")]
    pub success_rate: f64,
    #[serde(rename = "durationSecs")]
    pub duration_secs: f64,
    #[serde(rename = "wsEvents")]
    pub ws_events: Vec<EventSummary>,
    /// Reported HTTP failures per request name, with the last status and body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<EventSummary>,
    pub summary: String,
}

impl TestResult {
    pub fn from_counts(
        test: &str,
        successes: usize,
        failures: usize,
        duration_secs: f64,
        ws_events: Vec<EventSummary>,
    ) -> Self {
        let total = successes + failures;
        let success_rate = if total > 0 {
            (successes as f64 / total as f64) * 100.0
        } else {
            100.0
        };
        let throughput = if duration_secs > 0.0 {
            total as f64 / duration_secs
        } else {
            0.0
        };
        let ws_total: usize = ws_events.iter().map(|e| e.count).sum();
        let ws_failures: usize = ws_events.iter().map(|e| e.failures).sum();

        Self {
            test: test.to_string(),
            throughput,
            total,
            errors: failures,
            success_rate,
            duration_secs,
            summary: format!(
                "{throughput:.0} req/s, {success_rate:.1}% ok, {ws_total} ws events ({ws_failures} failed)"
            ),
            ws_events,
            failures: Vec::new(),
        }
    }

    pub fn with_failures(mut self, failures: Vec<EventSummary>) -> Self {
        self.failures = failures;
        self
    }

    /// Sum success and failure counts over every request name.
    pub fn from_metrics(test: &str, metrics: &GooseMetrics, ws_events: Vec<EventSummary>) -> Self {
        let (successes, failures) = metrics
            .requests
            .values()
            .fold((0, 0), |(ok, failed), agg| {
                (ok + agg.success_count, failed + agg.fail_count)
            });
        Self::from_counts(test, successes, failures, metrics.duration as f64, ws_events)
    }

    /// Print the JSON line and write it to `result_file` when given.
    pub fn emit(&self, result_file: Option<&str>) {
        match serde_json::to_string(self) {
            Ok(json) => {
                if let Some(path) = result_file {
                    if let Err(e) = fs::write(path, &json) {
                        tracing::warn!(path, error = %e, "could not write result file");
                    }
                }
                println!("{json}");
            }
            Err(e) => tracing::warn!(error = %e, "could not serialize result"),
        }
    }

    /// Markdown table body for RESULTS.md.
    pub fn markdown(&self, users: usize) -> String {
        let mut section = format!(
            "\n**Users**: {} | **Total**: {} | **Duration**: {:.1}s\n\n\
             | Throughput | Success | Errors |\n\
             |-----------|--------|--------|\n\
             | {:.0} req/s | {:.1}% | {} |\n",
            users, self.total, self.duration_secs, self.throughput, self.success_rate, self.errors
        );
        if !self.ws_events.is_empty() {
            section.push_str(
                "\n| WS event | Count | Failed | p50 | p99 |\n\
                 |----------|-------|--------|-----|-----|\n",
            );
            for event in &self.ws_events {
                section.push_str(&format!(
                    "| {} | {} | {} | {:.2}ms | {:.2}ms |\n",
                    event.name, event.count, event.failures, event.p50, event.p99
                ));
            }
        }
        if !self.failures.is_empty() {
            section.push_str(
                "\n| Request | Failed | Last error |\n\
                 |---------|--------|------------|\n",
            );
            for failure in &self.failures {
                let last = failure.last_error.as_deref().unwrap_or_default();
                section.push_str(&format!(
                    "| {} | {} | {} |\n",
                    failure.name,
                    failure.failures,
                    markdown_cell(last)
                ));
            }
        }
        section.push('\n');
        section
    }
}

/// Single-line, pipe-free and shortened so it fits a table cell.
fn markdown_cell(text: &str) -> String {
    let flat: String = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|");
    match flat.char_indices().nth(MARKDOWN_ERROR_CHARS) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

/// Header written when RESULTS.md does not exist yet.
pub fn results_header() -> String {
    format!(
        "# Support Desk Load Test Results\n\n\
         **Test Date**: {}\n\
         **Load Tester**: Goose (Rust-based)\n\n\
         ---\n\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M")
    )
}

/// Replace the `## {title}` section of `document`, or append it.
pub fn replace_section(document: &str, title: &str, content: &str) -> String {
    let marker = format!("## {title}");

    let Some(start) = document.find(&marker) else {
        let mut updated = document.to_string();
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&marker);
        updated.push('\n');
        updated.push_str(content);
        return updated;
    };

    let after = start + marker.len();
    let end = document[after..]
        .find("\n## ")
        .map(|offset| after + offset)
        .unwrap_or(document.len());

    let mut updated = String::with_capacity(document.len() + content.len());
    updated.push_str(&document[..start]);
    updated.push_str(&marker);
    updated.push('\n');
    updated.push_str(content);
    updated.push_str(&document[end..]);
    updated
}

/// Replace or append a section in the results file, creating it if needed.
pub fn update_section_in_results(path: &Path, title: &str, content: &str) -> io::Result<()> {
    let existing = if path.exists() {
        fs::read_to_string(path)?
    } else {
        results_header()
    };
    let updated = replace_section(&existing, title, content);

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(updated.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_to_rates() {
        let result = TestResult::from_counts("support", 90, 10, 20.0, Vec::new());
        assert_eq!(result.total, 100);
        assert_eq!(result.errors, 10);
        assert_eq!(result.throughput, 5.0);
        assert_eq!(result.success_rate, 90.0);
        assert!(result.summary.starts_with("5 req/s, 90.0% ok"));
    }

    #[test]
    fn empty_run_is_not_a_failure() {
        let result = TestResult::from_counts("support", 0, 0, 0.0, Vec::new());
        assert_eq!(result.success_rate, 100.0);
        assert_eq!(result.throughput, 0.0);
    }

    #[test]
    fn json_field_names() {
        let result = TestResult::from_counts("pressure", 1, 0, 1.0, Vec::new());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["test"], "pressure");
        assert!(json.get("durationSecs").is_some());
        assert!(json.get("successRate").is_some());
        assert!(json.get("wsEvents").is_some());
    }

    #[test]
    fn markdown_lists_ws_events() {
        let events = vec![EventSummary {
            name: "ws_connect".to_string(),
            count: 3,
            failures: 0,
            p50: 1.0,
            p95: 2.0,
            p99: 3.0,
            last_error: None,
        }];
        let result = TestResult::from_counts("support", 10, 0, 10.0, events);
        let section = result.markdown(5);
        assert!(section.contains("**Users**: 5"));
        assert!(section.contains("| ws_connect | 3 | 0 | 1.00ms | 3.00ms |"));
    }

    #[test]
    fn failures_carry_the_body() {
        let tracker = crate::tracker::EventTracker::new();
        tracker.failure("ai_send_msg", 12.0, "500 db | pool\nexhausted");
        tracker.failure("ai_send_msg", 14.0, &format!("502 {}", "x".repeat(200)));

        let result = TestResult::from_counts("support", 8, 2, 10.0, Vec::new())
            .with_failures(tracker.summaries());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["failures"][0]["name"], "ai_send_msg");
        assert!(json["failures"][0]["lastError"].as_str().unwrap().starts_with("502 xxx"));

        let section = result.markdown(1);
        assert!(section.contains("| Request | Failed | Last error |"));
        let row = section
            .lines()
            .find(|line| line.starts_with("| ai_send_msg | 2 |"))
            .unwrap();
        assert!(row.ends_with("... |"));
        assert!(row.len() < 140);
    }

    #[test]
    fn markdown_cells_stay_on_one_line() {
        assert_eq!(markdown_cell("500 db | pool\nexhausted"), "500 db \\| pool exhausted");
    }

    #[test]
    fn no_failures_no_table() {
        let result = TestResult::from_counts("support", 1, 0, 1.0, Vec::new());
        assert!(!result.markdown(1).contains("Last error"));
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("failures").is_none());
    }

    #[test]
    fn sections_are_replaced_in_place() {
        let doc = "# Title\n\n## A\nold a\n## B\nold b\n";
        assert_eq!(
            replace_section(doc, "A", "new a\n"),
            "# Title\n\n## A\nnew a\n\n## B\nold b\n"
        );
        assert_eq!(
            replace_section(doc, "B", "new b\n"),
            "# Title\n\n## A\nold a\n## B\nnew b\n"
        );
        assert_eq!(
            replace_section(doc, "C", "c\n"),
            "# Title\n\n## A\nold a\n## B\nold b\n## C\nc\n"
        );
    }
}
