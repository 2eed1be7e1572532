//! Counters for events goose does not report in detail.
//!
//! goose only measures HTTP requests, so socket.io connects, heartbeats and
//! their failures are tallied here. Failed HTTP requests are tallied too, so
//! the run summary can show the response body goose leaves out.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use std::time::Instant;

#[derive(Debug, Default)]
struct EventLog {
    /// Latencies in milliseconds.
    latencies: Vec<f64>,
    failures: usize,
    last_error: Option<String>,
}

/// Aggregated view of one event name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSummary {
    pub name: String,
    pub count: usize,
    pub failures: usize,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    #[serde(rename = "lastError", skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Thread-safe event tally keyed by event name.
#[derive(Debug, Default)]
pub struct EventTracker {
    events: Mutex<HashMap<String, EventLog>>,
}

impl EventTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, name: &str, latency_ms: f64) {
        if let Ok(mut map) = self.events.lock() {
            map.entry(name.to_string())
                .or_default()
                .latencies
                .push(latency_ms);
        }
    }

    pub fn failure(&self, name: &str, latency_ms: f64, error: &str) {
        if let Ok(mut map) = self.events.lock() {
            let log = map.entry(name.to_string()).or_default();
            log.latencies.push(latency_ms);
            log.failures += 1;
            log.last_error = Some(error.to_string());
        }
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .map(|map| map.get(name).map(|log| log.latencies.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn failures(&self, name: &str) -> usize {
        self.events
            .lock()
            .map(|map| map.get(name).map(|log| log.failures).unwrap_or(0))
            .unwrap_or(0)
    }

    /// One summary per event name, sorted by name.
    pub fn summaries(&self) -> Vec<EventSummary> {
        let Ok(map) = self.events.lock() else {
            return Vec::new();
        };
        let mut summaries: Vec<EventSummary> = map
            .iter()
            .map(|(name, log)| {
                let (p50, p95, p99) = percentiles(&log.latencies);
                EventSummary {
                    name: name.clone(),
                    count: log.latencies.len(),
                    failures: log.failures,
                    p50,
                    p95,
                    p99,
                    last_error: log.last_error.clone(),
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    pub fn clear(&self) {
        if let Ok(mut map) = self.events.lock() {
            map.clear();
        }
    }
}

/// (p50, p95, p99) of `samples`; zeros when empty.
pub fn percentiles(samples: &[f64]) -> (f64, f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let len = sorted.len();
    let at = |q: f64| sorted[((len as f64 * q) as usize).min(len - 1)];
    (at(0.50), at(0.95), at(0.99))
}

/// Process-wide tracker for socket.io events.
pub static WS_EVENTS: LazyLock<EventTracker> = LazyLock::new(EventTracker::new);

/// Process-wide tracker for reported HTTP failures, keyed by request name.
/// `last_error` holds the status and response body.
pub static HTTP_FAILURES: LazyLock<EventTracker> = LazyLock::new(EventTracker::new);

/// Times an event and records it on [`WS_EVENTS`].
pub struct EventTimer {
    name: &'static str,
    start: Instant,
}

impl EventTimer {
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn succeed(self) {
        WS_EVENTS.success(self.name, self.elapsed_ms());
    }

    /// Record under `name` instead of the timer's own name.
    pub fn fail_as(self, name: &str, error: &str) {
        WS_EVENTS.failure(name, self.elapsed_ms(), error);
    }
}
