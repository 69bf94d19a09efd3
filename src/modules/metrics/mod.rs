//! Send statistics.
//!
//! Aggregates global and per-target (session alias, or host for direct calls)
//! counters with a sliding latency window for average and p95.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const DEFAULT_WINDOW: usize = 128;
const MIN_WINDOW: usize = 16;

#[derive(Debug, Clone)]
pub struct GlobalStats {
    pub started_at: DateTime<Utc>,
    pub total_requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub average_latency: Option<Duration>,
    pub p95_latency: Option<Duration>,
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            total_requests: 0,
            successes: 0,
            failures: 0,
            average_latency: None,
            p95_latency: None,
        }
    }
}

/// Per-target snapshot.
#[derive(Debug, Clone)]
pub struct TargetStats {
    pub target: String,
    pub total_requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub average_latency: Option<Duration>,
    pub p95_latency: Option<Duration>,
    pub consecutive_failures: u32,
    /// `None` until a response arrives, and after a transport failure.
    pub last_status: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub global: GlobalStats,
    pub targets: Vec<TargetStats>,
}

impl MetricsSnapshot {
    pub fn target(&self, target: &str) -> Option<&TargetStats> {
        self.targets.iter().find(|stats| stats.target == target)
    }
}

#[derive(Debug)]
struct LatencyWindow {
    samples: VecDeque<Duration>,
    max: usize,
}

impl LatencyWindow {
    fn new(max: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max),
            max,
        }
    }

    fn push(&mut self, latency: Duration) {
        if self.samples.len() == self.max {
            self.samples.pop_front();
        }
        self.samples.push_back(latency);
    }

    fn stats(&self) -> (Option<Duration>, Option<Duration>) {
        if self.samples.is_empty() {
            return (None, None);
        }
        let mut sorted: Vec<_> = self.samples.iter().copied().collect();
        sorted.sort_unstable();
        let avg = sorted.iter().map(Duration::as_secs_f64).sum::<f64>() / sorted.len() as f64;
        let p95_index = ((sorted.len() as f64 * 0.95).ceil() as usize).saturating_sub(1);
        (Some(Duration::from_secs_f64(avg)), Some(sorted[p95_index]))
    }
}

#[derive(Debug)]
struct TargetAccumulator {
    total_requests: u64,
    successes: u64,
    failures: u64,
    latencies: LatencyWindow,
    consecutive_failures: u32,
    last_status: Option<u16>,
}

impl TargetAccumulator {
    fn new(window: usize) -> Self {
        Self {
            total_requests: 0,
            successes: 0,
            failures: 0,
            latencies: LatencyWindow::new(window),
            consecutive_failures: 0,
            last_status: None,
        }
    }

    fn record(&mut self, status: Option<u16>, latency: Option<Duration>) {
        self.total_requests += 1;
        self.last_status = status;
        if status.is_some_and(|code| code < 400) {
            self.successes += 1;
            self.consecutive_failures = 0;
        } else {
            self.failures += 1;
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }
        if let Some(latency) = latency {
            self.latencies.push(latency);
        }
    }

    fn snapshot(&self, target: &str) -> TargetStats {
        let (average_latency, p95_latency) = self.latencies.stats();
        TargetStats {
            target: target.to_string(),
            total_requests: self.total_requests,
            successes: self.successes,
            failures: self.failures,
            average_latency,
            p95_latency,
            consecutive_failures: self.consecutive_failures,
            last_status: self.last_status,
        }
    }
}

#[derive(Debug)]
struct MetricsState {
    global: GlobalStats,
    global_latencies: LatencyWindow,
    window: usize,
    targets: HashMap<String, TargetAccumulator>,
}

impl MetricsState {
    fn new(window: usize) -> Self {
        Self {
            global: GlobalStats::default(),
            global_latencies: LatencyWindow::new(window),
            window,
            targets: HashMap::new(),
        }
    }

    fn record(&mut self, target: &str, status: Option<u16>, latency: Option<Duration>) {
        self.global.total_requests += 1;
        if status.is_some_and(|code| code < 400) {
            self.global.successes += 1;
        } else {
            self.global.failures += 1;
        }
        if let Some(latency) = latency {
            self.global_latencies.push(latency);
            let (avg, p95) = self.global_latencies.stats();
            self.global.average_latency = avg;
            self.global.p95_latency = p95;
        }

        let window = self.window;
        self.targets
            .entry(target.to_string())
            .or_insert_with(|| TargetAccumulator::new(window))
            .record(status, latency);
    }
}

/// Thread-safe collector shared between the relay and its metrics handler.
#[derive(Clone, Debug)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState::new(window.max(MIN_WINDOW)))),
        }
    }

    pub fn record_response(&self, target: &str, status: u16, latency: Duration) {
        self.lock().record(target, Some(status), Some(latency));
    }

    /// A send that produced no response at all.
    pub fn record_error(&self, target: &str) {
        self.lock().record(target, None, None);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let guard = self.lock();
        let mut targets: Vec<_> = guard
            .targets
            .iter()
            .map(|(target, acc)| acc.snapshot(target))
            .collect();
        targets.sort_by(|a, b| a.target.cmp(&b.target));
        MetricsSnapshot {
            global: guard.global.clone(),
            targets,
        }
    }

    pub fn reset(&self) {
        let mut guard = self.lock();
        let window = guard.window;
        *guard = MetricsState::new(window);
    }

    fn lock(&self) -> MutexGuard<'_, MetricsState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
