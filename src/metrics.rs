//! Process-wide metrics sink.
//!
//! Created once at startup and shared by handle. Request paths only write to it;
//! the `/q/metrics` endpoint is the single reader.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct TimerState {
    count: u64,
    total: Duration,
    max: Duration,
}

#[derive(Debug, Default)]
pub struct Timer {
    state: Mutex<TimerState>,
}

impl Timer {
    pub fn record(&self, elapsed: Duration) {
        let mut state = lock(&self.state);
        state.count += 1;
        state.total += elapsed;
        state.max = state.max.max(elapsed);
    }

    pub fn count(&self) -> u64 {
        lock(&self.state).count
    }

    pub fn total(&self) -> Duration {
        lock(&self.state).total
    }

    pub fn max(&self) -> Duration {
        lock(&self.state).max
    }

    fn snapshot(&self) -> TimerState {
        *lock(&self.state)
    }
}

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: Mutex<BTreeMap<String, Arc<Counter>>>,
    timers: Mutex<BTreeMap<String, Arc<Timer>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the counter registered under `name`, creating it on first use.
    pub fn counter(&self, name: &str) -> Arc<Counter> {
        lock(&self.counters)
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Returns the timer registered under `name`, creating it on first use.
    pub fn timer(&self, name: &str) -> Arc<Timer> {
        lock(&self.timers)
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Renders every meter in Prometheus text exposition format.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();

        for (name, counter) in lock(&self.counters).iter() {
            let base = prometheus_name(name);
            let metric = if base.ends_with("_total") {
                base
            } else {
                format!("{}_total", base)
            };
            let _ = writeln!(out, "# TYPE {} counter", metric);
            let _ = writeln!(out, "{} {}", metric, counter.get());
        }

        for (name, timer) in lock(&self.timers).iter() {
            let metric = format!("{}_seconds", prometheus_name(name));
            let state = timer.snapshot();
            let _ = writeln!(out, "# TYPE {} summary", metric);
            let _ = writeln!(out, "{}_count {}", metric, state.count);
            let _ = writeln!(out, "{}_sum {}", metric, state.total.as_secs_f64());
            let _ = writeln!(out, "# TYPE {}_max gauge", metric);
            let _ = writeln!(out, "{}_max {}", metric, state.max.as_secs_f64());
        }

        out
    }
}

fn prometheus_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
