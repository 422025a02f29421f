use std::hint::black_box;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::identity;
use crate::metrics::MetricsRegistry;

/// Upper bound on a single burn, whatever the caller asked for.
pub const MAX_BURN_SECONDS: i64 = 120;
pub const DEFAULT_BURN_SECONDS: i64 = 30;
pub const BURN_TIMER: &str = "demo.cpu.burn.duration";
pub const BURN_MESSAGE: &str = "CPU burn complete — check HPA / top pods";

/// Returns the number of processing units to saturate.
pub type ParallelismProbe = Arc<dyn Fn() -> usize + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BurnResult {
    pub burned_seconds: i64,
    pub cores_used: usize,
    pub hostname: String,
    pub message: String,
}

/// Clamps a requested duration to the ceiling. Non-positive values pass through
/// unchanged and produce a burn that ends immediately.
pub fn effective_seconds(requested: i64) -> i64 {
    requested.min(MAX_BURN_SECONDS)
}

/// Saturates every available core until a shared deadline, then reports.
#[derive(Clone)]
pub struct BurnController {
    metrics: Arc<MetricsRegistry>,
    parallelism: ParallelismProbe,
}

impl BurnController {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            metrics,
            parallelism: Arc::new(num_cpus::get),
        }
    }

    /// Replaces the core-count discovery, mostly for tests.
    pub fn with_parallelism<F>(mut self, probe: F) -> Self
    where
        F: Fn() -> usize + Send + Sync + 'static,
    {
        self.parallelism = Arc::new(probe);
        self
    }

    /// Blocks the calling thread for the effective duration.
    pub fn burn(&self, requested_seconds: i64) -> BurnResult {
        self.burn_with(requested_seconds, spawn_burner)
    }

    /// `cores_used` counts the burners that actually started, which is the
    /// probed parallelism unless the OS refused a thread.
    fn burn_with<S>(&self, requested_seconds: i64, spawn: S) -> BurnResult
    where
        S: Fn(usize, Instant) -> io::Result<JoinHandle<u64>>,
    {
        let seconds = effective_seconds(requested_seconds);
        let burn_id = Uuid::new_v4();

        let started = Instant::now();
        let deadline = started + Duration::from_secs(seconds.max(0) as u64);

        let cores = (self.parallelism)();
        info!(
            "Burn {} starting: {} threads for {} seconds (requested {})",
            burn_id, cores, seconds, requested_seconds
        );

        let mut handles = Vec::with_capacity(cores);
        for n in 0..cores {
            match spawn(n, deadline) {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!("Burn {}: failed to spawn burner {}: {}", burn_id, n, e),
            }
        }

        let launched = handles.len();
        for (n, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(iterations) => {
                    debug!("Burn {}: burner {} ran {} iterations", burn_id, n, iterations)
                }
                Err(_) => warn!("Burn {}: burner {} panicked", burn_id, n),
            }
        }

        let elapsed = started.elapsed();
        self.metrics.timer(BURN_TIMER).record(elapsed);
        info!("Burn {} finished after {:.3}s", burn_id, elapsed.as_secs_f64());

        BurnResult {
            burned_seconds: seconds,
            cores_used: launched,
            hostname: identity::resolve_hostname(),
            message: BURN_MESSAGE.to_string(),
        }
    }
}

fn spawn_burner(n: usize, deadline: Instant) -> io::Result<JoinHandle<u64>> {
    thread::Builder::new()
        .name(format!("burner-{}", n))
        .spawn(move || burn_until(deadline))
}

// Tight math loop; never sleeps or touches shared state so the thread stays runnable.
fn burn_until(deadline: Instant) -> u64 {
    let mut rng = rand::rng();
    let mut x = 0f64;
    let mut iterations = 0u64;
    while Instant::now() < deadline {
        x += (rng.random::<f64>() * 999_999.0).sqrt();
        iterations += 1;
    }
    let _ = black_box(x);
    iterations
}
