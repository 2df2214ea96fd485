use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe counters for the execution layer.
#[derive(Debug)]
pub struct ExecutionMetrics {
    // Counters
    orders_placed: AtomicU64,
    cancels: AtomicU64,
    amend_failures: AtomicU64,
    noop_closes: AtomicU64,
    discarded_executions: AtomicU64,
    ref_price_refreshes: AtomicU64,

    // Timestamps
    inner: RwLock<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    start_time: Instant,
    last_order_time: Option<Instant>,
    last_failure_time: Option<Instant>,
    last_refresh_time: Option<Instant>,
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            orders_placed: AtomicU64::new(0),
            cancels: AtomicU64::new(0),
            amend_failures: AtomicU64::new(0),
            noop_closes: AtomicU64::new(0),
            discarded_executions: AtomicU64::new(0),
            ref_price_refreshes: AtomicU64::new(0),
            inner: RwLock::new(MetricsInner {
                start_time: Instant::now(),
                last_order_time: None,
                last_failure_time: None,
                last_refresh_time: None,
            }),
        }
    }

    // --- Increment methods ---

    pub fn inc_orders_placed(&self) {
        self.orders_placed.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_order_time = Some(Instant::now());
    }

    /// Count `n` cancelled orders.
    pub fn add_cancels(&self, n: u64) {
        self.cancels.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_amend_failures(&self) {
        self.amend_failures.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_failure_time = Some(Instant::now());
    }

    pub fn inc_noop_closes(&self) {
        self.noop_closes.fetch_add(1, Ordering::Relaxed);
    }

    /// Count `n` execution records dropped during reconciliation.
    pub fn add_discarded_executions(&self, n: u64) {
        self.discarded_executions.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_ref_price_refreshes(&self) {
        self.ref_price_refreshes.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_refresh_time = Some(Instant::now());
    }

    // --- Getter methods ---

    pub fn orders_placed(&self) -> u64 {
        self.orders_placed.load(Ordering::Relaxed)
    }

    pub fn cancels(&self) -> u64 {
        self.cancels.load(Ordering::Relaxed)
    }

    pub fn amend_failures(&self) -> u64 {
        self.amend_failures.load(Ordering::Relaxed)
    }

    pub fn noop_closes(&self) -> u64 {
        self.noop_closes.load(Ordering::Relaxed)
    }

    pub fn discarded_executions(&self) -> u64 {
        self.discarded_executions.load(Ordering::Relaxed)
    }

    pub fn ref_price_refreshes(&self) -> u64 {
        self.ref_price_refreshes.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.inner.read().start_time.elapsed().as_secs_f64()
    }

    pub fn secs_since_last_order(&self) -> Option<f64> {
        self.inner
            .read()
            .last_order_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    pub fn secs_since_last_failure(&self) -> Option<f64> {
        self.inner
            .read()
            .last_failure_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    pub fn secs_since_last_refresh(&self) -> Option<f64> {
        self.inner
            .read()
            .last_refresh_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    /// Generate a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            orders_placed: self.orders_placed(),
            cancels: self.cancels(),
            amend_failures: self.amend_failures(),
            noop_closes: self.noop_closes(),
            discarded_executions: self.discarded_executions(),
            ref_price_refreshes: self.ref_price_refreshes(),
            uptime_secs: self.uptime_secs(),
            secs_since_last_order: self.secs_since_last_order(),
            secs_since_last_failure: self.secs_since_last_failure(),
            secs_since_last_refresh: self.secs_since_last_refresh(),
        }
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub orders_placed: u64,
    pub cancels: u64,
    pub amend_failures: u64,
    pub noop_closes: u64,
    pub discarded_executions: u64,
    pub ref_price_refreshes: u64,
    pub uptime_secs: f64,
    pub secs_since_last_order: Option<f64>,
    pub secs_since_last_failure: Option<f64>,
    pub secs_since_last_refresh: Option<f64>,
}

impl MetricsSnapshot {
    /// True when reconciliation had to drop execution data or an amend failed.
    pub fn needs_attention(&self) -> bool {
        self.discarded_executions > 0 || self.amend_failures > 0
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Execution Metrics ===")?;
        writeln!(f, "Uptime:               {:.1}s", self.uptime_secs)?;
        writeln!(f, "Orders placed:        {}", self.orders_placed)?;
        writeln!(f, "Orders cancelled:     {}", self.cancels)?;
        writeln!(f, "Amend failures:       {}", self.amend_failures)?;
        writeln!(f, "No-op closes:         {}", self.noop_closes)?;
        writeln!(f, "Discarded executions: {}", self.discarded_executions)?;
        writeln!(f, "Ref price refreshes:  {}", self.ref_price_refreshes)?;
        if let Some(secs) = self.secs_since_last_order {
            writeln!(f, "Since last order:     {:.1}s", secs)?;
        }
        if let Some(secs) = self.secs_since_last_failure {
            writeln!(f, "Since last failure:   {:.1}s", secs)?;
        }
        if let Some(secs) = self.secs_since_last_refresh {
            writeln!(f, "Since last refresh:   {:.1}s", secs)?;
        }
        Ok(())
    }
}

/// Shared handle to metrics.
pub type SharedMetrics = Arc<ExecutionMetrics>;

pub fn create_metrics() -> SharedMetrics {
    Arc::new(ExecutionMetrics::new())
}
