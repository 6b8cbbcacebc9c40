//! Metrics for the authorization service
//!
//! Process-wide counters of authorization outcomes, exported in Prometheus text
//! format at `/metrics`. Counters live outside the decision path: the gate and
//! loader never read them.

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

pub const REQUESTS_TOTAL: &str = "authz.requests.total";
pub const UNAUTHENTICATED_TOTAL: &str = "authz.unauthenticated.total";
pub const DENIED_TOTAL: &str = "authz.denied.total";

/// Global metrics registry
pub struct MetricsRegistry {
    /// Counter metrics, sorted by name for stable export
    counters: RwLock<BTreeMap<String, Arc<AtomicU64>>>,

    /// Service start time
    start_time: Instant,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(BTreeMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Increment a counter
    pub async fn inc_counter(&self, name: &str) {
        self.add_counter(name, 1).await;
    }

    /// Add to a counter
    pub async fn add_counter(&self, name: &str, value: u64) {
        let counters = self.counters.read().await;
        if let Some(counter) = counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
            return;
        }
        drop(counters);

        let mut counters = self.counters.write().await;
        let counter = counters
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)));
        counter.fetch_add(value, Ordering::Relaxed);
    }

    /// Get a counter value
    pub async fn get_counter(&self, name: &str) -> u64 {
        let counters = self.counters.read().await;
        counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus format
    pub async fn to_prometheus(&self) -> String {
        let counters = self.counters.read().await;

        let mut output = String::new();

        output.push_str("# HELP authz_uptime_seconds Time since service start\n");
        output.push_str("# TYPE authz_uptime_seconds gauge\n");
        output.push_str(&format!("authz_uptime_seconds {}\n\n", self.uptime_seconds()));

        for (name, counter) in counters.iter() {
            let prometheus_name = name.replace(['.', '-'], "_");
            output.push_str(&format!("# TYPE {} counter\n", prometheus_name));
            output.push_str(&format!(
                "{} {}\n",
                prometheus_name,
                counter.load(Ordering::Relaxed)
            ));
        }

        output
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Count requests and the 401/403 rejections produced by the auth layers.
pub async fn track_auth_outcomes(
    State(metrics): State<Arc<MetricsRegistry>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    metrics.inc_counter(REQUESTS_TOTAL).await;
    match response.status() {
        StatusCode::UNAUTHORIZED => metrics.inc_counter(UNAUTHENTICATED_TOTAL).await,
        StatusCode::FORBIDDEN => metrics.inc_counter(DENIED_TOTAL).await,
        _ => {}
    }

    response
}
