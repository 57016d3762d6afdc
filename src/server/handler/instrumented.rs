use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use serde::Serialize;

use crate::{
    server::handler::{BoxedHandler, Handler, HandlerFuture},
    Request,
};

/// Request counters shared by the instrumentation layer and the admin endpoint.
///
/// All counters are atomics updated without locks.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    requests: AtomicU64,
    active: AtomicU64,
    informational: AtomicU64,
    successful: AtomicU64,
    redirection: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    failures: AtomicU64,
    total_time_ns: AtomicU64,
}

/// Point-in-time copy of [`RequestMetrics`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub active: u64,
    #[serde(rename = "1xx-responses")]
    pub informational: u64,
    #[serde(rename = "2xx-responses")]
    pub successful: u64,
    #[serde(rename = "3xx-responses")]
    pub redirection: u64,
    #[serde(rename = "4xx-responses")]
    pub client_errors: u64,
    #[serde(rename = "5xx-responses")]
    pub server_errors: u64,
    /// Requests whose handler returned an error instead of a response
    pub failures: u64,
    pub mean_time_ms: f64,
}

impl RequestMetrics {
    pub fn new() -> RequestMetrics {
        RequestMetrics::default()
    }

    fn started(&self) {
        self.requests
            .fetch_add(1, Ordering::Relaxed);
        self.active
            .fetch_add(1, Ordering::Relaxed);
    }

    fn finished(&self, status: Option<u16>, elapsed: Duration) {
        self.active
            .fetch_sub(1, Ordering::Relaxed);
        self.total_time_ns
            .fetch_add(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX), Ordering::Relaxed);

        let counter = match status {
            Some(100..=199) => &self.informational,
            Some(200..=299) => &self.successful,
            Some(300..=399) => &self.redirection,
            Some(400..=499) => &self.client_errors,
            Some(_) => &self.server_errors,
            None => &self.failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self
            .requests
            .load(Ordering::Relaxed);
        let active = self
            .active
            .load(Ordering::Relaxed);
        let completed = requests.saturating_sub(active);
        let total_time_ns = self
            .total_time_ns
            .load(Ordering::Relaxed);
        let mean_time_ms = if completed == 0 {
            0.0
        } else {
            total_time_ns as f64 / completed as f64 / 1_000_000.0
        };

        MetricsSnapshot {
            requests,
            active,
            informational: self
                .informational
                .load(Ordering::Relaxed),
            successful: self
                .successful
                .load(Ordering::Relaxed),
            redirection: self
                .redirection
                .load(Ordering::Relaxed),
            client_errors: self
                .client_errors
                .load(Ordering::Relaxed),
            server_errors: self
                .server_errors
                .load(Ordering::Relaxed),
            failures: self
                .failures
                .load(Ordering::Relaxed),
            mean_time_ms,
        }
    }
}

/// Records counts, timings and status classes around an inner handler without
/// altering the exchange.
pub struct InstrumentedHandler {
    inner: BoxedHandler,
    metrics: Arc<RequestMetrics>,
}

impl InstrumentedHandler {
    pub fn new(inner: BoxedHandler, metrics: Arc<RequestMetrics>) -> InstrumentedHandler {
        InstrumentedHandler { inner, metrics }
    }

    pub fn metrics(&self) -> &Arc<RequestMetrics> {
        &self.metrics
    }
}

impl Handler for InstrumentedHandler {
    fn handle(&self, request: Request) -> HandlerFuture<'_> {
        Box::pin(async move {
            let started = Instant::now();
            self.metrics
                .started();

            let result = self
                .inner
                .handle(request)
                .await;

            let status = result
                .as_ref()
                .ok()
                .map(|response| {
                    response
                        .status()
                        .as_u16()
                });
            self.metrics
                .finished(status, started.elapsed());

            result
        })
    }
}
