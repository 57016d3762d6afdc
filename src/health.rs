//! Health checks.
//!
//! A [`HealthCheckRegistry`] is shared between the assembler, which registers checks
//! once, and the admin handler, which runs them on every `/healthcheck` request.

use std::{
    collections::BTreeMap,
    panic::{self, AssertUnwindSafe},
    sync::{mpsc, Arc, Mutex, MutexGuard},
    thread,
    time::Duration,
};

use log::warn;
use serde::Serialize;

/// Outcome of a single health check.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct HealthResult {
    healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl HealthResult {
    pub fn healthy() -> HealthResult {
        HealthResult { healthy: true, message: None }
    }

    pub fn healthy_with(message: &str) -> HealthResult {
        HealthResult { healthy: true, message: Some(message.to_string()) }
    }

    pub fn unhealthy(message: &str) -> HealthResult {
        HealthResult { healthy: false, message: Some(message.to_string()) }
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
    }
}

pub trait HealthCheck: Send + Sync + 'static {
    /// Unique name the result is reported under.
    fn name(&self) -> &str;

    fn check(&self) -> HealthResult;
}

/// Append-only set of named health checks.
#[derive(Default)]
pub struct HealthCheckRegistry {
    checks: Mutex<BTreeMap<String, Arc<dyn HealthCheck>>>,
}

impl HealthCheckRegistry {
    pub fn new() -> HealthCheckRegistry {
        HealthCheckRegistry::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Arc<dyn HealthCheck>>> {
        self.checks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers `check`, replacing any check already registered under its name.
    pub fn register(&self, check: Box<dyn HealthCheck>) {
        let name = check
            .name()
            .to_string();
        if self
            .lock()
            .insert(name.clone(), Arc::from(check))
            .is_some()
        {
            warn!("Health check {} registered twice, keeping the latest", name);
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.lock()
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock()
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every check; a panicking check is reported as unhealthy.
    ///
    /// Checks run on the calling thread without the registry lock held. This call
    /// blocks; the built-in [`ThreadLivenessCheck`] alone may take up to its timeout.
    pub fn run_all(&self) -> BTreeMap<String, HealthResult> {
        let checks: Vec<(String, Arc<dyn HealthCheck>)> = self
            .lock()
            .iter()
            .map(|(name, check)| (name.clone(), check.clone()))
            .collect();

        checks
            .into_iter()
            .map(|(name, check)| {
                let result = panic::catch_unwind(AssertUnwindSafe(|| check.check()))
                    .unwrap_or_else(|_| HealthResult::unhealthy("health check panicked"));
                (name, result)
            })
            .collect()
    }
}

/// Name the built-in liveness check reports under.
pub const LIVENESS_CHECK_NAME: &str = "deadlocks";

/// Built-in thread liveness check: a freshly spawned thread must answer within the
/// timeout.
///
/// It does not inspect lock ownership, so it cannot name deadlocked threads. It fails
/// when the process can no longer spawn threads or its scheduler is too starved for a
/// new thread to run. Results are reported under [`LIVENESS_CHECK_NAME`], the key admin
/// consumers already poll.
pub struct ThreadLivenessCheck {
    timeout: Duration,
}

impl Default for ThreadLivenessCheck {
    fn default() -> Self {
        ThreadLivenessCheck { timeout: Duration::from_secs(1) }
    }
}

impl ThreadLivenessCheck {
    pub fn new() -> ThreadLivenessCheck {
        ThreadLivenessCheck::default()
    }

    pub fn with_timeout(timeout: Duration) -> ThreadLivenessCheck {
        ThreadLivenessCheck { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl HealthCheck for ThreadLivenessCheck {
    fn name(&self) -> &str {
        LIVENESS_CHECK_NAME
    }

    fn check(&self) -> HealthResult {
        let (sender, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("liveness-check".to_string())
            .spawn(move || {
                let _ = sender.send(());
            });

        if let Err(e) = spawned {
            return HealthResult::unhealthy(&format!("unable to spawn a thread: {}", e));
        }

        match receiver.recv_timeout(self.timeout) {
            Ok(()) => HealthResult::healthy(),
            Err(_) => HealthResult::unhealthy(&format!(
                "spawned thread did not answer within {:?}",
                self.timeout
            )),
        }
    }
}
