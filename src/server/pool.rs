use std::time::Duration;

/// Name of the server's main request pool.
pub const SERVER_POOL_NAME: &str = "dw";

/// Thread pool descriptor handed to the runtime.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ThreadPool {
    name: String,
    min_threads: usize,
    max_threads: usize,
    instrumented: bool,
}

impl ThreadPool {
    /// Instrumented, elastic pool.
    pub fn instrumented(name: &str, min_threads: usize, max_threads: usize) -> ThreadPool {
        ThreadPool { name: name.to_string(), min_threads, max_threads, instrumented: true }
    }

    /// Plain pool with a constant number of threads.
    pub fn fixed(name: &str, threads: usize) -> ThreadPool {
        ThreadPool { name: name.to_string(), min_threads: threads, max_threads: threads, instrumented: false }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_threads(&self) -> usize {
        self.min_threads
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    pub fn is_instrumented(&self) -> bool {
        self.instrumented
    }
}

/// How the runtime stops the server.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ShutdownPolicy {
    graceful_timeout: Duration,
    stop_at_shutdown: bool,
}

impl ShutdownPolicy {
    pub fn new(graceful_timeout: Duration) -> ShutdownPolicy {
        ShutdownPolicy { graceful_timeout, stop_at_shutdown: true }
    }

    /// Time in-flight requests get to complete once shutdown starts.
    pub fn graceful_timeout(&self) -> Duration {
        self.graceful_timeout
    }

    /// Whether the server stops when the process receives a shutdown signal.
    pub fn stop_at_shutdown(&self) -> bool {
        self.stop_at_shutdown
    }
}
