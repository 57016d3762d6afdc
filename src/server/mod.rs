//! Server assembly.
//!
//! [`ServerAssembler`] turns a [`ServerConfig`] and an [`Environment`] into an
//! [`AssembledServer`]: named listeners, handler chains bound to them, the request
//! log, the thread pool and the shutdown policy. Assembly either returns a complete
//! server or an error; nothing is left half built.
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dockyard::{
//!     config::ServerConfig,
//!     health::HealthCheckRegistry,
//!     server::{environment::Environment, ServerAssembler},
//! };
//!
//! let config = ServerConfig::from_file("dockyard.yml")?;
//! let registry = Arc::new(HealthCheckRegistry::new());
//! let server = ServerAssembler::new(registry).assemble(&config, Environment::new("orders"))?;
//!
//! for listener in server.listeners() {
//!     println!("{} -> {}", listener.name(), listener.port());
//! }
//! ```

use std::{fmt, sync::Arc, time::SystemTime};

use bytes::Bytes;
use http::{
    header::{CONTENT_LENGTH, DATE, SERVER},
    uri::PathAndQuery,
    HeaderValue, StatusCode, Uri,
};
use http_body_util::{BodyExt, Full};
use log::{error, info};

use crate::{
    config::ServerConfig,
    errors::DockyardError,
    health::{ThreadLivenessCheck, HealthCheckRegistry},
    server::{
        conn::listener::{Listener, ListenerFactory},
        environment::Environment,
        handler::{
            error_response, instrumented::RequestMetrics, request_log::RequestLogEntry,
            AdminCredentials, HandlerChain, HandlerChainBuilder, RequestLogChain,
        },
        plan::{PlannedTransport, ServerMode},
        pool::{ShutdownPolicy, ThreadPool, SERVER_POOL_NAME},
    },
    utils::date::format_date,
    Request, Response,
};

pub mod conn;
pub mod environment;
pub mod handler;
pub mod plan;
pub mod pool;
pub mod tls;

/// Value of the `Server` response header when enabled.
pub const SERVER_VERSION: &str = concat!("dockyard/", env!("CARGO_PKG_VERSION"));

/// Builds [`AssembledServer`]s against a shared health check registry.
pub struct ServerAssembler {
    registry: Arc<HealthCheckRegistry>,
}

impl ServerAssembler {
    pub fn new(registry: Arc<HealthCheckRegistry>) -> ServerAssembler {
        ServerAssembler { registry }
    }

    pub fn registry(&self) -> &Arc<HealthCheckRegistry> {
        &self.registry
    }

    /// Assembles a server for `config`.
    ///
    /// Health checks are registered only once every listener and chain was built.
    ///
    /// # Errors
    ///
    /// Returns [`DockyardError::Config`] when the topology, a listener, the TLS context
    /// or the request log cannot be built.
    pub fn assemble(
        &self,
        config: &ServerConfig,
        mut env: Environment,
    ) -> Result<AssembledServer, DockyardError> {
        let plan = plan::select_mode(config)?;

        let listeners = plan
            .listeners()
            .iter()
            .map(|planned| match planned.transport() {
                PlannedTransport::Configured(transport) => {
                    ListenerFactory::create_listener(transport, planned.port(), planned.name(), config)
                }
                PlannedTransport::Internal => Ok(ListenerFactory::create_internal_listener(config)),
            })
            .collect::<Result<Vec<Listener>, _>>()?;

        let metrics = Arc::new(RequestMetrics::new());
        let builder = HandlerChainBuilder::new(
            &plan,
            self.registry
                .clone(),
            metrics.clone(),
        );

        let credentials = AdminCredentials::from_config(config);
        let application = builder.build_external(&mut env, config.gzip());
        let admin = builder.build_admin(&mut env, credentials.as_ref())?;
        let request_log = builder.build_request_log(config.request_log(), env.name())?;

        self.registry
            .register(Box::new(ThreadLivenessCheck::new()));
        for check in env.take_health_checks() {
            self.registry
                .register(check);
        }

        let server = AssembledServer {
            mode: plan.mode(),
            listeners,
            chains: vec![application, admin],
            request_log,
            thread_pool: ThreadPool::instrumented(
                SERVER_POOL_NAME,
                config.min_threads(),
                config.max_threads(),
            ),
            shutdown: ShutdownPolicy::new(config.shutdown_grace_period()),
            date_header: config.date_header(),
            server_header: config.server_header(),
            registry: self
                .registry
                .clone(),
            metrics,
        };

        for chain in &server.chains {
            info!(
                "Chain {} at {} on {}",
                chain.name(),
                chain.context_path(),
                chain
                    .listeners()
                    .join(", ")
            );
        }

        Ok(server)
    }
}

/// A fully assembled, not yet started, server.
pub struct AssembledServer {
    mode: ServerMode,
    listeners: Vec<Listener>,
    chains: Vec<HandlerChain>,
    request_log: Option<RequestLogChain>,
    thread_pool: ThreadPool,
    shutdown: ShutdownPolicy,
    date_header: bool,
    server_header: bool,
    registry: Arc<HealthCheckRegistry>,
    metrics: Arc<RequestMetrics>,
}

impl fmt::Debug for AssembledServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssembledServer")
            .field("mode", &self.mode)
            .field("listeners", &self.listeners)
            .field("chains", &self.chains)
            .field("request_log", &self.request_log)
            .field("thread_pool", &self.thread_pool)
            .field("shutdown", &self.shutdown)
            .finish_non_exhaustive()
    }
}

impl AssembledServer {
    pub fn mode(&self) -> ServerMode {
        self.mode
    }

    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    pub fn listener(&self, name: &str) -> Option<&Listener> {
        self.listeners
            .iter()
            .find(|listener| listener.name() == name)
    }

    pub fn listener_names(&self) -> Vec<&str> {
        self.listeners
            .iter()
            .map(Listener::name)
            .collect()
    }

    pub fn chains(&self) -> &[HandlerChain] {
        &self.chains
    }

    pub fn chain(&self, name: &str) -> Option<&HandlerChain> {
        self.chains
            .iter()
            .find(|chain| chain.name() == name)
    }

    pub fn request_log(&self) -> Option<&RequestLogChain> {
        self.request_log
            .as_ref()
    }

    pub fn thread_pool(&self) -> &ThreadPool {
        &self.thread_pool
    }

    pub fn shutdown_policy(&self) -> &ShutdownPolicy {
        &self.shutdown
    }

    pub fn date_header(&self) -> bool {
        self.date_header
    }

    pub fn server_header(&self) -> bool {
        self.server_header
    }

    pub fn health_checks(&self) -> &Arc<HealthCheckRegistry> {
        &self.registry
    }

    /// Metrics recorded by the application chain.
    pub fn metrics(&self) -> &Arc<RequestMetrics> {
        &self.metrics
    }

    /// Chain serving `path` on `listener`: the bound chain with the longest matching
    /// context path.
    pub fn route(&self, listener: &str, path: &str) -> Option<&HandlerChain> {
        self.chains
            .iter()
            .filter(|chain| chain.is_bound_to(listener) && chain.matches(path))
            .max_by_key(|chain| {
                chain
                    .context_path()
                    .len()
            })
    }

    /// Serves `request` as if it arrived on `listener`.
    ///
    /// Unmatched requests get an unbranded 404 and handler failures an unbranded 500.
    pub async fn dispatch(&self, listener: &str, request: Request) -> Response {
        let entry = RequestLogEntry {
            remote: request
                .headers()
                .get("x-forwarded-for")
                .and_then(|value| {
                    value
                        .to_str()
                        .ok()
                })
                .map(str::to_string),
            user: None,
            method: request
                .method()
                .clone(),
            uri: request
                .uri()
                .clone(),
            version: request.version(),
            status: StatusCode::OK,
            length: None,
            at: SystemTime::now(),
        };

        let chain = self.route(
            listener,
            request
                .uri()
                .path(),
        );
        let response = match chain {
            Some(chain) => match self.execute(chain, request).await {
                Ok(response) => response,
                Err(e) => {
                    error!("Request to {} on {} failed: {}", entry.uri, listener, e);
                    error_response(StatusCode::INTERNAL_SERVER_ERROR)
                }
            },
            None => error_response(StatusCode::NOT_FOUND),
        };

        let (mut parts, body) = response.into_parts();
        let body = match body
            .collect()
            .await
        {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        parts
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        if self.date_header {
            if let Ok(date) = HeaderValue::from_str(&format_date(SystemTime::now())) {
                parts
                    .headers
                    .insert(DATE, date);
            }
        }
        if self.server_header {
            parts
                .headers
                .insert(SERVER, HeaderValue::from_static(SERVER_VERSION));
        }

        if let Some(request_log) = &self.request_log {
            if request_log
                .listeners()
                .iter()
                .any(|name| name == listener)
            {
                let entry = RequestLogEntry { status: parts.status, length: Some(body.len()), ..entry };
                request_log
                    .handler()
                    .log(&entry);
            }
        }

        Response::from_parts(parts, Full::new(body))
    }

    async fn execute(&self, chain: &HandlerChain, mut request: Request) -> Result<Response, DockyardError> {
        if chain.context_path() != "/" {
            let uri = strip_context(request.uri(), chain.context_path())?;
            *request.uri_mut() = uri;
        }

        chain
            .handler()
            .handle(request)
            .await
    }
}

fn strip_context(uri: &Uri, context_path: &str) -> Result<Uri, DockyardError> {
    let rest = uri
        .path()
        .strip_prefix(context_path)
        .unwrap_or_default();
    let rest = if rest.is_empty() { "/" } else { rest };
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", rest, query),
        None => rest.to_string(),
    };

    let mut parts = uri
        .clone()
        .into_parts();
    parts.path_and_query = Some(
        PathAndQuery::from_maybe_shared(Bytes::from(path_and_query))
            .map_err(|e| DockyardError::Handler(e.to_string()))?,
    );
    Uri::from_parts(parts).map_err(|e| DockyardError::Handler(e.to_string()))
}
