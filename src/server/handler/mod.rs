//! Handler chains.
//!
//! A [`HandlerChain`] is a dispatch context wrapped by zero or more layers and bound
//! to one or more listeners at a context path. [`HandlerChainBuilder`] composes the
//! application chain, the admin chain and the request log.
//!
//! # Examples
//!
//! ```rust,ignore
//! use dockyard::server::handler::{handler_fn, text_response};
//! use http::StatusCode;
//!
//! let hello = handler_fn(|_request| async move {
//!     Ok(text_response(StatusCode::OK, "text/plain", "Hello, world!"))
//! });
//! env.set_application("/*", hello);
//! ```

use std::{fmt, future::Future, pin::Pin, sync::Arc};

use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use http_body_util::Full;
use log::debug;

use crate::{
    config::{GzipConfig, RequestLogConfig, ServerConfig},
    errors::{ConfigError, DockyardError},
    health::HealthCheckRegistry,
    server::{
        environment::Environment,
        plan::{ListenerPlan, Mount},
    },
    Request, Response,
};

pub mod admin;
#[cfg(feature = "auth")]
pub mod auth;
pub mod context;
#[cfg(feature = "gzip")]
pub mod gzip;
pub mod instrumented;
pub mod request_log;

use admin::AdminHandler;
use instrumented::{InstrumentedHandler, RequestMetrics};
use request_log::RequestLogHandler;

pub const APPLICATION_CHAIN: &str = "application";
pub const ADMIN_CHAIN: &str = "admin";

/// Realm announced by the admin Basic auth gate.
pub const ADMIN_REALM: &str = "admin";
/// Role granted to the admin credential pair.
pub const ADMIN_ROLE: &str = "user";

pub type HandlerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Response, DockyardError>> + Send + 'a>>;

/// Anything that turns a request into a response.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: Request) -> HandlerFuture<'_>;
}

pub type BoxedHandler = Arc<dyn Handler>;

struct FnHandler<F> {
    f: F,
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, DockyardError>> + Send + 'static,
{
    fn handle(&self, request: Request) -> HandlerFuture<'_> {
        Box::pin((self.f)(request))
    }
}

/// Wraps an async closure as a [`BoxedHandler`].
///
/// # Examples
///
/// ```rust,ignore
/// let handler = handler_fn(|request: Request| async move {
///     Ok(text_response(StatusCode::OK, "text/plain", request.uri().path().to_string()))
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> BoxedHandler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, DockyardError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}

/// Builds a response with a fixed content type.
pub fn text_response(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Error page without any server branding: status code and reason phrase only.
pub fn error_response(status: StatusCode) -> Response {
    let body = format!(
        "{} {}",
        status.as_u16(),
        status
            .canonical_reason()
            .unwrap_or("Unknown")
    );
    text_response(status, "text/plain; charset=utf-8", body)
}

/// Layer applied around a dispatch context, listed outermost first in a chain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Layer {
    /// Bi-directional gzip
    Gzip,
    /// Request counters and timings
    Instrumentation,
    /// Basic auth gate
    BasicAuth { realm: String },
    /// Per-request tag attached before dispatch
    RequestTagging,
    /// Path-mounted dispatch context
    Dispatch { context: String },
}

/// A composed handler bound to listeners at a context path.
pub struct HandlerChain {
    name: String,
    listeners: Vec<String>,
    context_path: String,
    layers: Vec<Layer>,
    handler: BoxedHandler,
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("name", &self.name)
            .field("listeners", &self.listeners)
            .field("context_path", &self.context_path)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

impl HandlerChain {
    fn new(name: &str, mount: &Mount, layers: Vec<Layer>, handler: BoxedHandler) -> HandlerChain {
        HandlerChain {
            name: name.to_string(),
            listeners: mount
                .listeners()
                .iter()
                .map(|listener| listener.to_string())
                .collect(),
            context_path: mount
                .context_path()
                .to_string(),
            layers,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the listeners this chain is reachable through.
    pub fn listeners(&self) -> &[String] {
        &self.listeners
    }

    pub fn is_bound_to(&self, listener: &str) -> bool {
        self.listeners
            .iter()
            .any(|name| name == listener)
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn has_layer(&self, layer: &Layer) -> bool {
        self.layers
            .contains(layer)
    }

    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    /// Whether `path` falls under this chain's context path.
    pub fn matches(&self, path: &str) -> bool {
        context_matches(&self.context_path, path)
    }
}

pub(crate) fn context_matches(context_path: &str, path: &str) -> bool {
    if context_path == "/" {
        return true;
    }
    match path.strip_prefix(context_path) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Request logger bound to every listener.
#[derive(Debug)]
pub struct RequestLogChain {
    listeners: Vec<String>,
    handler: RequestLogHandler,
}

impl RequestLogChain {
    pub fn listeners(&self) -> &[String] {
        &self.listeners
    }

    pub fn handler(&self) -> &RequestLogHandler {
        &self.handler
    }
}

/// The single admin credential pair; an absent half is the empty string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(username: &str, password: &str) -> AdminCredentials {
        AdminCredentials { username: username.to_string(), password: password.to_string() }
    }

    /// Returns the credentials when a username or a password is configured.
    pub fn from_config(config: &ServerConfig) -> Option<AdminCredentials> {
        let username = config
            .admin_username()
            .filter(|username| !username.is_empty());
        let password = config
            .admin_password()
            .filter(|password| !password.is_empty());

        if username.is_none() && password.is_none() {
            return None;
        }

        Some(AdminCredentials::new(username.unwrap_or_default(), password.unwrap_or_default()))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Composes the chains of one server.
pub struct HandlerChainBuilder<'a> {
    plan: &'a ListenerPlan,
    registry: Arc<HealthCheckRegistry>,
    metrics: Arc<RequestMetrics>,
}

impl<'a> HandlerChainBuilder<'a> {
    pub fn new(
        plan: &'a ListenerPlan,
        registry: Arc<HealthCheckRegistry>,
        metrics: Arc<RequestMetrics>,
    ) -> HandlerChainBuilder<'a> {
        HandlerChainBuilder { plan, registry, metrics }
    }

    /// Builds the application chain from the environment's servlet context.
    ///
    /// Layers, outermost first: gzip (when enabled), instrumentation, request tagging.
    pub fn build_external(&self, env: &mut Environment, gzip: &GzipConfig) -> HandlerChain {
        let mut context = env.take_servlet_context();
        context.enable_request_tagging();
        if let Some(application) = env.take_application() {
            context.add_handler(application.url_pattern(), application.handler());
        }

        let mut layers = vec![Layer::Instrumentation, Layer::RequestTagging, context.layer()];
        let mut handler: BoxedHandler = Arc::new(InstrumentedHandler::new(
            Arc::new(context),
            self.metrics
                .clone(),
        ));

        if gzip.enabled() {
            cfg_if::cfg_if! {
                if #[cfg(feature = "gzip")] {
                    handler = Arc::new(gzip::GzipHandler::new(handler, gzip.clone()));
                    layers.insert(0, Layer::Gzip);
                } else {
                    log::warn!("gzip is enabled in the configuration but dockyard was built without the gzip feature");
                }
            }
        }

        let chain = HandlerChain::new(APPLICATION_CHAIN, self.plan.application(), layers, handler);
        debug!("Composed {:?}", chain);
        chain
    }

    /// Builds the admin chain from the environment's admin context.
    ///
    /// # Errors
    ///
    /// Fails when credentials are supplied but Basic auth support is not compiled in.
    pub fn build_admin(
        &self,
        env: &mut Environment,
        credentials: Option<&AdminCredentials>,
    ) -> Result<HandlerChain, ConfigError> {
        let mut context = env.take_admin_context();
        context.add_handler(
            "/*",
            Arc::new(AdminHandler::new(
                env.name(),
                self.registry
                    .clone(),
                self.metrics
                    .clone(),
            )),
        );

        let mut layers = vec![context.layer()];
        let mut handler: BoxedHandler = Arc::new(context);

        if let Some(credentials) = credentials {
            cfg_if::cfg_if! {
                if #[cfg(feature = "auth")] {
                    handler = Arc::new(auth::BasicAuthHandler::new(
                        handler,
                        credentials.clone(),
                        ADMIN_REALM,
                    ));
                    layers.insert(0, Layer::BasicAuth { realm: ADMIN_REALM.to_string() });
                } else {
                    return Err(ConfigError::Unsupported(format!(
                        "admin credentials for {} require the auth feature",
                        credentials.username()
                    )));
                }
            }
        }

        let chain = HandlerChain::new(ADMIN_CHAIN, self.plan.admin(), layers, handler);
        debug!("Composed {:?}", chain);
        Ok(chain)
    }

    /// Builds the request logger when enabled, bound to every planned listener.
    ///
    /// # Errors
    ///
    /// Fails when the configured time zone cannot be parsed.
    pub fn build_request_log(
        &self,
        config: &RequestLogConfig,
        name: &str,
    ) -> Result<Option<RequestLogChain>, ConfigError> {
        if !config.enabled() {
            return Ok(None);
        }

        let handler = RequestLogHandler::new(config, name)?;
        let listeners = self
            .plan
            .names()
            .into_iter()
            .map(str::to_string)
            .collect();
        debug!("Request log for {} written to target {}", name, handler.target());

        Ok(Some(RequestLogChain { listeners, handler }))
    }
}
