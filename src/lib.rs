//! # dockyard
//!
//! **Configuration-driven HTTP server assembly**
//!
//! dockyard reads a declarative [`ServerConfig`](config::ServerConfig) and assembles a
//! ready-to-run server description from it: named listeners with their transports, TLS
//! contexts and socket tuning, handler chains bound to those listeners, an admin
//! surface, a request log, the thread pool and the shutdown policy.
//!
//! ## Features
//!
//! - **Standard and dual modes**: a single "main" listener, or separate "SSL" and
//!   "NonSSL" listeners, each with an optional dedicated "internal" admin listener
//! - **Sparse TLS configuration**: only the TLS settings you write override the defaults
//! - **Admin surface**: ping, health checks and metrics, optionally behind Basic auth
//! - **Gzip**: bi-directional compression of the application chain
//! - **Feature-gated**: `auth` and `gzip` can be left out of the build
//!
//! ## Basic Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dockyard::{
//!     config::ServerConfig,
//!     health::HealthCheckRegistry,
//!     server::{environment::Environment, handler::{handler_fn, text_response}, ServerAssembler},
//! };
//!
//! let config = ServerConfig::from_yaml_str("port: 8080\nadmin_port: 8081\n")?;
//!
//! let mut env = Environment::new("hello");
//! env.set_application("/*", handler_fn(|_request| async move {
//!     Ok(text_response(http::StatusCode::OK, "text/plain", "Hello, World!"))
//! }));
//!
//! let server = ServerAssembler::new(Arc::new(HealthCheckRegistry::new()))
//!     .assemble(&config, env)?;
//!
//! let response = server.dispatch("main", request).await;
//! ```

use bytes::Bytes;
use http_body_util::Full;

pub mod config;
pub mod errors;
pub mod health;
pub mod server;
pub mod utils;

mod tests;

pub type Request = http::Request<Full<Bytes>>;
pub type Response = http::Response<Full<Bytes>>;

pub use server::{AssembledServer, ServerAssembler};
