//! Error handling types for dockyard.
//!
//! Assembly has a single failure kind, [`ConfigError`], raised synchronously and never
//! retried. [`DockyardError`] wraps it together with the errors that can surface while
//! an assembled handler chain executes a request.
//!
//! # Examples
//!
//! ```rust,ignore
//! use dockyard::errors::{ConfigError, DockyardError};
//!
//! match assembler.assemble(&config, &env) {
//!     Ok(server) => println!("{} listeners", server.listeners().len()),
//!     Err(DockyardError::Config(ConfigError::MissingTls(name))) => {
//!         eprintln!("listener {} needs an ssl section", name);
//!     }
//!     Err(other) => eprintln!("Error: {}", other),
//! }
//! ```

use thiserror::Error;

/// Main error type for dockyard operations.
#[derive(Debug, Error, PartialEq)]
pub enum DockyardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Request handler errors
    #[error("Handler error: {0}")]
    Handler(String),

    /// Failure reading a configuration source
    #[error("I/O error: {0}")]
    Io(String),
}

/// Configuration-related errors.
///
/// Any of these aborts assembly; no partially assembled server is returned.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// Transport type name that does not map to a known transport
    #[error("Invalid connector type: {0}")]
    UnknownTransport(String),

    /// A TLS transport was requested for a listener but no ssl section exists
    #[error("Listener {0} uses a TLS transport but no TLS configuration was supplied")]
    MissingTls(String),

    /// Native (platform) key store requested where it cannot be loaded
    #[error("{store} key store not supported: {reason}")]
    NativeKeyStore { store: String, reason: String },

    /// Malformed OCSP responder URL
    #[error("Invalid OCSP responder URL: {0}")]
    OcspResponderUrl(String),

    /// Malformed size literal, e.g. `16KiB`
    #[error("Invalid size: {0}")]
    Size(String),

    /// Malformed duration literal, e.g. `200s`
    #[error("Invalid duration: {0}")]
    Duration(String),

    /// Request log time zone that is neither `UTC` nor a `±HH:MM` offset
    #[error("Invalid time zone: {0}")]
    TimeZone(String),

    /// Thread pool bounds that cannot be satisfied
    #[error("Invalid thread pool bounds: min {min} > max {max}")]
    ThreadBounds { min: usize, max: usize },

    /// Configured feature that this build does not include
    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    /// Configuration document could not be parsed
    #[error("Invalid configuration document: {0}")]
    Parse(String),
}
