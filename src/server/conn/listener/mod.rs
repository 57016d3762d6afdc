//! Listener construction.
//!
//! A [`Listener`] is the fully tuned description of one network endpoint: its transport
//! variant, port, name and socket parameters. Binding is left to the runtime that
//! consumes the assembled server.

use std::time::Duration;

use log::info;

use crate::{
    config::{ServerConfig, TransportType},
    errors::ConfigError,
    server::{
        plan::INTERNAL,
        pool::ThreadPool,
        tls::{TlsContext, TlsFactory},
    },
};

/// Threads owned by the dedicated admin listener.
pub const INTERNAL_POOL_THREADS: usize = 8;

/// Parameters only selector based transports understand.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectorTuning {
    low_resources_connections: usize,
    use_direct_buffers: bool,
}

impl SelectorTuning {
    pub fn low_resources_connections(&self) -> usize {
        self.low_resources_connections
    }

    pub fn use_direct_buffers(&self) -> bool {
        self.use_direct_buffers
    }
}

/// Transport variant of a listener.
///
/// TLS settings only exist on the TLS variants, so a plain listener can never carry a
/// TLS context and a TLS listener can never lack one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transport {
    Blocking,
    Legacy,
    LegacyTls { tls: Box<TlsContext> },
    NonBlocking { selector: SelectorTuning },
    NonBlockingTls { selector: SelectorTuning, tls: Box<TlsContext> },
}

impl Transport {
    pub fn transport_type(&self) -> TransportType {
        match self {
            Transport::Blocking => TransportType::Blocking,
            Transport::Legacy => TransportType::Legacy,
            Transport::LegacyTls { .. } => TransportType::LegacyTls,
            Transport::NonBlocking { .. } => TransportType::NonBlocking,
            Transport::NonBlockingTls { .. } => TransportType::NonBlockingTls,
        }
    }

    pub fn tls(&self) -> Option<&TlsContext> {
        match self {
            Transport::LegacyTls { tls } | Transport::NonBlockingTls { tls, .. } => Some(tls),
            _ => None,
        }
    }

    pub fn selector(&self) -> Option<&SelectorTuning> {
        match self {
            Transport::NonBlocking { selector } | Transport::NonBlockingTls { selector, .. } => {
                Some(selector)
            }
            _ => None,
        }
    }
}

/// Socket and buffer parameters shared by every transport variant.
///
/// `None` keeps the transport default.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConnectorTuning {
    host: Option<String>,
    acceptors: Option<usize>,
    forwarded: Option<bool>,
    max_idle_time: Option<Duration>,
    low_resources_max_idle_time: Option<Duration>,
    acceptor_priority_offset: Option<i32>,
    accept_queue_size: Option<i32>,
    max_buffers: Option<usize>,
    request_buffer_size: Option<usize>,
    request_header_size: Option<usize>,
    response_buffer_size: Option<usize>,
    response_header_size: Option<usize>,
    reuse_address: Option<bool>,
    so_linger_time: Option<Duration>,
}

impl ConnectorTuning {
    fn from_config(config: &ServerConfig) -> ConnectorTuning {
        ConnectorTuning {
            host: config
                .bind_host()
                .map(str::to_string),
            acceptors: Some(config.acceptor_threads()),
            forwarded: Some(config.use_forwarded_headers()),
            max_idle_time: Some(config.max_idle_time()),
            low_resources_max_idle_time: Some(config.low_resources_max_idle_time()),
            acceptor_priority_offset: Some(config.acceptor_thread_priority_offset()),
            accept_queue_size: Some(config.accept_queue_size()),
            max_buffers: Some(config.max_buffer_count()),
            request_buffer_size: Some(config.request_buffer_size()),
            request_header_size: Some(config.request_header_buffer_size()),
            response_buffer_size: Some(config.response_buffer_size()),
            response_header_size: Some(config.response_header_buffer_size()),
            reuse_address: Some(config.reuse_address()),
            so_linger_time: config.so_linger_time(),
        }
    }

    /// Bind address; `None` binds every interface.
    pub fn host(&self) -> Option<&str> {
        self.host
            .as_deref()
    }

    pub fn acceptors(&self) -> Option<usize> {
        self.acceptors
    }

    pub fn forwarded(&self) -> Option<bool> {
        self.forwarded
    }

    pub fn max_idle_time(&self) -> Option<Duration> {
        self.max_idle_time
    }

    pub fn low_resources_max_idle_time(&self) -> Option<Duration> {
        self.low_resources_max_idle_time
    }

    pub fn acceptor_priority_offset(&self) -> Option<i32> {
        self.acceptor_priority_offset
    }

    pub fn accept_queue_size(&self) -> Option<i32> {
        self.accept_queue_size
    }

    pub fn max_buffers(&self) -> Option<usize> {
        self.max_buffers
    }

    pub fn request_buffer_size(&self) -> Option<usize> {
        self.request_buffer_size
    }

    pub fn request_header_size(&self) -> Option<usize> {
        self.request_header_size
    }

    pub fn response_buffer_size(&self) -> Option<usize> {
        self.response_buffer_size
    }

    pub fn response_header_size(&self) -> Option<usize> {
        self.response_header_size
    }

    pub fn reuse_address(&self) -> Option<bool> {
        self.reuse_address
    }

    /// Only present when the configuration sets it.
    pub fn so_linger_time(&self) -> Option<Duration> {
        self.so_linger_time
    }
}

/// A fully tuned, not yet bound, network endpoint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Listener {
    name: String,
    port: u16,
    transport: Transport,
    tuning: ConnectorTuning,
    thread_pool: Option<ThreadPool>,
}

impl Listener {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Port to bind; `0` lets the runtime allocate one.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn tuning(&self) -> &ConnectorTuning {
        &self.tuning
    }

    pub fn host(&self) -> Option<&str> {
        self.tuning
            .host()
    }

    pub fn tls(&self) -> Option<&TlsContext> {
        self.transport
            .tls()
    }

    pub fn is_secure(&self) -> bool {
        self.tls()
            .is_some()
    }

    /// Dedicated pool; `None` shares the server pool.
    pub fn thread_pool(&self) -> Option<&ThreadPool> {
        self.thread_pool
            .as_ref()
    }
}

pub struct ListenerFactory {}

impl ListenerFactory {
    /// Builds a listener of the given transport variant.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingTls`] for a TLS variant when `config` has no TLS
    /// section, or any error raised while building the TLS context.
    pub fn create_listener(
        transport: TransportType,
        port: u16,
        name: &str,
        config: &ServerConfig,
    ) -> Result<Listener, ConfigError> {
        let selector = || SelectorTuning {
            low_resources_connections: config.low_resources_connection_threshold(),
            use_direct_buffers: config.use_direct_buffers(),
        };
        let tls = || -> Result<Box<TlsContext>, ConfigError> {
            let tls_config = config
                .ssl()
                .ok_or_else(|| ConfigError::MissingTls(name.to_string()))?;
            Ok(Box::new(TlsFactory::create_tls_context(tls_config)?))
        };

        let transport = match transport {
            TransportType::Blocking => Transport::Blocking,
            TransportType::Legacy => Transport::Legacy,
            TransportType::LegacyTls => Transport::LegacyTls { tls: tls()? },
            TransportType::NonBlocking => Transport::NonBlocking { selector: selector() },
            TransportType::NonBlockingTls => {
                Transport::NonBlockingTls { selector: selector(), tls: tls()? }
            }
        };

        info!(
            "Listener {} on {}:{} ({})",
            name,
            config
                .bind_host()
                .unwrap_or("*"),
            port,
            transport.transport_type()
        );

        Ok(Listener {
            name: name.to_string(),
            port,
            transport,
            tuning: ConnectorTuning::from_config(config),
            thread_pool: None,
        })
    }

    /// Builds the dedicated admin listener: a legacy socket on the bind host and admin
    /// port with its own small pool and no further tuning.
    pub fn create_internal_listener(config: &ServerConfig) -> Listener {
        info!(
            "Listener {} on {}:{} (dedicated {} thread pool)",
            INTERNAL,
            config
                .bind_host()
                .unwrap_or("*"),
            config.admin_port(),
            INTERNAL_POOL_THREADS
        );

        Listener {
            name: INTERNAL.to_string(),
            port: config.admin_port(),
            transport: Transport::Legacy,
            tuning: ConnectorTuning {
                host: config
                    .bind_host()
                    .map(str::to_string),
                ..Default::default()
            },
            thread_pool: Some(ThreadPool::fixed(INTERNAL, INTERNAL_POOL_THREADS)),
        }
    }
}
