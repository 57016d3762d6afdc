//! Configuration types for dockyard.
//!
//! This module provides the declarative input of server assembly:
//! - [`ServerConfig`]: ports, transport selection, socket tuning, thread pool, admin access
//! - [`TlsConfig`]: sparse TLS overrides (key store, trust store, client auth, revocation)
//! - [`GzipConfig`]: response compression settings
//! - [`RequestLogConfig`]: NCSA request log settings
//!
//! Every type can be built with a fluent builder or deserialized from YAML.
//!
//! # Examples
//!
//! ```rust,ignore
//! use dockyard::config::{ServerConfig, TlsConfig, TransportType};
//!
//! let tls = TlsConfig::builder()
//!     .key_store("/etc/dockyard/keystore.jks")
//!     .key_store_password("changeit")
//!     .build();
//!
//! let config = ServerConfig::builder()
//!     .port(8080)
//!     .admin_port(8081)
//!     .ssl_port(8443)
//!     .ssl(tls)
//!     .build()?;
//! ```

use std::{collections::BTreeSet, fmt, fs, path::Path, path::PathBuf, str::FromStr, time::Duration};

use serde::Deserialize;

use crate::{
    errors::{ConfigError, DockyardError},
    utils::units,
};

/// Port number meaning "no TLS port configured".
pub const UNSET_SSL_PORT: u16 = 9999;

/// Transport implementation backing a listener.
///
/// Textual names are `blocking`, `legacy`, `legacy+ssl`, `nonblocking` and
/// `nonblocking+ssl`; `+tls` is accepted as an alias of `+ssl`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum TransportType {
    /// Blocking channel transport
    Blocking,
    /// Blocking socket transport
    Legacy,
    /// Blocking socket transport with TLS
    LegacyTls,
    /// Selector based non-blocking transport
    NonBlocking,
    /// Selector based non-blocking transport with TLS
    NonBlockingTls,
}

impl TransportType {
    pub const ALL: [TransportType; 5] = [
        TransportType::Blocking,
        TransportType::Legacy,
        TransportType::LegacyTls,
        TransportType::NonBlocking,
        TransportType::NonBlockingTls,
    ];

    pub fn is_tls(&self) -> bool {
        matches!(self, TransportType::LegacyTls | TransportType::NonBlockingTls)
    }

    pub fn is_non_blocking(&self) -> bool {
        matches!(self, TransportType::NonBlocking | TransportType::NonBlockingTls)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::Blocking => "blocking",
            TransportType::Legacy => "legacy",
            TransportType::LegacyTls => "legacy+ssl",
            TransportType::NonBlocking => "nonblocking",
            TransportType::NonBlockingTls => "nonblocking+ssl",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "blocking" => Ok(TransportType::Blocking),
            "legacy" => Ok(TransportType::Legacy),
            "legacy+ssl" | "legacy+tls" => Ok(TransportType::LegacyTls),
            "nonblocking" => Ok(TransportType::NonBlocking),
            "nonblocking+ssl" | "nonblocking+tls" => Ok(TransportType::NonBlockingTls),
            _ => Err(ConfigError::UnknownTransport(value.to_string())),
        }
    }
}

impl TryFrom<String> for TransportType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Client certificate policy of a TLS listener.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientAuth {
    /// Client certificates are not requested
    None,
    /// Client certificates are requested but optional
    Want,
    /// Client certificates are mandatory
    Need,
}

/// Sparse TLS settings.
///
/// Every field is optional; an absent field leaves the transport default untouched.
/// Key and trust store types default to `JKS`. A type starting with `Windows-`
/// selects the platform certificate store instead of a file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    key_store: Option<PathBuf>,
    key_store_password: Option<String>,
    key_store_type: String,
    key_manager_password: Option<String>,
    cert_alias: Option<String>,
    trust_store: Option<PathBuf>,
    trust_store_password: Option<String>,
    trust_store_type: String,
    client_auth: Option<ClientAuth>,
    need_client_auth: Option<bool>,
    want_client_auth: Option<bool>,
    allow_renegotiate: Option<bool>,
    crl_path: Option<PathBuf>,
    crldp_enabled: Option<bool>,
    ocsp_enabled: Option<bool>,
    ocsp_responder_url: Option<String>,
    max_cert_path_length: Option<i32>,
    provider: Option<String>,
    validate_peers: Option<bool>,
    supported_protocols: Option<Vec<String>>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        TlsConfig {
            key_store: None,
            key_store_password: None,
            key_store_type: "JKS".to_string(),
            key_manager_password: None,
            cert_alias: None,
            trust_store: None,
            trust_store_password: None,
            trust_store_type: "JKS".to_string(),
            client_auth: None,
            need_client_auth: None,
            want_client_auth: None,
            allow_renegotiate: None,
            crl_path: None,
            crldp_enabled: None,
            ocsp_enabled: None,
            ocsp_responder_url: None,
            max_cert_path_length: None,
            provider: None,
            validate_peers: None,
            supported_protocols: None,
        }
    }
}

impl TlsConfig {
    pub fn builder() -> TlsConfigBuilder {
        TlsConfigBuilder { config: TlsConfig::default() }
    }

    pub fn key_store(&self) -> Option<&Path> {
        self.key_store
            .as_deref()
    }

    pub fn key_store_password(&self) -> Option<&str> {
        self.key_store_password
            .as_deref()
    }

    pub fn key_store_type(&self) -> &str {
        &self.key_store_type
    }

    pub fn key_manager_password(&self) -> Option<&str> {
        self.key_manager_password
            .as_deref()
    }

    pub fn cert_alias(&self) -> Option<&str> {
        self.cert_alias
            .as_deref()
    }

    pub fn trust_store(&self) -> Option<&Path> {
        self.trust_store
            .as_deref()
    }

    pub fn trust_store_password(&self) -> Option<&str> {
        self.trust_store_password
            .as_deref()
    }

    pub fn trust_store_type(&self) -> &str {
        &self.trust_store_type
    }

    /// Returns the explicit `need` override, falling back to the client auth mode.
    pub fn need_client_auth(&self) -> Option<bool> {
        self.need_client_auth
            .or_else(|| {
                self.client_auth
                    .map(|mode| mode == ClientAuth::Need)
            })
    }

    /// Returns the explicit `want` override, falling back to the client auth mode.
    pub fn want_client_auth(&self) -> Option<bool> {
        self.want_client_auth
            .or_else(|| {
                self.client_auth
                    .map(|mode| mode == ClientAuth::Want)
            })
    }

    pub fn allow_renegotiate(&self) -> Option<bool> {
        self.allow_renegotiate
    }

    pub fn crl_path(&self) -> Option<&Path> {
        self.crl_path
            .as_deref()
    }

    pub fn crldp_enabled(&self) -> Option<bool> {
        self.crldp_enabled
    }

    pub fn ocsp_enabled(&self) -> Option<bool> {
        self.ocsp_enabled
    }

    pub fn ocsp_responder_url(&self) -> Option<&str> {
        self.ocsp_responder_url
            .as_deref()
    }

    pub fn max_cert_path_length(&self) -> Option<i32> {
        self.max_cert_path_length
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider
            .as_deref()
    }

    pub fn validate_peers(&self) -> Option<bool> {
        self.validate_peers
    }

    pub fn supported_protocols(&self) -> Option<&[String]> {
        self.supported_protocols
            .as_deref()
    }
}

/// Builder for [`TlsConfig`].
#[derive(Clone)]
pub struct TlsConfigBuilder {
    config: TlsConfig,
}

impl TlsConfigBuilder {
    pub fn key_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.key_store = Some(path.into());
        self
    }

    pub fn key_store_password(mut self, password: &str) -> Self {
        self.config.key_store_password = Some(password.to_string());
        self
    }

    pub fn key_store_type(mut self, store_type: &str) -> Self {
        self.config.key_store_type = store_type.to_string();
        self
    }

    pub fn key_manager_password(mut self, password: &str) -> Self {
        self.config.key_manager_password = Some(password.to_string());
        self
    }

    pub fn cert_alias(mut self, alias: &str) -> Self {
        self.config.cert_alias = Some(alias.to_string());
        self
    }

    pub fn trust_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.trust_store = Some(path.into());
        self
    }

    pub fn trust_store_password(mut self, password: &str) -> Self {
        self.config.trust_store_password = Some(password.to_string());
        self
    }

    pub fn trust_store_type(mut self, store_type: &str) -> Self {
        self.config.trust_store_type = store_type.to_string();
        self
    }

    pub fn client_auth(mut self, mode: ClientAuth) -> Self {
        self.config.client_auth = Some(mode);
        self
    }

    pub fn need_client_auth(mut self, need: bool) -> Self {
        self.config.need_client_auth = Some(need);
        self
    }

    pub fn want_client_auth(mut self, want: bool) -> Self {
        self.config.want_client_auth = Some(want);
        self
    }

    pub fn allow_renegotiate(mut self, allow: bool) -> Self {
        self.config.allow_renegotiate = Some(allow);
        self
    }

    pub fn crl_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.crl_path = Some(path.into());
        self
    }

    pub fn crldp_enabled(mut self, enabled: bool) -> Self {
        self.config.crldp_enabled = Some(enabled);
        self
    }

    pub fn ocsp_enabled(mut self, enabled: bool) -> Self {
        self.config.ocsp_enabled = Some(enabled);
        self
    }

    pub fn ocsp_responder_url(mut self, url: &str) -> Self {
        self.config.ocsp_responder_url = Some(url.to_string());
        self
    }

    pub fn max_cert_path_length(mut self, length: i32) -> Self {
        self.config.max_cert_path_length = Some(length);
        self
    }

    pub fn provider(mut self, provider: &str) -> Self {
        self.config.provider = Some(provider.to_string());
        self
    }

    pub fn validate_peers(mut self, validate: bool) -> Self {
        self.config.validate_peers = Some(validate);
        self
    }

    pub fn supported_protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.supported_protocols = Some(
            protocols
                .into_iter()
                .map(Into::into)
                .collect(),
        );
        self
    }

    pub fn build(self) -> TlsConfig {
        self.config
    }
}

/// Response compression settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GzipConfig {
    enabled: bool,
    #[serde(deserialize_with = "units::size::deserialize")]
    minimum_entity_size: usize,
    #[serde(deserialize_with = "units::size::deserialize")]
    buffer_size: usize,
    excluded_user_agents: BTreeSet<String>,
    #[serde(deserialize_with = "units::mime_types::deserialize")]
    compressed_mime_types: BTreeSet<String>,
}

impl Default for GzipConfig {
    fn default() -> Self {
        GzipConfig {
            enabled: true,
            minimum_entity_size: 256,
            buffer_size: 8 * 1024,
            excluded_user_agents: BTreeSet::new(),
            compressed_mime_types: BTreeSet::new(),
        }
    }
}

impl GzipConfig {
    pub fn builder() -> GzipConfigBuilder {
        GzipConfigBuilder { config: GzipConfig::default() }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Responses smaller than this many bytes are never compressed.
    pub fn minimum_entity_size(&self) -> usize {
        self.minimum_entity_size
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// User agent substrings that disable compression.
    pub fn excluded_user_agents(&self) -> &BTreeSet<String> {
        &self.excluded_user_agents
    }

    /// MIME types eligible for compression; empty means every type.
    pub fn compressed_mime_types(&self) -> &BTreeSet<String> {
        &self.compressed_mime_types
    }
}

/// Builder for [`GzipConfig`].
#[derive(Clone)]
pub struct GzipConfigBuilder {
    config: GzipConfig,
}

impl GzipConfigBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn minimum_entity_size(mut self, bytes: usize) -> Self {
        self.config.minimum_entity_size = bytes;
        self
    }

    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.config.buffer_size = bytes;
        self
    }

    pub fn exclude_user_agent(mut self, agent: &str) -> Self {
        self.config
            .excluded_user_agents
            .insert(agent.to_string());
        self
    }

    pub fn compress_mime_type(mut self, mime_type: &str) -> Self {
        self.config
            .compressed_mime_types
            .insert(
                mime_type
                    .trim()
                    .to_ascii_lowercase(),
            );
        self
    }

    pub fn build(self) -> GzipConfig {
        self.config
    }
}

/// NCSA request log settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RequestLogConfig {
    enabled: bool,
    target: String,
    time_zone: String,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        RequestLogConfig {
            enabled: false,
            target: "http.request".to_string(),
            time_zone: "UTC".to_string(),
        }
    }
}

impl RequestLogConfig {
    pub fn builder() -> RequestLogConfigBuilder {
        RequestLogConfigBuilder { config: RequestLogConfig::default() }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// `log` target the request lines are written to.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }
}

/// Builder for [`RequestLogConfig`].
#[derive(Clone)]
pub struct RequestLogConfigBuilder {
    config: RequestLogConfig,
}

impl RequestLogConfigBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn target(mut self, target: &str) -> Self {
        self.config.target = target.to_string();
        self
    }

    pub fn time_zone(mut self, time_zone: &str) -> Self {
        self.config.time_zone = time_zone.to_string();
        self
    }

    pub fn build(self) -> RequestLogConfig {
        self.config
    }
}

/// Declarative server configuration.
///
/// Read once and treated as immutable for the whole assembly. Every field has a
/// default, so an empty YAML document is a valid configuration.
///
/// # Examples
///
/// ```rust,ignore
/// use dockyard::config::ServerConfig;
///
/// let config = ServerConfig::from_yaml_str(r#"
/// port: 8080
/// admin_port: 8080
/// connector_type: nonblocking
/// max_idle_time: 30s
/// "#)?;
///
/// assert_eq!(config.admin_port(), config.port());
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    port: u16,
    admin_port: u16,
    ssl_port: u16,
    connector_type: TransportType,
    ssl_connector_type: TransportType,
    bind_host: Option<String>,
    acceptor_threads: usize,
    use_forwarded_headers: bool,
    #[serde(deserialize_with = "units::duration::deserialize")]
    max_idle_time: Duration,
    #[serde(deserialize_with = "units::duration::deserialize")]
    low_resources_max_idle_time: Duration,
    low_resources_connection_threshold: usize,
    use_direct_buffers: bool,
    acceptor_thread_priority_offset: i32,
    accept_queue_size: i32,
    max_buffer_count: usize,
    #[serde(deserialize_with = "units::size::deserialize")]
    request_buffer_size: usize,
    #[serde(deserialize_with = "units::size::deserialize")]
    request_header_buffer_size: usize,
    #[serde(deserialize_with = "units::size::deserialize")]
    response_buffer_size: usize,
    #[serde(deserialize_with = "units::size::deserialize")]
    response_header_buffer_size: usize,
    reuse_address: bool,
    #[serde(deserialize_with = "units::option_duration::deserialize")]
    so_linger_time: Option<Duration>,
    min_threads: usize,
    max_threads: usize,
    #[serde(deserialize_with = "units::duration::deserialize")]
    shutdown_grace_period: Duration,
    date_header: bool,
    server_header: bool,
    admin_username: Option<String>,
    admin_password: Option<String>,
    gzip: GzipConfig,
    request_log: RequestLogConfig,
    ssl: Option<TlsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 8080,
            admin_port: 8081,
            ssl_port: UNSET_SSL_PORT,
            connector_type: TransportType::Blocking,
            ssl_connector_type: TransportType::NonBlockingTls,
            bind_host: None,
            acceptor_threads: 1,
            use_forwarded_headers: true,
            max_idle_time: Duration::from_secs(200),
            low_resources_max_idle_time: Duration::ZERO,
            low_resources_connection_threshold: 25_000,
            use_direct_buffers: true,
            acceptor_thread_priority_offset: 0,
            accept_queue_size: -1,
            max_buffer_count: 1024,
            request_buffer_size: 16 * 1024,
            request_header_buffer_size: 6 * 1024,
            response_buffer_size: 32 * 1024,
            response_header_buffer_size: 6 * 1024,
            reuse_address: true,
            so_linger_time: None,
            min_threads: 8,
            max_threads: 1024,
            shutdown_grace_period: Duration::from_secs(2),
            date_header: true,
            server_header: false,
            admin_username: None,
            admin_password: None,
            gzip: GzipConfig::default(),
            request_log: RequestLogConfig::default(),
            ssl: None,
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder { config: ServerConfig::default() }
    }

    /// Parses and validates a YAML configuration document.
    pub fn from_yaml_str(document: &str) -> Result<ServerConfig, DockyardError> {
        let config: ServerConfig = serde_yaml_ng::from_str(document)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<ServerConfig, DockyardError> {
        let path = path.as_ref();
        let document = fs::read_to_string(path)
            .map_err(|e| DockyardError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&document)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_threads > self.max_threads {
            return Err(ConfigError::ThreadBounds { min: self.min_threads, max: self.max_threads });
        }
        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Admin port; `0` asks the runtime to allocate one dynamically.
    pub fn admin_port(&self) -> u16 {
        self.admin_port
    }

    /// TLS port; [`UNSET_SSL_PORT`] means no TLS port is configured.
    pub fn ssl_port(&self) -> u16 {
        self.ssl_port
    }

    pub fn connector_type(&self) -> TransportType {
        self.connector_type
    }

    pub fn ssl_connector_type(&self) -> TransportType {
        self.ssl_connector_type
    }

    pub fn bind_host(&self) -> Option<&str> {
        self.bind_host
            .as_deref()
    }

    pub fn acceptor_threads(&self) -> usize {
        self.acceptor_threads
    }

    pub fn use_forwarded_headers(&self) -> bool {
        self.use_forwarded_headers
    }

    pub fn max_idle_time(&self) -> Duration {
        self.max_idle_time
    }

    pub fn low_resources_max_idle_time(&self) -> Duration {
        self.low_resources_max_idle_time
    }

    pub fn low_resources_connection_threshold(&self) -> usize {
        self.low_resources_connection_threshold
    }

    pub fn use_direct_buffers(&self) -> bool {
        self.use_direct_buffers
    }

    pub fn acceptor_thread_priority_offset(&self) -> i32 {
        self.acceptor_thread_priority_offset
    }

    /// Listen backlog; negative values keep the operating system default.
    pub fn accept_queue_size(&self) -> i32 {
        self.accept_queue_size
    }

    pub fn max_buffer_count(&self) -> usize {
        self.max_buffer_count
    }

    pub fn request_buffer_size(&self) -> usize {
        self.request_buffer_size
    }

    pub fn request_header_buffer_size(&self) -> usize {
        self.request_header_buffer_size
    }

    pub fn response_buffer_size(&self) -> usize {
        self.response_buffer_size
    }

    pub fn response_header_buffer_size(&self) -> usize {
        self.response_header_buffer_size
    }

    pub fn reuse_address(&self) -> bool {
        self.reuse_address
    }

    pub fn so_linger_time(&self) -> Option<Duration> {
        self.so_linger_time
    }

    pub fn min_threads(&self) -> usize {
        self.min_threads
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    pub fn shutdown_grace_period(&self) -> Duration {
        self.shutdown_grace_period
    }

    pub fn date_header(&self) -> bool {
        self.date_header
    }

    pub fn server_header(&self) -> bool {
        self.server_header
    }

    pub fn admin_username(&self) -> Option<&str> {
        self.admin_username
            .as_deref()
    }

    pub fn admin_password(&self) -> Option<&str> {
        self.admin_password
            .as_deref()
    }

    pub fn gzip(&self) -> &GzipConfig {
        &self.gzip
    }

    pub fn request_log(&self) -> &RequestLogConfig {
        &self.request_log
    }

    pub fn ssl(&self) -> Option<&TlsConfig> {
        self.ssl
            .as_ref()
    }
}

/// Builder for [`ServerConfig`].
///
/// Starts from [`ServerConfig::default`]; only the fields that are set change.
#[derive(Clone)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn admin_port(mut self, port: u16) -> Self {
        self.config.admin_port = port;
        self
    }

    pub fn ssl_port(mut self, port: u16) -> Self {
        self.config.ssl_port = port;
        self
    }

    pub fn connector_type(mut self, transport: TransportType) -> Self {
        self.config.connector_type = transport;
        self
    }

    pub fn ssl_connector_type(mut self, transport: TransportType) -> Self {
        self.config.ssl_connector_type = transport;
        self
    }

    pub fn bind_host(mut self, host: &str) -> Self {
        self.config.bind_host = Some(host.to_string());
        self
    }

    pub fn acceptor_threads(mut self, threads: usize) -> Self {
        self.config.acceptor_threads = threads;
        self
    }

    pub fn use_forwarded_headers(mut self, enabled: bool) -> Self {
        self.config.use_forwarded_headers = enabled;
        self
    }

    pub fn max_idle_time(mut self, idle: Duration) -> Self {
        self.config.max_idle_time = idle;
        self
    }

    pub fn low_resources_max_idle_time(mut self, idle: Duration) -> Self {
        self.config.low_resources_max_idle_time = idle;
        self
    }

    pub fn low_resources_connection_threshold(mut self, connections: usize) -> Self {
        self.config.low_resources_connection_threshold = connections;
        self
    }

    pub fn use_direct_buffers(mut self, enabled: bool) -> Self {
        self.config.use_direct_buffers = enabled;
        self
    }

    pub fn acceptor_thread_priority_offset(mut self, offset: i32) -> Self {
        self.config.acceptor_thread_priority_offset = offset;
        self
    }

    pub fn accept_queue_size(mut self, size: i32) -> Self {
        self.config.accept_queue_size = size;
        self
    }

    pub fn max_buffer_count(mut self, count: usize) -> Self {
        self.config.max_buffer_count = count;
        self
    }

    pub fn request_buffer_size(mut self, bytes: usize) -> Self {
        self.config.request_buffer_size = bytes;
        self
    }

    pub fn request_header_buffer_size(mut self, bytes: usize) -> Self {
        self.config.request_header_buffer_size = bytes;
        self
    }

    pub fn response_buffer_size(mut self, bytes: usize) -> Self {
        self.config.response_buffer_size = bytes;
        self
    }

    pub fn response_header_buffer_size(mut self, bytes: usize) -> Self {
        self.config.response_header_buffer_size = bytes;
        self
    }

    pub fn reuse_address(mut self, enabled: bool) -> Self {
        self.config.reuse_address = enabled;
        self
    }

    pub fn so_linger_time(mut self, linger: Duration) -> Self {
        self.config.so_linger_time = Some(linger);
        self
    }

    pub fn min_threads(mut self, threads: usize) -> Self {
        self.config.min_threads = threads;
        self
    }

    pub fn max_threads(mut self, threads: usize) -> Self {
        self.config.max_threads = threads;
        self
    }

    pub fn shutdown_grace_period(mut self, period: Duration) -> Self {
        self.config.shutdown_grace_period = period;
        self
    }

    pub fn date_header(mut self, enabled: bool) -> Self {
        self.config.date_header = enabled;
        self
    }

    pub fn server_header(mut self, enabled: bool) -> Self {
        self.config.server_header = enabled;
        self
    }

    pub fn admin_username(mut self, username: &str) -> Self {
        self.config.admin_username = Some(username.to_string());
        self
    }

    pub fn admin_password(mut self, password: &str) -> Self {
        self.config.admin_password = Some(password.to_string());
        self
    }

    pub fn gzip(mut self, gzip: GzipConfig) -> Self {
        self.config.gzip = gzip;
        self
    }

    pub fn request_log(mut self, request_log: RequestLogConfig) -> Self {
        self.config.request_log = request_log;
        self
    }

    pub fn ssl(mut self, ssl: TlsConfig) -> Self {
        self.config.ssl = Some(ssl);
        self
    }

    /// Creates the `ServerConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if `min_threads` exceeds `max_threads`.
    pub fn build(self) -> Result<ServerConfig, DockyardError> {
        self.config
            .validate()?;
        Ok(self.config)
    }
}
