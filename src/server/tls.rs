//! TLS context construction.
//!
//! [`TlsFactory`] turns the sparse [`TlsConfig`] into a complete [`TlsContext`]:
//! every field starts at the transport default and is replaced only when the
//! configuration sets it. The result does not depend on the order fields are applied.

use std::path::{Path, PathBuf};

use log::debug;
use rustls::{ProtocolVersion, SupportedProtocolVersion};
use url::Url;

use crate::{config::TlsConfig, errors::ConfigError};

/// Key store type prefix selecting the platform certificate store.
pub const NATIVE_STORE_PREFIX: &str = "Windows-";

/// Where key material or trust anchors come from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreSource {
    /// A key store file, addressed textually
    File { path: Option<PathBuf>, password: Option<String>, store_type: String },
    /// A platform certificate store loaded in memory, without path or password
    Native { store_type: String },
}

impl Default for StoreSource {
    fn default() -> Self {
        StoreSource::File { path: None, password: None, store_type: "JKS".to_string() }
    }
}

impl StoreSource {
    fn resolve(
        path: Option<&Path>,
        password: Option<&str>,
        store_type: &str,
    ) -> Result<StoreSource, ConfigError> {
        if store_type.starts_with(NATIVE_STORE_PREFIX) {
            return load_native_store(store_type);
        }

        Ok(StoreSource::File {
            path: path.map(absolute),
            password: password.map(str::to_string),
            store_type: store_type.to_string(),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            StoreSource::File { path, .. } => path.as_deref(),
            StoreSource::Native { .. } => None,
        }
    }

    pub fn password(&self) -> Option<&str> {
        match self {
            StoreSource::File { password, .. } => password.as_deref(),
            StoreSource::Native { .. } => None,
        }
    }

    pub fn store_type(&self) -> &str {
        match self {
            StoreSource::File { store_type, .. } | StoreSource::Native { store_type } => store_type,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, StoreSource::Native { .. })
    }
}

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        fn load_native_store(store_type: &str) -> Result<StoreSource, ConfigError> {
            Ok(StoreSource::Native { store_type: store_type.to_string() })
        }
    } else {
        fn load_native_store(store_type: &str) -> Result<StoreSource, ConfigError> {
            Err(ConfigError::NativeKeyStore {
                store: store_type.to_string(),
                reason: format!("{} stores are not available on {}", NATIVE_STORE_PREFIX, std::env::consts::OS),
            })
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|dir| dir.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Fully populated TLS settings attached to a TLS listener.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TlsContext {
    key_store: StoreSource,
    key_manager_password: Option<String>,
    cert_alias: Option<String>,
    trust_store: StoreSource,
    need_client_auth: bool,
    want_client_auth: bool,
    allow_renegotiate: bool,
    crl_path: Option<PathBuf>,
    enable_crldp: bool,
    enable_ocsp: bool,
    ocsp_responder_url: Option<String>,
    max_cert_path_length: i32,
    provider: Option<String>,
    validate_peer_certs: bool,
    include_protocols: Option<Vec<String>>,
}

impl Default for TlsContext {
    fn default() -> Self {
        TlsContext {
            key_store: StoreSource::default(),
            key_manager_password: None,
            cert_alias: None,
            trust_store: StoreSource::default(),
            need_client_auth: false,
            want_client_auth: false,
            allow_renegotiate: true,
            crl_path: None,
            enable_crldp: false,
            enable_ocsp: false,
            ocsp_responder_url: None,
            max_cert_path_length: -1,
            provider: None,
            validate_peer_certs: false,
            include_protocols: None,
        }
    }
}

impl TlsContext {
    pub fn key_store(&self) -> &StoreSource {
        &self.key_store
    }

    pub fn key_manager_password(&self) -> Option<&str> {
        self.key_manager_password
            .as_deref()
    }

    pub fn cert_alias(&self) -> Option<&str> {
        self.cert_alias
            .as_deref()
    }

    pub fn trust_store(&self) -> &StoreSource {
        &self.trust_store
    }

    pub fn need_client_auth(&self) -> bool {
        self.need_client_auth
    }

    pub fn want_client_auth(&self) -> bool {
        self.want_client_auth
    }

    pub fn allow_renegotiate(&self) -> bool {
        self.allow_renegotiate
    }

    pub fn crl_path(&self) -> Option<&Path> {
        self.crl_path
            .as_deref()
    }

    pub fn enable_crldp(&self) -> bool {
        self.enable_crldp
    }

    pub fn enable_ocsp(&self) -> bool {
        self.enable_ocsp
    }

    pub fn ocsp_responder_url(&self) -> Option<&str> {
        self.ocsp_responder_url
            .as_deref()
    }

    /// `-1` leaves the path length unbounded.
    pub fn max_cert_path_length(&self) -> i32 {
        self.max_cert_path_length
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider
            .as_deref()
    }

    pub fn validate_peer_certs(&self) -> bool {
        self.validate_peer_certs
    }

    /// Protocols the listener is restricted to; `None` keeps the transport default.
    pub fn include_protocols(&self) -> Option<&[String]> {
        self.include_protocols
            .as_deref()
    }

    /// Protocol versions a rustls based runtime should enable for this context.
    ///
    /// Names follow the `TLSv1.2` / `TLSv1.3` convention; names rustls does not
    /// implement are ignored.
    pub fn protocol_versions(&self) -> Vec<&'static SupportedProtocolVersion> {
        match &self.include_protocols {
            None => rustls::DEFAULT_VERSIONS.to_vec(),
            Some(included) => rustls::ALL_VERSIONS
                .iter()
                .copied()
                .filter(|version| {
                    protocol_name(version)
                        .map(|name| {
                            included
                                .iter()
                                .any(|included| included.eq_ignore_ascii_case(name))
                        })
                        .unwrap_or(false)
                })
                .collect(),
        }
    }
}

fn protocol_name(version: &SupportedProtocolVersion) -> Option<&'static str> {
    match version.version {
        ProtocolVersion::TLSv1_2 => Some("TLSv1.2"),
        ProtocolVersion::TLSv1_3 => Some("TLSv1.3"),
        _ => None,
    }
}

pub struct TlsFactory {}

impl TlsFactory {
    /// Merges the configured overrides onto [`TlsContext::default`].
    ///
    /// # Errors
    ///
    /// Fails when a native key or trust store is requested on a platform without one,
    /// or when the OCSP responder URL is malformed.
    pub fn create_tls_context(config: &TlsConfig) -> Result<TlsContext, ConfigError> {
        let defaults = TlsContext::default();

        let key_store = StoreSource::resolve(
            config.key_store(),
            config.key_store_password(),
            config.key_store_type(),
        )?;
        let trust_store = StoreSource::resolve(
            config.trust_store(),
            config.trust_store_password(),
            config.trust_store_type(),
        )?;

        let ocsp_responder_url = match config.ocsp_responder_url() {
            Some(url) => {
                Url::parse(url).map_err(|e| ConfigError::OcspResponderUrl(format!("{}: {}", url, e)))?;
                Some(url.to_string())
            }
            None => defaults.ocsp_responder_url,
        };

        let context = TlsContext {
            key_store,
            key_manager_password: config
                .key_manager_password()
                .map(str::to_string)
                .or(defaults.key_manager_password),
            cert_alias: config
                .cert_alias()
                .map(str::to_string)
                .or(defaults.cert_alias),
            trust_store,
            need_client_auth: config
                .need_client_auth()
                .unwrap_or(defaults.need_client_auth),
            want_client_auth: config
                .want_client_auth()
                .unwrap_or(defaults.want_client_auth),
            allow_renegotiate: config
                .allow_renegotiate()
                .unwrap_or(defaults.allow_renegotiate),
            crl_path: config
                .crl_path()
                .map(absolute)
                .or(defaults.crl_path),
            enable_crldp: config
                .crldp_enabled()
                .unwrap_or(defaults.enable_crldp),
            enable_ocsp: config
                .ocsp_enabled()
                .unwrap_or(defaults.enable_ocsp),
            ocsp_responder_url,
            max_cert_path_length: config
                .max_cert_path_length()
                .unwrap_or(defaults.max_cert_path_length),
            provider: config
                .provider()
                .map(str::to_string)
                .or(defaults.provider),
            validate_peer_certs: config
                .validate_peers()
                .unwrap_or(defaults.validate_peer_certs),
            include_protocols: config
                .supported_protocols()
                .map(<[String]>::to_vec)
                .or(defaults.include_protocols),
        };

        debug!(
            "TLS context: key store {}, trust store {}, need client auth {}, want client auth {}",
            context
                .key_store
                .store_type(),
            context
                .trust_store
                .store_type(),
            context.need_client_auth,
            context.want_client_auth
        );

        Ok(context)
    }
}
