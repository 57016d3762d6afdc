//! Listener topology selection.
//!
//! [`select_mode`] evaluates the port-sharing rules once and returns an explicit
//! [`ListenerPlan`]: which listeners exist, on which ports, with which transports, and
//! where the application and admin chains are mounted. Nothing is built here.

use log::info;

use crate::{
    config::{ServerConfig, TransportType, UNSET_SSL_PORT},
    errors::ConfigError,
};

pub const MAIN: &str = "main";
pub const INTERNAL: &str = "internal";
pub const SSL: &str = "SSL";
pub const NON_SSL: &str = "NonSSL";

pub const ROOT_CONTEXT: &str = "/";
pub const ADMIN_CONTEXT: &str = "/admin";

/// Server topology.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ServerMode {
    /// "main" listener plus an optional "internal" admin listener
    Standard,
    /// Separate "SSL" and "NonSSL" listeners plus an optional "internal" admin listener
    Dual,
}

/// Transport a planned listener will be built with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlannedTransport {
    /// One of the configurable transports
    Configured(TransportType),
    /// The dedicated admin socket listener
    Internal,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlannedListener {
    name: &'static str,
    port: u16,
    transport: PlannedTransport,
}

impl PlannedListener {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn transport(&self) -> PlannedTransport {
        self.transport
    }
}

/// Where a handler chain is mounted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mount {
    listeners: Vec<&'static str>,
    context_path: &'static str,
}

impl Mount {
    pub fn listeners(&self) -> &[&'static str] {
        &self.listeners
    }

    pub fn context_path(&self) -> &'static str {
        self.context_path
    }
}

/// The outcome of mode selection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListenerPlan {
    mode: ServerMode,
    listeners: Vec<PlannedListener>,
    application: Mount,
    admin: Mount,
}

impl ListenerPlan {
    pub fn mode(&self) -> ServerMode {
        self.mode
    }

    pub fn listeners(&self) -> &[PlannedListener] {
        &self.listeners
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.listeners
            .iter()
            .map(PlannedListener::name)
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&PlannedListener> {
        self.listeners
            .iter()
            .find(|listener| listener.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name)
            .is_some()
    }

    /// Mount of the application chain.
    pub fn application(&self) -> &Mount {
        &self.application
    }

    /// Mount of the admin chain.
    pub fn admin(&self) -> &Mount {
        &self.admin
    }
}

/// Dual mode needs a TLS port other than the sentinel, a TLS section, and a TLS port
/// distinct from the main port.
pub fn is_dual_mode(config: &ServerConfig) -> bool {
    config.ssl_port() != UNSET_SSL_PORT
        && config
            .ssl()
            .is_some()
        && config.ssl_port() != config.port()
}

/// Decides the listener topology for `config`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingTls`] when a planned listener uses a TLS transport
/// and the configuration has no TLS section.
pub fn select_mode(config: &ServerConfig) -> Result<ListenerPlan, ConfigError> {
    let port = config.port();
    let admin_port = config.admin_port();
    let ssl_port = config.ssl_port();
    let internal = PlannedListener {
        name: INTERNAL,
        port: admin_port,
        transport: PlannedTransport::Internal,
    };

    let plan = if is_dual_mode(config) {
        info!("Dual mode: SSL port {}, non-SSL port {}", ssl_port, port);
        let mut listeners = Vec::with_capacity(3);

        // Precedence matches the historical rule: `a || (b && c)`.
        if admin_port == 0 || (admin_port != port) && (admin_port != ssl_port) {
            listeners.push(internal);
        }
        listeners.push(PlannedListener {
            name: SSL,
            port: ssl_port,
            transport: PlannedTransport::Configured(config.ssl_connector_type()),
        });
        listeners.push(PlannedListener {
            name: NON_SSL,
            port,
            transport: PlannedTransport::Configured(config.connector_type()),
        });

        let admin = admin_mount(&listeners, admin_port, port, NON_SSL);
        ListenerPlan {
            mode: ServerMode::Dual,
            listeners,
            application: Mount { listeners: vec![SSL, NON_SSL], context_path: ROOT_CONTEXT },
            admin,
        }
    } else {
        info!("Standard mode: main port {}, admin port {}", port, admin_port);
        let mut listeners = Vec::with_capacity(2);
        listeners.push(PlannedListener {
            name: MAIN,
            port,
            transport: PlannedTransport::Configured(config.connector_type()),
        });

        // A dynamically allocated admin port never collides.
        if admin_port == 0 || admin_port != port {
            listeners.push(internal);
        }

        let admin = admin_mount(&listeners, admin_port, port, MAIN);
        ListenerPlan {
            mode: ServerMode::Standard,
            listeners,
            application: Mount { listeners: vec![MAIN], context_path: ROOT_CONTEXT },
            admin,
        }
    };

    if config
        .ssl()
        .is_none()
    {
        for listener in &plan.listeners {
            if let PlannedTransport::Configured(transport) = listener.transport {
                if transport.is_tls() {
                    return Err(ConfigError::MissingTls(listener.name.to_string()));
                }
            }
        }
    }

    Ok(plan)
}

fn admin_mount(
    listeners: &[PlannedListener],
    admin_port: u16,
    port: u16,
    main_port_listener: &'static str,
) -> Mount {
    if admin_port != 0 && admin_port == port {
        return Mount { listeners: vec![main_port_listener], context_path: ADMIN_CONTEXT };
    }

    if listeners
        .iter()
        .any(|listener| listener.name == INTERNAL)
    {
        return Mount { listeners: vec![INTERNAL], context_path: ROOT_CONTEXT };
    }

    // Dual mode with the admin port on the TLS port: share that listener.
    let shared = listeners
        .iter()
        .find(|listener| listener.port == admin_port)
        .map(PlannedListener::name)
        .unwrap_or(main_port_listener);
    Mount { listeners: vec![shared], context_path: ADMIN_CONTEXT }
}
