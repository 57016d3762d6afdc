use std::fmt;

use crate::{
    health::HealthCheck,
    server::handler::{context::DispatchContext, BoxedHandler},
};

/// Application dispatch unit and the URL pattern it is mounted at.
#[derive(Clone)]
pub struct Application {
    url_pattern: String,
    handler: BoxedHandler,
}

impl Application {
    pub fn url_pattern(&self) -> &str {
        &self.url_pattern
    }

    pub fn handler(&self) -> BoxedHandler {
        self.handler
            .clone()
    }
}

/// Everything the application contributes to assembly.
///
/// # Examples
///
/// ```rust,ignore
/// let mut env = Environment::new("orders");
/// env.add_health_check(Box::new(DatabaseCheck::new(pool)));
/// env.set_application("/api/*", handler_fn(orders));
///
/// let server = ServerAssembler::new(registry).assemble(&config, env)?;
/// ```
pub struct Environment {
    name: String,
    health_checks: Vec<Box<dyn HealthCheck>>,
    servlet_context: DispatchContext,
    admin_context: DispatchContext,
    application: Option<Application>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("name", &self.name)
            .field("health_checks", &self.health_checks.len())
            .field("servlet_context", &self.servlet_context)
            .field("admin_context", &self.admin_context)
            .field(
                "application",
                &self
                    .application
                    .as_ref()
                    .map(Application::url_pattern),
            )
            .finish()
    }
}

impl Environment {
    pub fn new(name: &str) -> Environment {
        Environment {
            name: name.to_string(),
            health_checks: Vec::new(),
            servlet_context: DispatchContext::new("application"),
            admin_context: DispatchContext::new("admin"),
            application: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_health_check(&mut self, check: Box<dyn HealthCheck>) {
        self.health_checks
            .push(check);
    }

    pub fn health_checks(&self) -> &[Box<dyn HealthCheck>] {
        &self.health_checks
    }

    /// Context the application chain dispatches into.
    pub fn servlet_context(&mut self) -> &mut DispatchContext {
        &mut self.servlet_context
    }

    /// Context the admin chain dispatches into.
    pub fn admin_context(&mut self) -> &mut DispatchContext {
        &mut self.admin_context
    }

    /// Sets the application dispatch unit, mounted at `url_pattern` in the servlet context.
    pub fn set_application(&mut self, url_pattern: &str, handler: BoxedHandler) {
        self.application = Some(Application { url_pattern: url_pattern.to_string(), handler });
    }

    pub fn application(&self) -> Option<&Application> {
        self.application
            .as_ref()
    }

    pub(crate) fn take_servlet_context(&mut self) -> DispatchContext {
        std::mem::replace(&mut self.servlet_context, DispatchContext::new("application"))
    }

    pub(crate) fn take_admin_context(&mut self) -> DispatchContext {
        std::mem::replace(&mut self.admin_context, DispatchContext::new("admin"))
    }

    pub(crate) fn take_application(&mut self) -> Option<Application> {
        self.application
            .take()
    }

    pub(crate) fn take_health_checks(&mut self) -> Vec<Box<dyn HealthCheck>> {
        std::mem::take(&mut self.health_checks)
    }
}
