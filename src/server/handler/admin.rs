//! Administrative endpoints.
//!
//! Mounted at `/*` in the admin context:
//! - `/` index page linking the endpoints
//! - `/ping` liveness answer `pong`
//! - `/healthcheck` runs every registered health check
//! - `/metrics` request metrics of the application chain

use std::{collections::BTreeMap, sync::Arc};

use http::StatusCode;
use serde::Serialize;

use crate::{
    errors::DockyardError,
    health::{HealthCheckRegistry, HealthResult},
    server::handler::{
        error_response, instrumented::RequestMetrics, text_response, Handler, HandlerFuture,
    },
    Request, Response,
};

const JSON: &str = "application/json";

pub struct AdminHandler {
    service: String,
    registry: Arc<HealthCheckRegistry>,
    metrics: Arc<RequestMetrics>,
}

impl AdminHandler {
    pub fn new(
        service: &str,
        registry: Arc<HealthCheckRegistry>,
        metrics: Arc<RequestMetrics>,
    ) -> AdminHandler {
        AdminHandler { service: service.to_string(), registry, metrics }
    }

    fn index(&self) -> Response {
        let body = format!(
            "<!DOCTYPE html>\n<html><head><title>{service} operational menu</title></head><body>\
             <h1>{service} operational menu</h1><ul>\
             <li><a href=\"ping\">Ping</a></li>\
             <li><a href=\"healthcheck\">Healthcheck</a></li>\
             <li><a href=\"metrics\">Metrics</a></li>\
             </ul></body></html>",
            service = self.service
        );
        text_response(StatusCode::OK, "text/html; charset=utf-8", body)
    }

    /// Runs the registered checks inline, so the `/healthcheck` future blocks its task
    /// until every check returns.
    fn health(&self) -> Result<Response, DockyardError> {
        let results: BTreeMap<String, HealthResult> = self
            .registry
            .run_all();
        if results.is_empty() {
            return Ok(text_response(
                StatusCode::NOT_IMPLEMENTED,
                "text/plain; charset=utf-8",
                "No health checks registered.",
            ));
        }

        let status = if results
            .values()
            .all(HealthResult::is_healthy)
        {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        json(status, &results)
    }

    fn metrics(&self) -> Result<Response, DockyardError> {
        json(
            StatusCode::OK,
            &self
                .metrics
                .snapshot(),
        )
    }
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response, DockyardError> {
    let body = serde_json::to_vec(value).map_err(|e| DockyardError::Handler(e.to_string()))?;
    Ok(text_response(status, JSON, body))
}

impl Handler for AdminHandler {
    fn handle(&self, request: Request) -> HandlerFuture<'_> {
        Box::pin(async move {
            let path = request
                .uri()
                .path()
                .trim_end_matches('/');

            match path {
                "" => Ok(self.index()),
                "/ping" => Ok(text_response(StatusCode::OK, "text/plain; charset=utf-8", "pong\n")),
                "/healthcheck" => self.health(),
                "/metrics" => self.metrics(),
                _ => Ok(error_response(StatusCode::NOT_FOUND)),
            }
        })
    }
}
