//! Bi-directional gzip.
//!
//! Requests carrying `Content-Encoding: gzip` are inflated before they reach the inner
//! handler. Responses are compressed when the client accepts gzip, the user agent is
//! not excluded, the body reaches the minimum entity size and its MIME type is allowed.

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use http::{
    header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT, VARY},
    HeaderMap, HeaderValue, StatusCode,
};
use http_body_util::{BodyExt, Full};
use log::debug;
use mime::Mime;

use crate::{
    config::GzipConfig,
    errors::DockyardError,
    server::handler::{error_response, BoxedHandler, Handler, HandlerFuture},
    Request, Response,
};

const GZIP: &str = "gzip";

pub struct GzipHandler {
    inner: BoxedHandler,
    config: GzipConfig,
}

impl GzipHandler {
    pub fn new(inner: BoxedHandler, config: GzipConfig) -> GzipHandler {
        GzipHandler { inner, config }
    }

    pub fn config(&self) -> &GzipConfig {
        &self.config
    }

    /// Whether the client side of the exchange allows a compressed response.
    fn client_accepts(&self, headers: &HeaderMap) -> bool {
        let accepts = headers
            .get_all(ACCEPT_ENCODING)
            .iter()
            .filter_map(|value| {
                value
                    .to_str()
                    .ok()
            })
            .flat_map(|value| value.split(','))
            .any(accepts_gzip);
        if !accepts {
            return false;
        }

        let agent = headers
            .get(USER_AGENT)
            .and_then(|agent| {
                agent
                    .to_str()
                    .ok()
            })
            .unwrap_or_default();
        !self
            .config
            .excluded_user_agents()
            .iter()
            .any(|excluded| agent.contains(excluded.as_str()))
    }

    /// Whether a response body of this type and size is worth compressing.
    pub fn should_compress(&self, content_type: Option<&str>, length: usize) -> bool {
        if length < self
            .config
            .minimum_entity_size()
        {
            return false;
        }

        let allowed = self
            .config
            .compressed_mime_types();
        if allowed.is_empty() {
            return true;
        }

        content_type
            .and_then(|content_type| {
                content_type
                    .parse::<Mime>()
                    .ok()
            })
            .map(|mime| allowed.contains(&mime.essence_str().to_ascii_lowercase()))
            .unwrap_or(false)
    }

    fn compress(&self, body: &[u8]) -> Result<Vec<u8>, DockyardError> {
        let mut encoder = GzEncoder::new(
            Vec::with_capacity(
                self.config
                    .buffer_size()
                    .min(body.len()),
            ),
            Compression::default(),
        );
        encoder
            .write_all(body)
            .map_err(|e| DockyardError::Handler(format!("gzip: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| DockyardError::Handler(format!("gzip: {}", e)))
    }
}

fn accepts_gzip(coding: &str) -> bool {
    let mut params = coding.split(';');
    let name = params
        .next()
        .unwrap_or_default()
        .trim();
    if !name.eq_ignore_ascii_case(GZIP) && name != "*" {
        return false;
    }

    // `gzip;q=0` explicitly refuses the coding.
    !params.any(|param| {
        param
            .trim()
            .strip_prefix("q=")
            .and_then(|q| {
                q.trim()
                    .parse::<f32>()
                    .ok()
            })
            .map(|q| q <= 0.0)
            .unwrap_or(false)
    })
}

fn inflate(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoded = Vec::new();
    GzDecoder::new(body).read_to_end(&mut decoded)?;
    Ok(decoded)
}

async fn collect(body: Full<Bytes>) -> Bytes {
    match body
        .collect()
        .await
    {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    }
}

impl Handler for GzipHandler {
    fn handle(&self, request: Request) -> HandlerFuture<'_> {
        Box::pin(async move {
            let (mut parts, body) = request.into_parts();

            let compressed_request = parts
                .headers
                .get(CONTENT_ENCODING)
                .map(|encoding| encoding.as_bytes().eq_ignore_ascii_case(GZIP.as_bytes()))
                .unwrap_or(false);

            let body = if compressed_request {
                let raw = collect(body).await;
                match inflate(&raw) {
                    Ok(decoded) => {
                        parts
                            .headers
                            .remove(CONTENT_ENCODING);
                        parts
                            .headers
                            .insert(CONTENT_LENGTH, HeaderValue::from(decoded.len()));
                        Full::new(Bytes::from(decoded))
                    }
                    Err(e) => {
                        debug!("Rejecting malformed gzip request body: {}", e);
                        return Ok(error_response(StatusCode::BAD_REQUEST));
                    }
                }
            } else {
                body
            };

            let client_accepts = self.client_accepts(&parts.headers);
            let response = self
                .inner
                .handle(Request::from_parts(parts, body))
                .await?;

            if response
                .headers()
                .contains_key(CONTENT_ENCODING)
            {
                return Ok(response);
            }

            let (mut parts, body) = response.into_parts();
            let body = collect(body).await;
            let content_type = parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|value| {
                    value
                        .to_str()
                        .ok()
                });

            if !self.should_compress(content_type, body.len()) {
                return Ok(Response::from_parts(parts, Full::new(body)));
            }

            parts
                .headers
                .append(VARY, HeaderValue::from_static("Accept-Encoding"));
            if !client_accepts {
                return Ok(Response::from_parts(parts, Full::new(body)));
            }

            let compressed = self.compress(&body)?;
            parts
                .headers
                .insert(CONTENT_ENCODING, HeaderValue::from_static(GZIP));
            parts
                .headers
                .insert(CONTENT_LENGTH, HeaderValue::from(compressed.len()));

            Ok(Response::from_parts(parts, Full::new(Bytes::from(compressed))))
        })
    }
}
