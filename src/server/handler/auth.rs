use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use http::{
    header::{AUTHORIZATION, WWW_AUTHENTICATE},
    HeaderValue, StatusCode,
};
use http_body_util::Full;
use log::debug;

use crate::{
    server::handler::{
        error_response, AdminCredentials, BoxedHandler, Handler, HandlerFuture, ADMIN_ROLE,
    },
    Request, Response,
};

/// Identity attached to a request that passed the Basic auth gate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Principal {
    name: String,
    role: &'static str,
}

impl Principal {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &str {
        self.role
    }
}

/// Basic auth gate guarding an inner handler with a single credential pair.
pub struct BasicAuthHandler {
    inner: BoxedHandler,
    credentials: AdminCredentials,
    realm: String,
}

impl BasicAuthHandler {
    pub fn new(inner: BoxedHandler, credentials: AdminCredentials, realm: &str) -> BasicAuthHandler {
        BasicAuthHandler { inner, credentials, realm: realm.to_string() }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    fn authenticate(&self, request: &Request) -> Option<Principal> {
        let header = request
            .headers()
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?;
        let (scheme, encoded) = header
            .trim()
            .split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        if username == self
            .credentials
            .username()
            && password
                == self
                    .credentials
                    .password()
        {
            Some(Principal { name: username.to_string(), role: ADMIN_ROLE })
        } else {
            None
        }
    }

    fn challenge(&self) -> Response {
        let mut response = error_response(StatusCode::UNAUTHORIZED);
        let challenge = format!("Basic realm=\"{}\"", self.realm);
        match HeaderValue::from_str(&challenge) {
            Ok(value) => {
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, value);
                response
            }
            Err(_) => {
                let mut response = Response::new(Full::new(Bytes::new()));
                *response.status_mut() = StatusCode::UNAUTHORIZED;
                response
            }
        }
    }
}

impl Handler for BasicAuthHandler {
    fn handle(&self, mut request: Request) -> HandlerFuture<'_> {
        Box::pin(async move {
            match self.authenticate(&request) {
                Some(principal) => {
                    request
                        .extensions_mut()
                        .insert(principal);
                    self.inner
                        .handle(request)
                        .await
                }
                None => {
                    debug!("Rejected unauthenticated request to {}", request.uri());
                    Ok(self.challenge())
                }
            }
        })
    }
}
