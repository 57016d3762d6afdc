use std::fmt;

use http::StatusCode;
use log::debug;
use radix_trie::{Trie, TrieCommon};

use crate::{
    server::handler::{error_response, BoxedHandler, Handler, HandlerFuture, Layer},
    Request,
};

/// Tag attached to every request dispatched through a tagging context.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestTag(String);

impl RequestTag {
    fn generate() -> RequestTag {
        RequestTag(format!("{:016x}", rand::random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path-mounted dispatch unit registry.
///
/// URL patterns follow the servlet convention: `/*` and `/api/*` match a path prefix
/// on segment boundaries, anything else matches exactly. The longest prefix wins.
pub struct DispatchContext {
    name: String,
    tag_requests: bool,
    exact: Trie<String, BoxedHandler>,
    prefixes: Trie<String, BoxedHandler>,
}

impl fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("name", &self.name)
            .field("tag_requests", &self.tag_requests)
            .field("patterns", &self.patterns())
            .finish()
    }
}

impl DispatchContext {
    pub fn new(name: &str) -> DispatchContext {
        DispatchContext {
            name: name.to_string(),
            tag_requests: false,
            exact: Trie::new(),
            prefixes: Trie::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mounts `handler` at `url_pattern`, replacing any handler already there.
    pub fn add_handler(&mut self, url_pattern: &str, handler: BoxedHandler) {
        match url_pattern.strip_suffix("/*") {
            Some(prefix) => {
                self.prefixes
                    .insert(format!("{}/", prefix), handler);
            }
            None => {
                self.exact
                    .insert(url_pattern.to_string(), handler);
            }
        }
        debug!("Mounted {} in context {}", url_pattern, self.name);
    }

    pub fn enable_request_tagging(&mut self) {
        self.tag_requests = true;
    }

    pub fn tags_requests(&self) -> bool {
        self.tag_requests
    }

    /// Mounted URL patterns, exact ones first.
    pub fn patterns(&self) -> Vec<String> {
        let exact = self
            .exact
            .keys()
            .cloned();
        let prefixes = self
            .prefixes
            .keys()
            .map(|prefix| format!("{}*", prefix));
        exact
            .chain(prefixes)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.exact
            .is_empty()
            && self
                .prefixes
                .is_empty()
    }

    pub(crate) fn layer(&self) -> Layer {
        Layer::Dispatch { context: self.name.clone() }
    }

    fn route(&self, path: &str) -> Option<&BoxedHandler> {
        let path = path.to_string();
        if let Some(handler) = self
            .exact
            .get(&path)
        {
            return Some(handler);
        }

        // `/api` must reach `/api/*`, `/apix` must not.
        let probe = if path.ends_with('/') { path } else { format!("{}/", path) };
        self.prefixes
            .get_ancestor_value(&probe)
    }
}

impl Handler for DispatchContext {
    fn handle(&self, mut request: Request) -> HandlerFuture<'_> {
        if self.tag_requests {
            let tag = RequestTag::generate();
            debug!("[{}] {} {}", tag, request.method(), request.uri());
            request
                .extensions_mut()
                .insert(tag);
        }

        let handler = self.route(
            request
                .uri()
                .path(),
        );

        Box::pin(async move {
            match handler {
                Some(handler) => {
                    handler
                        .handle(request)
                        .await
                }
                None => Ok(error_response(StatusCode::NOT_FOUND)),
            }
        })
    }
}
