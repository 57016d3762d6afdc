use std::{error::Error, sync::Arc};

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};

use crate::{
    errors::DockyardError,
    server::handler::{handler_fn, text_response, BoxedHandler},
    Request, Response,
};

fn request(uri: &str) -> Result<Request, http::Error> {
    http::Request::builder()
        .uri(uri)
        .body(Full::new(Bytes::new()))
}

async fn body_of(response: Response) -> Result<Bytes, Box<dyn Error>> {
    Ok(response
        .into_body()
        .collect()
        .await?
        .to_bytes())
}

fn named(name: &'static str) -> BoxedHandler {
    handler_fn(move |_request| async move { Ok(text_response(StatusCode::OK, "text/plain", name)) })
}

mod dispatch_context_tests {
    use super::*;
    use crate::server::handler::{
        context::{DispatchContext, RequestTag},
        Handler,
    };

    fn context() -> DispatchContext {
        let mut context = DispatchContext::new("application");
        context.add_handler("/*", named("root"));
        context.add_handler("/api/*", named("api"));
        context.add_handler("/ping", named("ping"));
        context
    }

    async fn route(context: &DispatchContext, uri: &str) -> Result<String, Box<dyn Error>> {
        let response = context
            .handle(request(uri)?)
            .await?;
        Ok(String::from_utf8(body_of(response).await?.to_vec())?)
    }

    #[tokio::test]
    async fn test_longest_prefix_wins() -> Result<(), Box<dyn Error>> {
        let context = context();
        assert_eq!(route(&context, "/api").await?, "api");
        assert_eq!(route(&context, "/api/").await?, "api");
        assert_eq!(route(&context, "/api/orders/1").await?, "api");
        assert_eq!(route(&context, "/apix").await?, "root");
        assert_eq!(route(&context, "/").await?, "root");
        Ok(())
    }

    #[tokio::test]
    async fn test_exact_pattern() -> Result<(), Box<dyn Error>> {
        let context = context();
        assert_eq!(route(&context, "/ping").await?, "ping");
        assert_eq!(route(&context, "/ping/more").await?, "root");
        Ok(())
    }

    #[tokio::test]
    async fn test_unmatched_path() -> Result<(), Box<dyn Error>> {
        let mut context = DispatchContext::new("application");
        context.add_handler("/api/*", named("api"));

        let response = context
            .handle(request("/other")?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await?, "404 Not Found");
        Ok(())
    }

    #[test]
    fn test_patterns() {
        let context = context();
        assert_eq!(context.patterns(), vec!["/ping", "/*", "/api/*"]);
        assert!(!context.is_empty());
        assert!(DispatchContext::new("empty").is_empty());
    }

    #[tokio::test]
    async fn test_request_tagging() -> Result<(), Box<dyn Error>> {
        let tagged = handler_fn(|request: Request| async move {
            let body = match request
                .extensions()
                .get::<RequestTag>()
            {
                Some(tag) if tag.as_str().len() == 16 => "tagged",
                _ => "untagged",
            };
            Ok(text_response(StatusCode::OK, "text/plain", body))
        });

        let mut context = DispatchContext::new("application");
        context.add_handler("/*", tagged);
        assert_eq!(route(&context, "/").await?, "untagged");

        context.enable_request_tagging();
        assert!(context.tags_requests());
        assert_eq!(route(&context, "/").await?, "tagged");
        Ok(())
    }
}

mod instrumented_tests {
    use super::*;
    use crate::server::handler::{
        instrumented::{InstrumentedHandler, RequestMetrics},
        Handler,
    };

    #[tokio::test]
    async fn test_instrumentation_counts_status_classes() -> Result<(), Box<dyn Error>> {
        let metrics = Arc::new(RequestMetrics::new());
        let inner = handler_fn(|request: Request| async move {
            match request
                .uri()
                .path()
            {
                "/missing" => Ok(text_response(StatusCode::NOT_FOUND, "text/plain", "")),
                "/broken" => Err(DockyardError::Handler("broken".to_string())),
                _ => Ok(text_response(StatusCode::OK, "text/plain", "ok")),
            }
        });
        let handler = InstrumentedHandler::new(inner, metrics.clone());

        let response = handler
            .handle(request("/")?)
            .await?;
        assert_eq!(body_of(response).await?, "ok");
        handler
            .handle(request("/")?)
            .await?;
        handler
            .handle(request("/missing")?)
            .await?;
        assert!(handler
            .handle(request("/broken")?)
            .await
            .is_err());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests, 4);
        assert_eq!(snapshot.active, 0);
        assert_eq!(snapshot.successful, 2);
        assert_eq!(snapshot.client_errors, 1);
        assert_eq!(snapshot.server_errors, 0);
        assert_eq!(snapshot.failures, 1);
        Ok(())
    }
}

#[cfg(feature = "gzip")]
mod gzip_tests {
    use std::io::{Read, Write};

    use flate2::{read::GzDecoder, write::GzEncoder, Compression};
    use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT, VARY};

    use super::*;
    use crate::{
        config::GzipConfig,
        server::handler::{gzip::GzipHandler, Handler},
    };

    fn sized(length: usize, content_type: &'static str) -> BoxedHandler {
        handler_fn(move |_request| async move {
            Ok(text_response(StatusCode::OK, content_type, vec![b'a'; length]))
        })
    }

    fn gzip_request(uri: &str, agent: Option<&str>) -> Result<Request, http::Error> {
        let mut builder = http::Request::builder()
            .uri(uri)
            .header(ACCEPT_ENCODING, "gzip, deflate");
        if let Some(agent) = agent {
            builder = builder.header(USER_AGENT, agent);
        }
        builder.body(Full::new(Bytes::new()))
    }

    fn gunzip(body: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        let mut decoded = Vec::new();
        GzDecoder::new(body).read_to_end(&mut decoded)?;
        Ok(decoded)
    }

    #[tokio::test]
    async fn test_below_minimum_is_not_compressed() -> Result<(), Box<dyn Error>> {
        let handler = GzipHandler::new(sized(255, "text/plain"), GzipConfig::default());

        let response = handler
            .handle(gzip_request("/", None)?)
            .await?;
        assert!(!response
            .headers()
            .contains_key(CONTENT_ENCODING));
        assert_eq!(
            body_of(response)
                .await?
                .len(),
            255
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_at_minimum_is_compressed() -> Result<(), Box<dyn Error>> {
        let handler = GzipHandler::new(sized(256, "text/plain"), GzipConfig::default());

        let response = handler
            .handle(gzip_request("/", None)?)
            .await?;
        assert_eq!(
            response
                .headers()
                .get(CONTENT_ENCODING),
            Some(&http::HeaderValue::from_static("gzip"))
        );
        assert_eq!(
            response
                .headers()
                .get(VARY),
            Some(&http::HeaderValue::from_static("Accept-Encoding"))
        );
        let body = body_of(response).await?;
        assert_eq!(gunzip(&body)?, vec![b'a'; 256]);
        Ok(())
    }

    #[tokio::test]
    async fn test_mime_type_not_in_allowlist() -> Result<(), Box<dyn Error>> {
        let config = GzipConfig::builder()
            .compress_mime_type("text/html")
            .build();

        let handler = GzipHandler::new(sized(4096, "text/plain"), config.clone());
        let response = handler
            .handle(gzip_request("/", None)?)
            .await?;
        assert!(!response
            .headers()
            .contains_key(CONTENT_ENCODING));

        let handler = GzipHandler::new(sized(4096, "text/html; charset=utf-8"), config);
        let response = handler
            .handle(gzip_request("/", None)?)
            .await?;
        assert!(response
            .headers()
            .contains_key(CONTENT_ENCODING));
        Ok(())
    }

    #[tokio::test]
    async fn test_allowlist_loaded_from_yaml() -> Result<(), Box<dyn Error>> {
        let config = crate::config::ServerConfig::from_yaml_str(
            "gzip:\n  compressed_mime_types: [\"Text/HTML\"]\n",
        )?;

        let handler = GzipHandler::new(
            sized(1024, "text/html"),
            config
                .gzip()
                .clone(),
        );
        let response = handler
            .handle(gzip_request("/", None)?)
            .await?;
        assert_eq!(
            response
                .headers()
                .get(CONTENT_ENCODING),
            Some(&http::HeaderValue::from_static("gzip"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_excluded_user_agent() -> Result<(), Box<dyn Error>> {
        let config = GzipConfig::builder()
            .exclude_user_agent("MSIE 6")
            .build();
        let handler = GzipHandler::new(sized(4096, "text/plain"), config);

        let response = handler
            .handle(gzip_request("/", Some("Mozilla/4.0 (compatible; MSIE 6.0; Windows NT 5.1)"))?)
            .await?;
        assert!(!response
            .headers()
            .contains_key(CONTENT_ENCODING));

        let response = handler
            .handle(gzip_request("/", Some("curl/8.0"))?)
            .await?;
        assert!(response
            .headers()
            .contains_key(CONTENT_ENCODING));
        Ok(())
    }

    #[tokio::test]
    async fn test_client_without_gzip() -> Result<(), Box<dyn Error>> {
        let handler = GzipHandler::new(sized(4096, "text/plain"), GzipConfig::default());

        let response = handler
            .handle(request("/")?)
            .await?;
        assert!(!response
            .headers()
            .contains_key(CONTENT_ENCODING));

        let refused = http::Request::builder()
            .uri("/")
            .header(ACCEPT_ENCODING, "gzip;q=0, identity")
            .body(Full::new(Bytes::new()))?;
        let response = handler
            .handle(refused)
            .await?;
        assert!(!response
            .headers()
            .contains_key(CONTENT_ENCODING));
        Ok(())
    }

    #[tokio::test]
    async fn test_compressed_request_is_inflated() -> Result<(), Box<dyn Error>> {
        let echo = handler_fn(|request: Request| async move {
            let body = match request
                .into_body()
                .collect()
                .await
            {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };
            Ok(text_response(StatusCode::OK, "application/octet-stream", body))
        });
        let handler = GzipHandler::new(echo, GzipConfig::default());

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello, gzip")?;
        let compressed = encoder.finish()?;

        let request = http::Request::builder()
            .uri("/")
            .header(CONTENT_ENCODING, "gzip")
            .header(CONTENT_TYPE, "text/plain")
            .body(Full::new(Bytes::from(compressed)))?;
        let response = handler
            .handle(request)
            .await?;
        assert_eq!(body_of(response).await?, "hello, gzip");
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_compressed_request() -> Result<(), Box<dyn Error>> {
        let handler = GzipHandler::new(named("unreachable"), GzipConfig::default());

        let request = http::Request::builder()
            .uri("/")
            .header(CONTENT_ENCODING, "gzip")
            .body(Full::new(Bytes::from_static(b"not gzip at all")))?;
        let response = handler
            .handle(request)
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}

#[cfg(feature = "auth")]
mod basic_auth_tests {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use http::header::{AUTHORIZATION, WWW_AUTHENTICATE};

    use super::*;
    use crate::{
        config::ServerConfig,
        server::handler::{
            auth::{BasicAuthHandler, Principal},
            AdminCredentials, Handler,
        },
    };

    fn guarded() -> BasicAuthHandler {
        let inner = handler_fn(|request: Request| async move {
            let role = request
                .extensions()
                .get::<Principal>()
                .map(|principal| principal.role().to_string())
                .unwrap_or_default();
            Ok(text_response(StatusCode::OK, "text/plain", role))
        });
        BasicAuthHandler::new(inner, AdminCredentials::new("admin", "secret"), "admin")
    }

    fn authorized(user: &str, password: &str) -> Result<Request, http::Error> {
        let token = STANDARD.encode(format!("{}:{}", user, password));
        http::Request::builder()
            .uri("/")
            .header(AUTHORIZATION, format!("Basic {}", token))
            .body(Full::new(Bytes::new()))
    }

    #[tokio::test]
    async fn test_missing_credentials_are_challenged() -> Result<(), Box<dyn Error>> {
        let response = guarded()
            .handle(request("/")?)
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get(WWW_AUTHENTICATE),
            Some(&http::HeaderValue::from_static("Basic realm=\"admin\""))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_valid_credentials_pass_with_user_role() -> Result<(), Box<dyn Error>> {
        let response = guarded()
            .handle(authorized("admin", "secret")?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await?, "user");
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() -> Result<(), Box<dyn Error>> {
        let response = guarded()
            .handle(authorized("admin", "guess")?)
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[test]
    fn test_credentials_from_config() -> Result<(), Box<dyn Error>> {
        let config = ServerConfig::default();
        assert_eq!(AdminCredentials::from_config(&config), None);

        let config = ServerConfig::builder()
            .admin_username("ops")
            .build()?;
        assert_eq!(AdminCredentials::from_config(&config), Some(AdminCredentials::new("ops", "")));

        let config = ServerConfig::builder()
            .admin_password("secret")
            .build()?;
        assert_eq!(AdminCredentials::from_config(&config), Some(AdminCredentials::new("", "secret")));

        let config = ServerConfig::builder()
            .admin_username("")
            .admin_password("")
            .build()?;
        assert_eq!(AdminCredentials::from_config(&config), None);
        Ok(())
    }
}

mod admin_tests {
    use super::*;
    use crate::{
        health::{HealthCheck, HealthCheckRegistry, HealthResult},
        server::handler::{admin::AdminHandler, instrumented::RequestMetrics, Handler},
    };

    struct Failing;

    impl HealthCheck for Failing {
        fn name(&self) -> &str {
            "db"
        }

        fn check(&self) -> HealthResult {
            HealthResult::unhealthy("connection refused")
        }
    }

    fn admin(registry: Arc<HealthCheckRegistry>) -> AdminHandler {
        AdminHandler::new("orders", registry, Arc::new(RequestMetrics::new()))
    }

    #[tokio::test]
    async fn test_ping_and_index() -> Result<(), Box<dyn Error>> {
        let handler = admin(Arc::new(HealthCheckRegistry::new()));

        let response = handler
            .handle(request("/ping")?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await?, "pong\n");

        let response = handler
            .handle(request("/")?)
            .await?;
        let body = String::from_utf8(body_of(response).await?.to_vec())?;
        assert!(body.contains("orders operational menu"));
        assert!(body.contains("healthcheck"));

        let response = handler
            .handle(request("/threads")?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_healthcheck_status() -> Result<(), Box<dyn Error>> {
        let registry = Arc::new(HealthCheckRegistry::new());
        let handler = admin(registry.clone());

        let response = handler
            .handle(request("/healthcheck")?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);

        registry.register(Box::new(crate::health::ThreadLivenessCheck::new()));
        let response = handler
            .handle(request("/healthcheck")?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = String::from_utf8(body_of(response).await?.to_vec())?;
        assert_eq!(body, r#"{"deadlocks":{"healthy":true}}"#);

        registry.register(Box::new(Failing));
        let response = handler
            .handle(request("/healthcheck")?)
            .await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = String::from_utf8(body_of(response).await?.to_vec())?;
        assert!(body.contains(r#""db":{"healthy":false,"message":"connection refused"}"#));
        Ok(())
    }

    #[tokio::test]
    async fn test_metrics() -> Result<(), Box<dyn Error>> {
        let handler = admin(Arc::new(HealthCheckRegistry::new()));

        let response = handler
            .handle(request("/metrics")?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = String::from_utf8(body_of(response).await?.to_vec())?;
        assert!(body.contains(r#""requests":0"#));
        assert!(body.contains(r#""2xx-responses":0"#));
        Ok(())
    }
}

mod request_log_tests {
    use std::time::UNIX_EPOCH;

    use http::{Method, Version};

    use super::*;
    use crate::{
        config::RequestLogConfig,
        errors::ConfigError,
        server::handler::request_log::{RequestLogEntry, RequestLogHandler},
    };

    fn entry() -> Result<RequestLogEntry, Box<dyn Error>> {
        Ok(RequestLogEntry {
            remote: Some("10.0.0.7".to_string()),
            user: None,
            method: Method::GET,
            uri: "/orders?page=2".parse()?,
            version: Version::HTTP_11,
            status: StatusCode::OK,
            length: Some(42),
            at: UNIX_EPOCH,
        })
    }

    #[test]
    fn test_ncsa_format() -> Result<(), Box<dyn Error>> {
        let handler = RequestLogHandler::new(&RequestLogConfig::default(), "orders")?;
        assert_eq!(handler.name(), "orders");
        assert_eq!(handler.target(), "http.request");
        assert_eq!(
            handler.format(&entry()?),
            r#"10.0.0.7 - - [01/Jan/1970:00:00:00 +0000] "GET /orders?page=2 HTTP/1.1" 200 42"#
        );
        Ok(())
    }

    #[test]
    fn test_ncsa_format_with_offset() -> Result<(), Box<dyn Error>> {
        let config = RequestLogConfig::builder()
            .enabled(true)
            .time_zone("+02:00")
            .build();
        let handler = RequestLogHandler::new(&config, "orders")?;

        let mut entry = entry()?;
        entry.remote = None;
        entry.length = None;
        assert_eq!(
            handler.format(&entry),
            r#"- - - [01/Jan/1970:02:00:00 +0200] "GET /orders?page=2 HTTP/1.1" 200 -"#
        );
        Ok(())
    }

    #[test]
    fn test_invalid_time_zone() {
        let config = RequestLogConfig::builder()
            .time_zone("Mars/Olympus")
            .build();
        assert!(matches!(
            RequestLogHandler::new(&config, "orders"),
            Err(ConfigError::TimeZone(_))
        ));
    }
}
