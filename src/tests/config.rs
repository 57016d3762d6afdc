use std::{error::Error, str::FromStr, time::Duration};

use crate::{
    config::{ClientAuth, GzipConfig, ServerConfig, TlsConfig, TransportType, UNSET_SSL_PORT},
    errors::{ConfigError, DockyardError},
};

mod server_config_tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.port(), 8080);
        assert_eq!(config.admin_port(), 8081);
        assert_eq!(config.ssl_port(), UNSET_SSL_PORT);
        assert_eq!(config.connector_type(), TransportType::Blocking);
        assert_eq!(config.ssl_connector_type(), TransportType::NonBlockingTls);
        assert_eq!(config.bind_host(), None);
        assert_eq!(config.max_idle_time(), Duration::from_secs(200));
        assert_eq!(config.request_buffer_size(), 16 * 1024);
        assert_eq!(config.response_buffer_size(), 32 * 1024);
        assert_eq!(config.so_linger_time(), None);
        assert_eq!(config.min_threads(), 8);
        assert_eq!(config.max_threads(), 1024);
        assert_eq!(config.shutdown_grace_period(), Duration::from_secs(2));
        assert!(config.date_header());
        assert!(!config.server_header());
        assert!(config.ssl().is_none());
        assert!(config
            .gzip()
            .enabled());
        assert!(!config
            .request_log()
            .enabled());
    }

    #[test]
    fn test_server_config_builder() -> Result<(), Box<dyn Error>> {
        let config = ServerConfig::builder()
            .port(9000)
            .admin_port(0)
            .bind_host("127.0.0.1")
            .connector_type(TransportType::NonBlocking)
            .so_linger_time(Duration::from_millis(500))
            .build()?;

        assert_eq!(config.port(), 9000);
        assert_eq!(config.admin_port(), 0);
        assert_eq!(config.bind_host(), Some("127.0.0.1"));
        assert_eq!(config.connector_type(), TransportType::NonBlocking);
        assert_eq!(config.so_linger_time(), Some(Duration::from_millis(500)));
        Ok(())
    }

    #[test]
    fn test_server_config_rejects_inverted_thread_bounds() {
        let result = ServerConfig::builder()
            .min_threads(10)
            .max_threads(2)
            .build();
        assert_eq!(result.err(), Some(DockyardError::Config(ConfigError::ThreadBounds { min: 10, max: 2 })));
    }

    #[test]
    fn test_server_config_from_empty_yaml() -> Result<(), Box<dyn Error>> {
        let config = ServerConfig::from_yaml_str("{}")?;
        assert_eq!(config, ServerConfig::default());
        Ok(())
    }

    #[test]
    fn test_server_config_from_yaml() -> Result<(), Box<dyn Error>> {
        let config = ServerConfig::from_yaml_str(
            r#"
port: 9090
admin_port: 9090
connector_type: nonblocking
ssl_connector_type: legacy+ssl
max_idle_time: 30s
low_resources_max_idle_time: 1500
request_buffer_size: 32KiB
response_header_buffer_size: 512
so_linger_time: 500ms
admin_username: ops
gzip:
  minimum_entity_size: 1KiB
  compressed_mime_types: [text/html]
request_log:
  enabled: true
  time_zone: "+02:00"
ssl:
  key_store: /etc/dockyard/keys.jks
  key_store_password: secret
  client_auth: need
"#,
        )?;

        assert_eq!(config.port(), 9090);
        assert_eq!(config.admin_port(), 9090);
        assert_eq!(config.connector_type(), TransportType::NonBlocking);
        assert_eq!(config.ssl_connector_type(), TransportType::LegacyTls);
        assert_eq!(config.max_idle_time(), Duration::from_secs(30));
        assert_eq!(config.low_resources_max_idle_time(), Duration::from_millis(1500));
        assert_eq!(config.request_buffer_size(), 32 * 1024);
        assert_eq!(config.response_header_buffer_size(), 512);
        assert_eq!(config.so_linger_time(), Some(Duration::from_millis(500)));
        assert_eq!(config.admin_username(), Some("ops"));
        assert_eq!(config.admin_password(), None);
        assert_eq!(
            config
                .gzip()
                .minimum_entity_size(),
            1024
        );
        assert!(config
            .gzip()
            .compressed_mime_types()
            .contains("text/html"));
        assert!(config
            .request_log()
            .enabled());
        assert_eq!(
            config
                .request_log()
                .time_zone(),
            "+02:00"
        );

        let ssl = config
            .ssl()
            .ok_or("ssl section missing")?;
        assert_eq!(ssl.key_store_password(), Some("secret"));
        assert_eq!(ssl.key_store_type(), "JKS");
        assert_eq!(ssl.trust_store_type(), "JKS");
        assert_eq!(ssl.need_client_auth(), Some(true));
        assert_eq!(ssl.want_client_auth(), Some(false));
        Ok(())
    }

    #[test]
    fn test_server_config_from_yaml_with_unknown_transport() {
        let result = ServerConfig::from_yaml_str("connector_type: quantum\n");
        assert!(matches!(result, Err(DockyardError::Config(ConfigError::Parse(_)))));
    }

    #[test]
    fn test_server_config_from_yaml_with_bad_size() {
        let result = ServerConfig::from_yaml_str("request_buffer_size: 12 parsecs\n");
        assert!(matches!(result, Err(DockyardError::Config(ConfigError::Parse(_)))));
    }

    #[test]
    fn test_server_config_from_missing_file() {
        let result = ServerConfig::from_file("/nonexistent/dockyard.yml");
        assert!(matches!(result, Err(DockyardError::Io(_))));
    }
}

mod transport_type_tests {
    use super::*;

    #[test]
    fn test_transport_type_from_str() -> Result<(), Box<dyn Error>> {
        assert_eq!(TransportType::from_str("blocking")?, TransportType::Blocking);
        assert_eq!(TransportType::from_str("legacy")?, TransportType::Legacy);
        assert_eq!(TransportType::from_str("LEGACY+TLS")?, TransportType::LegacyTls);
        assert_eq!(TransportType::from_str("legacy+ssl")?, TransportType::LegacyTls);
        assert_eq!(TransportType::from_str("nonblocking")?, TransportType::NonBlocking);
        assert_eq!(TransportType::from_str(" nonblocking+ssl ")?, TransportType::NonBlockingTls);
        Ok(())
    }

    #[test]
    fn test_transport_type_rejects_unknown_name() {
        assert_eq!(
            TransportType::from_str("quantum"),
            Err(ConfigError::UnknownTransport("quantum".to_string()))
        );
    }

    #[test]
    fn test_transport_type_display_round_trips() -> Result<(), Box<dyn Error>> {
        for transport in TransportType::ALL {
            assert_eq!(TransportType::from_str(&transport.to_string())?, transport);
        }
        Ok(())
    }

    #[test]
    fn test_transport_type_flags() {
        let tls: Vec<_> = TransportType::ALL
            .into_iter()
            .filter(TransportType::is_tls)
            .collect();
        assert_eq!(tls, vec![TransportType::LegacyTls, TransportType::NonBlockingTls]);

        let non_blocking: Vec<_> = TransportType::ALL
            .into_iter()
            .filter(TransportType::is_non_blocking)
            .collect();
        assert_eq!(non_blocking, vec![TransportType::NonBlocking, TransportType::NonBlockingTls]);
    }
}

mod tls_config_tests {
    use super::*;

    #[test]
    fn test_tls_config_default_store_types() {
        let config = TlsConfig::default();
        assert_eq!(config.key_store_type(), "JKS");
        assert_eq!(config.trust_store_type(), "JKS");
        assert_eq!(config.need_client_auth(), None);
        assert_eq!(config.want_client_auth(), None);
    }

    #[test]
    fn test_tls_config_client_auth_mode() {
        let config = TlsConfig::builder()
            .client_auth(ClientAuth::Want)
            .build();
        assert_eq!(config.need_client_auth(), Some(false));
        assert_eq!(config.want_client_auth(), Some(true));
    }

    #[test]
    fn test_tls_config_explicit_flag_wins_over_mode() {
        let config = TlsConfig::builder()
            .client_auth(ClientAuth::None)
            .need_client_auth(true)
            .build();
        assert_eq!(config.need_client_auth(), Some(true));
        assert_eq!(config.want_client_auth(), Some(false));
    }
}

mod gzip_config_tests {
    use super::*;

    #[test]
    fn test_gzip_config_builder() {
        let config = GzipConfig::builder()
            .minimum_entity_size(1024)
            .exclude_user_agent("MSIE 6")
            .compress_mime_type("Text/HTML")
            .build();

        assert!(config.enabled());
        assert_eq!(config.minimum_entity_size(), 1024);
        assert_eq!(config.buffer_size(), 8 * 1024);
        assert!(config
            .excluded_user_agents()
            .contains("MSIE 6"));
        assert!(config
            .compressed_mime_types()
            .contains("text/html"));
    }

    #[test]
    fn test_gzip_mime_types_from_yaml_are_lowercased() -> Result<(), Box<dyn Error>> {
        let loaded = ServerConfig::from_yaml_str(
            "gzip:\n  compressed_mime_types: [\"Text/HTML\", \" Application/JSON \"]\n",
        )?;
        let built = GzipConfig::builder()
            .compress_mime_type("Text/HTML")
            .compress_mime_type(" Application/JSON ")
            .build();

        let expected = ["application/json".to_string(), "text/html".to_string()];
        assert!(loaded
            .gzip()
            .compressed_mime_types()
            .iter()
            .eq(expected.iter()));
        assert_eq!(loaded.gzip(), &built);
        Ok(())
    }
}

mod units_tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use time::UtcOffset;

    use super::*;
    use crate::utils::{
        date::{format_date, format_ncsa, parse_offset},
        units::{parse_duration, parse_size},
    };

    #[test]
    fn test_parse_size() -> Result<(), Box<dyn Error>> {
        assert_eq!(parse_size("256B")?, 256);
        assert_eq!(parse_size("12")?, 12);
        assert_eq!(parse_size("16KiB")?, 16 * 1024);
        assert_eq!(parse_size("8 kb")?, 8 * 1024);
        assert_eq!(parse_size("1 MiB")?, 1024 * 1024);
        assert_eq!(parse_size("abc"), Err(ConfigError::Size("abc".to_string())));
        assert_eq!(parse_size("5XB"), Err(ConfigError::Size("5XB".to_string())));
        Ok(())
    }

    #[test]
    fn test_parse_duration() -> Result<(), Box<dyn Error>> {
        assert_eq!(parse_duration("200s")?, Duration::from_secs(200));
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("10")?, Duration::from_millis(10));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        assert_eq!(parse_duration("2 minutes")?, Duration::from_secs(120));
        assert_eq!(parse_duration("1h")?, Duration::from_secs(3600));
        assert_eq!(parse_duration("3 weeks"), Err(ConfigError::Duration("3 weeks".to_string())));
        Ok(())
    }

    #[test]
    fn test_parse_offset() -> Result<(), Box<dyn Error>> {
        assert_eq!(parse_offset("UTC")?, UtcOffset::UTC);
        assert_eq!(parse_offset("gmt")?, UtcOffset::UTC);
        assert_eq!(parse_offset("+02:00")?, UtcOffset::from_hms(2, 0, 0)?);
        assert_eq!(parse_offset("-05:30")?, UtcOffset::from_hms(-5, -30, 0)?);
        assert_eq!(parse_offset("CET"), Err(ConfigError::TimeZone("CET".to_string())));
        Ok(())
    }

    #[test]
    fn test_format_dates() -> Result<(), Box<dyn Error>> {
        let epoch: SystemTime = UNIX_EPOCH;
        assert_eq!(format_date(epoch), "Thu, 01 Jan 1970 00:00:00 GMT");
        assert_eq!(
            format_date(epoch + std::time::Duration::from_secs(784_111_777)),
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
        assert_eq!(format_ncsa(epoch, UtcOffset::UTC), "01/Jan/1970:00:00:00 +0000");
        assert_eq!(format_ncsa(epoch, UtcOffset::from_hms(2, 0, 0)?), "01/Jan/1970:02:00:00 +0200");
        Ok(())
    }
}
