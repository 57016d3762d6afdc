use std::time::SystemTime;

use http::{Method, StatusCode, Uri, Version};
use log::info;
use time::UtcOffset;

use crate::{
    config::RequestLogConfig,
    errors::ConfigError,
    utils::date::{format_ncsa, parse_offset},
};

/// One completed exchange, as recorded by the request log.
#[derive(Clone, Debug)]
pub struct RequestLogEntry {
    pub remote: Option<String>,
    pub user: Option<String>,
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub status: StatusCode,
    pub length: Option<usize>,
    pub at: SystemTime,
}

/// NCSA common log format writer.
#[derive(Clone, Debug)]
pub struct RequestLogHandler {
    name: String,
    target: String,
    offset: UtcOffset,
}

impl RequestLogHandler {
    pub fn new(config: &RequestLogConfig, name: &str) -> Result<RequestLogHandler, ConfigError> {
        Ok(RequestLogHandler {
            name: name.to_string(),
            target: config
                .target()
                .to_string(),
            offset: parse_offset(config.time_zone())?,
        })
    }

    /// Service the log belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    /// Formats `entry` as `host - user [date] "METHOD uri VERSION" status bytes`.
    pub fn format(&self, entry: &RequestLogEntry) -> String {
        format!(
            "{} - {} [{}] \"{} {} {:?}\" {} {}",
            entry
                .remote
                .as_deref()
                .unwrap_or("-"),
            entry
                .user
                .as_deref()
                .unwrap_or("-"),
            format_ncsa(entry.at, self.offset),
            entry.method,
            entry.uri,
            entry.version,
            entry
                .status
                .as_u16(),
            entry
                .length
                .map(|length| length.to_string())
                .unwrap_or_else(|| "-".to_string())
        )
    }

    pub fn log(&self, entry: &RequestLogEntry) {
        info!(target: self.target.as_str(), "{}", self.format(entry));
    }
}
