//! Human-readable sizes and durations used by configuration documents.
//!
//! Accepted forms are an integer followed by an optional unit, with or without a space:
//! `256B`, `16KiB`, `1 MiB`, `500ms`, `200s`, `2 minutes`. Bare numbers are bytes for
//! sizes and milliseconds for durations.

use std::{collections::BTreeSet, time::Duration};

use serde::{Deserialize, Deserializer};

use crate::errors::ConfigError;

#[derive(Deserialize)]
#[serde(untagged)]
enum Humanized {
    Number(u64),
    Text(String),
}

fn split_quantity(value: &str) -> Option<(u64, String)> {
    let value = value.trim();
    let digits = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (count, unit) = value.split_at(digits);
    let count = count.parse().ok()?;
    Some((count, unit.trim().to_ascii_lowercase()))
}

/// Parses a size literal into a number of bytes.
pub fn parse_size(value: &str) -> Result<usize, ConfigError> {
    let invalid = || ConfigError::Size(value.to_string());
    let (count, unit) = split_quantity(value).ok_or_else(invalid)?;

    let multiplier: u64 = match unit.as_str() {
        "" | "b" | "byte" | "bytes" => 1,
        "k" | "kb" | "kib" | "kilobyte" | "kilobytes" => 1 << 10,
        "m" | "mb" | "mib" | "megabyte" | "megabytes" => 1 << 20,
        "g" | "gb" | "gib" | "gigabyte" | "gigabytes" => 1 << 30,
        _ => return Err(invalid()),
    };

    count
        .checked_mul(multiplier)
        .and_then(|bytes| usize::try_from(bytes).ok())
        .ok_or_else(invalid)
}

/// Parses a duration literal.
pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::Duration(value.to_string());
    let (count, unit) = split_quantity(value).ok_or_else(invalid)?;

    let duration = match unit.as_str() {
        "ns" | "nanosecond" | "nanoseconds" => Duration::from_nanos(count),
        "us" | "microsecond" | "microseconds" => Duration::from_micros(count),
        "" | "ms" | "millisecond" | "milliseconds" => Duration::from_millis(count),
        "s" | "second" | "seconds" => Duration::from_secs(count),
        "m" | "minute" | "minutes" => Duration::from_secs(count.saturating_mul(60)),
        "h" | "hour" | "hours" => Duration::from_secs(count.saturating_mul(60 * 60)),
        "d" | "day" | "days" => Duration::from_secs(count.saturating_mul(24 * 60 * 60)),
        _ => return Err(invalid()),
    };

    Ok(duration)
}

pub(crate) mod size {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<usize, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Humanized::deserialize(deserializer)? {
            Humanized::Number(bytes) => usize::try_from(bytes).map_err(serde::de::Error::custom),
            Humanized::Text(text) => parse_size(&text).map_err(serde::de::Error::custom),
        }
    }
}

pub(crate) mod duration {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Humanized::deserialize(deserializer)? {
            Humanized::Number(millis) => Ok(Duration::from_millis(millis)),
            Humanized::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
        }
    }
}

pub(crate) mod option_duration {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Humanized>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Humanized::Number(millis)) => Ok(Some(Duration::from_millis(millis))),
            Some(Humanized::Text(text)) => parse_duration(&text)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// MIME types compare lowercased, however the document spells them.
pub(crate) mod mime_types {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .map(|mime_type| {
                mime_type
                    .trim()
                    .to_ascii_lowercase()
            })
            .collect())
    }
}
