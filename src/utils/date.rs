use std::time::SystemTime;

use time::{macros::format_description, OffsetDateTime, UtcOffset};

use crate::errors::ConfigError;

/// Formats a timestamp as an HTTP-date for the `Date` response header,
/// e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_date(date: SystemTime) -> String {
    OffsetDateTime::from(date)
        .to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
        ))
        .unwrap_or_default()
}

/// Formats a timestamp the way NCSA request logs expect, e.g. `10/Oct/2000:13:55:36 +0000`.
pub fn format_ncsa(date: SystemTime, offset: UtcOffset) -> String {
    OffsetDateTime::from(date)
        .to_offset(offset)
        .format(format_description!(
            "[day]/[month repr:short]/[year]:[hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
        ))
        .unwrap_or_default()
}

/// Parses `UTC`, `GMT`, `Z` or a `+HH:MM` / `-HH:MM` offset.
pub fn parse_offset(zone: &str) -> Result<UtcOffset, ConfigError> {
    let zone = zone.trim();
    if zone.eq_ignore_ascii_case("utc") || zone.eq_ignore_ascii_case("gmt") || zone == "Z" {
        return Ok(UtcOffset::UTC);
    }

    let invalid = || ConfigError::TimeZone(zone.to_string());

    let (sign, rest) = if let Some(rest) = zone.strip_prefix('+') {
        (1i8, rest)
    } else if let Some(rest) = zone.strip_prefix('-') {
        (-1i8, rest)
    } else {
        return Err(invalid());
    };
    let (hours, minutes) = rest
        .split_once(':')
        .ok_or_else(invalid)?;
    let hours: i8 = hours
        .parse()
        .map_err(|_| invalid())?;
    let minutes: i8 = minutes
        .parse()
        .map_err(|_| invalid())?;

    UtcOffset::from_hms(sign * hours, sign * minutes, 0).map_err(|_| invalid())
}
