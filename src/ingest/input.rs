//! Text input conversion for routing columns.
//!
//! Only the fields a distribution key or partition selector reads are
//! converted; everything else stays raw text.

use std::net::IpAddr;

use bytes::Bytes;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use uuid::Uuid;

use crate::error::{Result, RouteError};
use crate::types::datum::{BitString, Inet, Tid, TimeTz};
use crate::types::{Datum, Numeric, TypeFamily};

/// `num_days_from_ce` of 2000-01-01, the epoch of date and timestamp values
const EPOCH_DAYS_FROM_CE: i32 = 730_120;
/// 2000-01-01 00:00:00 UTC in Unix microseconds
const EPOCH_UNIX_MICROS: i64 = 946_684_800_000_000;

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const TIMESTAMPTZ_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

/// Convert one text field into the datum `family` hashes.
pub fn parse_text(family: TypeFamily, raw: &Bytes) -> Result<Datum> {
    use TypeFamily as T;

    let invalid = || RouteError::invalid_input(family, raw);

    // Character payloads are hashed as given
    match family {
        T::BpChar | T::Text | T::VarChar | T::Name => return Ok(Datum::Text(raw.clone())),
        T::Bytea => return parse_bytea(raw).ok_or_else(invalid),
        T::Char => return Ok(Datum::Char(raw.first().copied().unwrap_or(0))),
        _ => {}
    }

    let text = std::str::from_utf8(raw).map_err(|_| invalid())?.trim();
    let datum = match family {
        T::Int2 => text.parse().map(Datum::Int2).ok(),
        T::Int4 => text.parse().map(Datum::Int4).ok(),
        T::Int8 => text.parse().map(Datum::Int8).ok(),
        // Enum labels are resolved by the caller; only their oids are accepted here
        T::Oid
        | T::RegProc
        | T::RegProcedure
        | T::RegOper
        | T::RegOperator
        | T::RegClass
        | T::RegType
        | T::Enum => text.parse().map(Datum::Oid).ok(),
        T::Float4 => text.parse().map(Datum::Float4).ok(),
        T::Float8 => text.parse().map(Datum::Float8).ok(),
        T::Numeric => Some(Datum::Numeric(text.parse::<Numeric>()?)),
        T::Cash => parse_cash(text).map(Datum::Cash),
        T::Bool => parse_bool(text).map(Datum::Bool),
        T::Tid => parse_tid(text).map(Datum::Tid),
        T::OidVector => text
            .split_whitespace()
            .map(str::parse)
            .collect::<std::result::Result<Vec<u32>, _>>()
            .ok()
            .map(Datum::OidVector),
        T::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .map(|d| Datum::Date(d.num_days_from_ce() - EPOCH_DAYS_FROM_CE)),
        T::Time => parse_time(text).map(Datum::Time),
        T::TimeTz => parse_timetz(text).map(Datum::TimeTz),
        T::Timestamp => parse_timestamp(text).map(Datum::Timestamp),
        T::TimestampTz => parse_timestamptz(text).map(Datum::Timestamp),
        T::Inet => parse_inet(text, false).map(Datum::Inet),
        T::Cidr => parse_inet(text, true).map(Datum::Inet),
        T::MacAddr => parse_macaddr(text).map(Datum::MacAddr),
        T::Bit | T::VarBit => parse_bits(text).map(Datum::Bits),
        T::Uuid => Uuid::parse_str(text).ok().map(Datum::Uuid),
        // No text form handled here; these arrive already converted
        T::Complex
        | T::Interval
        | T::AbsTime
        | T::RelTime
        | T::TInterval
        | T::Array
        | T::BpChar
        | T::Text
        | T::VarChar
        | T::Name
        | T::Bytea
        | T::Char => None,
    };
    datum.ok_or_else(invalid)
}

fn parse_bytea(raw: &Bytes) -> Option<Datum> {
    match raw.strip_prefix(b"\\x") {
        Some(hex_digits) => hex::decode(hex_digits).ok().map(|v| Datum::Text(Bytes::from(v))),
        None => Some(Datum::Text(raw.clone())),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Some(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Cents, rounding half away from zero past the second fraction digit.
fn parse_cash(text: &str) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let body: String = body
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body.as_str(), ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut cents: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse::<i64>().ok()?.checked_mul(100)?
    };
    let frac = frac_part.as_bytes();
    for (i, scale) in [10i64, 1].iter().enumerate() {
        if let Some(d) = frac.get(i) {
            cents = cents.checked_add((d - b'0') as i64 * scale)?;
        }
    }
    if frac.get(2).is_some_and(|d| *d >= b'5') {
        cents = cents.checked_add(1)?;
    }
    Some(if negative { -cents } else { cents })
}

fn parse_tid(text: &str) -> Option<Tid> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;
    let (block, offset) = inner.split_once(',')?;
    Some(Tid {
        block: block.trim().parse().ok()?,
        offset: offset.trim().parse().ok()?,
    })
}

fn time_micros(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64 * 1_000_000 + (time.nanosecond() / 1_000) as i64
}

fn parse_time(text: &str) -> Option<i64> {
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
        .map(time_micros)
}

fn parse_timetz(text: &str) -> Option<TimeTz> {
    let split = text.rfind(['+', '-']).filter(|pos| *pos > 0)?;
    let (time, zone) = text.split_at(split);
    let sign = if zone.starts_with('-') { -1 } else { 1 };
    let zone = &zone[1..];
    let (hours, minutes) = zone.split_once(':').unwrap_or((zone, "0"));
    let east = sign * (hours.parse::<i32>().ok()? * 3600 + minutes.parse::<i32>().ok()? * 60);
    Some(TimeTz {
        micros: parse_time(time.trim())?,
        zone: -east,
    })
}

fn parse_timestamp(text: &str) -> Option<i64> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|dt| dt.and_utc().timestamp_micros() - EPOCH_UNIX_MICROS)
}

/// Normalized to UTC; a value without a zone is taken as UTC.
fn parse_timestamptz(text: &str) -> Option<i64> {
    TIMESTAMPTZ_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(text, format).ok())
        .map(|dt| dt.timestamp_micros() - EPOCH_UNIX_MICROS)
        .or_else(|| parse_timestamp(text))
}

fn parse_inet(text: &str, is_cidr: bool) -> Option<Inet> {
    let (addr, bits) = match text.split_once('/') {
        Some((addr, bits)) => (addr, Some(bits.parse::<u8>().ok()?)),
        None => (text, None),
    };
    let inet = match addr.parse::<IpAddr>().ok()? {
        IpAddr::V4(v4) => {
            let bits = bits.unwrap_or(32);
            if bits > 32 {
                return None;
            }
            Inet::v4(v4.octets(), bits)
        }
        IpAddr::V6(v6) => {
            let bits = bits.unwrap_or(128);
            if bits > 128 {
                return None;
            }
            Inet::v6(v6.octets(), bits)
        }
    };
    Some(if is_cidr { inet.as_cidr() } else { inet })
}

fn parse_macaddr(text: &str) -> Option<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut parts = text.split([':', '-']);
    for byte in mac.iter_mut() {
        *byte = u8::from_str_radix(parts.next()?, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(mac)
}

fn parse_bits(text: &str) -> Option<BitString> {
    let bits = text
        .chars()
        .map(|c| match c {
            '0' => Some(false),
            '1' => Some(true),
            _ => None,
        })
        .collect::<Option<Vec<bool>>>()?;
    Some(BitString::from_bits(&bits))
}
