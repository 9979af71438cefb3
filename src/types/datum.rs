use bytes::Bytes;
use uuid::Uuid;

use super::numeric::Numeric;

/// Address family tags stored inside inet/cidr values
pub const PGSQL_AF_INET: u8 = 2;
pub const PGSQL_AF_INET6: u8 = 3;

/// Sentinel for an invalid abstime/reltime
pub const INVALID_ABSTIME: i32 = 0x7FFF_FFFE;
pub const INVALID_RELTIME: i32 = 0x7FFF_FFFE;

/// A single materialized column value.
///
/// Values arrive already converted by the tuple layer; the variant carries the
/// physical shape, the bound column family decides how it is hashed.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Int2(i16),
    Int4(i32),
    Int8(i64),
    /// oid, reg* types and enum labels
    Oid(u32),
    Float4(f32),
    Float8(f64),
    Numeric(Numeric),
    Cash(i64),
    Complex(Complex),
    Char(u8),
    /// text, varchar, bpchar, name and bytea payloads
    Text(Bytes),
    Bool(bool),
    Tid(Tid),
    OidVector(Vec<u32>),
    /// Microseconds since 2000-01-01, with or without zone
    Timestamp(i64),
    /// Days since 2000-01-01
    Date(i32),
    /// Microseconds since midnight
    Time(i64),
    TimeTz(TimeTz),
    Interval(Interval),
    AbsTime(i32),
    RelTime(i32),
    TInterval(TInterval),
    Inet(Inet),
    MacAddr([u8; 6]),
    Bits(BitString),
    Uuid(Uuid),
    /// Serialized array payload without its length header
    Array(Bytes),
}

impl Datum {
    pub fn text(value: &str) -> Self {
        Datum::Text(Bytes::copy_from_slice(value.as_bytes()))
    }

    /// Short name of the physical shape, used in mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Datum::Int2(_) => "int2",
            Datum::Int4(_) => "int4",
            Datum::Int8(_) => "int8",
            Datum::Oid(_) => "oid",
            Datum::Float4(_) => "float4",
            Datum::Float8(_) => "float8",
            Datum::Numeric(_) => "numeric",
            Datum::Cash(_) => "money",
            Datum::Complex(_) => "complex",
            Datum::Char(_) => "char",
            Datum::Text(_) => "text",
            Datum::Bool(_) => "bool",
            Datum::Tid(_) => "tid",
            Datum::OidVector(_) => "oidvector",
            Datum::Timestamp(_) => "timestamp",
            Datum::Date(_) => "date",
            Datum::Time(_) => "time",
            Datum::TimeTz(_) => "timetz",
            Datum::Interval(_) => "interval",
            Datum::AbsTime(_) => "abstime",
            Datum::RelTime(_) => "reltime",
            Datum::TInterval(_) => "tinterval",
            Datum::Inet(_) => "inet",
            Datum::MacAddr(_) => "macaddr",
            Datum::Bits(_) => "bit",
            Datum::Uuid(_) => "uuid",
            Datum::Array(_) => "array",
        }
    }
}

impl From<i16> for Datum {
    fn from(v: i16) -> Self {
        Datum::Int2(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Int4(v)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Int8(v)
    }
}

impl From<f32> for Datum {
    fn from(v: f32) -> Self {
        Datum::Float4(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Float8(v)
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::Bool(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::text(v)
    }
}

impl From<Uuid> for Datum {
    fn from(v: Uuid) -> Self {
        Datum::Uuid(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

/// Physical tuple location: block number and line pointer offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tid {
    pub block: u32,
    pub offset: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeTz {
    pub micros: i64,
    /// Zone offset in seconds west of UTC
    pub zone: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub micros: i64,
    pub days: i32,
    pub months: i32,
}

impl Interval {
    pub const MICROS_PER_DAY: i128 = 86_400_000_000;
    pub const DAYS_PER_MONTH: i128 = 30;

    /// Total span with months as 30 days, the ordering interval comparison uses.
    pub fn span_micros(&self) -> i128 {
        self.micros as i128
            + self.days as i128 * Self::MICROS_PER_DAY
            + self.months as i128 * Self::DAYS_PER_MONTH * Self::MICROS_PER_DAY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TInterval {
    /// 0 marks an invalid interval
    pub status: i32,
    pub start: i32,
    pub end: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inet {
    pub family: u8,
    pub bits: u8,
    pub addr: [u8; 16],
    pub is_cidr: bool,
}

impl Inet {
    pub fn v4(octets: [u8; 4], bits: u8) -> Self {
        let mut addr = [0u8; 16];
        addr[..4].copy_from_slice(&octets);
        Self {
            family: PGSQL_AF_INET,
            bits,
            addr,
            is_cidr: false,
        }
    }

    pub fn v6(octets: [u8; 16], bits: u8) -> Self {
        Self {
            family: PGSQL_AF_INET6,
            bits,
            addr: octets,
            is_cidr: false,
        }
    }

    pub fn as_cidr(mut self) -> Self {
        self.is_cidr = true;
        self
    }

    /// Number of meaningful address bytes, `None` for an unknown family.
    pub fn addr_len(&self) -> Option<usize> {
        match self.family {
            PGSQL_AF_INET => Some(4),
            PGSQL_AF_INET6 => Some(16),
            _ => None,
        }
    }
}

/// Fixed or variable bit string; `bytes` holds the packed bits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitString {
    pub bit_len: u32,
    pub bytes: Bytes,
}

impl BitString {
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut packed = vec![0u8; bits.len().div_ceil(8)];
        for (i, bit) in bits.iter().enumerate() {
            if *bit {
                packed[i / 8] |= 0x80 >> (i % 8);
            }
        }
        Self {
            bit_len: bits.len() as u32,
            bytes: Bytes::from(packed),
        }
    }
}
