//! Canonical byte encodings for distribution hashing.
//!
//! Every value is turned into a byte string such that SQL-equal values give
//! identical bytes: integers are widened to eight bytes, float zeros lose
//! their sign, trailing blanks are dropped from character types, and fixed
//! sentinels stand in for NULL, numeric NaN and invalid legacy time values.
//! Multi-byte primitives are written little-endian.

use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

use crate::error::{Result, RouteError};
use crate::stats;
use crate::types::datum::{Datum, Inet, INVALID_ABSTIME, INVALID_RELTIME};
use crate::types::TypeFamily;

/// Hashed in place of a NULL, whatever the column type
pub const NULL_VAL: u32 = 0xF0F0_F0F1;

/// Hashed in place of a numeric NaN
pub const NAN_VAL: u32 = 0xE0E0_E0E1;

/// Hashed in place of an invalid abstime/reltime/tinterval
pub const INVALID_VAL: u32 = 0xD0D0_D0D1;

/// Bytes fed for a NULL attribute.
pub fn null_bytes() -> [u8; 4] {
    NULL_VAL.to_le_bytes()
}

/// Length of `data` once trailing blanks are ignored.
///
/// A value is never trimmed below one byte, so an all-blank string keeps a
/// single blank.
pub fn ignore_blanks(data: &[u8]) -> &[u8] {
    let mut len = data.len();
    if len <= 1 {
        return data;
    }
    while data[len - 1] == b' ' {
        len -= 1;
        if len == 1 {
            break;
        }
    }
    &data[..len]
}

fn canonical_f32(v: f32) -> f32 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f32::NAN
    } else {
        v
    }
}

fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Turns typed values into their distribution byte strings.
///
/// Holds no per-row state; the only mutable field counts inet values whose
/// address family was not recognised.
#[derive(Debug, Default)]
pub struct ByteEncoder {
    strict_inet_family: bool,
    bad_inet_family: u64,
}

impl ByteEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject unknown inet address families instead of hashing a short key.
    pub fn strict(mut self, strict_inet_family: bool) -> Self {
        self.strict_inet_family = strict_inet_family;
        self
    }

    pub fn bad_inet_family_count(&self) -> u64 {
        self.bad_inet_family
    }

    /// Feed the canonical encoding of `datum`, read as `family`, into `sink`.
    ///
    /// Encodings built from several primitives may reach `sink` in more than
    /// one call; the concatenation is what gets hashed.
    pub fn encode<F>(&mut self, family: TypeFamily, datum: &Datum, mut sink: F) -> Result<()>
    where
        F: FnMut(&[u8]),
    {
        use TypeFamily as T;

        match (family, datum) {
            (T::Int2 | T::Int4 | T::Int8, Datum::Int2(v)) => sink(&(*v as i64).to_le_bytes()),
            (T::Int2 | T::Int4 | T::Int8, Datum::Int4(v)) => sink(&(*v as i64).to_le_bytes()),
            (T::Int2 | T::Int4 | T::Int8, Datum::Int8(v)) => sink(&v.to_le_bytes()),
            (
                T::Oid
                | T::RegProc
                | T::RegProcedure
                | T::RegOper
                | T::RegOperator
                | T::RegClass
                | T::RegType
                | T::Enum,
                Datum::Oid(v),
            ) => sink(&(*v as i64).to_le_bytes()),

            (T::Float4, Datum::Float4(v)) => sink(&canonical_f32(*v).to_le_bytes()),
            (T::Float8, Datum::Float8(v)) => sink(&canonical_f64(*v).to_le_bytes()),
            (T::Float8, Datum::Float4(v)) => sink(&canonical_f64(*v as f64).to_le_bytes()),
            (T::Numeric, Datum::Numeric(n)) => {
                if n.is_nan() {
                    sink(&NAN_VAL.to_le_bytes());
                } else {
                    for digit in n.digits() {
                        sink(&digit.to_le_bytes());
                    }
                }
            }
            (T::Cash, Datum::Cash(v)) => sink(&v.to_le_bytes()),
            (T::Complex, Datum::Complex(c)) => {
                let mut buf = [0u8; 16];
                LittleEndian::write_f64(&mut buf[..8], canonical_f64(c.re));
                LittleEndian::write_f64(&mut buf[8..], canonical_f64(c.im));
                sink(&buf);
            }

            (T::Char, Datum::Char(c)) => sink(&[*c]),
            (T::BpChar | T::Text | T::VarChar | T::Name, Datum::Text(b)) => sink(ignore_blanks(b)),
            (T::Bytea, Datum::Text(b)) => sink(b),

            (T::Tid, Datum::Tid(tid)) => {
                let mut buf = [0u8; 6];
                LittleEndian::write_u16(&mut buf[..2], (tid.block >> 16) as u16);
                LittleEndian::write_u16(&mut buf[2..4], tid.block as u16);
                LittleEndian::write_u16(&mut buf[4..], tid.offset);
                sink(&buf);
            }
            (T::OidVector, Datum::OidVector(oids)) => {
                for oid in oids {
                    sink(&oid.to_le_bytes());
                }
            }

            (T::Timestamp | T::TimestampTz, Datum::Timestamp(v)) => sink(&v.to_le_bytes()),
            (T::Date, Datum::Date(v)) => sink(&v.to_le_bytes()),
            (T::Time, Datum::Time(v)) => sink(&v.to_le_bytes()),
            (T::TimeTz, Datum::TimeTz(t)) => {
                // time and zone only, packed
                let mut buf = [0u8; 12];
                LittleEndian::write_i64(&mut buf[..8], t.micros);
                LittleEndian::write_i32(&mut buf[8..], t.zone);
                sink(&buf);
            }
            (T::Interval, Datum::Interval(iv)) => sink(&iv.span_micros().to_le_bytes()),
            (T::AbsTime, Datum::AbsTime(v)) => {
                if *v == INVALID_ABSTIME {
                    sink(&INVALID_VAL.to_le_bytes());
                } else {
                    sink(&v.to_le_bytes());
                }
            }
            (T::RelTime, Datum::RelTime(v)) => {
                if *v == INVALID_RELTIME {
                    sink(&INVALID_VAL.to_le_bytes());
                } else {
                    sink(&v.to_le_bytes());
                }
            }
            (T::TInterval, Datum::TInterval(t)) => {
                if t.status == 0 || t.start == INVALID_ABSTIME || t.end == INVALID_ABSTIME {
                    sink(&INVALID_VAL.to_le_bytes());
                } else {
                    sink(&t.end.wrapping_sub(t.start).to_le_bytes());
                }
            }

            (T::Inet | T::Cidr, Datum::Inet(addr)) => {
                let mut key = [0u8; 18];
                let len = self.inet_key(addr, &mut key)?;
                sink(&key[..len]);
            }
            (T::MacAddr, Datum::MacAddr(mac)) => sink(mac),

            // '10' and '010' are different bit strings, no length normalization
            (T::Bit | T::VarBit, Datum::Bits(bits)) => sink(&bits.bytes),

            (T::Bool, Datum::Bool(b)) => sink(&[*b as u8]),
            (T::Uuid, Datum::Uuid(u)) => sink(u.as_bytes()),
            (T::Array, Datum::Array(payload)) => sink(payload),

            (expected, found) => {
                return Err(RouteError::DatumMismatch {
                    attr: 0,
                    expected,
                    found: found.kind_name(),
                })
            }
        }
        Ok(())
    }

    /// Family, prefix bits and address bytes; the cidr flag is left out since
    /// inet and cidr values compare on these fields alone.
    fn inet_key(&mut self, addr: &Inet, key: &mut [u8; 18]) -> Result<usize> {
        let addr_len = match addr.addr_len() {
            Some(len) => len,
            None => {
                if self.strict_inet_family {
                    return Err(RouteError::BadNetworkAddressFamily(addr.family));
                }
                self.bad_inet_family += 1;
                metrics::counter!(stats::BAD_INET_FAMILY_TOTAL).increment(1);
                warn!(
                    family = addr.family,
                    "unrecognized inet address family, hashing family and prefix only"
                );
                0
            }
        };
        key[0] = addr.family;
        key[1] = addr.bits;
        key[2..2 + addr_len].copy_from_slice(&addr.addr[..addr_len]);
        Ok(addr_len + 2)
    }
}

/// Encoding of `datum` collected into one buffer.
pub fn encode_to_vec(family: TypeFamily, datum: &Datum) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ByteEncoder::new().encode(family, datum, |bytes| out.extend_from_slice(bytes))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::datum::{BitString, Interval, TInterval, PGSQL_AF_INET};
    use crate::types::Numeric;

    #[test]
    fn test_integers_widen_to_eight_bytes() {
        let small = encode_to_vec(TypeFamily::Int2, &Datum::Int2(5)).unwrap();
        let big = encode_to_vec(TypeFamily::Int8, &Datum::Int8(5)).unwrap();
        assert_eq!(small.len(), 8);
        assert_eq!(small, big);
        assert_eq!(encode_to_vec(TypeFamily::Oid, &Datum::Oid(5)).unwrap(), big);
    }

    #[test]
    fn test_negative_zero() {
        let neg = encode_to_vec(TypeFamily::Float8, &Datum::Float8(-0.0)).unwrap();
        let pos = encode_to_vec(TypeFamily::Float8, &Datum::Float8(0.0)).unwrap();
        assert_eq!(neg, pos);
        let neg = encode_to_vec(TypeFamily::Float4, &Datum::Float4(-0.0)).unwrap();
        assert_eq!(neg, 0.0f32.to_le_bytes());
    }

    #[test]
    fn test_ignore_blanks() {
        assert_eq!(ignore_blanks(b"ab   "), b"ab");
        assert_eq!(ignore_blanks(b"   "), b" ");
        assert_eq!(ignore_blanks(b" "), b" ");
        assert_eq!(ignore_blanks(b""), b"");
        assert_eq!(ignore_blanks(b" a"), b" a");
    }

    #[test]
    fn test_bytea_keeps_blanks() {
        let bytea = encode_to_vec(TypeFamily::Bytea, &Datum::text("ab  ")).unwrap();
        assert_eq!(bytea, b"ab  ");
        let text = encode_to_vec(TypeFamily::Text, &Datum::text("ab  ")).unwrap();
        assert_eq!(text, b"ab");
    }

    #[test]
    fn test_numeric_nan_and_digits() {
        let nan = encode_to_vec(TypeFamily::Numeric, &Datum::Numeric(Numeric::nan())).unwrap();
        assert_eq!(nan, NAN_VAL.to_le_bytes());
        let a = encode_to_vec(TypeFamily::Numeric, &Datum::Numeric("2.50".parse().unwrap())).unwrap();
        let b = encode_to_vec(TypeFamily::Numeric, &Datum::Numeric("2.5".parse().unwrap())).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn test_invalid_time_values_share_sentinel() {
        let abs = encode_to_vec(TypeFamily::AbsTime, &Datum::AbsTime(INVALID_ABSTIME)).unwrap();
        let rel = encode_to_vec(TypeFamily::RelTime, &Datum::RelTime(INVALID_RELTIME)).unwrap();
        let tint = encode_to_vec(
            TypeFamily::TInterval,
            &Datum::TInterval(TInterval { status: 0, start: 1, end: 2 }),
        )
        .unwrap();
        assert_eq!(abs, INVALID_VAL.to_le_bytes());
        assert_eq!(abs, rel);
        assert_eq!(abs, tint);
    }

    #[test]
    fn test_tinterval_hashes_its_length() {
        let a = Datum::TInterval(TInterval { status: 1, start: 100, end: 160 });
        let b = Datum::TInterval(TInterval { status: 1, start: 1000, end: 1060 });
        assert_eq!(
            encode_to_vec(TypeFamily::TInterval, &a).unwrap(),
            encode_to_vec(TypeFamily::TInterval, &b).unwrap()
        );
    }

    #[test]
    fn test_interval_equal_spans() {
        let month = Datum::Interval(Interval { micros: 0, days: 0, months: 1 });
        let days = Datum::Interval(Interval { micros: 0, days: 30, months: 0 });
        assert_eq!(
            encode_to_vec(TypeFamily::Interval, &month).unwrap(),
            encode_to_vec(TypeFamily::Interval, &days).unwrap()
        );
    }

    #[test]
    fn test_inet_ignores_cidr_flag() {
        let inet = Inet::v4([192, 168, 0, 0], 16);
        let a = encode_to_vec(TypeFamily::Inet, &Datum::Inet(inet)).unwrap();
        let b = encode_to_vec(TypeFamily::Cidr, &Datum::Inet(inet.as_cidr())).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, vec![PGSQL_AF_INET, 16, 192, 168, 0, 0]);
    }

    #[test]
    fn test_bad_inet_family() {
        let mut odd = Inet::v4([10, 1, 2, 3], 32);
        odd.family = 42;

        let mut encoder = ByteEncoder::new();
        let mut out = Vec::new();
        encoder
            .encode(TypeFamily::Inet, &Datum::Inet(odd), |b| out.extend_from_slice(b))
            .unwrap();
        assert_eq!(out, vec![42, 32]);
        assert_eq!(encoder.bad_inet_family_count(), 1);

        let mut strict = ByteEncoder::new().strict(true);
        let err = strict.encode(TypeFamily::Inet, &Datum::Inet(odd), |_| {}).unwrap_err();
        assert_eq!(err, RouteError::BadNetworkAddressFamily(42));
    }

    #[test]
    fn test_bit_strings_keep_length_distinction() {
        let a = BitString::from_bits(&[true, false]);
        let b = BitString::from_bits(&[false, true, false]);
        assert_ne!(
            encode_to_vec(TypeFamily::VarBit, &Datum::Bits(a)).unwrap(),
            encode_to_vec(TypeFamily::VarBit, &Datum::Bits(b)).unwrap()
        );
    }

    #[test]
    fn test_mismatched_datum() {
        let err = encode_to_vec(TypeFamily::Uuid, &Datum::Int4(1)).unwrap_err();
        assert!(matches!(
            err,
            RouteError::DatumMismatch { expected: TypeFamily::Uuid, found: "int4", .. }
        ));
    }
}
