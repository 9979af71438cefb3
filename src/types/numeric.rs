//! Arbitrary precision decimal in base-10000 digit form.
//!
//! Values are kept normalized (no leading or trailing zero digit groups), so
//! two numerically equal inputs such as `1.50` and `1.5` share the same
//! digit sequence and only differ in display scale.

use std::str::FromStr;

use crate::error::RouteError;
use crate::types::TypeFamily;

pub const NBASE: i16 = 10000;
pub const DEC_DIGITS: usize = 4;

const MAX_EXPONENT: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericSign {
    Positive,
    Negative,
    NaN,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numeric {
    sign: NumericSign,
    weight: i16,
    dscale: u16,
    digits: Vec<i16>,
}

impl Numeric {
    pub fn nan() -> Self {
        Self {
            sign: NumericSign::NaN,
            weight: 0,
            dscale: 0,
            digits: Vec::new(),
        }
    }

    pub fn zero() -> Self {
        Self {
            sign: NumericSign::Positive,
            weight: 0,
            dscale: 0,
            digits: Vec::new(),
        }
    }

    pub fn is_nan(&self) -> bool {
        self.sign == NumericSign::NaN
    }

    pub fn sign(&self) -> NumericSign {
        self.sign
    }

    /// Weight of the first digit group, in units of NBASE
    pub fn weight(&self) -> i16 {
        self.weight
    }

    pub fn dscale(&self) -> u16 {
        self.dscale
    }

    pub fn digits(&self) -> &[i16] {
        &self.digits
    }

    fn from_decimal_digits(
        negative: bool,
        int_digits: &[u8],
        frac_digits: &[u8],
        exponent: i64,
    ) -> Option<Self> {
        let dscale = u16::try_from((frac_digits.len() as i64 - exponent).max(0)).ok()?;

        // Position of the decimal point within the digit run
        let mut point = int_digits.len() as i64 + exponent;
        let mut run: Vec<u8> = Vec::with_capacity(int_digits.len() + frac_digits.len() + 8);
        if point < 0 {
            run.resize((-point) as usize, 0);
            point = 0;
        }
        run.extend_from_slice(int_digits);
        run.extend_from_slice(frac_digits);
        if (run.len() as i64) < point {
            run.resize(point as usize, 0);
        }

        // Align the point on a group boundary
        let lead = (DEC_DIGITS - (point as usize % DEC_DIGITS)) % DEC_DIGITS;
        let mut aligned = vec![0u8; lead];
        aligned.extend_from_slice(&run);
        let point = point as usize + lead;
        let tail = (DEC_DIGITS - aligned.len() % DEC_DIGITS) % DEC_DIGITS;
        aligned.resize(aligned.len() + tail, 0);

        let mut digits: Vec<i16> = aligned
            .chunks(DEC_DIGITS)
            .map(|group| group.iter().fold(0i16, |acc, d| acc * 10 + *d as i16))
            .collect();
        let mut weight = (point / DEC_DIGITS) as i64 - 1;

        let leading = digits.iter().take_while(|d| **d == 0).count();
        digits.drain(..leading);
        weight -= leading as i64;
        while digits.last() == Some(&0) {
            digits.pop();
        }

        if digits.is_empty() {
            return Some(Self {
                dscale,
                ..Self::zero()
            });
        }

        Some(Self {
            sign: if negative {
                NumericSign::Negative
            } else {
                NumericSign::Positive
            },
            weight: i16::try_from(weight).ok()?,
            dscale,
            digits,
        })
    }
}

impl From<i64> for Numeric {
    fn from(value: i64) -> Self {
        let mut magnitude = value.unsigned_abs();
        let mut digits = Vec::new();
        while magnitude > 0 {
            digits.push((magnitude % NBASE as u64) as i16);
            magnitude /= NBASE as u64;
        }
        if digits.is_empty() {
            return Self::zero();
        }
        digits.reverse();
        let weight = digits.len() as i16 - 1;
        while digits.last() == Some(&0) {
            digits.pop();
        }
        Self {
            sign: if value < 0 {
                NumericSign::Negative
            } else {
                NumericSign::Positive
            },
            weight,
            dscale: 0,
            digits,
        }
    }
}

impl FromStr for Numeric {
    type Err = RouteError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || RouteError::invalid_input(TypeFamily::Numeric, input.as_bytes());
        let s = input.trim();
        if s.eq_ignore_ascii_case("nan") {
            return Ok(Self::nan());
        }

        let bytes = s.as_bytes();
        let mut pos = 0;
        let mut negative = false;
        match bytes.first() {
            Some(b'-') => {
                negative = true;
                pos += 1;
            }
            Some(b'+') => pos += 1,
            _ => {}
        }

        let mut int_digits = Vec::new();
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            int_digits.push(bytes[pos] - b'0');
            pos += 1;
        }
        let mut frac_digits = Vec::new();
        if pos < bytes.len() && bytes[pos] == b'.' {
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                frac_digits.push(bytes[pos] - b'0');
                pos += 1;
            }
        }
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }

        let mut exponent = 0i64;
        if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
            pos += 1;
            let exp_str = &s[pos..];
            exponent = exp_str.parse::<i64>().map_err(|_| invalid())?;
            if exponent.abs() > MAX_EXPONENT {
                return Err(invalid());
            }
            pos = bytes.len();
        }
        if pos != bytes.len() {
            return Err(invalid());
        }

        Self::from_decimal_digits(negative, &int_digits, &frac_digits, exponent).ok_or_else(invalid)
    }
}
