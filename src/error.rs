use thiserror::Error;

use crate::policy::AttrNumber;
use crate::shard::SegmentId;
use crate::types::{TypeFamily, TypeOid};

/// Core error type for distribution operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error("type {0} is not hashable")]
    NotHashable(TypeOid),
    #[error("invalid distribution policy: {0}")]
    InvalidPolicy(String),
    #[error("unrecognized network address family {0}")]
    BadNetworkAddressFamily(u8),
    #[error("attribute {attr} expects a {expected} value, found {found}")]
    DatumMismatch {
        attr: AttrNumber,
        expected: TypeFamily,
        found: &'static str,
    },
    #[error("value of distribution key doesn't belong to segment with ID {local}, it belongs to segment with ID {target}")]
    WrongSegment { local: SegmentId, target: SegmentId },
    #[error("invalid input syntax for type {family}: \"{input}\"")]
    InvalidInput { family: TypeFamily, input: String },
    #[error("bad row format: {0}")]
    BadRowFormat(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl RouteError {
    pub(crate) fn invalid_input(family: TypeFamily, input: &[u8]) -> Self {
        RouteError::InvalidInput {
            family,
            input: String::from_utf8_lossy(input).into_owned(),
        }
    }

    /// Attach the attribute number to a datum mismatch raised by the encoder.
    pub(crate) fn at_attr(self, attno: AttrNumber) -> Self {
        match self {
            RouteError::DatumMismatch {
                expected, found, ..
            } => RouteError::DatumMismatch {
                attr: attno,
                expected,
                found,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, RouteError>;
