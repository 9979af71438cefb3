//! Value model and canonical byte encodings for distribution keys.

pub mod datum;
pub mod encode;
pub mod family;
pub mod numeric;
pub mod oid;

// Re-exports
pub use datum::{BitString, Complex, Datum, Inet, Interval, TInterval, Tid, TimeTz};
pub use encode::{encode_to_vec, ByteEncoder};
pub use family::{equality_redistributable, is_hashable_type, TypeFamily};
pub use numeric::Numeric;
pub use oid::TypeOid;
