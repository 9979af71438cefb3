use crate::error::{Result, RouteError};
use crate::hash::HashAccumulator;
use crate::policy::BoundPolicy;
use crate::shard::SegmentId;
use crate::types::{ByteEncoder, Datum};

/// Row router: hashes the key columns of a bound policy and reduces the
/// hash to a segment.
///
/// Key columns are fed in policy order, NULLs as a fixed sentinel. A policy
/// without key columns feeds the accumulator's round-robin counter instead,
/// so consecutive rows land on consecutive counter values.
#[derive(Debug, Default)]
pub struct RowRouter {
    encoder: ByteEncoder,
}

impl RowRouter {
    pub fn new(encoder: ByteEncoder) -> Self {
        Self { encoder }
    }

    /// Route one row of attribute values (index 0 is attribute 1).
    pub fn route(
        &mut self,
        values: &[Option<Datum>],
        policy: &BoundPolicy,
        hasher: &mut HashAccumulator,
    ) -> Result<SegmentId> {
        hasher.reset();

        if policy.is_round_robin() {
            hasher.feed_round_robin();
            return Ok(hasher.reduce());
        }

        for key in policy.keys() {
            let value = values.get(key.attno as usize - 1).ok_or_else(|| {
                RouteError::BadRowFormat(format!(
                    "row has {} values, key attribute {} is missing",
                    values.len(),
                    key.attno
                ))
            })?;
            match value {
                None => hasher.feed_null(),
                Some(datum) => self
                    .encoder
                    .encode(key.family, datum, |bytes| hasher.feed(bytes))
                    .map_err(|e| e.at_attr(key.attno))?,
            }
        }
        Ok(hasher.reduce())
    }

    pub fn encoder(&self) -> &ByteEncoder {
        &self.encoder
    }
}
