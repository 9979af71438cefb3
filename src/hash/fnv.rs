use rand::Rng;

use crate::error::Result;
use crate::hash::reduce::Reducer;
use crate::shard::SegmentId;
use crate::types::encode::null_bytes;

/// 32 bit FNV-1 non-zero initial basis
pub const FNV1_32_INIT: u32 = 0x811c_9dc5;

/// 32 bit FNV magic prime
pub const FNV_32_PRIME: u32 = 0x0100_0193;

/// Inclusive upper bound of the random round-robin starting index
pub const UPPER_VAL: u32 = 0xA0B0_C0D1;

/// FNV-1 (multiply, then xor) over `buf`, continuing from `hval`.
pub fn fnv1_32(buf: &[u8], mut hval: u32) -> u32 {
    for byte in buf {
        hval = hval.wrapping_mul(FNV_32_PRIME);
        hval ^= *byte as u32;
    }
    hval
}

/// Rolling per-row hash bound to a segment count.
///
/// One accumulator serves every row of a statement for one policy: `reset`
/// starts a row, attributes are fed in key order, `reduce` picks the segment.
/// The round-robin index survives across rows so key-less relations spread
/// consecutive rows over consecutive counter values.
#[derive(Debug, Clone)]
pub struct HashAccumulator {
    hash: u32,
    rr_index: u32,
    reducer: Reducer,
}

impl HashAccumulator {
    /// Accumulator whose round-robin index starts at a random point.
    pub fn new(num_segments: u32) -> Result<Self> {
        let seed = rand::thread_rng().gen_range(0..=UPPER_VAL);
        Self::with_seed(num_segments, seed)
    }

    pub fn with_seed(num_segments: u32, rr_seed: u32) -> Result<Self> {
        Ok(Self {
            hash: 0,
            rr_index: rr_seed,
            reducer: Reducer::new(num_segments)?,
        })
    }

    pub fn reset(&mut self) {
        self.hash = FNV1_32_INIT;
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.hash = fnv1_32(bytes, self.hash);
    }

    pub fn feed_null(&mut self) {
        self.feed(&null_bytes());
    }

    /// Hash the current round-robin index, then advance it.
    pub fn feed_round_robin(&mut self) {
        let index = self.rr_index;
        self.feed(&index.to_le_bytes());
        self.rr_index = index.wrapping_add(1);
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn round_robin_index(&self) -> u32 {
        self.rr_index
    }

    pub fn reducer(&self) -> Reducer {
        self.reducer
    }

    pub fn num_segments(&self) -> u32 {
        self.reducer.num_segments()
    }

    pub fn reduce(&self) -> SegmentId {
        self.reducer.reduce(self.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1_reference_values() {
        assert_eq!(fnv1_32(b"", FNV1_32_INIT), 0x811c_9dc5);
        assert_eq!(fnv1_32(b"a", FNV1_32_INIT), 0x050c_5d7e);
        assert_eq!(fnv1_32(b"foobar", FNV1_32_INIT), 0x31f0_b262);
    }

    #[test]
    fn test_feed_is_streaming() {
        let mut whole = HashAccumulator::with_seed(4, 0).unwrap();
        whole.reset();
        whole.feed(b"foobar");

        let mut split = HashAccumulator::with_seed(4, 0).unwrap();
        split.reset();
        split.feed(b"foo");
        split.feed(b"bar");

        assert_eq!(whole.hash(), split.hash());
    }

    #[test]
    fn test_reset_restores_basis() {
        let mut acc = HashAccumulator::with_seed(3, 0).unwrap();
        acc.reset();
        acc.feed(b"row one");
        acc.reset();
        assert_eq!(acc.hash(), FNV1_32_INIT);
    }

    #[test]
    fn test_round_robin_advances_by_one() {
        let mut acc = HashAccumulator::with_seed(4, u32::MAX).unwrap();
        acc.reset();
        acc.feed_round_robin();
        assert_eq!(acc.hash(), fnv1_32(&u32::MAX.to_le_bytes(), FNV1_32_INIT));
        assert_eq!(acc.round_robin_index(), 0);
    }

    #[test]
    fn test_random_seed_in_range() {
        for _ in 0..32 {
            let acc = HashAccumulator::new(5).unwrap();
            assert!(acc.round_robin_index() <= UPPER_VAL);
        }
    }
}
