use tracing::debug;

use crate::error::{Result, RouteError};
use crate::shard::SegmentId;

/// How a finished hash is folded onto the segment range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// `hash & (n - 1)`, for power-of-two segment counts
    Bitmask,
    /// `hash % n`
    LazyMod,
}

impl Reduction {
    pub fn for_segments(num_segments: u32) -> Self {
        if num_segments.is_power_of_two() {
            Reduction::Bitmask
        } else {
            Reduction::LazyMod
        }
    }
}

/// Segment count together with the reduction chosen for it.
///
/// The algorithm is fixed when the reducer is built, never per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reducer {
    num_segments: u32,
    algorithm: Reduction,
}

impl Reducer {
    pub fn new(num_segments: u32) -> Result<Self> {
        if num_segments == 0 {
            return Err(RouteError::Config("number of segments must be positive".into()));
        }
        let algorithm = Reduction::for_segments(num_segments);
        debug!(num_segments, ?algorithm, "hashing into segment databases");
        Ok(Self {
            num_segments,
            algorithm,
        })
    }

    pub fn num_segments(&self) -> u32 {
        self.num_segments
    }

    pub fn algorithm(&self) -> Reduction {
        self.algorithm
    }

    pub fn reduce(&self, hash: u32) -> SegmentId {
        match self.algorithm {
            Reduction::Bitmask => hash & (self.num_segments - 1),
            Reduction::LazyMod => hash % self.num_segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_selection() {
        assert_eq!(Reducer::new(1).unwrap().algorithm(), Reduction::Bitmask);
        assert_eq!(Reducer::new(8).unwrap().algorithm(), Reduction::Bitmask);
        assert_eq!(Reducer::new(7).unwrap().algorithm(), Reduction::LazyMod);
        assert_eq!(Reducer::new(12).unwrap().algorithm(), Reduction::LazyMod);
    }

    #[test]
    fn test_reduce_matches_definition() {
        let eight = Reducer::new(8).unwrap();
        let seven = Reducer::new(7).unwrap();
        for hash in [0u32, 1, 7, 8, 0xdead_beef, u32::MAX] {
            assert_eq!(eight.reduce(hash), hash & 7);
            assert_eq!(seven.reduce(hash), hash % 7);
        }
    }

    #[test]
    fn test_zero_segments_rejected() {
        assert!(matches!(Reducer::new(0), Err(RouteError::Config(_))));
    }
}
