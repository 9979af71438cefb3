//! Routing counters.
//!
//! Every event is both exported through the `metrics` facade under the names
//! below and counted locally, so callers without a recorder installed can
//! still read totals after a statement.

/// Rows assigned a segment
pub const ROWS_ROUTED_TOTAL: &str = "luma_distribution_rows_routed_total";
/// Rows routed through a round-robin policy
pub const ROUND_ROBIN_ROWS_TOTAL: &str = "luma_distribution_round_robin_rows_total";
/// Child partition policies bound on first use
pub const PARTITION_CACHE_MISSES_TOTAL: &str = "luma_distribution_partition_cache_misses_total";
/// Inet values hashed with an unrecognized address family
pub const BAD_INET_FAMILY_TOTAL: &str = "luma_distribution_bad_inet_family_total";
/// Rows rejected by the local segment check
pub const WRONG_SEGMENT_TOTAL: &str = "luma_distribution_wrong_segment_total";

/// Snapshot of one router's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutingStats {
    pub rows_routed: u64,
    pub round_robin_rows: u64,
    pub partition_cache_misses: u64,
    pub bad_inet_family: u64,
    pub wrong_segment: u64,
}
