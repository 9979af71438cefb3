pub mod check;
pub mod context;
pub mod router;

// Re-exports
pub use check::SegmentGuard;
pub use context::{Routed, RouterContext};
pub use router::RowRouter;

/// Index of a storage segment, in `0..num_segments`
pub type SegmentId = u32;
