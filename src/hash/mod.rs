pub mod fnv;
pub mod reduce;

// Re-exports
pub use fnv::{fnv1_32, HashAccumulator, FNV1_32_INIT, FNV_32_PRIME};
pub use reduce::{Reducer, Reduction};
