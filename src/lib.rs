//! Row-to-segment routing for a hash-distributed database.
//!
//! A relation's distribution policy names the columns whose values decide
//! which segment stores a row. Values are encoded into canonical bytes,
//! folded with 32-bit FNV-1 and reduced to a segment index; relations
//! without key columns are spread round robin. Partitioned relations whose
//! children declare their own policies are routed per child, and the ingest
//! layer only parses as many input fields as routing needs.

pub mod config;
pub mod error;
pub mod hash;
pub mod ingest;
pub mod policy;
pub mod shard;
pub mod stats;
pub mod types;

pub use config::{IngestConfig, RouterConfig};
pub use error::{Result, RouteError};
pub use hash::HashAccumulator;
pub use policy::{BoundPolicy, Catalog, DistributionPolicy, MemoryCatalog, PartitionSelector};
pub use shard::{Routed, RouterContext, RowRouter, SegmentGuard, SegmentId};
pub use types::{Datum, TypeFamily};
