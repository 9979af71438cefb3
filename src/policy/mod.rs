//! Distribution policies and their resolution against catalog metadata.

pub mod bind;
pub mod catalog;
pub mod partition;

use std::collections::HashSet;

use crate::error::{Result, RouteError};

// Re-exports
pub use bind::{column_family, resolve_column_family, BoundPolicy, KeyColumn};
pub use catalog::{AttributeDesc, Catalog, MemoryCatalog, TupleDesc, TypeKind};
pub use partition::{
    policies_differ, union_key_attrs, PartitionEntry, PartitionPolicyCache, PartitionSelector,
};

/// 1-based attribute position within a relation
pub type AttrNumber = u16;

/// Catalog relation identifier
pub type RelationId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Rows are spread over all segments
    Partitioned,
    /// Not sharded; every row lives in one fixed place
    SingleNode,
}

/// Declared distribution of one relation.
///
/// An empty key list on a partitioned policy means rows are spread round
/// robin instead of by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionPolicy {
    kind: PolicyKind,
    hash_key_attrs: Vec<AttrNumber>,
}

impl DistributionPolicy {
    /// Hash distribution on `attrs`, in the given order.
    pub fn hashed(attrs: impl Into<Vec<AttrNumber>>) -> Result<Self> {
        let hash_key_attrs = attrs.into();
        let mut seen = HashSet::with_capacity(hash_key_attrs.len());
        for attno in &hash_key_attrs {
            if *attno == 0 {
                return Err(RouteError::InvalidPolicy(
                    "attribute numbers are 1-based".into(),
                ));
            }
            if !seen.insert(*attno) {
                return Err(RouteError::InvalidPolicy(format!(
                    "attribute {} appears twice in the distribution key",
                    attno
                )));
            }
        }
        Ok(Self {
            kind: PolicyKind::Partitioned,
            hash_key_attrs,
        })
    }

    pub fn round_robin() -> Self {
        Self {
            kind: PolicyKind::Partitioned,
            hash_key_attrs: Vec::new(),
        }
    }

    pub fn single_node() -> Self {
        Self {
            kind: PolicyKind::SingleNode,
            hash_key_attrs: Vec::new(),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        self.kind
    }

    pub fn hash_key_attrs(&self) -> &[AttrNumber] {
        &self.hash_key_attrs
    }

    pub fn is_round_robin(&self) -> bool {
        self.kind == PolicyKind::Partitioned && self.hash_key_attrs.is_empty()
    }
}
