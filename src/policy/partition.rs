//! Per-partition distribution policies.
//!
//! A partitioned relation normally shares one policy across its children.
//! When a child declares a different one, every row has to be routed with
//! the policy of the child it lands in, which the cache below resolves
//! lazily on the first row that reaches each child.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;

use crate::error::{Result, RouteError};
use crate::hash::HashAccumulator;
use crate::policy::bind::BoundPolicy;
use crate::policy::catalog::Catalog;
use crate::policy::{AttrNumber, DistributionPolicy, RelationId};
use crate::stats;
use crate::types::Datum;

/// Picks the leaf partition a row belongs to.
pub trait PartitionSelector {
    /// Attributes `select` reads.
    fn key_attrs(&self) -> &[AttrNumber];

    /// Leaf partition for a row of root attribute values (index 0 is
    /// attribute 1).
    fn select(&self, values: &[Option<Datum>]) -> Result<RelationId>;
}

/// Bound policy and hasher of one child partition
#[derive(Debug, Clone)]
pub struct PartitionEntry {
    bound: BoundPolicy,
    hasher: HashAccumulator,
}

impl PartitionEntry {
    pub fn bound(&self) -> &BoundPolicy {
        &self.bound
    }

    pub fn hasher(&self) -> &HashAccumulator {
        &self.hasher
    }

    pub(crate) fn parts_mut(&mut self) -> (&BoundPolicy, &mut HashAccumulator) {
        (&self.bound, &mut self.hasher)
    }
}

/// Lazily filled map from child partition to its policy and hasher.
///
/// Lives for one statement. Entries are never evicted, so each child's
/// round-robin counter keeps advancing across the rows routed to it.
#[derive(Debug)]
pub struct PartitionPolicyCache {
    num_segments: u32,
    rr_seed: Option<u32>,
    entries: HashMap<RelationId, PartitionEntry>,
    misses: u64,
}

impl PartitionPolicyCache {
    pub fn new(num_segments: u32, rr_seed: Option<u32>) -> Self {
        Self {
            num_segments,
            rr_seed,
            entries: HashMap::new(),
            misses: 0,
        }
    }

    /// Entry for `child`, binding its policy on first use.
    pub fn resolve(&mut self, catalog: &dyn Catalog, child: RelationId) -> Result<&mut PartitionEntry> {
        let num_segments = self.num_segments;
        let rr_seed = self.rr_seed;
        match self.entries.entry(child) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(slot) => {
                let bound = BoundPolicy::bind(catalog, child)?;
                let hasher = match rr_seed {
                    Some(seed) => HashAccumulator::with_seed(num_segments, seed)?,
                    None => HashAccumulator::new(num_segments)?,
                };
                self.misses += 1;
                metrics::counter!(stats::PARTITION_CACHE_MISSES_TOTAL).increment(1);
                debug!(child, keys = bound.keys().len(), "cached partition policy");
                Ok(slot.insert(PartitionEntry { bound, hasher }))
            }
        }
    }

    pub fn get(&self, child: RelationId) -> Option<&PartitionEntry> {
        self.entries.get(&child)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of children bound so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

fn child_policy(catalog: &dyn Catalog, child: RelationId) -> Result<&DistributionPolicy> {
    catalog.distribution_policy(child).ok_or_else(|| {
        RouteError::InvalidPolicy(format!("no distribution policy for partition {}", child))
    })
}

/// True when some leaf partition of `root` is distributed differently from
/// `root_policy`.
pub fn policies_differ(
    catalog: &dyn Catalog,
    root: RelationId,
    root_policy: &DistributionPolicy,
) -> Result<bool> {
    for child in catalog.partition_children(root) {
        if child_policy(catalog, child)? != root_policy {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Every attribute some policy in the hierarchy hashes on, root keys first,
/// without duplicates.
pub fn union_key_attrs(
    catalog: &dyn Catalog,
    root: RelationId,
    root_policy: &DistributionPolicy,
) -> Result<Vec<AttrNumber>> {
    let mut attrs: Vec<AttrNumber> = root_policy.hash_key_attrs().to_vec();
    for child in catalog.partition_children(root) {
        for attno in child_policy(catalog, child)?.hash_key_attrs() {
            if !attrs.contains(attno) {
                attrs.push(*attno);
            }
        }
    }
    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{AttributeDesc, MemoryCatalog, TupleDesc};
    use crate::types::oid::{INT4OID, TEXTOID};

    fn desc() -> TupleDesc {
        TupleDesc::new(vec![
            AttributeDesc::new("a", INT4OID),
            AttributeDesc::new("b", TEXTOID),
            AttributeDesc::new("c", INT4OID),
        ])
    }

    fn hierarchy(child_b: DistributionPolicy) -> MemoryCatalog {
        let root = DistributionPolicy::hashed(vec![1]).unwrap();
        let mut catalog = MemoryCatalog::new();
        catalog.add_relation(1, desc(), Some(root.clone()));
        catalog.add_partition(1, 2, desc(), Some(root));
        catalog.add_partition(1, 3, desc(), Some(child_b));
        catalog
    }

    #[test]
    fn test_policies_differ() {
        let root = DistributionPolicy::hashed(vec![1]).unwrap();
        let same = hierarchy(root.clone());
        assert!(!policies_differ(&same, 1, &root).unwrap());

        let differ = hierarchy(DistributionPolicy::hashed(vec![3, 2]).unwrap());
        assert!(policies_differ(&differ, 1, &root).unwrap());
        assert_eq!(union_key_attrs(&differ, 1, &root).unwrap(), vec![1, 3, 2]);
    }

    #[test]
    fn test_child_without_policy_is_invalid() {
        let root = DistributionPolicy::hashed(vec![1]).unwrap();
        let mut catalog = MemoryCatalog::new();
        catalog.add_relation(1, desc(), Some(root.clone()));
        catalog.add_partition(1, 2, desc(), None);
        assert!(matches!(
            policies_differ(&catalog, 1, &root),
            Err(RouteError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_cache_binds_once_per_child() {
        let catalog = hierarchy(DistributionPolicy::round_robin());
        let mut cache = PartitionPolicyCache::new(4, Some(0));
        assert!(cache.is_empty());

        assert!(cache.resolve(&catalog, 3).unwrap().bound().is_round_robin());
        cache.resolve(&catalog, 3).unwrap();
        cache.resolve(&catalog, 2).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.get(2).unwrap().bound().keys()[0].attno, 1);
    }

    #[test]
    fn test_cache_keeps_round_robin_counter() {
        let catalog = hierarchy(DistributionPolicy::round_robin());
        let mut cache = PartitionPolicyCache::new(4, Some(7));
        {
            let (_, hasher) = cache.resolve(&catalog, 3).unwrap().parts_mut();
            hasher.reset();
            hasher.feed_round_robin();
        }
        assert_eq!(cache.get(3).unwrap().hasher().round_robin_index(), 8);
    }
}
