use tracing::debug;

use crate::config::RouterConfig;
use crate::error::Result;
use crate::hash::HashAccumulator;
use crate::policy::{
    policies_differ, union_key_attrs, AttrNumber, BoundPolicy, Catalog, PartitionPolicyCache,
    PartitionSelector, RelationId,
};
use crate::shard::{RowRouter, SegmentId};
use crate::stats::{self, RoutingStats};
use crate::types::Datum;

/// Outcome of routing one row: the target and whether the policy that
/// placed it was round robin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routed {
    pub segment: SegmentId,
    pub round_robin: bool,
}

struct PartitionRouting<'a> {
    selector: Box<dyn PartitionSelector + 'a>,
    /// Present only when some child is distributed differently from the root
    cache: Option<PartitionPolicyCache>,
}

/// Per-statement routing state for one target relation.
///
/// Owns the root policy's hasher, the optional partition policy cache and
/// the counters for everything routed through it. Dropped at the end of the
/// statement; nothing here outlives it.
pub struct RouterContext<'a> {
    catalog: &'a dyn Catalog,
    root: BoundPolicy,
    hasher: HashAccumulator,
    router: RowRouter,
    partitions: Option<PartitionRouting<'a>>,
    routing_attrs: Vec<AttrNumber>,
    round_robin_seed: Option<u32>,
    stats: RoutingStats,
}

impl<'a> RouterContext<'a> {
    /// Bind the policy of `relid`; unhashable keys fail here, before any row.
    pub fn new(catalog: &'a dyn Catalog, relid: RelationId, config: &RouterConfig) -> Result<Self> {
        config.validate()?;
        let root = BoundPolicy::bind(catalog, relid)?;
        let routing_attrs = root.keys().iter().map(|k| k.attno).collect();
        Ok(Self {
            catalog,
            hasher: config.hasher()?,
            router: RowRouter::new(config.encoder()),
            root,
            partitions: None,
            routing_attrs,
            round_robin_seed: config.round_robin_seed,
            stats: RoutingStats::default(),
        })
    }

    /// Route rows of a partitioned relation with the policy of the child
    /// each row lands in, when children declare their own policies.
    ///
    /// The selector's columns always count as routing columns, even when
    /// every child shares the root policy and no selection happens.
    ///
    /// Every child policy is bound once here so that an unhashable child key
    /// is reported up front.
    pub fn with_partitions(mut self, selector: Box<dyn PartitionSelector + 'a>) -> Result<Self> {
        let relid = self.root.relid();
        let differ = policies_differ(self.catalog, relid, self.root.policy())?;

        let cache = if differ {
            for child in self.catalog.partition_children(relid) {
                BoundPolicy::bind(self.catalog, child)?;
            }
            self.routing_attrs = union_key_attrs(self.catalog, relid, self.root.policy())?;
            Some(PartitionPolicyCache::new(
                self.hasher.num_segments(),
                self.round_robin_seed,
            ))
        } else {
            None
        };
        for attno in selector.key_attrs() {
            if !self.routing_attrs.contains(attno) {
                self.routing_attrs.push(*attno);
            }
        }

        debug!(
            relid,
            per_child_policies = differ,
            routing_attrs = self.routing_attrs.len(),
            "partition routing prepared"
        );
        self.partitions = Some(PartitionRouting { selector, cache });
        Ok(self)
    }

    /// Segment for one row of root attribute values (index 0 is attribute 1).
    pub fn route(&mut self, values: &[Option<Datum>]) -> Result<SegmentId> {
        self.route_row(values).map(|routed| routed.segment)
    }

    /// Like [`route`](Self::route), also reporting whether the policy in
    /// effect for the row, the child's under per-child routing, was round
    /// robin.
    pub fn route_row(&mut self, values: &[Option<Datum>]) -> Result<Routed> {
        let (segment, round_robin) = match &mut self.partitions {
            Some(PartitionRouting {
                selector,
                cache: Some(cache),
            }) => {
                let child = selector.select(values)?;
                let (bound, hasher) = cache.resolve(self.catalog, child)?.parts_mut();
                let segment = self.router.route(values, bound, hasher)?;
                (segment, bound.is_round_robin())
            }
            _ => {
                let segment = self.router.route(values, &self.root, &mut self.hasher)?;
                (segment, self.root.is_round_robin())
            }
        };

        self.stats.rows_routed += 1;
        metrics::counter!(stats::ROWS_ROUTED_TOTAL).increment(1);
        if round_robin {
            self.stats.round_robin_rows += 1;
            metrics::counter!(stats::ROUND_ROBIN_ROWS_TOTAL).increment(1);
        }
        Ok(Routed {
            segment,
            round_robin,
        })
    }

    /// Attributes routing reads: the key attributes of every policy in play
    /// plus the partition selector's, in first-seen order.
    pub fn routing_attrs(&self) -> &[AttrNumber] {
        &self.routing_attrs
    }

    /// 1-based position, within `input_columns`, of the last field routing
    /// needs; fields after it can be forwarded unparsed.
    ///
    /// `None` means no input field is needed at all, as with round-robin
    /// relations.
    pub fn last_needed_column(&self, input_columns: &[AttrNumber]) -> Option<u32> {
        input_columns
            .iter()
            .enumerate()
            .filter(|(_, attno)| self.routing_attrs.contains(attno))
            .map(|(pos, _)| pos as u32 + 1)
            .max()
    }

    /// Whether rows are routed with the policy of the child they land in.
    pub fn routes_per_child(&self) -> bool {
        self.partitions.as_ref().map_or(false, |p| p.cache.is_some())
    }

    pub fn catalog(&self) -> &'a dyn Catalog {
        self.catalog
    }

    pub fn root_policy(&self) -> &BoundPolicy {
        &self.root
    }

    pub fn num_segments(&self) -> u32 {
        self.hasher.num_segments()
    }

    /// Next round-robin index of the root policy.
    pub fn round_robin_index(&self) -> u32 {
        self.hasher.round_robin_index()
    }

    /// Child partitions bound so far, 0 without per-child routing.
    pub fn cached_partitions(&self) -> usize {
        self.partitions
            .as_ref()
            .and_then(|p| p.cache.as_ref())
            .map_or(0, PartitionPolicyCache::len)
    }

    pub(crate) fn note_wrong_segment(&mut self) {
        self.stats.wrong_segment += 1;
        metrics::counter!(stats::WRONG_SEGMENT_TOTAL).increment(1);
    }

    pub fn stats(&self) -> RoutingStats {
        let partition_cache_misses = self
            .partitions
            .as_ref()
            .and_then(|p| p.cache.as_ref())
            .map_or(0, PartitionPolicyCache::misses);
        RoutingStats {
            partition_cache_misses,
            bad_inet_family: self.router.encoder().bad_inet_family_count(),
            ..self.stats
        }
    }
}
