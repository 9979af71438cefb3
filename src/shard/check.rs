use tracing::warn;

use crate::config::RouterConfig;
use crate::error::{Result, RouteError};
use crate::shard::{RouterContext, SegmentId};
use crate::types::Datum;

/// Verifies rows loaded directly on a segment actually belong there.
///
/// Rows placed by a round-robin policy have no owner, so they are never
/// checked. Under per-child routing that is decided by the child each row
/// lands in, not by the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentGuard {
    local: SegmentId,
}

impl SegmentGuard {
    pub fn new(local: SegmentId, num_segments: u32) -> Result<Self> {
        if local >= num_segments {
            return Err(RouteError::Config(format!(
                "local segment {} is outside 0..{}",
                local, num_segments
            )));
        }
        Ok(Self { local })
    }

    /// Guard for the configured local segment, if any.
    pub fn from_config(config: &RouterConfig) -> Result<Option<Self>> {
        config
            .local_segment
            .map(|local| Self::new(local, config.num_segments))
            .transpose()
    }

    pub fn local(&self) -> SegmentId {
        self.local
    }

    /// Route `values` and fail with `WrongSegment` when they belong elsewhere.
    ///
    /// Returns the target segment, or `None` when the policy that applies to
    /// the row is round robin.
    pub fn check(&self, ctx: &mut RouterContext<'_>, values: &[Option<Datum>]) -> Result<Option<SegmentId>> {
        if ctx.root_policy().is_round_robin() && !ctx.routes_per_child() {
            return Ok(None);
        }
        let routed = ctx.route_row(values)?;
        if routed.round_robin {
            return Ok(None);
        }
        let target = routed.segment;
        if target != self.local {
            ctx.note_wrong_segment();
            warn!(local = self.local, target, "row does not belong to the local segment");
            return Err(RouteError::WrongSegment {
                local: self.local,
                target,
            });
        }
        Ok(Some(target))
    }
}
