//! Circular partition of the key space into ownership ranges.

use ringscope_types::{
    NodeStatus, RING_SIZE, RangeOptions, Token, TokenEntry, arc_contains, ring_distance,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::RingModel;

/// A contiguous arc `(start, end]` of the ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRange {
    /// Exclusive left boundary.
    pub start: Token,
    /// Inclusive right boundary; the owner's token.
    pub end: Token,
    /// Owning node, or `None` for a gap.
    pub owner: Option<String>,
    /// Clockwise distance from `start` to `end`, in `[1, 2^64]`.
    pub size: u128,
}

impl TokenRange {
    /// Whether the arc has no resolvable owner.
    pub fn is_gap(&self) -> bool {
        self.owner.is_none()
    }

    /// Whether the arc passes through the maximum token back to the minimum.
    pub fn wraps(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `token` falls inside the arc.
    pub fn contains(&self, token: Token) -> bool {
        arc_contains(self.start, self.end, token)
    }

    /// Size as a fraction of the whole ring.
    pub fn fraction(&self) -> f64 {
        self.size as f64 / RING_SIZE as f64
    }
}

/// Derives [`TokenRange`]s from a [`RingModel`].
///
/// Each range `(tokens[i-1], tokens[i]]` is owned by the node at
/// `tokens[i]`; the wraparound range `(tokens[n-1], tokens[0]]` is emitted
/// last and owned by the node at `tokens[0]`.
///
/// A range is a gap only when its right-endpoint owner cannot be resolved:
/// the token is orphaned, or the [`RangeOptions`] mark the node absent. Two
/// adjacent tokens owned by different nodes is the normal layout and is never
/// a gap, and neither is an unusually large range.
#[derive(Debug, Clone, Default)]
pub struct RangeCalculator {
    options: RangeOptions,
}

impl RangeCalculator {
    /// Create a calculator with the given gap policy.
    pub fn new(options: RangeOptions) -> Self {
        Self { options }
    }

    /// The gap policy in effect.
    pub fn options(&self) -> &RangeOptions {
        &self.options
    }

    /// Compute the ordered ranges for `model`. Sizes always sum to `2^64`.
    pub fn calculate(&self, model: &RingModel) -> Vec<TokenRange> {
        let entries = model.entries();
        let mut ranges = Vec::with_capacity(entries.len());

        for pair in entries.windows(2) {
            ranges.push(self.range_between(&pair[0], &pair[1]));
        }
        // Wraparound arc; for a single token this is the full circle.
        if let (Some(last), Some(first)) = (entries.last(), entries.first()) {
            ranges.push(self.range_between(last, first));
        }

        debug_assert!(covers_ring(&ranges), "ranges must partition the ring");
        debug!(
            datacenter = model.datacenter(),
            ranges = ranges.len(),
            gaps = ranges.iter().filter(|r| r.is_gap()).count(),
            "computed token ranges"
        );
        ranges
    }

    /// Resolve the owner of an entry under the current gap policy.
    pub fn resolve_owner<'a>(&self, entry: &'a TokenEntry) -> Option<&'a str> {
        let address = entry.address.as_deref()?;
        if self.options.excluded_nodes.contains(address) {
            return None;
        }
        if self.options.down_nodes_are_gaps && entry.status == NodeStatus::Down {
            return None;
        }
        Some(address)
    }

    fn range_between(&self, prev: &TokenEntry, owner: &TokenEntry) -> TokenRange {
        TokenRange {
            start: prev.token,
            end: owner.token,
            owner: self.resolve_owner(owner).map(str::to_string),
            size: ring_distance(prev.token, owner.token),
        }
    }
}

/// Whether `ranges` exactly partition the ring: each range starts where the
/// previous one ended, the last closes the circle, and sizes sum to `2^64`.
pub fn covers_ring(ranges: &[TokenRange]) -> bool {
    let (Some(first), Some(last)) = (ranges.first(), ranges.last()) else {
        return false;
    };
    let contiguous = ranges.windows(2).all(|w| w[0].end == w[1].start) && last.end == first.start;
    let sized = ranges
        .iter()
        .all(|r| r.size == ring_distance(r.start, r.end));
    let total: u128 = ranges.iter().map(|r| r.size).sum();
    contiguous && sized && total == RING_SIZE
}
