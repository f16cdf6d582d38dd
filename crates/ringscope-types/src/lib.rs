//! Shared types for ringscope.
//!
//! This crate defines the core types used across the ringscope workspace:
//! ring arithmetic over the signed 64-bit token space ([`ring_position`],
//! [`ring_distance`], [`RING_SIZE`]), snapshot identifiers ([`SnapshotId`]),
//! token entries as handed in by a parser ([`RawTokenEntry`]) and after
//! validation ([`TokenEntry`]), node flags ([`NodeStatus`], [`NodeState`]),
//! and policy configuration ([`RangeOptions`], [`AdvisorConfig`],
//! [`SeverityThresholds`]).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ring arithmetic
// ---------------------------------------------------------------------------

/// A coordinate on the ring.
pub type Token = i64;

/// Smallest representable token (`-2^63`).
pub const MIN_TOKEN: Token = i64::MIN;

/// Largest representable token (`2^63 - 1`).
pub const MAX_TOKEN: Token = i64::MAX;

/// Total size of the circular key space: `2^64`.
pub const RING_SIZE: u128 = 1 << 64;

/// [`RING_SIZE`] as a float, for share and percentage math.
pub const RING_SIZE_F64: f64 = 18_446_744_073_709_551_616.0;

/// Map a signed token to its unsigned ring position (`token + 2^63`).
///
/// Flipping the sign bit is the same bias transform without any arithmetic
/// that could overflow. Ordering is preserved: `a < b` iff
/// `ring_position(a) < ring_position(b)`.
pub fn ring_position(token: Token) -> u64 {
    (token as u64) ^ (1 << 63)
}

/// Inverse of [`ring_position`].
pub fn token_at(position: u64) -> Token {
    (position ^ (1 << 63)) as i64
}

/// Clockwise distance from `start` (exclusive) to `end` (inclusive).
///
/// Returns a value in `[1, 2^64]`. `start == end` denotes the full circle,
/// which is what a single-token ring owns.
pub fn ring_distance(start: Token, end: Token) -> u128 {
    let forward = ring_position(end).wrapping_sub(ring_position(start));
    if forward == 0 {
        RING_SIZE
    } else {
        u128::from(forward)
    }
}

/// Whether `token` lies on the arc `(start, end]`.
pub fn arc_contains(start: Token, end: Token, token: Token) -> bool {
    if start == end {
        return true;
    }
    let offset = ring_position(token).wrapping_sub(ring_position(start));
    offset != 0 && u128::from(offset) <= ring_distance(start, end)
}

// ---------------------------------------------------------------------------
// Snapshot identifiers
// ---------------------------------------------------------------------------

/// Content fingerprint of one datacenter's ring: `blake3` over the sorted
/// `(token, owner)` pairs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SnapshotId([u8; 32]);

impl SnapshotId {
    /// Create an ID by hashing arbitrary data with BLAKE3.
    pub fn from_data(data: &[u8]) -> Self {
        Self(blake3::hash(data).into())
    }

    /// Return the raw 32-byte representation.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for SnapshotId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotId({self})")
    }
}

/// Caller-supplied metadata for one snapshot.
///
/// The core never derives timestamps from ring content; these are echoed back
/// in comparisons and trends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Free-form label, typically the source file name.
    pub label: String,
    /// Unix timestamp (seconds) the snapshot was taken.
    pub taken_at: i64,
}

impl SnapshotMeta {
    /// Create snapshot metadata.
    pub fn new(label: impl Into<String>, taken_at: i64) -> Self {
        Self {
            label: label.into(),
            taken_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Token entries
// ---------------------------------------------------------------------------

/// Reported liveness of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Node is reachable.
    Up,
    /// Node is unreachable.
    Down,
    /// Status column missing or unrecognised.
    Unknown,
}

impl NodeStatus {
    /// Parse a status column (`Up`, `Down`, or their one-letter forms).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "up" | "u" => Some(Self::Up),
            "down" | "d" => Some(Self::Down),
            _ => None,
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("Up"),
            Self::Down => f.write_str("Down"),
            Self::Unknown => f.write_str("?"),
        }
    }
}

/// Reported ring state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeState {
    /// Node is serving its ranges.
    Normal,
    /// Node is streaming its ranges away before removal.
    Leaving,
    /// Node is bootstrapping into the ring.
    Joining,
    /// Node is relocating a token.
    Moving,
    /// State column missing or unrecognised.
    Unknown,
}

impl NodeState {
    /// Parse a state column (`Normal`, `Leaving`, `Joining`, `Moving`, or
    /// their one-letter forms).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "normal" | "n" => Some(Self::Normal),
            "leaving" | "l" => Some(Self::Leaving),
            "joining" | "j" => Some(Self::Joining),
            "moving" | "m" => Some(Self::Moving),
            _ => None,
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("Normal"),
            Self::Leaving => f.write_str("Leaving"),
            Self::Joining => f.write_str("Joining"),
            Self::Moving => f.write_str("Moving"),
            Self::Unknown => f.write_str("?"),
        }
    }
}

/// One line of a ring dump as extracted by a parser, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTokenEntry {
    /// 1-based line number in the source dump.
    pub line: usize,
    /// Node address. Required unless `orphaned` is set.
    pub address: Option<String>,
    /// Rack label.
    pub rack: Option<String>,
    /// Status column, e.g. `Up`.
    pub status: Option<String>,
    /// State column, e.g. `Normal`.
    pub state: Option<String>,
    /// Reported load, already converted to bytes.
    pub load_bytes: Option<u64>,
    /// Reported ownership column, e.g. `33.33%`.
    pub owns: Option<String>,
    /// Token text; must parse as a signed 64-bit integer.
    pub token: String,
    /// The line carried a token but no owning node.
    pub orphaned: bool,
}

impl RawTokenEntry {
    /// Entry with only an address and a token, as most tests need.
    pub fn new(line: usize, address: impl Into<String>, token: impl fmt::Display) -> Self {
        Self {
            line,
            address: Some(address.into()),
            token: token.to_string(),
            ..Self::default()
        }
    }

    /// A token line that names no owner.
    pub fn orphan(line: usize, token: impl fmt::Display) -> Self {
        Self {
            line,
            token: token.to_string(),
            orphaned: true,
            ..Self::default()
        }
    }

    /// Set the reported load.
    pub fn with_load(mut self, load_bytes: u64) -> Self {
        self.load_bytes = Some(load_bytes);
        self
    }

    /// Set the status and state columns.
    pub fn with_flags(mut self, status: &str, state: &str) -> Self {
        self.status = Some(status.to_string());
        self.state = Some(state.to_string());
        self
    }
}

/// A validated ring position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Owning node address; `None` for an orphaned token.
    pub address: Option<String>,
    /// Rack label (empty when not reported).
    pub rack: String,
    /// Datacenter this entry belongs to.
    pub datacenter: String,
    /// Reported liveness.
    pub status: NodeStatus,
    /// Reported ring state.
    pub state: NodeState,
    /// Reported load in bytes (0 when not reported).
    pub load_bytes: u64,
    /// Reported ownership percentage, when parseable.
    pub owns: Option<f64>,
    /// Ring coordinate.
    pub token: Token,
    /// Source line number.
    pub line: usize,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which owners count as unresolvable when computing ranges.
///
/// Orphaned tokens are always gaps. The options below add nodes that are
/// administratively absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeOptions {
    /// Treat tokens of nodes reported `Down` as gaps.
    pub down_nodes_are_gaps: bool,
    /// Addresses whose tokens are treated as gaps.
    pub excluded_nodes: BTreeSet<String>,
}

/// Ascending absolute-deviation thresholds (in percent) for node severity.
///
/// | abs deviation            | severity              |
/// |--------------------------|-----------------------|
/// | `<= balanced`            | Balanced              |
/// | `<= fair`                | Fair                  |
/// | `<= imbalanced`          | Imbalanced            |
/// | `> imbalanced`           | SeverelyImbalanced    |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    /// Upper bound for Balanced.
    pub balanced: f64,
    /// Upper bound for Fair.
    pub fair: f64,
    /// Upper bound for Imbalanced.
    pub imbalanced: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            balanced: 10.0,
            fair: 25.0,
            imbalanced: 50.0,
        }
    }
}

impl SeverityThresholds {
    /// Whether the thresholds are finite, non-negative, and ascending.
    pub fn is_valid(&self) -> bool {
        let all = [self.balanced, self.fair, self.imbalanced];
        all.iter().all(|t| t.is_finite() && *t >= 0.0)
            && self.balanced <= self.fair
            && self.fair <= self.imbalanced
    }
}

/// Rebalancing advisor policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Node severity thresholds.
    pub thresholds: SeverityThresholds,
    /// Maximum number of synthetic moves to suggest.
    pub max_moves: usize,
    /// Assumed streaming throughput for time estimates, in bytes per second.
    pub throughput_bytes_per_sec: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            thresholds: SeverityThresholds::default(),
            max_moves: 10,
            throughput_bytes_per_sec: 104_857_600, // 100 MB/s
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
