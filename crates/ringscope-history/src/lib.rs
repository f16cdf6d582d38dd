//! Comparing ring snapshots over time.
//!
//! [`SnapshotDiffer`] compares two scored snapshots of the same datacenter;
//! [`detect_trends`] summarises a longer series. Both work on finished
//! [`BalanceReport`](ringscope_balance::BalanceReport)s and never infer why
//! membership changed.

mod diff;
mod error;
mod trends;

pub use diff::{SnapshotComparison, SnapshotDiffer, TokenDelta};
pub use error::HistoryError;
pub use trends::{BalanceTrend, Direction, TrendReport, TrendSample, detect_trends};
