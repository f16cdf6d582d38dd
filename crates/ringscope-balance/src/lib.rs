//! Per-node ownership aggregates and ring balance scoring.
//!
//! [`BalanceScorer`] folds a datacenter's [`TokenRange`](ringscope_ring::TokenRange)s
//! into a [`BalanceReport`]: per-node [`NodeStats`], coverage, gap totals,
//! range-size statistics, and a balance score in `[0, 1]`.
//!
//! The score itself is exposed as [`balance_score`] so that anything
//! projecting a hypothetical ownership layout (the rebalancing advisor)
//! evaluates it with exactly the same model.

mod error;
mod report;
mod score;

pub use error::BalanceError;
pub use report::{BalanceReport, BalanceScorer, NodeStats, RangeStats};
pub use score::{balance_score, fraction_score};
