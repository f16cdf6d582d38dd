//! Rebalancing advice for a scored ring.
//!
//! This crate provides:
//!
//! - [`RebalancingAdvisor`]: turns a [`BalanceReport`](ringscope_balance::BalanceReport)
//!   into a [`RebalancingPlan`].
//! - [`severity`]: node and overall classification against configurable
//!   thresholds.
//! - [`plan`]: the plan records (per-node analysis, ranked recommendations,
//!   simulated token moves, and an approximate cost estimate).
//!
//! Move synthesis is a simulation. It reassigns ownership of ranges on a
//! private copy of the per-node totals and scores every step with
//! [`ringscope_balance::balance_score`], the same function the report was
//! scored with. Nothing here touches the ring model.

mod advisor;
pub mod error;
pub mod plan;
pub mod severity;

pub use advisor::RebalancingAdvisor;
pub use error::AdvisorError;
pub use plan::{CostEstimate, NodeAnalysis, RebalancingPlan, Recommendation, TokenMove};
pub use severity::{NodeBalance, OverallStatus, Priority};
