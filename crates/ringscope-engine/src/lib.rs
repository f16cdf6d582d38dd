//! Ring analysis pipeline tying the ringscope stages together.
//!
//! [`ClusterAnalyzer`] runs each datacenter through
//! model → ranges → report → plan. Datacenters are independent: one that
//! fails validation is reported as a named [`DatacenterOutcome::Failed`]
//! next to its healthy siblings, never dropped.
//!
//! [`assign_palette`] gives renderers a stable colour index per node.

pub mod analysis;
pub mod error;
pub mod palette;

pub use analysis::{
    Advice, AnalysisConfig, ClusterAnalysis, ClusterAnalyzer, ClusterNode, ClusterSummary,
    DatacenterAnalysis, DatacenterFailure, DatacenterOutcome, analyze_cluster,
};
pub use error::AnalysisError;
pub use palette::{assign_palette, palette_len_for};
