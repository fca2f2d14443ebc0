//! # Claimcheck Verdict
//!
//! Turns a claim plus retrieved evidence into a verdict.
//!
//! ```text
//! claim + EvidenceGroup[]
//!     │
//!     ├──> EvidenceScorer   one backend call per group, concurrent, shared deadline
//!     ├──> Aggregator       max per source type, weighted blend
//!     ├──> Thresholds       Likely True / Likely False / Unsure
//!     └──> rank_evidence    similarity descending, stable, truncated
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use claimcheck_similarity::TfidfBackend;
//! use claimcheck_verdict::{EvidenceGroup, VerdictConfig, VerdictPipeline};
//!
//! #[tokio::main]
//! async fn main() -> claimcheck_verdict::Result<()> {
//!     let pipeline = VerdictPipeline::new(
//!         Arc::new(TfidfBackend::new()),
//!         Arc::new(VerdictConfig::default()),
//!     );
//!     let tweets = EvidenceGroup::new("tweet", vec!["Council approves park budget".into()]);
//!     let result = pipeline.evaluate("park budget approved", vec![tweets]).await?;
//!     println!("{} ({:.2})", result.verdict, result.score);
//!     Ok(())
//! }
//! ```

mod aggregate;
mod classify;
mod config;
mod error;
mod pipeline;
mod rank;
mod scorer;
mod types;

pub use aggregate::{AggregatedScore, Aggregator};
pub use classify::Thresholds;
pub use config::{VerdictConfig, WeightTable};
pub use error::{Result, VerdictError};
pub use pipeline::VerdictPipeline;
pub use rank::rank_evidence;
pub use scorer::EvidenceScorer;
pub use types::{
    Claim, EvidenceGroup, EvidenceMeta, ScoredEvidence, SourceType, Verdict, VerdictResult,
};
