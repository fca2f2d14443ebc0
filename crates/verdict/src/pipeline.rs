use crate::aggregate::Aggregator;
use crate::config::VerdictConfig;
use crate::error::Result;
use crate::rank::rank_evidence;
use crate::scorer::EvidenceScorer;
use crate::types::{Claim, EvidenceGroup, VerdictResult};
use claimcheck_similarity::SimilarityBackend;
use std::sync::Arc;

/// Claim verification: score, aggregate, classify, rank.
///
/// Holds no per-request state; one pipeline can serve concurrent requests.
#[derive(Clone)]
pub struct VerdictPipeline {
    scorer: EvidenceScorer,
    config: Arc<VerdictConfig>,
}

impl VerdictPipeline {
    pub fn new(backend: Arc<dyn SimilarityBackend>, config: Arc<VerdictConfig>) -> Self {
        Self {
            scorer: EvidenceScorer::new(backend, config.scoring_timeout()),
            config,
        }
    }

    pub fn config(&self) -> &VerdictConfig {
        &self.config
    }

    /// Validates the claim text, then evaluates it.
    ///
    /// Fails only for a blank claim. Missing, failed or timed-out evidence still yields a
    /// result.
    pub async fn evaluate(&self, claim: &str, groups: Vec<EvidenceGroup>) -> Result<VerdictResult> {
        let claim = Claim::parse(claim)?;
        Ok(self.evaluate_claim(&claim, groups).await)
    }

    pub async fn evaluate_claim(&self, claim: &Claim, groups: Vec<EvidenceGroup>) -> VerdictResult {
        log::debug!("Evaluating claim '{}' against {} groups", claim, groups.len());

        let evidence = self.scorer.score_groups(claim, groups).await;
        if evidence.is_empty() {
            log::info!("No evidence scored; verdict Unsure");
            return VerdictResult::no_evidence();
        }

        let aggregated = Aggregator::new(self.config.weights()).aggregate(&evidence);
        let verdict = self
            .config
            .thresholds()
            .classify(aggregated.score, aggregated.has_evidence);
        let ranked = rank_evidence(&evidence, self.config.max_evidence());

        log::info!(
            "Verdict {} (score {:.3}, {} evidence items, {} returned)",
            verdict,
            aggregated.score,
            evidence.len(),
            ranked.len()
        );

        VerdictResult {
            verdict,
            score: aggregated.score,
            evidence: ranked,
        }
    }
}
