use crate::sources::{gather_evidence, EvidenceSource};
use claimcheck_history::{HistoryEntry, VerdictSink};
use claimcheck_protocol::HistoryItem;
use claimcheck_similarity::BackendKind;
use claimcheck_verdict::{Claim, EvidenceGroup, VerdictPipeline, VerdictResult};
use std::sync::Arc;

/// Everything a verify request needs: retrieval, scoring and the history sink.
pub struct App {
    pipeline: VerdictPipeline,
    sources: Vec<Arc<dyn EvidenceSource>>,
    history: Option<Arc<dyn VerdictSink>>,
    backend: BackendKind,
}

impl App {
    pub fn new(
        pipeline: VerdictPipeline,
        sources: Vec<Arc<dyn EvidenceSource>>,
        history: Option<Arc<dyn VerdictSink>>,
        backend: BackendKind,
    ) -> Self {
        Self {
            pipeline,
            sources,
            history,
            backend,
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn history(&self) -> Option<&Arc<dyn VerdictSink>> {
        self.history.as_ref()
    }

    /// Verifies `text` against `evidence`, or against live sources when none is given.
    ///
    /// Only a blank claim is an error. A failed history write is logged and ignored.
    pub async fn verify(
        &self,
        text: &str,
        evidence: Option<Vec<EvidenceGroup>>,
    ) -> claimcheck_verdict::Result<VerdictResult> {
        let claim = Claim::parse(text)?;
        let groups = match evidence {
            Some(groups) => groups,
            None => gather_evidence(&self.sources, &claim).await,
        };

        let result = self.pipeline.evaluate_claim(&claim, groups).await;

        if let Some(history) = &self.history {
            if let Err(e) = history.record(&claim, &result).await {
                log::warn!("Failed to record check: {e}");
            }
        }

        Ok(result)
    }
}

pub fn history_item(entry: &HistoryEntry) -> HistoryItem {
    HistoryItem {
        id: entry.id,
        text: entry.query_text.clone(),
        verdict: entry.verdict.as_str().to_string(),
        score: entry.score,
        created_at: entry.created_at.to_rfc3339(),
    }
}
