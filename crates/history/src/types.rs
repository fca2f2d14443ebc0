use chrono::{DateTime, Utc};
use claimcheck_verdict::{Claim, ScoredEvidence, Verdict, VerdictResult};
use serde::{Deserialize, Serialize};

/// One recorded check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub query_text: String,
    pub verdict: Verdict,
    pub score: f32,
    #[serde(default)]
    pub evidence: Vec<ScoredEvidence>,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub(crate) fn new(id: u64, claim: &Claim, result: &VerdictResult) -> Self {
        Self {
            id,
            query_text: claim.as_str().to_string(),
            verdict: result.verdict,
            score: result.score,
            evidence: result.evidence.clone(),
            created_at: Utc::now(),
        }
    }
}
