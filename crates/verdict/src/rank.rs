use crate::types::ScoredEvidence;
use std::cmp::Ordering;

/// Orders evidence by similarity (highest first) and keeps at most `limit` items.
///
/// The sort is stable: equal scores keep their input order (group order, then position
/// within the group).
pub fn rank_evidence(evidence: &[ScoredEvidence], limit: usize) -> Vec<ScoredEvidence> {
    let mut ranked = evidence.to_vec();
    ranked.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}
