use crate::error::VerdictError;
use crate::types::{Claim, EvidenceGroup, ScoredEvidence, SourceType};
use claimcheck_similarity::{score_candidates, SimilarityBackend, SimilarityError};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

type GroupTask = JoinHandle<(EvidenceGroup, claimcheck_similarity::Result<Vec<f32>>)>;

/// In-flight group tasks; dropping this aborts whatever is still running.
struct GroupTasks(Vec<(SourceType, GroupTask)>);

impl Drop for GroupTasks {
    fn drop(&mut self) {
        for (_, task) in &self.0 {
            task.abort();
        }
    }
}

/// Scores evidence groups against a claim, one backend call per group.
///
/// Groups are scored concurrently under a shared deadline. A group whose backend call
/// fails, panics or misses the deadline is dropped; the remaining groups are kept in
/// their input order.
#[derive(Clone)]
pub struct EvidenceScorer {
    backend: Arc<dyn SimilarityBackend>,
    timeout: Duration,
}

impl EvidenceScorer {
    pub fn new(backend: Arc<dyn SimilarityBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub async fn score_groups(
        &self,
        claim: &Claim,
        groups: Vec<EvidenceGroup>,
    ) -> Vec<ScoredEvidence> {
        // A timeout too large to represent as an instant means no deadline.
        let deadline = Instant::now().checked_add(self.timeout);

        let mut tasks = GroupTasks(Vec::with_capacity(groups.len()));
        for group in groups {
            if group.is_empty() {
                log::debug!("Skipping empty '{}' group", group.source_type());
                continue;
            }
            let source_type = group.source_type().clone();
            let backend = Arc::clone(&self.backend);
            let claim = claim.as_str().to_string();
            let task = tokio::spawn(async move {
                let scores = score_candidates(backend.as_ref(), &claim, group.texts()).await;
                (group, scores)
            });
            tasks.0.push((source_type, task));
        }

        let mut scored = Vec::new();
        for (source_type, task) in tasks.0.iter_mut() {
            let outcome = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, &mut *task).await,
                None => Ok((&mut *task).await),
            };
            match outcome {
                Ok(Ok((group, Ok(scores)))) => {
                    log::debug!("Scored {} '{}' candidates", scores.len(), source_type);
                    scored.extend(group.into_scored(scores));
                }
                Ok(Ok((_, Err(e)))) => drop_group(source_type, e),
                Ok(Err(e)) => drop_group(source_type, format!("Task panicked: {e}")),
                Err(_) => {
                    task.abort();
                    drop_group(source_type, SimilarityError::Timeout);
                }
            }
        }

        scored
    }
}

fn drop_group(source_type: &SourceType, reason: impl std::fmt::Display) {
    let err = VerdictError::backend_unavailable(source_type.as_str(), reason);
    log::warn!("{err}; dropping group");
}
