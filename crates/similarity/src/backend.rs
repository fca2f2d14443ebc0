use crate::embeddings::{CachedEmbedder, EmbeddingBackend, HashEmbedder};
use crate::error::{Result, SimilarityError};
use crate::tfidf::TfidfBackend;
use async_trait::async_trait;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

const BACKEND_ENV: &str = "CLAIMCHECK_SIMILARITY_BACKEND";
const EMBEDDING_DIMENSION: usize = 384;
const EMBEDDING_CACHE_CAPACITY: usize = 4096;

/// Scores a claim against a batch of candidate texts.
///
/// Implementations return one score per candidate, aligned by position. Callers should go
/// through [`score_candidates`], which enforces the length and range guarantees instead of
/// trusting the implementation.
#[async_trait]
pub trait SimilarityBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn score(&self, claim: &str, candidates: &[String]) -> Result<Vec<f32>>;
}

/// Calls `backend` once for the whole batch and enforces the scoring contract.
///
/// - empty `candidates` never reach the backend
/// - the result has exactly one score per candidate
/// - every score lies in `[0, 1]` (non-finite values become `0.0`)
pub async fn score_candidates(
    backend: &dyn SimilarityBackend,
    claim: &str,
    candidates: &[String],
) -> Result<Vec<f32>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let raw = backend.score(claim, candidates).await?;
    if raw.len() != candidates.len() {
        return Err(SimilarityError::LengthMismatch {
            expected: candidates.len(),
            actual: raw.len(),
        });
    }

    let mut clamped = 0usize;
    let scores: Vec<f32> = raw
        .into_iter()
        .map(|score| {
            let fixed = clamp_unit(score);
            if fixed != score {
                clamped += 1;
            }
            fixed
        })
        .collect();
    if clamped > 0 {
        log::warn!(
            "Backend '{}' returned {} out-of-range scores; clamped to [0, 1]",
            backend.name(),
            clamped
        );
    }

    Ok(scores)
}

#[must_use]
pub fn clamp_unit(score: f32) -> f32 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Tfidf,
    Embedding,
}

impl BackendKind {
    pub fn from_env() -> Result<Self> {
        match env::var(BACKEND_ENV) {
            Ok(raw) if !raw.trim().is_empty() => raw.parse(),
            _ => Ok(Self::default()),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tfidf => "tfidf",
            Self::Embedding => "embedding",
        }
    }

    /// Builds a shareable backend of this kind.
    pub fn build(self) -> Arc<dyn SimilarityBackend> {
        log::info!("Using '{}' similarity backend", self.as_str());
        match self {
            Self::Tfidf => Arc::new(TfidfBackend::new()),
            Self::Embedding => Arc::new(EmbeddingBackend::new(CachedEmbedder::new(
                HashEmbedder::new(EMBEDDING_DIMENSION),
                EMBEDDING_CACHE_CAPACITY,
            ))),
        }
    }
}

impl FromStr for BackendKind {
    type Err = SimilarityError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tfidf" | "lexical" => Ok(Self::Tfidf),
            "embedding" | "neural" => Ok(Self::Embedding),
            other => Err(SimilarityError::Other(format!(
                "Unsupported {BACKEND_ENV} '{other}' (expected 'tfidf' or 'embedding')"
            ))),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
