//! # Claimcheck Similarity
//!
//! Pluggable text-similarity backends for claim verification.
//!
//! Every backend answers one question: given a claim and a batch of candidate texts, how
//! similar is each candidate to the claim, on a `[0, 1]` scale, aligned by position.
//!
//! ## Backends
//!
//! - **Lexical** ([`TfidfBackend`]): TF-IDF vectors rebuilt per batch, cosine scored
//! - **Embedding** ([`EmbeddingBackend`]): any [`Embedder`], optionally behind an LRU
//!   [`CachedEmbedder`]
//!
//! ## Example
//!
//! ```no_run
//! use claimcheck_similarity::{score_candidates, TfidfBackend};
//!
//! #[tokio::main]
//! async fn main() -> claimcheck_similarity::Result<()> {
//!     let backend = TfidfBackend::new();
//!     let candidates = vec!["Council approves park budget".to_string()];
//!     let scores = score_candidates(&backend, "park budget approved", &candidates).await?;
//!     println!("{scores:?}");
//!     Ok(())
//! }
//! ```

mod backend;
mod embeddings;
mod error;
mod tfidf;

pub use backend::{clamp_unit, score_candidates, BackendKind, SimilarityBackend};
pub use embeddings::{cosine_similarity, CachedEmbedder, Embedder, EmbeddingBackend, HashEmbedder};
pub use error::{Result, SimilarityError};
pub use tfidf::TfidfBackend;
