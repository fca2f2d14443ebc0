use crate::backend::SimilarityBackend;
use crate::error::{Result, SimilarityError};
use crate::tfidf::TfidfBackend;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Turns texts into fixed-size vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Neural-style backend: embeds the claim with the batch and scores cosine similarity.
pub struct EmbeddingBackend<E> {
    embedder: E,
}

impl<E: Embedder> EmbeddingBackend<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}

#[async_trait]
impl<E: Embedder> SimilarityBackend for EmbeddingBackend<E> {
    fn name(&self) -> &str {
        "embedding"
    }

    async fn score(&self, claim: &str, candidates: &[String]) -> Result<Vec<f32>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut texts = Vec::with_capacity(candidates.len() + 1);
        texts.push(claim.to_string());
        texts.extend(candidates.iter().cloned());

        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(SimilarityError::LengthMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }

        let (claim_vec, candidate_vecs) = vectors
            .split_first()
            .ok_or_else(|| SimilarityError::Backend("empty embedding batch".to_string()))?;
        Ok(candidate_vecs
            .iter()
            .map(|vec| cosine_similarity(claim_vec, vec).max(0.0))
            .collect())
    }
}

#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Deterministic offline embedder: signed feature hashing of the lexical tokens.
///
/// Texts that share vocabulary land close together; no model files are needed.
#[derive(Clone, Debug)]
pub struct HashEmbedder {
    dimension: usize,
    tokenizer: TfidfBackend,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            tokenizer: TfidfBackend::new(),
        }
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dimension];
        for token in self.tokenizer.tokenize(text) {
            let hash = fnv1a_64(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vec[bucket] += sign;
        }
        normalize(&mut vec);
        vec
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

/// LRU cache in front of another embedder; only misses reach the inner model.
pub struct CachedEmbedder<E> {
    inner: E,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    fn lookup(&self, texts: &[String]) -> Result<Vec<Option<Vec<f32>>>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| SimilarityError::Other("embedding cache poisoned".to_string()))?;
        Ok(texts.iter().map(|text| cache.get(text).cloned()).collect())
    }
}

#[async_trait]
impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut slots = self.lookup(texts)?;
        let misses: Vec<String> = texts
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(text, _)| text.clone())
            .collect();

        if !misses.is_empty() {
            log::debug!("Embedding cache: {} hits, {} misses", texts.len() - misses.len(), misses.len());
            let fresh = self.inner.embed_batch(&misses).await?;
            if fresh.len() != misses.len() {
                return Err(SimilarityError::LengthMismatch {
                    expected: misses.len(),
                    actual: fresh.len(),
                });
            }

            let mut cache = self
                .cache
                .lock()
                .map_err(|_| SimilarityError::Other("embedding cache poisoned".to_string()))?;
            let mut fresh = misses.into_iter().zip(fresh);
            for slot in slots.iter_mut().filter(|slot| slot.is_none()) {
                if let Some((text, vector)) = fresh.next() {
                    cache.put(text, vector.clone());
                    *slot = Some(vector);
                }
            }
        }

        Ok(slots.into_iter().map(Option::unwrap_or_default).collect())
    }
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
