use crate::error::{Result, VerdictError};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Claim text, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Claim(String);

impl Claim {
    pub fn parse(raw: &str) -> Result<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(VerdictError::InvalidInput("Empty text provided".to_string()));
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of evidence source, e.g. `article` or `tweet`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SourceType(String);

impl<'de> Deserialize<'de> for SourceType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl SourceType {
    pub const ARTICLE: &'static str = "article";
    pub const TWEET: &'static str = "tweet";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_ascii_lowercase())
    }

    pub fn article() -> Self {
        Self::new(Self::ARTICLE)
    }

    pub fn tweet() -> Self {
        Self::new(Self::TWEET)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceType {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Structured metadata carried by article-like evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Candidate texts from one source, in retrieval order.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceGroup {
    source_type: SourceType,
    texts: Vec<String>,
    metadata: Option<Vec<EvidenceMeta>>,
}

impl EvidenceGroup {
    pub fn new(source_type: impl Into<SourceType>, texts: Vec<String>) -> Self {
        Self {
            source_type: source_type.into(),
            texts,
            metadata: None,
        }
    }

    /// Group whose metadata is aligned by index with `texts`.
    pub fn with_metadata(
        source_type: impl Into<SourceType>,
        texts: Vec<String>,
        metadata: Vec<EvidenceMeta>,
    ) -> Result<Self> {
        let source_type = source_type.into();
        if metadata.len() != texts.len() {
            return Err(VerdictError::InvalidInput(format!(
                "group '{source_type}' has {} texts but {} metadata entries",
                texts.len(),
                metadata.len()
            )));
        }
        Ok(Self {
            source_type,
            texts,
            metadata: Some(metadata),
        })
    }

    pub fn source_type(&self) -> &SourceType {
        &self.source_type
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn metadata(&self) -> Option<&[EvidenceMeta]> {
        self.metadata.as_deref()
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Attaches one score per text, consuming the group.
    pub(crate) fn into_scored(self, scores: Vec<f32>) -> Vec<ScoredEvidence> {
        let source_type = self.source_type;
        let mut metadata = self.metadata.map(Vec::into_iter);
        self.texts
            .into_iter()
            .zip(scores)
            .map(|(text, similarity)| ScoredEvidence {
                source_type: source_type.clone(),
                similarity,
                text,
                meta: metadata.as_mut().and_then(Iterator::next),
            })
            .collect()
    }
}

/// One candidate after scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvidence {
    pub source_type: SourceType,
    pub similarity: f32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<EvidenceMeta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Likely True")]
    LikelyTrue,
    #[serde(rename = "Likely False")]
    LikelyFalse,
    #[serde(rename = "Unsure")]
    Unsure,
}

impl Verdict {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LikelyTrue => "Likely True",
            Self::LikelyFalse => "Likely False",
            Self::Unsure => "Unsure",
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finished verdict for one claim: label, blended score, ranked evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictResult {
    pub verdict: Verdict,
    pub score: f32,
    pub evidence: Vec<ScoredEvidence>,
}

impl VerdictResult {
    pub fn no_evidence() -> Self {
        Self {
            verdict: Verdict::Unsure,
            score: 0.0,
            evidence: Vec::new(),
        }
    }
}
