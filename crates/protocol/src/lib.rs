use anyhow::Result;
use claimcheck_verdict::{EvidenceGroup, EvidenceMeta, ScoredEvidence, VerdictResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidInput,
    Internal,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidInput,
            message: message.into(),
            hint: Some("Send a JSON body like {\"text\": \"claim to verify\"}.".to_string()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Internal,
            message: message.into(),
            hint: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct VerifyRequest {
    pub text: String,
}

/// One piece of evidence as shown to clients.
///
/// Article-like evidence carries `source`/`title`/`url`; everything else carries `text`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct EvidenceItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub sim: f32,
}

impl From<&ScoredEvidence> for EvidenceItem {
    fn from(evidence: &ScoredEvidence) -> Self {
        let kind = evidence.source_type.as_str().to_string();
        match &evidence.meta {
            Some(meta) => Self {
                kind,
                source: meta.source.clone(),
                title: meta.title.clone(),
                url: meta.url.clone(),
                text: None,
                sim: evidence.similarity,
            },
            None => Self {
                kind,
                source: None,
                title: None,
                url: None,
                text: Some(evidence.text.clone()),
                sim: evidence.similarity,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct VerifyResponse {
    pub verdict: String,
    pub score: f32,
    pub evidence: Vec<EvidenceItem>,
}

impl From<&VerdictResult> for VerifyResponse {
    fn from(result: &VerdictResult) -> Self {
        Self {
            verdict: result.verdict.as_str().to_string(),
            score: result.score,
            evidence: result.evidence.iter().map(EvidenceItem::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct HistoryItem {
    pub id: u64,
    pub text: String,
    pub verdict: String,
    pub score: f32,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct HistoryResponse {
    pub items: Vec<HistoryItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct ClearHistoryResponse {
    pub removed: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
}

/// Pre-fetched evidence as accepted on input (e.g. an evidence file).
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct EvidenceGroupIn {
    #[serde(rename = "type")]
    pub kind: String,
    pub texts: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Vec<EvidenceMetaIn>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, JsonSchema)]
pub struct EvidenceMetaIn {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl EvidenceGroupIn {
    pub fn into_group(self) -> claimcheck_verdict::Result<EvidenceGroup> {
        match self.metadata {
            Some(metadata) => EvidenceGroup::with_metadata(
                self.kind,
                self.texts,
                metadata
                    .into_iter()
                    .map(|m| EvidenceMeta {
                        source: m.source,
                        title: m.title,
                        url: m.url,
                    })
                    .collect(),
            ),
            None => Ok(EvidenceGroup::new(self.kind, self.texts)),
        }
    }
}

pub fn parse_evidence_groups(raw: &str) -> Result<Vec<EvidenceGroup>> {
    let groups: Vec<EvidenceGroupIn> = serde_json::from_str(raw)?;
    groups
        .into_iter()
        .map(|g| g.into_group().map_err(Into::into))
        .collect()
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimcheck_verdict::{SourceType, Verdict};
    use pretty_assertions::assert_eq;

    #[test]
    fn articles_expose_metadata_and_tweets_expose_text() {
        let result = VerdictResult {
            verdict: Verdict::LikelyTrue,
            score: 0.8,
            evidence: vec![
                ScoredEvidence {
                    source_type: SourceType::article(),
                    similarity: 0.9,
                    text: "Title description".to_string(),
                    meta: Some(EvidenceMeta {
                        source: Some("Herald".to_string()),
                        title: Some("Title".to_string()),
                        url: Some("https://example.com/a".to_string()),
                    }),
                },
                ScoredEvidence {
                    source_type: SourceType::tweet(),
                    similarity: 0.5,
                    text: "so true".to_string(),
                    meta: None,
                },
            ],
        };

        let json: serde_json::Value =
            serde_json::from_str(&serialize_json(&VerifyResponse::from(&result)).unwrap())
                .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "verdict": "Likely True",
                "score": 0.8,
                "evidence": [
                    {"type": "article", "source": "Herald", "title": "Title",
                     "url": "https://example.com/a", "sim": 0.9},
                    {"type": "tweet", "text": "so true", "sim": 0.5}
                ]
            })
        );
    }

    #[test]
    fn evidence_file_groups_enforce_alignment() {
        let ok = parse_evidence_groups(
            r#"[
                {"type": "article", "texts": ["a", "b"],
                 "metadata": [{"title": "A"}, {"title": "B"}]},
                {"type": "tweet", "texts": ["c"]}
            ]"#,
        )
        .unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok[0].metadata().unwrap()[1].title.as_deref(), Some("B"));

        let err = parse_evidence_groups(
            r#"[{"type": "article", "texts": ["a", "b"], "metadata": [{"title": "A"}]}]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("metadata"));
    }

    #[test]
    fn error_codes_are_snake_case() {
        let json = serialize_json(&ErrorEnvelope::invalid_input("Empty text provided")).unwrap();
        assert!(json.contains("\"code\":\"invalid_input\""));
    }
}
