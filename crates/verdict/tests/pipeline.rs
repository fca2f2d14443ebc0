use async_trait::async_trait;
use claimcheck_similarity::{SimilarityBackend, SimilarityError};
use claimcheck_verdict::{
    EvidenceGroup, EvidenceMeta, SourceType, Verdict, VerdictConfig, VerdictError, VerdictPipeline,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Reads each candidate's score from its first word; `fail` and `slow:<ms>` script errors
/// and delays for the whole batch.
#[derive(Default)]
struct ScriptedBackend {
    calls: AtomicUsize,
    slow_finished: AtomicUsize,
}

#[async_trait]
impl SimilarityBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn score(
        &self,
        _claim: &str,
        candidates: &[String],
    ) -> claimcheck_similarity::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut scores = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let head = candidate.split_whitespace().next().unwrap_or_default();
            if head == "fail" {
                return Err(SimilarityError::Backend("model exploded".to_string()));
            }
            if let Some(ms) = head.strip_prefix("slow:") {
                let ms: u64 = ms.parse().unwrap();
                tokio::time::sleep(Duration::from_millis(ms)).await;
                self.slow_finished.fetch_add(1, Ordering::SeqCst);
                scores.push(0.9);
                continue;
            }
            scores.push(head.parse().unwrap_or(0.0));
        }
        Ok(scores)
    }
}

fn pipeline_with(config: VerdictConfig) -> (VerdictPipeline, Arc<ScriptedBackend>) {
    let backend = Arc::new(ScriptedBackend::default());
    let pipeline = VerdictPipeline::new(backend.clone(), Arc::new(config));
    (pipeline, backend)
}

fn pipeline() -> (VerdictPipeline, Arc<ScriptedBackend>) {
    pipeline_with(VerdictConfig::default())
}

fn group(source_type: &str, texts: &[&str]) -> EvidenceGroup {
    EvidenceGroup::new(source_type, texts.iter().map(|t| t.to_string()).collect())
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[tokio::test]
async fn article_only_evidence_is_unsure() {
    let (pipeline, _) = pipeline();
    let result = pipeline
        .evaluate("X", vec![group("article", &["0.9 strong match", "0.2 weak"])])
        .await
        .unwrap();
    assert!(approx(result.score, 0.63), "got {}", result.score);
    assert_eq!(result.verdict, Verdict::Unsure);
}

#[tokio::test]
async fn strong_evidence_everywhere_is_likely_true() {
    let (pipeline, _) = pipeline();
    let result = pipeline
        .evaluate(
            "X",
            vec![group("article", &["0.9 a"]), group("tweet", &["0.9 t"])],
        )
        .await
        .unwrap();
    assert!(approx(result.score, 0.9), "got {}", result.score);
    assert_eq!(result.verdict, Verdict::LikelyTrue);
}

#[tokio::test]
async fn weak_evidence_everywhere_is_likely_false() {
    let (pipeline, _) = pipeline();
    let result = pipeline
        .evaluate(
            "X",
            vec![group("article", &["0.1 a"]), group("tweet", &["0.1 t"])],
        )
        .await
        .unwrap();
    assert!(approx(result.score, 0.1), "got {}", result.score);
    assert_eq!(result.verdict, Verdict::LikelyFalse);
}

#[tokio::test]
async fn no_evidence_is_unsure_with_zero_score() {
    let (pipeline, backend) = pipeline();
    for groups in [vec![], vec![group("article", &[]), group("tweet", &[])]] {
        let result = pipeline.evaluate("X", groups).await.unwrap();
        assert_eq!(result.verdict, Verdict::Unsure);
        assert_eq!(result.score, 0.0);
        assert!(result.evidence.is_empty());
    }
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_claim_is_rejected_before_scoring() {
    let (pipeline, backend) = pipeline();
    let err = pipeline
        .evaluate("   ", vec![group("article", &["0.9 a"])])
        .await
        .unwrap_err();
    assert!(matches!(err, VerdictError::InvalidInput(_)));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ranking_breaks_ties_by_input_order() {
    let (pipeline, _) = pipeline();
    let result = pipeline
        .evaluate(
            "X",
            vec![
                group("article", &["0.3 A"]),
                group("article", &["0.9 B"]),
                group("article", &["0.9 C"]),
                group("article", &["0.1 D"]),
            ],
        )
        .await
        .unwrap();
    let order: Vec<&str> = result.evidence.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(order, vec!["0.9 B", "0.9 C", "0.3 A", "0.1 D"]);
}

#[tokio::test]
async fn truncation_does_not_change_the_score() {
    let (pipeline, _) = pipeline_with(VerdictConfig::default().with_max_evidence(2).unwrap());
    let result = pipeline
        .evaluate(
            "X",
            vec![
                group("article", &["0.2 a", "0.3 b", "0.4 c"]),
                group("tweet", &["0.95 t"]),
            ],
        )
        .await
        .unwrap();
    assert_eq!(result.evidence.len(), 2);
    assert_eq!(result.evidence[0].source_type, SourceType::tweet());
    assert!(approx(result.score, 0.4 * 0.7 + 0.95 * 0.3), "got {}", result.score);
}

#[tokio::test]
async fn each_group_is_scored_in_one_batch() {
    let (pipeline, backend) = pipeline();
    pipeline
        .evaluate(
            "X",
            vec![
                group("article", &["0.2 a", "0.3 b", "0.4 c"]),
                group("tweet", &["0.5 t", "0.6 u"]),
            ],
        )
        .await
        .unwrap();
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failing_group_is_dropped_and_siblings_survive() {
    let (pipeline, _) = pipeline();
    let result = pipeline
        .evaluate(
            "X",
            vec![group("article", &["fail"]), group("tweet", &["0.9 t"])],
        )
        .await
        .unwrap();
    assert_eq!(result.evidence.len(), 1);
    assert_eq!(result.evidence[0].source_type, SourceType::tweet());
    assert!(approx(result.score, 0.27), "got {}", result.score);
    assert_eq!(result.verdict, Verdict::LikelyFalse);
}

#[tokio::test]
async fn all_groups_failing_is_unsure() {
    let (pipeline, _) = pipeline();
    let result = pipeline
        .evaluate("X", vec![group("article", &["fail"]), group("tweet", &["fail"])])
        .await
        .unwrap();
    assert_eq!(result, claimcheck_verdict::VerdictResult::no_evidence());
}

#[tokio::test]
async fn slow_group_is_dropped_at_the_deadline() {
    let config = VerdictConfig::default()
        .with_scoring_timeout(Duration::from_millis(100))
        .unwrap();
    let (pipeline, _) = pipeline_with(config);

    let started = Instant::now();
    let result = pipeline
        .evaluate(
            "X",
            vec![group("article", &["slow:30000"]), group("tweet", &["0.9 t"])],
        )
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(result.evidence.len(), 1);
    assert_eq!(result.evidence[0].source_type, SourceType::tweet());
}

#[tokio::test]
async fn unbounded_timeout_scores_without_a_deadline() {
    let config = VerdictConfig::default()
        .with_scoring_timeout(Duration::MAX)
        .unwrap();
    let (pipeline, _) = pipeline_with(config);

    let result = pipeline
        .evaluate(
            "X",
            vec![group("article", &["slow:20 a"]), group("tweet", &["0.9 t"])],
        )
        .await
        .unwrap();

    assert_eq!(result.evidence.len(), 2);
    assert_eq!(result.verdict, Verdict::LikelyTrue);
}

#[tokio::test]
async fn dropping_an_evaluation_cancels_its_group_tasks() {
    let (pipeline, backend) = pipeline();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        pipeline.evaluate("X", vec![group("article", &["slow:300"])]),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.slow_finished.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn groups_are_scored_concurrently() {
    let config = VerdictConfig::default()
        .with_scoring_timeout(Duration::from_millis(1500))
        .unwrap();
    let (pipeline, _) = pipeline_with(config);

    let result = pipeline
        .evaluate(
            "X",
            vec![group("article", &["slow:1000"]), group("tweet", &["slow:1000"])],
        )
        .await
        .unwrap();

    // Sequential scoring would blow the 1.5s budget for the second group.
    assert_eq!(result.evidence.len(), 2);
    assert_eq!(result.verdict, Verdict::LikelyTrue);
}

#[tokio::test]
async fn out_of_range_backend_scores_are_clamped() {
    let (pipeline, _) = pipeline();
    let result = pipeline
        .evaluate(
            "X",
            vec![group("article", &["1.8 a"]), group("tweet", &["-3 t"])],
        )
        .await
        .unwrap();
    assert!(result.evidence.iter().all(|e| (0.0..=1.0).contains(&e.similarity)));
    assert_eq!(result.evidence[0].similarity, 1.0);
    assert!(approx(result.score, 0.7));
}

#[tokio::test]
async fn metadata_travels_with_ranked_evidence() {
    let (pipeline, _) = pipeline();
    let articles = EvidenceGroup::with_metadata(
        "article",
        vec!["0.4 low".to_string(), "0.8 high".to_string()],
        vec![
            EvidenceMeta {
                source: Some("Daily".to_string()),
                title: Some("low".to_string()),
                url: Some("https://example.com/low".to_string()),
            },
            EvidenceMeta {
                source: Some("Herald".to_string()),
                title: Some("high".to_string()),
                url: Some("https://example.com/high".to_string()),
            },
        ],
    )
    .unwrap();

    let result = pipeline.evaluate("X", vec![articles]).await.unwrap();
    let top = result.evidence[0].meta.as_ref().unwrap();
    assert_eq!(top.source.as_deref(), Some("Herald"));
    assert_eq!(top.url.as_deref(), Some("https://example.com/high"));
}

#[tokio::test]
async fn repeated_runs_are_byte_identical() {
    let (pipeline, _) = pipeline();
    let groups = vec![
        group("article", &["0.5 a", "0.5 b", "0.7 c"]),
        group("tweet", &["0.5 d", "0.7 e"]),
    ];
    let first = pipeline.evaluate("X", groups.clone()).await.unwrap();
    let second = pipeline.evaluate("X", groups).await.unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

proptest! {
    #[test]
    fn verdict_follows_score_and_evidence(
        articles in proptest::collection::vec(0.0f32..=1.0, 0..6),
        tweets in proptest::collection::vec(0.0f32..=1.0, 0..6),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (pipeline, _) = pipeline();
        let to_texts = |scores: &[f32]| scores.iter().map(|s| format!("{s} x")).collect::<Vec<_>>();
        let groups = vec![
            EvidenceGroup::new("article", to_texts(&articles)),
            EvidenceGroup::new("tweet", to_texts(&tweets)),
        ];
        let result = rt.block_on(pipeline.evaluate("claim", groups)).unwrap();

        let has_evidence = !articles.is_empty() || !tweets.is_empty();
        prop_assert!((0.0..=1.0).contains(&result.score));
        prop_assert!(result.evidence.len() <= 10);
        prop_assert!(result.evidence.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        let expected = if result.score >= 0.75 {
            Verdict::LikelyTrue
        } else if result.score < 0.35 && has_evidence {
            Verdict::LikelyFalse
        } else {
            Verdict::Unsure
        };
        prop_assert_eq!(result.verdict, expected);
    }
}
