use crate::config::WeightTable;
use crate::types::{ScoredEvidence, SourceType};
use std::collections::BTreeMap;

/// Per-type representative scores and the blended claim score.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedScore {
    /// Maximum similarity per source type; declared types without evidence hold `0.0`.
    pub per_type: BTreeMap<SourceType, f32>,
    /// Weighted sum of the declared types' representative scores.
    pub score: f32,
    /// Whether any evidence of a declared type was scored.
    pub has_evidence: bool,
}

/// Weighted blend of per-type maxima
///
/// score(claim) = Σ weight(type) · max(sim over evidence of type)
pub struct Aggregator<'a> {
    weights: &'a WeightTable,
}

impl<'a> Aggregator<'a> {
    pub fn new(weights: &'a WeightTable) -> Self {
        Self { weights }
    }

    pub fn aggregate(&self, evidence: &[ScoredEvidence]) -> AggregatedScore {
        let mut per_type: BTreeMap<SourceType, f32> = self
            .weights
            .iter()
            .map(|(source_type, _)| (source_type.clone(), 0.0))
            .collect();

        let mut has_evidence = false;
        let mut undeclared = 0usize;
        for item in evidence {
            if self.weights.is_declared(&item.source_type) {
                has_evidence = true;
            } else {
                undeclared += 1;
            }
            let best = per_type.entry(item.source_type.clone()).or_insert(0.0);
            *best = best.max(item.similarity);
        }

        if undeclared > 0 {
            log::warn!(
                "{} evidence items have no declared weight and do not affect the score",
                undeclared
            );
        }

        let mut score = 0.0f32;
        for (source_type, weight) in self.weights.iter() {
            let representative = per_type.get(source_type).copied().unwrap_or(0.0);
            score += weight * representative;
        }
        let score = if score > 0.0 { score.min(1.0) } else { 0.0 };

        log::debug!("Aggregated per-type scores {:?} -> {:.4}", per_type, score);

        AggregatedScore {
            per_type,
            score,
            has_evidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(source_type: &str, similarity: f32) -> ScoredEvidence {
        ScoredEvidence {
            source_type: SourceType::new(source_type),
            similarity,
            text: format!("{source_type} {similarity}"),
            meta: None,
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn article_only_scores_its_weight_share() {
        let weights = WeightTable::default();
        let agg = Aggregator::new(&weights).aggregate(&[item("article", 0.9), item("article", 0.4)]);
        assert!(approx(agg.score, 0.63), "got {}", agg.score);
        assert_eq!(agg.per_type[&SourceType::article()], 0.9);
        assert_eq!(agg.per_type[&SourceType::tweet()], 0.0);
        assert!(agg.has_evidence);
    }

    #[test]
    fn equal_maxima_blend_to_the_same_value() {
        let weights = WeightTable::default();
        let agg = Aggregator::new(&weights).aggregate(&[item("tweet", 0.9), item("article", 0.9)]);
        assert!(approx(agg.score, 0.9), "got {}", agg.score);
    }

    #[test]
    fn no_evidence_is_exactly_zero() {
        let weights = WeightTable::default();
        let agg = Aggregator::new(&weights).aggregate(&[]);
        assert_eq!(agg.score, 0.0);
        assert!(!agg.has_evidence);
    }

    #[test]
    fn zero_similarity_evidence_still_counts_as_present() {
        let weights = WeightTable::default();
        let agg = Aggregator::new(&weights).aggregate(&[item("tweet", 0.0)]);
        assert_eq!(agg.score, 0.0);
        assert!(agg.has_evidence);
    }

    #[test]
    fn undeclared_types_are_reported_but_not_weighted() {
        let weights = WeightTable::default();
        let agg = Aggregator::new(&weights).aggregate(&[item("podcast", 0.95)]);
        assert_eq!(agg.score, 0.0);
        assert!(!agg.has_evidence);
        assert_eq!(agg.per_type[&SourceType::new("podcast")], 0.95);
    }
}
