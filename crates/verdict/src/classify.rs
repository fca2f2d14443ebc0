use crate::error::{Result, VerdictError};
use crate::types::Verdict;

/// Score cut-offs for the verdict rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    high: f32,
    low: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: 0.75,
            low: 0.35,
        }
    }
}

impl Thresholds {
    pub fn new(high: f32, low: f32) -> Result<Self> {
        let thresholds = Self { high, low };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn high(&self) -> f32 {
        self.high
    }

    pub fn low(&self) -> f32 {
        self.low
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (name, value) in [("thresholds.high", self.high), ("thresholds.low", self.low)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(VerdictError::config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.low >= self.high {
            return Err(VerdictError::config(format!(
                "thresholds.low ({}) must be below thresholds.high ({})",
                self.low, self.high
            )));
        }
        Ok(())
    }

    /// First matching rule wins:
    /// 1. `score >= high` is `LikelyTrue`
    /// 2. `score < low` with evidence present is `LikelyFalse`
    /// 3. anything else is `Unsure`
    ///
    /// Without evidence the score is 0, which must not read as a refutation.
    pub fn classify(&self, score: f32, has_any_evidence: bool) -> Verdict {
        if score >= self.high {
            Verdict::LikelyTrue
        } else if score < self.low && has_any_evidence {
            Verdict::LikelyFalse
        } else {
            Verdict::Unsure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_apply_in_order() {
        let t = Thresholds::default();
        assert_eq!(t.classify(0.9, true), Verdict::LikelyTrue);
        assert_eq!(t.classify(0.75, true), Verdict::LikelyTrue);
        assert_eq!(t.classify(0.63, true), Verdict::Unsure);
        assert_eq!(t.classify(0.35, true), Verdict::Unsure);
        assert_eq!(t.classify(0.1, true), Verdict::LikelyFalse);
    }

    #[test]
    fn missing_evidence_never_refutes() {
        let t = Thresholds::default();
        assert_eq!(t.classify(0.0, false), Verdict::Unsure);
        assert_eq!(t.classify(0.1, false), Verdict::Unsure);
    }

    #[test]
    fn thresholds_are_tunable() {
        let t = Thresholds::new(0.5, 0.2).unwrap();
        assert_eq!(t.classify(0.6, true), Verdict::LikelyTrue);
        assert_eq!(t.classify(0.3, true), Verdict::Unsure);
    }

    #[test]
    fn rejects_unordered_or_out_of_range() {
        assert!(Thresholds::new(0.3, 0.3).is_err());
        assert!(Thresholds::new(0.3, 0.6).is_err());
        assert!(Thresholds::new(1.5, 0.2).is_err());
        assert!(Thresholds::new(0.8, f32::NAN).is_err());
    }
}
