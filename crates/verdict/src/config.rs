use crate::classify::Thresholds;
use crate::error::{Result, VerdictError};
use crate::types::SourceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-source-type weights used to blend representative scores.
///
/// Weights are non-negative and sum to 1.0. Types missing from the table get no weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeightTable(BTreeMap<SourceType, f32>);

impl Default for WeightTable {
    fn default() -> Self {
        Self(BTreeMap::from([
            (SourceType::article(), 0.7),
            (SourceType::tweet(), 0.3),
        ]))
    }
}

impl WeightTable {
    pub fn new<I, S>(weights: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<SourceType>,
    {
        let mut table = BTreeMap::new();
        for (source_type, weight) in weights {
            let source_type = source_type.into();
            if table.insert(source_type.clone(), weight).is_some() {
                return Err(VerdictError::config(format!(
                    "weight for '{source_type}' declared twice"
                )));
            }
        }
        let table = Self(table);
        table.validate()?;
        Ok(table)
    }

    /// Equal weights across `types`.
    pub fn uniform<I, S>(types: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<SourceType>,
    {
        let types: Vec<SourceType> = types.into_iter().map(Into::into).collect();
        if types.is_empty() {
            return Err(VerdictError::config("weight table is empty"));
        }
        let weight = 1.0 / types.len() as f32;
        Self::new(types.into_iter().map(|t| (t, weight)))
    }

    fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(VerdictError::config("weight table is empty"));
        }
        for (source_type, weight) in &self.0 {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(VerdictError::config(format!(
                    "weight for '{source_type}' must be a non-negative number, got {weight}"
                )));
            }
        }
        let sum: f64 = self.0.values().map(|w| f64::from(*w)).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(VerdictError::config(format!(
                "weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }

    pub fn weight(&self, source_type: &SourceType) -> Option<f32> {
        self.0.get(source_type).copied()
    }

    pub fn is_declared(&self, source_type: &SourceType) -> bool {
        self.0.contains_key(source_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceType, f32)> {
        self.0.iter().map(|(t, w)| (t, *w))
    }
}

/// Immutable tuning for the verdict pipeline. Only valid values can be constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictConfig {
    thresholds: Thresholds,
    weights: WeightTable,
    max_evidence: usize,
    scoring_timeout: Duration,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            weights: WeightTable::default(),
            max_evidence: 10,
            scoring_timeout: Duration::from_secs(10),
        }
    }
}

impl VerdictConfig {
    pub fn new(
        thresholds: Thresholds,
        weights: WeightTable,
        max_evidence: usize,
        scoring_timeout: Duration,
    ) -> Result<Self> {
        let cfg = Self {
            thresholds,
            weights,
            max_evidence,
            scoring_timeout,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_max_evidence(mut self, max_evidence: usize) -> Result<Self> {
        self.max_evidence = max_evidence;
        self.validate()?;
        Ok(self)
    }

    pub fn with_scoring_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.scoring_timeout = timeout;
        self.validate()?;
        Ok(self)
    }

    /// Reads a TOML file; keys left out keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading verdict config from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let raw: RawVerdictConfig = toml::from_str(raw)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawVerdictConfig) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(thresholds) = raw.thresholds {
            let high = thresholds.high.unwrap_or(cfg.thresholds.high());
            let low = thresholds.low.unwrap_or(cfg.thresholds.low());
            cfg.thresholds = Thresholds::new(high, low)?;
        }
        if let Some(weights) = raw.weights {
            cfg.weights = WeightTable::new(weights)?;
        }
        if let Some(max_evidence) = raw.max_evidence {
            cfg.max_evidence = max_evidence;
        }
        if let Some(timeout_ms) = raw.scoring_timeout_ms {
            cfg.scoring_timeout = Duration::from_millis(timeout_ms);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.weights.validate()?;
        if self.max_evidence == 0 {
            return Err(VerdictError::config("max_evidence must be > 0"));
        }
        if self.scoring_timeout.is_zero() {
            return Err(VerdictError::config("scoring_timeout_ms must be > 0"));
        }
        Ok(())
    }

    /// Effective configuration in the same TOML shape `load` accepts.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(&RawVerdictConfig::from(self))
            .map_err(|e| VerdictError::config(format!("cannot serialize config: {e}")))
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn max_evidence(&self) -> usize {
        self.max_evidence
    }

    pub fn scoring_timeout(&self) -> Duration {
        self.scoring_timeout
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVerdictConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_evidence: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scoring_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thresholds: Option<RawThresholds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weights: Option<BTreeMap<String, f32>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThresholds {
    high: Option<f32>,
    low: Option<f32>,
}

impl From<&VerdictConfig> for RawVerdictConfig {
    fn from(cfg: &VerdictConfig) -> Self {
        Self {
            max_evidence: Some(cfg.max_evidence),
            // TOML integers are i64.
            scoring_timeout_ms: Some(
                u64::try_from(cfg.scoring_timeout.as_millis())
                    .unwrap_or(u64::MAX)
                    .min(i64::MAX as u64),
            ),
            thresholds: Some(RawThresholds {
                high: Some(cfg.thresholds.high()),
                low: Some(cfg.thresholds.low()),
            }),
            weights: Some(
                cfg.weights
                    .iter()
                    .map(|(t, w)| (t.as_str().to_string(), w))
                    .collect(),
            ),
        }
    }
}
