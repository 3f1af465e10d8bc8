//! Data-driven engine parameters.
//!
//! Scoring weights, tier thresholds, answer labels, the tie-break policy and
//! the graph-construction settings live in a single [`EngineParams`] resource
//! instead of module-level constants, so a deployment can retune them from a
//! JSON document without recompiling.
//!
//! Systems read `Res<EngineParams>`; plain-Rust callers pass `&EngineParams`
//! (or one of its sections) explicitly.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::classifier::QuestionField;
use crate::error::EngineError;
use crate::geo::DistanceMetric;
use crate::graph::GraphDirection;
use crate::queue::TieBreakPolicy;

/// Highest supported coordinate precision (decimal places). 10^9 * 180 still
/// fits comfortably in an `i64`.
pub const MAX_COORDINATE_PRECISION: u32 = 9;

// ---------------------------------------------------------------------------
// Severity parameters
// ---------------------------------------------------------------------------

/// Accepted answer labels per questionnaire field, least severe first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldLabels {
    pub consciousness: Vec<String>,
    pub breathing: Vec<String>,
    pub bleeding: Vec<String>,
    pub trauma: Vec<String>,
}

impl Default for FieldLabels {
    fn default() -> Self {
        fn owned(labels: &[&str]) -> Vec<String> {
            labels.iter().map(|s| s.to_string()).collect()
        }
        Self {
            consciousness: owned(&["alert", "verbal", "pain", "unresponsive"]),
            breathing: owned(&["normal", "laboured", "critical"]),
            bleeding: owned(&["none", "mild", "moderate", "severe"]),
            trauma: owned(&["none", "minor", "major"]),
        }
    }
}

/// Score contribution per level, least severe first. Index 0 is the
/// "none/normal" answer and must be worth 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWeights {
    pub consciousness: Vec<u32>,
    pub breathing: Vec<u32>,
    pub bleeding: Vec<u32>,
    pub trauma: Vec<u32>,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            consciousness: vec![0, 4, 10, 20],
            breathing: vec![0, 6, 15],
            bleeding: vec![0, 2, 5, 10],
            trauma: vec![0, 5, 12],
        }
    }
}

/// Tunables for the severity classifier and admission queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityParams {
    pub labels: FieldLabels,
    pub weights: FieldWeights,
    /// Inclusive lower bounds of tiers 2..=5. A score below `thresholds[0]`
    /// is tier 1.
    pub thresholds: [u32; 4],
    pub tie_break: TieBreakPolicy,
}

impl Default for SeverityParams {
    fn default() -> Self {
        Self {
            labels: FieldLabels::default(),
            weights: FieldWeights::default(),
            thresholds: [3, 10, 20, 35],
            tie_break: TieBreakPolicy::OldestFirst,
        }
    }
}

impl SeverityParams {
    /// Labels accepted for `field`.
    pub fn labels_for(&self, field: QuestionField) -> &[String] {
        match field {
            QuestionField::Consciousness => &self.labels.consciousness,
            QuestionField::Breathing => &self.labels.breathing,
            QuestionField::Bleeding => &self.labels.bleeding,
            QuestionField::Trauma => &self.labels.trauma,
        }
    }

    /// Per-level weights for `field`.
    pub fn weights_for(&self, field: QuestionField) -> &[u32] {
        match field {
            QuestionField::Consciousness => &self.weights.consciousness,
            QuestionField::Breathing => &self.weights.breathing,
            QuestionField::Bleeding => &self.weights.bleeding,
            QuestionField::Trauma => &self.weights.trauma,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let mut max_score: u32 = 0;
        for field in QuestionField::ALL {
            let levels = field.level_count();

            let labels = self.labels_for(field);
            if labels.len() != levels {
                return Err(EngineError::InvalidParams(format!(
                    "{field} needs {levels} labels, got {}",
                    labels.len()
                )));
            }
            for (i, label) in labels.iter().enumerate() {
                let normalized = label.trim();
                if normalized.is_empty() {
                    return Err(EngineError::InvalidParams(format!(
                        "{field} label #{i} is blank"
                    )));
                }
                if labels[..i]
                    .iter()
                    .any(|other| other.trim().eq_ignore_ascii_case(normalized))
                {
                    return Err(EngineError::InvalidParams(format!(
                        "{field} label {normalized:?} is listed twice"
                    )));
                }
            }

            let weights = self.weights_for(field);
            if weights.len() != levels {
                return Err(EngineError::InvalidParams(format!(
                    "{field} needs {levels} weights, got {}",
                    weights.len()
                )));
            }
            if weights[0] != 0 {
                return Err(EngineError::InvalidParams(format!(
                    "{field} weight for the least severe answer must be 0"
                )));
            }
            if weights.windows(2).any(|w| w[1] <= w[0]) {
                return Err(EngineError::InvalidParams(format!(
                    "{field} weights must strictly increase with severity"
                )));
            }
            // Weights increase, so the last one is the field's maximum.
            max_score = weights
                .last()
                .and_then(|&w| max_score.checked_add(w))
                .ok_or_else(|| {
                    EngineError::InvalidParams(
                        "the highest possible score overflows u32".to_string(),
                    )
                })?;
        }

        if self.thresholds[0] == 0 {
            return Err(EngineError::InvalidParams(
                "the lowest tier threshold must be positive".to_string(),
            ));
        }
        if self.thresholds.windows(2).any(|t| t[1] <= t[0]) {
            return Err(EngineError::InvalidParams(
                "tier thresholds must strictly increase".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Routing parameters
// ---------------------------------------------------------------------------

/// Tunables for transport-graph construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingParams {
    pub metric: DistanceMetric,
    pub direction: GraphDirection,
    /// Decimal places kept when turning a coordinate into a node identity.
    /// 6 places is roughly 0.11 m at the equator.
    pub coordinate_precision: u32,
    /// Upper bound on stored edges. Records that would exceed it are dropped.
    pub max_edges: Option<usize>,
}

impl Default for RoutingParams {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::GreatCircle,
            direction: GraphDirection::Undirected,
            coordinate_precision: 6,
            max_edges: None,
        }
    }
}

impl RoutingParams {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.coordinate_precision > MAX_COORDINATE_PRECISION {
            return Err(EngineError::InvalidParams(format!(
                "coordinate precision {} exceeds the maximum of {MAX_COORDINATE_PRECISION}",
                self.coordinate_precision
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EngineParams resource
// ---------------------------------------------------------------------------

/// Central resource holding every engine tunable.
#[derive(Resource, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub severity: SeverityParams,
    pub routing: RoutingParams,
}

impl EngineParams {
    /// Parse a JSON document. Missing sections and fields take their defaults;
    /// the result is validated before it is returned.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let params: EngineParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.severity.validate()?;
        self.routing.validate()
    }
}
