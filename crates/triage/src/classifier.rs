//! Severity classification of the intake questionnaire.
//!
//! Four categorical answers are parsed against the configured label sets,
//! scored additively with per-level weights, and bucketed into one of five
//! ordered [`SeverityTier`]s. Only the tier drives queue priority; the raw
//! score is kept for audit and display.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::params::SeverityParams;

// ---------------------------------------------------------------------------
// Questionnaire fields
// ---------------------------------------------------------------------------

/// The four questionnaire fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionField {
    Consciousness,
    Breathing,
    Bleeding,
    Trauma,
}

impl QuestionField {
    pub const ALL: [QuestionField; 4] = [
        QuestionField::Consciousness,
        QuestionField::Breathing,
        QuestionField::Bleeding,
        QuestionField::Trauma,
    ];

    /// Number of severity levels this field distinguishes.
    pub fn level_count(self) -> usize {
        match self {
            QuestionField::Consciousness => Consciousness::ALL.len(),
            QuestionField::Breathing => Breathing::ALL.len(),
            QuestionField::Bleeding => Bleeding::ALL.len(),
            QuestionField::Trauma => Trauma::ALL.len(),
        }
    }
}

impl fmt::Display for QuestionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionField::Consciousness => "consciousness",
            QuestionField::Breathing => "breathing",
            QuestionField::Bleeding => "bleeding",
            QuestionField::Trauma => "trauma",
        };
        f.write_str(name)
    }
}

/// Level of responsiveness (AVPU scale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Consciousness {
    Alert,
    Verbal,
    Pain,
    Unresponsive,
}

impl Consciousness {
    pub const ALL: [Consciousness; 4] = [
        Consciousness::Alert,
        Consciousness::Verbal,
        Consciousness::Pain,
        Consciousness::Unresponsive,
    ];
}

/// Breathing distress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Breathing {
    Normal,
    Laboured,
    Critical,
}

impl Breathing {
    pub const ALL: [Breathing; 3] = [Breathing::Normal, Breathing::Laboured, Breathing::Critical];
}

/// Combined pain / bleeding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Bleeding {
    None,
    Mild,
    Moderate,
    Severe,
}

impl Bleeding {
    pub const ALL: [Bleeding; 4] = [
        Bleeding::None,
        Bleeding::Mild,
        Bleeding::Moderate,
        Bleeding::Severe,
    ];
}

/// Physical trauma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Trauma {
    None,
    Minor,
    Major,
}

impl Trauma {
    pub const ALL: [Trauma; 3] = [Trauma::None, Trauma::Minor, Trauma::Major];
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// Unvalidated answers exactly as the intake form supplied them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAnswers {
    pub consciousness: String,
    pub breathing: String,
    pub bleeding: String,
    pub trauma: String,
}

impl RawAnswers {
    pub fn new(
        consciousness: impl Into<String>,
        breathing: impl Into<String>,
        bleeding: impl Into<String>,
        trauma: impl Into<String>,
    ) -> Self {
        Self {
            consciousness: consciousness.into(),
            breathing: breathing.into(),
            bleeding: bleeding.into(),
            trauma: trauma.into(),
        }
    }

    fn get(&self, field: QuestionField) -> &str {
        match field {
            QuestionField::Consciousness => &self.consciousness,
            QuestionField::Breathing => &self.breathing,
            QuestionField::Bleeding => &self.bleeding,
            QuestionField::Trauma => &self.trauma,
        }
    }
}

/// A validated questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Questionnaire {
    pub consciousness: Consciousness,
    pub breathing: Breathing,
    pub bleeding: Bleeding,
    pub trauma: Trauma,
}

impl Questionnaire {
    /// Parse raw labels. Fails on the first field whose value is not one of
    /// the configured labels; matching ignores surrounding whitespace and
    /// ASCII case.
    pub fn parse(answers: &RawAnswers, params: &SeverityParams) -> Result<Self, EngineError> {
        let level = |field: QuestionField| -> Result<usize, EngineError> {
            let value = answers.get(field);
            let needle = value.trim();
            params
                .labels_for(field)
                .iter()
                .position(|label| label.trim().eq_ignore_ascii_case(needle))
                .ok_or_else(|| EngineError::InvalidInput {
                    field,
                    value: value.to_string(),
                })
        };

        // Level indices are bounded by the label table, which validation ties
        // to the enum size; `get` keeps a mis-sized table from panicking.
        let out_of_domain = |field: QuestionField| EngineError::InvalidInput {
            field,
            value: answers.get(field).to_string(),
        };
        Ok(Self {
            consciousness: *Consciousness::ALL
                .get(level(QuestionField::Consciousness)?)
                .ok_or_else(|| out_of_domain(QuestionField::Consciousness))?,
            breathing: *Breathing::ALL
                .get(level(QuestionField::Breathing)?)
                .ok_or_else(|| out_of_domain(QuestionField::Breathing))?,
            bleeding: *Bleeding::ALL
                .get(level(QuestionField::Bleeding)?)
                .ok_or_else(|| out_of_domain(QuestionField::Bleeding))?,
            trauma: *Trauma::ALL
                .get(level(QuestionField::Trauma)?)
                .ok_or_else(|| out_of_domain(QuestionField::Trauma))?,
        })
    }

    /// Severity level index of `field`, 0 being the least severe.
    pub fn level(&self, field: QuestionField) -> usize {
        match field {
            QuestionField::Consciousness => self.consciousness as usize,
            QuestionField::Breathing => self.breathing as usize,
            QuestionField::Bleeding => self.bleeding as usize,
            QuestionField::Trauma => self.trauma as usize,
        }
    }

    /// Additive score over the per-field weights. Saturates at `u32::MAX`
    /// for tables that skipped [`SeverityParams::validate`].
    pub fn score(&self, params: &SeverityParams) -> u32 {
        QuestionField::ALL
            .into_iter()
            .map(|field| {
                params
                    .weights_for(field)
                    .get(self.level(field))
                    .copied()
                    .unwrap_or(0)
            })
            .fold(0, u32::saturating_add)
    }

    /// True when no field of `self` is more severe than the matching field of
    /// `other`.
    pub fn dominated_by(&self, other: &Questionnaire) -> bool {
        self.consciousness <= other.consciousness
            && self.breathing <= other.breathing
            && self.bleeding <= other.bleeding
            && self.trauma <= other.trauma
    }
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Ordered severity tier; `Critical` is served first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityTier {
    Mild = 1,
    Moderate = 2,
    Severe = 3,
    Urgent = 4,
    Critical = 5,
}

impl SeverityTier {
    pub const ALL: [SeverityTier; 5] = [
        SeverityTier::Mild,
        SeverityTier::Moderate,
        SeverityTier::Severe,
        SeverityTier::Urgent,
        SeverityTier::Critical,
    ];

    /// Bucket a score. `thresholds[i]` is the inclusive lower bound of the
    /// tier after `ALL[i]`, so the buckets are contiguous and cover every
    /// score.
    pub fn from_score(score: u32, thresholds: &[u32; 4]) -> Self {
        let passed = thresholds.iter().filter(|&&t| score >= t).count();
        Self::ALL[passed]
    }

    /// Numeric rank, 1 (mild) to 5 (critical).
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            SeverityTier::Mild => "mild",
            SeverityTier::Moderate => "moderate",
            SeverityTier::Severe => "severe",
            SeverityTier::Urgent => "urgent",
            SeverityTier::Critical => "critical",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    pub score: u32,
    pub tier: SeverityTier,
}

impl Classification {
    pub fn of(questionnaire: &Questionnaire, params: &SeverityParams) -> Self {
        let score = questionnaire.score(params);
        Self {
            score,
            tier: SeverityTier::from_score(score, &params.thresholds),
        }
    }
}

/// Parse and classify in one step. Pure: the same answers and params always
/// give the same result.
pub fn classify(
    answers: &RawAnswers,
    params: &SeverityParams,
) -> Result<(Questionnaire, Classification), EngineError> {
    let questionnaire = Questionnaire::parse(answers, params)?;
    let classification = Classification::of(&questionnaire, params);
    Ok((questionnaire, classification))
}
