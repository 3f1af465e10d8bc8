// ---------------------------------------------------------------------------
// EngineError: typed failures for classification, graph input and params
// ---------------------------------------------------------------------------

use std::fmt;

use crate::classifier::QuestionField;
use crate::graph::RecordDefect;

/// Errors surfaced synchronously to the immediate caller.
///
/// None of these is fatal: a rejected questionnaire leaves the queue as it
/// was, and a rejected transport record is skipped while the build carries on
/// with the rest. An empty queue and an unreachable destination are not errors
/// at all; they are `None` and `RouteResult { found: false, .. }`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A questionnaire field held a value outside its label set.
    InvalidInput { field: QuestionField, value: String },
    /// One transport record was malformed and has been skipped.
    InvalidRecord { index: usize, defect: RecordDefect },
    /// Engine parameters failed validation.
    InvalidParams(String),
    /// Engine parameters could not be parsed.
    Config(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidInput { field, value } => {
                write!(f, "Invalid input: {value:?} is not a valid {field} answer")
            }
            EngineError::InvalidRecord { index, defect } => {
                write!(f, "Invalid transport record #{index}: {defect}")
            }
            EngineError::InvalidParams(msg) => write!(f, "Invalid engine parameters: {msg}"),
            EngineError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Config(e.to_string())
    }
}
