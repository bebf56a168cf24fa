use serde::{Deserialize, Serialize};
use crate::models::domain::{Constraint, ScoredCandidate};

/// Outcome of free-text constraint extraction
///
/// Extraction never fails outright: when the text service misbehaves the
/// caller gets the default constraint together with the reason.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Extracted(Constraint),
    Degraded { constraint: Constraint, reason: String },
}

impl Extraction {
    pub fn constraint(&self) -> &Constraint {
        match self {
            Extraction::Extracted(c) => c,
            Extraction::Degraded { constraint, .. } => constraint,
        }
    }

    pub fn into_constraint(self) -> Constraint {
        match self {
            Extraction::Extracted(c) => c,
            Extraction::Degraded { constraint, .. } => constraint,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Extraction::Degraded { .. })
    }
}

/// Where the request's constraint came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintSource {
    Extracted,
    ExtractionDegraded,
    Supplied,
}

/// Final result of one pass through the recommendation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub request_id: String,
    pub constraint: Constraint,
    pub constraint_source: ConstraintSource,
    pub picks: Vec<ScoredCandidate>,
    pub text: String,
    /// True when the summarizer failed and `text` is an apology
    pub synthesis_degraded: bool,
}

impl Recommendation {
    pub fn top_pick(&self) -> Option<&ScoredCandidate> {
        self.picks.first()
    }
}
