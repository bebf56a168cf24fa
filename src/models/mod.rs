// Model exports
pub mod domain;
pub mod outcome;

pub use domain::{Candidate, CalendarEvent, Constraint, ConstraintField, MemoryEntry, ScoredCandidate};
pub use outcome::{ConstraintSource, Extraction, Recommendation};
