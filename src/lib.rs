//! Lunza - calendar-aware lunch recommendations
//!
//! This library provides the recommendation pipeline used by the `lunza`
//! agent: constraint extraction, venue retrieval, suitability scoring with
//! a short selection memory, and explanation synthesis.

pub mod agent;
pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use core::{Recommender, RecommendationInput, SelectionMemory};
pub use models::{CalendarEvent, Candidate, Constraint, Recommendation, ScoredCandidate};
