// Core pipeline exports
pub mod distance;
pub mod events;
pub mod memory;
pub mod payload;
pub mod recommender;
pub mod scoring;

pub use distance::{haversine_km, BoundingBox, GeoPoint};
pub use events::{build_query, constraint_from_event, is_lunch_meeting};
pub use memory::{SelectionMemory, DEFAULT_MEMORY_CAP};
pub use payload::{extract_json_payload, parse_json_payload, PayloadError};
pub use recommender::{rank, Prompter, RecommendError, RecommendationInput, Recommender, TOP_N};
pub use scoring::{score, score_card, Adjustments, ScoreCard};
