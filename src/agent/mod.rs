// Agent surfaces: calendar batches, scheduling and the interactive session
pub mod calendar_agent;
pub mod interactive;
pub mod scheduler;

use std::sync::Arc;
use crate::config::Settings;
use crate::core::recommender::Recommender;
use crate::services::extractor::ConstraintExtractor;
use crate::services::gemini::TextGenerator;
use crate::services::synthesizer::ExplanationSynthesizer;
use crate::services::venues::{RetrievalError, VenueDirectory};

pub use calendar_agent::{AgentError, BatchReport, CalendarAgent, EventOutcome};
pub use interactive::{ask_once, run_repl, Console};
pub use scheduler::{interval_from_minutes, run_every, run_once};

/// Wire a recommender from settings around the given text service
pub fn build_recommender(
    settings: &Settings,
    generator: Arc<dyn TextGenerator>,
) -> Result<Recommender, RetrievalError> {
    let radius_km = settings.venues.search_radius_km;
    let directory = match &settings.venues.dataset_path {
        Some(path) => VenueDirectory::from_file(path, radius_km)?,
        None => VenueDirectory::builtin(radius_km),
    };

    let fallback_area = settings.agent.fallback_area.as_str();
    Ok(Recommender::new(
        ConstraintExtractor::new(generator.clone(), fallback_area),
        Arc::new(directory),
        ExplanationSynthesizer::new(generator),
        fallback_area,
    ))
}
