use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;
use crate::core::events::build_query;
use crate::core::memory::SelectionMemory;
use crate::core::scoring::{score_card, Adjustments};
use crate::models::{
    Candidate, Constraint, ConstraintField, ConstraintSource, Recommendation, ScoredCandidate,
};
use crate::services::extractor::ConstraintExtractor;
use crate::services::synthesizer::ExplanationSynthesizer;
use crate::services::venues::{RetrievalError, VenueRetriever};

/// Number of venues kept after ranking
pub const TOP_N: usize = 3;

const APOLOGY_TEXT: &str = "Sorry, I found some lunch options but could not put together a \
recommendation right now. Please try again in a moment.";

/// Fields solicited during interactive fill, in asking order
const FILLABLE: &[(ConstraintField, &str)] = &[
    (ConstraintField::Venue, "Where will you be? (office, landmark, or 'skip')"),
    (ConstraintField::Time, "What time is lunch? (or 'skip')"),
    (ConstraintField::Health, "Any health goal, e.g. low carb, high protein, brain fuel? (or 'skip')"),
];

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("Venue retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),
}

/// What the pipeline starts from
#[derive(Debug, Clone)]
pub enum RecommendationInput {
    /// Free text, parsed by the constraint extractor
    FreeText(String),
    /// Constraint built elsewhere, e.g. from a calendar event
    Structured(Constraint),
}

/// Asks the requester for a missing constraint field
///
/// Returning `None`, an empty answer or "skip" leaves the field absent.
#[async_trait]
pub trait Prompter: Send {
    async fn ask(&mut self, field: ConstraintField, question: &str) -> Option<String>;
}

/// Recommendation pipeline
///
/// # Pipeline Stages
/// 1. Extract (or accept) a constraint
/// 2. Fill missing fields, interactive only
/// 3. Retrieve candidates
/// 4. Score and rank, keeping the top three
/// 5. Record the top pick in selection memory
/// 6. Synthesize the explanation
pub struct Recommender {
    extractor: ConstraintExtractor,
    retriever: Arc<dyn VenueRetriever>,
    synthesizer: ExplanationSynthesizer,
    fallback_area: String,
    adjustments: Adjustments,
}

impl Recommender {
    pub fn new(
        extractor: ConstraintExtractor,
        retriever: Arc<dyn VenueRetriever>,
        synthesizer: ExplanationSynthesizer,
        fallback_area: impl Into<String>,
    ) -> Self {
        Self {
            extractor,
            retriever,
            synthesizer,
            fallback_area: fallback_area.into(),
            adjustments: Adjustments::default(),
        }
    }

    pub fn with_adjustments(mut self, adjustments: Adjustments) -> Self {
        self.adjustments = adjustments;
        self
    }

    pub fn fallback_area(&self) -> &str {
        &self.fallback_area
    }

    /// Run one request through every stage
    ///
    /// Only retrieval failures are returned as errors. Extraction and
    /// synthesis problems degrade and are flagged on the result.
    pub async fn recommend(
        &self,
        input: RecommendationInput,
        memory: &mut SelectionMemory,
        prompter: Option<&mut dyn Prompter>,
    ) -> Result<Recommendation, RecommendError> {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("recommendation", request_id = %request_id);

        self.run(request_id.clone(), input, memory, prompter)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        request_id: String,
        input: RecommendationInput,
        memory: &mut SelectionMemory,
        prompter: Option<&mut dyn Prompter>,
    ) -> Result<Recommendation, RecommendError> {
        // EXTRACT
        let (mut constraint, constraint_source) = match input {
            RecommendationInput::FreeText(text) => {
                let extraction = self.extractor.extract(&text).await;
                let source = if extraction.is_degraded() {
                    ConstraintSource::ExtractionDegraded
                } else {
                    ConstraintSource::Extracted
                };
                (extraction.into_constraint(), source)
            }
            RecommendationInput::Structured(c) => (
                c.with_fallback_area(&self.fallback_area),
                ConstraintSource::Supplied,
            ),
        };

        // FILL_MISSING
        if let Some(prompter) = prompter {
            fill_missing(&mut constraint, prompter).await;
        }

        tracing::info!(query = %build_query(&constraint), source = ?constraint_source, "Constraint ready");

        // RETRIEVE
        let area = constraint.area.as_deref().unwrap_or(&self.fallback_area);
        let candidates = self
            .retriever
            .search(area, constraint.venue.as_deref())
            .await
            .map_err(|e| {
                tracing::error!(area, "Retrieval failed: {}", e);
                e
            })?;

        tracing::debug!(area, candidates = candidates.len(), "Retrieved candidates");

        // SCORE_AND_RANK
        let picks = rank(candidates, &constraint, memory, &self.adjustments);

        // Snapshot before the update so the explanation reflects what scoring saw
        let recent_categories = memory.recent_categories();

        // UPDATE_MEMORY
        if let Some(top) = picks.first() {
            memory.record(top.candidate.name.clone(), top.candidate.category.clone());
            tracing::debug!(venue = %top.candidate.name, score = top.score, "Recorded top pick");
        }

        // SYNTHESIZE
        let (text, synthesis_degraded) = match self
            .synthesizer
            .render(&picks, &constraint, &recent_categories)
            .await
        {
            Ok(text) => (text, false),
            Err(e) => {
                tracing::warn!("Synthesis degraded: {}", e);
                (APOLOGY_TEXT.to_string(), true)
            }
        };

        tracing::info!(picks = picks.len(), synthesis_degraded, "Recommendation complete");

        Ok(Recommendation {
            request_id,
            constraint,
            constraint_source,
            picks,
            text,
            synthesis_degraded,
        })
    }
}

/// Score every candidate and keep the best [`TOP_N`]
///
/// The sort is stable, so equal scores keep retrieval order.
pub fn rank(
    candidates: Vec<Candidate>,
    constraint: &Constraint,
    memory: &SelectionMemory,
    adjustments: &Adjustments,
) -> Vec<ScoredCandidate> {
    let diet = constraint.diet.as_deref();
    let health = constraint.health.as_deref();

    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let card = score_card(&candidate, diet, health, memory, adjustments);
            ScoredCandidate {
                candidate,
                score: card.score,
                reasons: card.reasons,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(TOP_N);
    scored
}

async fn fill_missing(constraint: &mut Constraint, prompter: &mut dyn Prompter) {
    for (field, question) in FILLABLE {
        if constraint.get(*field).is_some() {
            continue;
        }
        let answer = prompter
            .ask(*field, question)
            .await
            .filter(|a| !a.trim().eq_ignore_ascii_case("skip"));
        constraint.set(*field, answer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gemini::{GenerationError, TextGenerator};

    struct Silent;

    #[async_trait]
    impl TextGenerator for Silent {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::EmptyResponse)
        }
    }

    struct FixedVenues(Vec<Candidate>);

    #[async_trait]
    impl VenueRetriever for FixedVenues {
        async fn search(&self, _area: &str, _hint: Option<&str>) -> Result<Vec<Candidate>, RetrievalError> {
            Ok(self.0.clone())
        }
    }

    struct Scripted(Vec<&'static str>, Vec<ConstraintField>);

    #[async_trait]
    impl Prompter for Scripted {
        async fn ask(&mut self, field: ConstraintField, _question: &str) -> Option<String> {
            self.1.push(field);
            if self.0.is_empty() {
                None
            } else {
                Some(self.0.remove(0).to_string())
            }
        }
    }

    fn create_candidate(name: &str, category: &str, rating: f64, tags: &[&str]) -> Candidate {
        Candidate {
            name: name.to_string(),
            address: format!("{} Main St", name.len()),
            rating,
            price: "$$".to_string(),
            distance: "0.1 mi".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: category.to_string(),
        }
    }

    fn recommender(candidates: Vec<Candidate>) -> Recommender {
        let generator: Arc<dyn TextGenerator> = Arc::new(Silent);
        Recommender::new(
            ConstraintExtractor::new(generator.clone(), "San Francisco"),
            Arc::new(FixedVenues(candidates)),
            ExplanationSynthesizer::new(generator),
            "San Francisco",
        )
    }

    #[test]
    fn test_rank_is_stable_and_truncated() {
        let candidates = vec![
            create_candidate("A", "Salad", 4.0, &[]),
            create_candidate("B", "Poke", 4.0, &[]),
            create_candidate("C", "Grill", 4.5, &[]),
            create_candidate("D", "Deli", 4.0, &[]),
        ];

        let picks = rank(
            candidates,
            &Constraint::default(),
            &SelectionMemory::default(),
            &Adjustments::default(),
        );

        let names: Vec<&str> = picks.iter().map(|p| p.candidate.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_memory_updated_even_when_synthesis_degrades() {
        let recommender = recommender(vec![create_candidate("Greenleaf", "Salad", 4.5, &["healthy"])]);
        let mut memory = SelectionMemory::default();

        let result = recommender
            .recommend(RecommendationInput::Structured(Constraint::default()), &mut memory, None)
            .await
            .unwrap();

        assert!(result.synthesis_degraded);
        assert_eq!(result.text, APOLOGY_TEXT);
        assert_eq!(result.constraint_source, ConstraintSource::Supplied);
        assert_eq!(result.constraint.area.as_deref(), Some("San Francisco"));
        assert_eq!(memory.recent_categories(), vec!["Salad".to_string()]);
    }

    #[tokio::test]
    async fn test_fill_missing_asks_only_absent_fields() {
        let recommender = recommender(vec![]);
        let mut memory = SelectionMemory::default();
        let mut prompter = Scripted(vec!["skip", "high protein"], Vec::new());

        let constraint = Constraint {
            venue: Some("GitHub HQ".to_string()),
            ..Constraint::default()
        };
        let result = recommender
            .recommend(
                RecommendationInput::Structured(constraint),
                &mut memory,
                Some(&mut prompter),
            )
            .await
            .unwrap();

        assert_eq!(prompter.1, vec![ConstraintField::Time, ConstraintField::Health]);
        assert_eq!(result.constraint.time, None);
        assert_eq!(result.constraint.health.as_deref(), Some("high protein"));
        assert!(memory.is_empty());
    }
}
