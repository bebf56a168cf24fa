use std::sync::Arc;
use crate::core::payload::parse_json_payload;
use crate::models::{Constraint, Extraction};
use crate::services::gemini::TextGenerator;

const EXTRACTION_SYSTEM_PROMPT: &str = "\
You extract lunch-planning constraints from a user's request. \
Reply with a single JSON object and nothing else, using exactly these keys: \
\"area\" (neighborhood or city), \"venue\" (a landmark or office to eat near), \
\"time\" (meeting time), \"diet\" (dietary restriction such as diabetes, vegan, keto), \
\"health\" (health goal such as low carb, high protein, brain fuel). \
Use null for anything the request does not mention.";

/// Turns free text into a [`Constraint`] via a text-generation service
///
/// Never fails: any transport, formatting or schema problem yields
/// [`Extraction::Degraded`] carrying the default constraint.
pub struct ConstraintExtractor {
    generator: Arc<dyn TextGenerator>,
    fallback_area: String,
}

impl ConstraintExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, fallback_area: impl Into<String>) -> Self {
        Self {
            generator,
            fallback_area: fallback_area.into(),
        }
    }

    pub async fn extract(&self, raw: &str) -> Extraction {
        let prompt = format!("Request: {}", raw.trim());

        let response = match self.generator.generate(EXTRACTION_SYSTEM_PROMPT, &prompt).await {
            Ok(text) => text,
            Err(e) => return self.degraded(format!("text service failed: {}", e)),
        };

        match parse_json_payload::<Constraint>(&response) {
            Ok(constraint) => {
                Extraction::Extracted(constraint.with_fallback_area(&self.fallback_area))
            }
            Err(e) => self.degraded(e.to_string()),
        }
    }

    fn degraded(&self, reason: String) -> Extraction {
        tracing::warn!(reason = %reason, "Constraint extraction degraded to defaults");
        Extraction::Degraded {
            constraint: Constraint::fallback(&self.fallback_area),
            reason,
        }
    }
}
