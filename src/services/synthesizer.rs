use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;
use crate::core::payload::{parse_json_payload, PayloadError};
use crate::models::{Constraint, ConstraintField, ScoredCandidate};
use crate::services::gemini::{GenerationError, TextGenerator};

/// Marker phrase present in every empty-result explanation
pub const NO_OPTIONS_TEXT: &str = "No options found";

const SYNTHESIS_SYSTEM_PROMPT: &str = "\
You are Lunza, a location-aware lunch menu advisor. For each venue you are given, \
suggest two or three specific menu items that fit the diner's constraints and write \
a one-sentence rationale that mentions the constraints it satisfies. \
Reply with a single JSON object and nothing else: \
{\"summary\": string, \"picks\": [{\"name\": string, \"menu_items\": [string], \"rationale\": string}]}. \
Use the venue names exactly as given.";

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("text service failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("unusable summary: {0}")]
    Payload(#[from] PayloadError),
}

#[derive(Debug, Default, Deserialize)]
struct SynthesisReply {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    picks: Vec<PickReply>,
}

#[derive(Debug, Deserialize)]
struct PickReply {
    name: String,
    #[serde(default)]
    menu_items: Vec<String>,
    #[serde(default)]
    rationale: Option<String>,
}

#[derive(Serialize)]
struct PromptVenue<'a> {
    rank: usize,
    name: &'a str,
    category: &'a str,
    tags: &'a [String],
    rating: f64,
    price: &'a str,
    score: u8,
}

/// Renders ranked venues into a readable recommendation
///
/// The text service only contributes menu suggestions and rationale. Names,
/// addresses and scores come straight from the input.
pub struct ExplanationSynthesizer {
    generator: Arc<dyn TextGenerator>,
}

impl ExplanationSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn render(
        &self,
        top: &[ScoredCandidate],
        constraint: &Constraint,
        recent_categories: &[String],
    ) -> Result<String, SynthesisError> {
        if top.is_empty() {
            return Ok(render_no_options(constraint));
        }

        let prompt = build_prompt(top, constraint, recent_categories);
        let response = self.generator.generate(SYNTHESIS_SYSTEM_PROMPT, &prompt).await?;
        let reply: SynthesisReply = parse_json_payload(&response)?;

        Ok(render_text(top, constraint, recent_categories, &reply))
    }
}

fn build_prompt(top: &[ScoredCandidate], constraint: &Constraint, recent: &[String]) -> String {
    let venues: Vec<PromptVenue> = top
        .iter()
        .enumerate()
        .map(|(i, s)| PromptVenue {
            rank: i + 1,
            name: &s.candidate.name,
            category: &s.candidate.category,
            tags: &s.candidate.tags,
            rating: s.candidate.rating,
            price: &s.candidate.price,
            score: s.score,
        })
        .collect();

    let mut prompt = String::new();
    let _ = writeln!(prompt, "Diner constraints:");
    for (label, value) in constraint_lines(constraint) {
        let _ = writeln!(prompt, "- {}: {}", label, value);
    }
    if !recent.is_empty() {
        let _ = writeln!(prompt, "Recently eaten categories (prefer variety): {}", recent.join(", "));
    }
    let _ = writeln!(
        prompt,
        "Ranked venues:\n{}",
        serde_json::to_string_pretty(&venues).unwrap_or_default()
    );
    prompt
}

fn constraint_lines(constraint: &Constraint) -> Vec<(&'static str, &str)> {
    [
        ConstraintField::Area,
        ConstraintField::Venue,
        ConstraintField::Time,
        ConstraintField::Diet,
        ConstraintField::Health,
    ]
    .into_iter()
    .filter_map(|f| constraint.get(f).map(|v| (f.as_str(), v)))
    .collect()
}

fn heading(constraint: &Constraint) -> String {
    let mut heading = String::from("Lunch recommendations");
    if let Some(area) = &constraint.area {
        let _ = write!(heading, " in {}", area);
    }
    if let Some(venue) = &constraint.venue {
        let _ = write!(heading, " near {}", venue);
    }
    if let Some(time) = &constraint.time {
        let _ = write!(heading, " for {}", time);
    }
    heading
}

fn render_no_options(constraint: &Constraint) -> String {
    format!(
        "{}\n\n{} that match your request. Try a different area or fewer restrictions.",
        heading(constraint),
        NO_OPTIONS_TEXT
    )
}

fn render_text(
    top: &[ScoredCandidate],
    constraint: &Constraint,
    recent: &[String],
    reply: &SynthesisReply,
) -> String {
    let mut out = heading(constraint);
    out.push('\n');
    if let Some(summary) = reply.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(out, "{}", summary.trim());
    }

    let advice_by_pick = match_advice(top, &reply.picks);
    for (i, (pick, advice)) in top.iter().zip(advice_by_pick).enumerate() {
        let c = &pick.candidate;

        let _ = writeln!(out, "\n{}. {} (score {}/100)", i + 1, c.name, pick.score);
        let _ = writeln!(out, "   Address: {}", c.address);
        let _ = writeln!(
            out,
            "   {} | {} | rated {:.1} | {}",
            c.category, c.price, c.rating, c.distance
        );

        let menu = advice
            .map(|a| a.menu_items.as_slice())
            .filter(|items| !items.is_empty());
        match menu {
            Some(items) => {
                let _ = writeln!(out, "   Try: {}", items.join(", "));
            }
            None => {
                let _ = writeln!(out, "   Try: ask for their {} specials", c.category.to_lowercase());
            }
        }

        let _ = writeln!(out, "   Why: {}", rationale(pick, constraint, advice));
    }

    if !recent.is_empty() {
        let _ = writeln!(out, "\nRecently chosen: {}", recent.join(", "));
    }

    out.trim_end().to_string()
}

/// Pair each rendered venue with at most one reply entry
///
/// A name match wins. Otherwise the entry at the same position is used,
/// but only when it names none of the rendered venues and is still unused.
fn match_advice<'a>(top: &[ScoredCandidate], replies: &'a [PickReply]) -> Vec<Option<&'a PickReply>> {
    let same_name = |reply: &PickReply, pick: &ScoredCandidate| {
        reply.name.trim().eq_ignore_ascii_case(pick.candidate.name.trim())
    };
    let mut used = vec![false; replies.len()];

    let mut matched: Vec<Option<usize>> = top
        .iter()
        .map(|pick| {
            let idx = replies
                .iter()
                .enumerate()
                .position(|(j, reply)| !used[j] && same_name(reply, pick))?;
            used[idx] = true;
            Some(idx)
        })
        .collect();

    for (i, slot) in matched.iter_mut().enumerate() {
        if slot.is_some() || i >= replies.len() || used[i] {
            continue;
        }
        if top.iter().any(|pick| same_name(&replies[i], pick)) {
            continue;
        }
        used[i] = true;
        *slot = Some(i);
    }

    matched.into_iter().map(|idx| idx.map(|j| &replies[j])).collect()
}

fn rationale(pick: &ScoredCandidate, constraint: &Constraint, advice: Option<&PickReply>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(text) = advice
        .and_then(|a| a.rationale.as_deref())
        .filter(|r| !r.trim().is_empty())
    {
        parts.push(text.trim().to_string());
    }

    let drivers: Vec<String> = [ConstraintField::Diet, ConstraintField::Health]
        .into_iter()
        .filter_map(|f| constraint.get(f).map(|v| format!("{} {}", f.as_str(), v)))
        .collect();
    if !drivers.is_empty() {
        parts.push(format!("Scored for {}", drivers.join(" and ")));
    }
    if !pick.reasons.is_empty() {
        parts.push(format!("({})", pick.reasons.join("; ")));
    }

    if parts.is_empty() {
        "A well-rated option nearby.".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candidate;
    use async_trait::async_trait;

    struct Canned(Option<&'static str>);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, GenerationError> {
            self.0.map(str::to_string).ok_or(GenerationError::EmptyResponse)
        }
    }

    fn scored(name: &str, address: &str, score: u8) -> ScoredCandidate {
        ScoredCandidate {
            candidate: Candidate {
                name: name.to_string(),
                address: address.to_string(),
                rating: 4.5,
                price: "$$".to_string(),
                distance: "0.2 mi".to_string(),
                tags: vec!["healthy".to_string()],
                category: "Salad".to_string(),
            },
            score,
            reasons: vec!["tagged healthy".to_string()],
        }
    }

    fn diabetes_constraint() -> Constraint {
        Constraint {
            area: Some("Soma".to_string()),
            diet: Some("diabetes".to_string()),
            ..Constraint::default()
        }
    }

    #[tokio::test]
    async fn test_empty_input_skips_text_service() {
        let synth = ExplanationSynthesizer::new(Arc::new(Canned(None)));
        let text = synth.render(&[], &diabetes_constraint(), &[]).await.unwrap();

        assert!(text.contains(NO_OPTIONS_TEXT));
        assert!(text.contains("in Soma"));
    }

    #[tokio::test]
    async fn test_names_and_addresses_verbatim() {
        let reply = r#"```json
{"summary": "Two solid picks.", "picks": [
  {"name": "greenleaf salad co.", "menu_items": ["Kale Caesar", "Salmon Plate"], "rationale": "Low sugar greens."}
]}
```"#;
        let synth = ExplanationSynthesizer::new(Arc::new(Canned(Some(reply))));
        let top = vec![
            scored("Greenleaf Salad Co.", "153 Townsend St, San Francisco, CA 94107", 95),
            scored("Yerba Grill", "88 Bluxome St, San Francisco, CA 94107", 80),
        ];

        let text = synth
            .render(&top, &diabetes_constraint(), &["Poke".to_string()])
            .await
            .unwrap();

        assert!(text.contains("1. Greenleaf Salad Co. (score 95/100)"));
        assert!(text.contains("Address: 153 Townsend St, San Francisco, CA 94107"));
        assert!(text.contains("Address: 88 Bluxome St, San Francisco, CA 94107"));
        assert!(text.contains("Try: Kale Caesar, Salmon Plate"));
        assert!(text.contains("Low sugar greens."));
        assert!(text.contains("Scored for diet diabetes"));
        assert!(text.contains("Recently chosen: Poke"));
    }

    #[tokio::test]
    async fn test_advice_not_reused_for_other_venue() {
        let reply = r#"{"picks": [{"name": "Yerba Grill", "menu_items": ["Lamb Shawarma"], "rationale": "Lean protein."}]}"#;
        let synth = ExplanationSynthesizer::new(Arc::new(Canned(Some(reply))));
        let mut grill = scored("Yerba Grill", "88 Bluxome St", 80);
        grill.candidate.category = "Grill".to_string();
        let top = vec![scored("Greenleaf Salad Co.", "153 Townsend St", 95), grill];

        let text = synth.render(&top, &Constraint::default(), &[]).await.unwrap();

        assert_eq!(text.matches("Lamb Shawarma").count(), 1);
        assert_eq!(text.matches("Lean protein.").count(), 1);
        let (greenleaf, yerba) = text.split_once("2. Yerba Grill").unwrap();
        assert!(greenleaf.contains("Try: ask for their salad specials"));
        assert!(yerba.contains("Try: Lamb Shawarma"));
    }

    #[tokio::test]
    async fn test_unnamed_advice_falls_back_to_position() {
        let reply = r#"{"picks": [{"name": "", "menu_items": ["Kale Caesar"]}, {"name": "Somewhere Else", "menu_items": ["Falafel Wrap"]}]}"#;
        let synth = ExplanationSynthesizer::new(Arc::new(Canned(Some(reply))));
        let top = vec![
            scored("Greenleaf Salad Co.", "153 Townsend St", 95),
            scored("Sprout Bowls", "2 Second St", 85),
        ];

        let text = synth.render(&top, &Constraint::default(), &[]).await.unwrap();

        let (first, second) = text.split_once("2. Sprout Bowls").unwrap();
        assert!(first.contains("Try: Kale Caesar"));
        assert!(second.contains("Try: Falafel Wrap"));
    }

    #[tokio::test]
    async fn test_missing_fields_still_readable() {
        let synth = ExplanationSynthesizer::new(Arc::new(Canned(Some("{\"picks\": []}"))));
        let top = vec![scored("Greenleaf Salad Co.", "153 Townsend St", 60)];

        let text = synth.render(&top, &Constraint::default(), &[]).await.unwrap();

        assert!(text.starts_with("Lunch recommendations"));
        assert!(text.contains("Try: ask for their salad specials"));
        assert!(text.contains("Why: (tagged healthy)"));
    }

    #[tokio::test]
    async fn test_generation_failure() {
        let synth = ExplanationSynthesizer::new(Arc::new(Canned(None)));
        let top = vec![scored("Greenleaf Salad Co.", "153 Townsend St", 60)];

        let err = synth.render(&top, &Constraint::default(), &[]).await.unwrap_err();
        assert!(matches!(err, SynthesisError::Generation(_)));
    }

    #[tokio::test]
    async fn test_non_json_reply_fails() {
        let synth = ExplanationSynthesizer::new(Arc::new(Canned(Some("Enjoy your lunch!"))));
        let top = vec![scored("Greenleaf Salad Co.", "153 Townsend St", 60)];

        let err = synth.render(&top, &Constraint::default(), &[]).await.unwrap_err();
        assert!(matches!(err, SynthesisError::Payload(_)));
    }
}
