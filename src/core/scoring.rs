use crate::core::memory::SelectionMemory;
use crate::models::Candidate;

const BASE_SCORE: i32 = 50;
const MIN_SCORE: i32 = 0;
const MAX_SCORE: i32 = 100;

const DIABETES_TERMS: &[&str] = &["diabetes", "diabetic", "blood sugar"];

const DIABETES_FRIENDLY_TAGS: &[&str] = &["diabetes-friendly", "diabetic-friendly", "low-carb", "low carb"];
const LOW_CARB_TAGS: &[&str] = &["low-carb", "low carb", "keto"];
const HEALTHY_TAGS: &[&str] = &["healthy"];
const PROTEIN_TAGS: &[&str] = &["protein", "high-protein", "high protein"];
const SUGAR_TAGS: &[&str] = &["dessert", "sugary", "sweets", "bakery"];
const ORGANIC_TAGS: &[&str] = &["organic"];

/// Points awarded or deducted by each rule
#[derive(Debug, Clone, Copy)]
pub struct Adjustments {
    pub diabetes_friendly: i32,
    pub diabetes_healthy: i32,
    pub diabetes_protein: i32,
    pub diabetes_sugar: i32,
    pub health_low_carb: i32,
    pub health_high_protein: i32,
    pub health_brain_fuel: i32,
    pub healthy: i32,
    pub organic: i32,
    pub rating_per_star: f64,
    pub repeat_category: i32,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            diabetes_friendly: 30,
            diabetes_healthy: 15,
            diabetes_protein: 10,
            diabetes_sugar: -20,
            health_low_carb: 25,
            health_high_protein: 20,
            health_brain_fuel: 15,
            healthy: 10,
            organic: 5,
            rating_per_star: 10.0,
            repeat_category: -15,
        }
    }
}

/// Score plus the reasons behind each adjustment
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub score: u8,
    pub reasons: Vec<String>,
}

/// Calculate a suitability score (0-100) for a venue
///
/// Scoring formula:
/// score = 50
///     + diet rules       # only when diet mentions diabetes
///     + health rules     # "low carb", "high protein", "brain fuel"
///     + healthy/organic  # unconditional tag bonuses
///     + (rating - 4.0) * 10
///     - 15 if the category was picked recently
///
/// The result is clamped, never rejected.
pub fn score(
    candidate: &Candidate,
    diet: Option<&str>,
    health: Option<&str>,
    memory: &SelectionMemory,
) -> u8 {
    score_card(candidate, diet, health, memory, &Adjustments::default()).score
}

pub fn score_card(
    candidate: &Candidate,
    diet: Option<&str>,
    health: Option<&str>,
    memory: &SelectionMemory,
    adj: &Adjustments,
) -> ScoreCard {
    let mut total = BASE_SCORE;
    let mut reasons = Vec::new();

    let healthy = candidate.has_any_tag(HEALTHY_TAGS);
    let protein = candidate.has_any_tag(PROTEIN_TAGS);

    // Diet rules: independent checks, several may apply at once
    if let Some(diet) = diet.map(str::to_lowercase) {
        if DIABETES_TERMS.iter().any(|t| diet.contains(t)) {
            if candidate.has_any_tag(DIABETES_FRIENDLY_TAGS) {
                total += adj.diabetes_friendly;
                reasons.push(format!("diabetes-friendly options for a {} diet", diet));
            }
            if healthy {
                total += adj.diabetes_healthy;
                reasons.push(format!("healthy menu suits a {} diet", diet));
            }
            if protein {
                total += adj.diabetes_protein;
                reasons.push("protein-rich dishes help steady blood sugar".to_string());
            }
            if candidate.has_any_tag(SUGAR_TAGS) {
                total += adj.diabetes_sugar;
                reasons.push(format!("sugary menu is a poor fit for a {} diet", diet));
            }
        }
    }

    // Health goals
    if let Some(health) = health.map(str::to_lowercase) {
        if health.contains("low carb") && candidate.has_any_tag(LOW_CARB_TAGS) {
            total += adj.health_low_carb;
            reasons.push("low-carb dishes match the low carb goal".to_string());
        }
        if health.contains("high protein") && protein {
            total += adj.health_high_protein;
            reasons.push("protein-forward menu matches the high protein goal".to_string());
        }
        if health.contains("brain fuel") && (protein || healthy) {
            total += adj.health_brain_fuel;
            reasons.push("balanced meals for brain fuel".to_string());
        }
    }

    if healthy {
        total += adj.healthy;
        reasons.push("tagged healthy".to_string());
    }
    if candidate.has_any_tag(ORGANIC_TAGS) {
        total += adj.organic;
        reasons.push("organic ingredients".to_string());
    }

    let rating_delta = ((candidate.rating - 4.0) * adj.rating_per_star).round() as i32;
    if rating_delta != 0 {
        total += rating_delta;
        reasons.push(format!("rated {:.1}/5", candidate.rating));
    }

    if memory.should_avoid(&candidate.category) {
        total += adj.repeat_category;
        reasons.push(format!("{} was picked recently", candidate.category));
    }

    ScoreCard {
        score: total.clamp(MIN_SCORE, MAX_SCORE) as u8,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_candidate(tags: &[&str], rating: f64, category: &str) -> Candidate {
        Candidate {
            name: "Test Venue".to_string(),
            address: "1 Market St".to_string(),
            rating,
            price: "$$".to_string(),
            distance: "0.2 mi".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_base_score_for_plain_venue() {
        let candidate = create_candidate(&[], 4.0, "Deli");
        let memory = SelectionMemory::default();

        assert_eq!(score(&candidate, None, None, &memory), 50);
    }

    #[test]
    fn test_diabetes_scenario_clamps_to_100() {
        let candidate = create_candidate(&["diabetes-friendly", "healthy"], 4.5, "Salad");
        let memory = SelectionMemory::default();

        assert_eq!(score(&candidate, Some("diabetes"), None, &memory), 100);
    }

    #[test]
    fn test_diet_rules_are_independent() {
        let memory = SelectionMemory::default();
        // +30 (low-carb) +10 (protein) -20 (dessert)
        let candidate = create_candidate(&["low-carb", "protein", "dessert"], 4.0, "Cafe");

        assert_eq!(score(&candidate, Some("Diabetic"), None, &memory), 70);
    }

    #[test]
    fn test_diet_rules_need_diabetes_term() {
        let memory = SelectionMemory::default();
        let candidate = create_candidate(&["dessert"], 4.0, "Bakery");

        assert_eq!(score(&candidate, Some("vegetarian"), None, &memory), 50);
        assert_eq!(score(&candidate, Some("diabetes"), None, &memory), 30);
    }

    #[test]
    fn test_health_rules() {
        let memory = SelectionMemory::default();
        let low_carb = create_candidate(&["low-carb"], 4.0, "Grill");
        let protein = create_candidate(&["protein"], 4.0, "Grill");

        assert_eq!(score(&low_carb, None, Some("Low Carb"), &memory), 75);
        assert_eq!(score(&protein, None, Some("high protein"), &memory), 70);
        assert_eq!(score(&protein, None, Some("brain fuel"), &memory), 65);
    }

    #[test]
    fn test_negative_rating_adjustment() {
        let memory = SelectionMemory::default();
        let candidate = create_candidate(&[], 3.5, "Deli");

        assert_eq!(score(&candidate, None, None, &memory), 45);
    }

    #[test]
    fn test_repeat_penalty() {
        let mut memory = SelectionMemory::default();
        let candidate = create_candidate(&[], 4.0, "Salad");
        let before = score(&candidate, None, None, &memory);

        memory.record("Other Salad Place", "salad");
        let after = score(&candidate, None, None, &memory);

        assert_eq!(before - after, 15);
    }

    #[test]
    fn test_floor_clamp() {
        let mut memory = SelectionMemory::default();
        memory.record("Donut Hole", "Bakery");
        let candidate = create_candidate(&["dessert", "sweets"], 0.0, "Bakery");

        // 50 - 20 - 40 - 15 = -25
        assert_eq!(score(&candidate, Some("diabetes"), None, &memory), 0);
    }

    #[test]
    fn test_score_card_reasons() {
        let memory = SelectionMemory::default();
        let candidate = create_candidate(&["healthy", "organic"], 4.0, "Salad");
        let card = score_card(&candidate, None, None, &memory, &Adjustments::default());

        assert_eq!(card.score, 65);
        assert_eq!(card.reasons, vec!["tagged healthy", "organic ingredients"]);
    }
}
