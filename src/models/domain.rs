use serde::{Deserialize, Serialize};
use validator::Validate;

/// Normalized lunch constraints for a single request
///
/// Every field is optional. Only `area` receives a default, applied by
/// [`Constraint::with_fallback_area`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub diet: Option<String>,
    #[serde(default)]
    pub health: Option<String>,
}

impl Constraint {
    /// The default constraint: only the fallback area is set
    pub fn fallback(area: &str) -> Self {
        Self {
            area: Some(area.to_string()),
            ..Self::default()
        }
    }

    /// Trim every field, drop blank ones and fill in the fallback area
    pub fn with_fallback_area(self, fallback: &str) -> Self {
        let area = non_blank(self.area).unwrap_or_else(|| fallback.to_string());
        Self {
            area: Some(area),
            venue: non_blank(self.venue),
            time: non_blank(self.time),
            diet: non_blank(self.diet),
            health: non_blank(self.health),
        }
    }

    pub fn get(&self, field: ConstraintField) -> Option<&str> {
        match field {
            ConstraintField::Area => self.area.as_deref(),
            ConstraintField::Venue => self.venue.as_deref(),
            ConstraintField::Time => self.time.as_deref(),
            ConstraintField::Diet => self.diet.as_deref(),
            ConstraintField::Health => self.health.as_deref(),
        }
    }

    pub fn set(&mut self, field: ConstraintField, value: Option<String>) {
        let value = non_blank(value);
        match field {
            ConstraintField::Area => self.area = value,
            ConstraintField::Venue => self.venue = value,
            ConstraintField::Time => self.time = value,
            ConstraintField::Diet => self.diet = value,
            ConstraintField::Health => self.health = value,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

/// Names of the constraint fields, used by the interactive fill stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintField {
    Area,
    Venue,
    Time,
    Diet,
    Health,
}

impl ConstraintField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintField::Area => "area",
            ConstraintField::Venue => "venue",
            ConstraintField::Time => "time",
            ConstraintField::Diet => "diet",
            ConstraintField::Health => "health",
        }
    }
}

/// A venue returned by retrieval, before scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub price: String,
    pub distance: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: String,
}

impl Candidate {
    /// Case-insensitive check for any of the given tags
    pub fn has_any_tag(&self, markers: &[&str]) -> bool {
        self.tags
            .iter()
            .any(|tag| markers.iter().any(|m| tag.trim().eq_ignore_ascii_case(m)))
    }
}

/// Candidate with its suitability score attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub score: u8,
    /// Human-readable reasons for the positive and negative adjustments
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// One remembered selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub name: String,
    pub category: String,
}

/// Normalized calendar event as produced by an event source
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CalendarEvent {
    #[validate(length(min = 1))]
    #[serde(alias = "eventId")]
    pub event_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[validate(length(min = 1))]
    #[serde(alias = "startTime", default)]
    pub start_time: String,
    #[serde(alias = "endTime", default)]
    pub end_time: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub organizer: String,
}
