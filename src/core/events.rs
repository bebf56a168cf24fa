use chrono::{DateTime, NaiveDateTime, Timelike};
use crate::models::{CalendarEvent, Constraint};

const LUNCH_KEYWORDS: &[&str] = &["lunch", "meal", "dining", "restaurant", "food", "eat"];
const LUNCH_HOURS: std::ops::RangeInclusive<u32> = 11..=14;

/// (location keyword, canonical area)
const AREAS: &[(&str, &str)] = &[
    ("san francisco", "San Francisco"),
    ("downtown", "Downtown"),
    ("soma", "Soma"),
    ("mission", "Mission"),
    ("financial district", "Financial District"),
    ("north beach", "North Beach"),
    ("hayes valley", "Hayes Valley"),
];

const DIETS: &[(&str, &[&str])] = &[
    ("diabetes", &["diabetes", "diabetic", "blood sugar"]),
    ("vegetarian", &["vegetarian", "veggie"]),
    ("vegan", &["vegan"]),
    ("keto", &["keto", "ketogenic"]),
    ("gluten-free", &["gluten-free", "gluten free", "celiac"]),
    ("low-carb", &["low carb", "low-carb"]),
    ("paleo", &["paleo"]),
];

const HEALTH_GOALS: &[(&str, &[&str])] = &[
    ("low carb", &["low carb", "low-carb"]),
    ("high protein", &["high protein", "protein"]),
    ("brain fuel", &["brain", "focus", "energy"]),
    ("healthy", &["healthy", "nutritious"]),
];

const CITY_SUFFIXES: &[&str] = &["san francisco", "sf", "ca"];

/// Wall-clock start of an event in its own offset
///
/// Accepts RFC 3339 (`2026-10-20T12:30:00-07:00`, `...Z`) and naive
/// ISO-8601 date-times. All-day events (date only) yield `None`.
pub fn parse_start(start_time: &str) -> Option<NaiveDateTime> {
    let raw = start_time.trim();
    if !raw.contains('T') {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Whether an event looks like a lunch meeting
///
/// It must start between 11:00 and 14:59. Then either the title or the
/// description mentions food, or it starts in the noon hour.
pub fn is_lunch_meeting(event: &CalendarEvent) -> bool {
    let Some(start) = parse_start(&event.start_time) else {
        return false;
    };
    let hour = start.hour();
    if !LUNCH_HOURS.contains(&hour) {
        return false;
    }

    let title = event.title.to_lowercase();
    let description = event.description.to_lowercase();
    LUNCH_KEYWORDS
        .iter()
        .any(|k| title.contains(k) || description.contains(k))
        || hour == 12
}

/// Rule-based constraint extraction for calendar events
///
/// The area falls back to `fallback_area` when the location names no known
/// neighborhood.
pub fn constraint_from_event(event: &CalendarEvent, fallback_area: &str) -> Constraint {
    let full_text = format!("{} {}", event.title, event.description).to_lowercase();

    Constraint {
        area: extract_area(&event.location),
        venue: extract_venue(&event.location),
        time: parse_start(&event.start_time).map(|t| t.format("%I:%M %p").to_string()),
        diet: first_keyword_match(&full_text, DIETS),
        health: first_keyword_match(&full_text, HEALTH_GOALS),
    }
    .with_fallback_area(fallback_area)
}

fn extract_area(location: &str) -> Option<String> {
    let lower = location.to_lowercase();
    if let Some((_, area)) = AREAS.iter().find(|(keyword, _)| lower.contains(keyword)) {
        return Some(area.to_string());
    }
    // "SF" only counts as a standalone word
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "sf")
        .then(|| "San Francisco".to_string())
}

fn extract_venue(location: &str) -> Option<String> {
    let padded = format!(" {}", location);

    for marker in [" near ", " at ", "@"] {
        if let Some(idx) = find_ignore_ascii_case(&padded, marker) {
            if let Some(venue) = padded.get(idx + marker.len()..).and_then(clean_venue) {
                return Some(venue);
            }
        }
    }

    location
        .split(',')
        .find(|segment| {
            segment
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| matches!(word, "hq" | "headquarters" | "office"))
        })
        .and_then(clean_venue)
}

/// Byte offset of `needle` in `haystack`, comparing ASCII letters case-insensitively
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.char_indices().map(|(i, _)| i).find(|&i| {
        haystack
            .get(i..i + needle.len())
            .is_some_and(|window| window.eq_ignore_ascii_case(needle))
    })
}

fn clean_venue(raw: &str) -> Option<String> {
    let mut venue = raw
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_end_matches('.')
        .trim()
        .to_string();

    while let Some(cut) = CITY_SUFFIXES
        .iter()
        .find_map(|suffix| city_suffix_start(&venue, suffix))
    {
        venue.truncate(cut);
        venue = venue.trim().to_string();
    }

    (!venue.is_empty()).then_some(venue)
}

/// Where `suffix` starts when `venue` is that word alone or ends with it after a space
fn city_suffix_start(venue: &str, suffix: &str) -> Option<usize> {
    let cut = venue.len().checked_sub(suffix.len())?;
    let tail = venue.get(cut..)?;
    if !tail.eq_ignore_ascii_case(suffix) {
        return None;
    }
    (cut == 0 || venue[..cut].ends_with(' ')).then_some(cut)
}

fn first_keyword_match(text: &str, table: &[(&str, &[&str])]) -> Option<String> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(label, _)| label.to_string())
}

/// Natural-language rendering of a constraint, used for logging and as
/// context for the summarizer
pub fn build_query(constraint: &Constraint) -> String {
    let mut parts = Vec::new();

    if let Some(area) = &constraint.area {
        parts.push(format!("in {}", area));
    }
    if let Some(venue) = &constraint.venue {
        parts.push(format!("near {}", venue));
    }
    if let Some(diet) = &constraint.diet {
        parts.push(format!("that helps with {}", diet));
    }
    if let Some(health) = &constraint.health {
        parts.push(format!("with {} options", health));
    }
    if let Some(time) = &constraint.time {
        parts.push(format!("for my {} meeting", time));
    }

    if parts.is_empty() {
        "I want to have lunch".to_string()
    } else {
        format!("I want to have lunch {}", parts.join(" "))
    }
}
