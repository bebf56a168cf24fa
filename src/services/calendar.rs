use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use crate::models::CalendarEvent;

const ANNOTATION_HEADER: &str = "---\nLunza Recommendation:";

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid calendar data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Event not found: {0}")]
    NotFound(String),
}

/// Source of normalized calendar events
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Events starting within the next `hours_ahead` hours
    async fn upcoming_events(&self, hours_ahead: u32) -> Result<Vec<CalendarEvent>, CalendarError>;

    /// Attach recommendation text to an event
    async fn annotate(&self, event_id: &str, recommendation: &str) -> Result<(), CalendarError>;
}

fn annotated(description: &str, recommendation: &str) -> String {
    if description.trim().is_empty() {
        format!("{}\n{}", ANNOTATION_HEADER, recommendation)
    } else {
        format!("{}\n\n{}\n{}", description, ANNOTATION_HEADER, recommendation)
    }
}

/// Calendar with two fixed lunch meetings, relative to `now`
///
/// Used by demo mode so the pipeline runs without calendar credentials.
pub struct MockCalendar {
    events: Vec<CalendarEvent>,
    annotations: Mutex<HashMap<String, String>>,
}

impl MockCalendar {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            events: demo_events(now),
            annotations: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events,
            annotations: Mutex::new(HashMap::new()),
        }
    }

    pub fn annotation(&self, event_id: &str) -> Option<String> {
        self.annotations
            .lock()
            .ok()
            .and_then(|map| map.get(event_id).cloned())
    }
}

#[async_trait]
impl EventSource for MockCalendar {
    /// Demo events are always returned, regardless of the lookahead window.
    async fn upcoming_events(&self, _hours_ahead: u32) -> Result<Vec<CalendarEvent>, CalendarError> {
        Ok(self.events.clone())
    }

    async fn annotate(&self, event_id: &str, recommendation: &str) -> Result<(), CalendarError> {
        let event = self
            .events
            .iter()
            .find(|e| e.event_id == event_id)
            .ok_or_else(|| CalendarError::NotFound(event_id.to_string()))?;

        let mut map = self
            .annotations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.insert(event_id.to_string(), annotated(&event.description, recommendation));
        Ok(())
    }
}

fn demo_events(now: NaiveDateTime) -> Vec<CalendarEvent> {
    let tomorrow = now.date() + Duration::days(1);
    let lunch = tomorrow.and_hms_opt(12, 30, 0).unwrap_or(now);
    let iso = |t: NaiveDateTime| t.format("%Y-%m-%dT%H:%M:%S").to_string();

    vec![
        CalendarEvent {
            event_id: "demo_lunch_1".to_string(),
            title: "Team Lunch Meeting".to_string(),
            location: "San Francisco, near GitHub HQ".to_string(),
            start_time: iso(lunch),
            end_time: iso(lunch + Duration::hours(1)),
            description: "Need healthy lunch options for diabetes management. Looking for low-carb, high-protein options.".to_string(),
            attendees: vec!["alice@example.com".to_string(), "bob@example.com".to_string()],
            organizer: "demo@example.com".to_string(),
        },
        CalendarEvent {
            event_id: "demo_lunch_2".to_string(),
            title: "Client Lunch".to_string(),
            location: "Downtown San Francisco".to_string(),
            start_time: iso(lunch + Duration::days(1)),
            end_time: iso(lunch + Duration::days(1) + Duration::hours(1)),
            description: "Business lunch. Need vegetarian options.".to_string(),
            attendees: vec!["client@example.com".to_string()],
            organizer: "demo@example.com".to_string(),
        },
    ]
}

/// Calendar backed by a JSON array of events on disk
///
/// Annotations are written back into the event's description.
pub struct FileCalendar {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileCalendar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn read_events(&self) -> Result<Vec<CalendarEvent>, CalendarError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait]
impl EventSource for FileCalendar {
    async fn upcoming_events(&self, hours_ahead: u32) -> Result<Vec<CalendarEvent>, CalendarError> {
        let now = Local::now();
        let horizon = now + Duration::hours(i64::from(hours_ahead));

        let events: Vec<CalendarEvent> = self
            .read_events()
            .await?
            .into_iter()
            .filter(|e| match event_start(&e.start_time) {
                Some(start) => start >= now && start <= horizon,
                None => true,
            })
            .collect();

        tracing::debug!(count = events.len(), path = %self.path.display(), "Read calendar file");
        Ok(events)
    }

    async fn annotate(&self, event_id: &str, recommendation: &str) -> Result<(), CalendarError> {
        let _guard = self.write_lock.lock().await;
        let mut events = self.read_events().await?;

        let event = events
            .iter_mut()
            .find(|e| e.event_id == event_id)
            .ok_or_else(|| CalendarError::NotFound(event_id.to_string()))?;
        event.description = annotated(&event.description, recommendation);

        tokio::fs::write(&self.path, serde_json::to_string_pretty(&events)?).await?;
        Ok(())
    }
}

/// Absolute start time; naive timestamps are read as local time
fn event_start(start_time: &str) -> Option<DateTime<Local>> {
    let raw = start_time.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = crate::core::events::parse_start(raw)?;
    Local.from_local_datetime(&naive).earliest()
}
