use std::sync::Arc;
use thiserror::Error;
use validator::Validate;
use crate::core::events::{constraint_from_event, is_lunch_meeting};
use crate::core::memory::SelectionMemory;
use crate::core::recommender::{RecommendError, RecommendationInput, Recommender};
use crate::models::CalendarEvent;
use crate::services::calendar::{CalendarError, EventSource};
use crate::services::notifier::NotificationSender;
use crate::services::tracker::{ProcessedEvents, TrackerError};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Recommend(#[from] RecommendError),

    #[error("Failed to record processed event: {0}")]
    Tracker(#[from] TrackerError),
}

/// What happened to a single calendar event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Recommendation delivered and the event marked processed
    Recommended,
    /// Pipeline ran but synthesis degraded; left unmarked for a retry
    Degraded,
    AlreadyProcessed,
    NotLunch,
    Invalid,
}

/// Tally of one pass over the calendar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }
}

/// Watches a calendar and recommends lunch for upcoming lunch meetings
///
/// Owns the selection memory and the processed-event set, so a single
/// agent never runs two batches at once.
pub struct CalendarAgent {
    source: Arc<dyn EventSource>,
    notifier: Arc<dyn NotificationSender>,
    recommender: Recommender,
    tracker: ProcessedEvents,
    memory: SelectionMemory,
    lookahead_hours: u32,
}

impl CalendarAgent {
    pub fn new(
        source: Arc<dyn EventSource>,
        notifier: Arc<dyn NotificationSender>,
        recommender: Recommender,
        tracker: ProcessedEvents,
        memory: SelectionMemory,
    ) -> Self {
        Self {
            source,
            notifier,
            recommender,
            tracker,
            memory,
            lookahead_hours: 24,
        }
    }

    pub fn with_lookahead_hours(mut self, hours: u32) -> Self {
        self.lookahead_hours = hours;
        self
    }

    pub fn memory(&self) -> &SelectionMemory {
        &self.memory
    }

    pub fn tracker(&self) -> &ProcessedEvents {
        &self.tracker
    }

    /// Fetch upcoming events and handle each one in isolation
    ///
    /// Only a failure to read the calendar itself is returned. Per-event
    /// errors are logged and counted.
    pub async fn process_calendar_events(&mut self) -> Result<BatchReport, CalendarError> {
        let events = self.source.upcoming_events(self.lookahead_hours).await?;
        tracing::info!(events = events.len(), lookahead_hours = self.lookahead_hours, "Checking calendar");

        let mut report = BatchReport::default();
        for event in &events {
            match self.process_event(event).await {
                Ok(EventOutcome::Recommended) => report.processed += 1,
                Ok(EventOutcome::Degraded) => report.failed += 1,
                Ok(_) => report.skipped += 1,
                Err(e) => {
                    tracing::error!(event_id = %event.event_id, "Failed to process event: {}", e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            "Calendar batch complete"
        );
        Ok(report)
    }

    pub async fn process_event(&mut self, event: &CalendarEvent) -> Result<EventOutcome, AgentError> {
        if let Err(e) = event.validate() {
            tracing::warn!(event_id = %event.event_id, "Skipping malformed event: {}", e);
            return Ok(EventOutcome::Invalid);
        }
        if self.tracker.contains(&event.event_id) {
            tracing::debug!(event_id = %event.event_id, "Already processed");
            return Ok(EventOutcome::AlreadyProcessed);
        }
        if !is_lunch_meeting(event) {
            tracing::debug!(event_id = %event.event_id, title = %event.title, "Not a lunch meeting");
            return Ok(EventOutcome::NotLunch);
        }

        tracing::info!(event_id = %event.event_id, title = %event.title, "Processing lunch meeting");

        let constraint = constraint_from_event(event, self.recommender.fallback_area());
        let recommendation = self
            .recommender
            .recommend(RecommendationInput::Structured(constraint), &mut self.memory, None)
            .await?;

        if recommendation.synthesis_degraded {
            tracing::warn!(event_id = %event.event_id, "Recommendation degraded, will retry next run");
            return Ok(EventOutcome::Degraded);
        }

        if let Err(e) = self
            .notifier
            .send(&recommendation.text, event, &recommendation.constraint)
            .await
        {
            tracing::warn!(event_id = %event.event_id, "Notification failed: {}", e);
        }

        if let Err(e) = self.source.annotate(&event.event_id, &recommendation.text).await {
            tracing::warn!(event_id = %event.event_id, "Could not annotate event: {}", e);
        }

        self.tracker.add(&event.event_id)?;
        tracing::info!(
            event_id = %event.event_id,
            top_pick = recommendation.top_pick().map(|p| p.candidate.name.as_str()).unwrap_or("none"),
            "Event processed"
        );
        Ok(EventOutcome::Recommended)
    }
}
