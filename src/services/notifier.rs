use async_trait::async_trait;
use thiserror::Error;
use crate::models::{CalendarEvent, Constraint};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("No recipient configured")]
    NoRecipient,
}

/// Delivers a finished recommendation for a calendar event
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(
        &self,
        recommendation: &str,
        event: &CalendarEvent,
        constraint: &Constraint,
    ) -> Result<(), NotifyError>;
}

/// Writes the notification to the log instead of sending mail
pub struct LogNotifier {
    recipient: String,
    preview_chars: usize,
}

impl LogNotifier {
    pub fn new(recipient: impl Into<String>, preview_chars: usize) -> Self {
        Self {
            recipient: recipient.into(),
            preview_chars,
        }
    }

    pub fn subject(event: &CalendarEvent) -> String {
        let title = if event.title.trim().is_empty() {
            "your lunch meeting"
        } else {
            event.title.trim()
        };
        format!("Lunch recommendation for {}", title)
    }
}

/// First `max_chars` characters, with an ellipsis when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head.trim_end())
    } else {
        head
    }
}

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send(
        &self,
        recommendation: &str,
        event: &CalendarEvent,
        constraint: &Constraint,
    ) -> Result<(), NotifyError> {
        if self.recipient.trim().is_empty() {
            return Err(NotifyError::NoRecipient);
        }

        tracing::info!(
            recipient = %self.recipient,
            subject = %Self::subject(event),
            location = %event.location,
            start_time = %event.start_time,
            diet = constraint.diet.as_deref().unwrap_or("none"),
            "Notification: {}",
            preview(recommendation, self.preview_chars)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_cuts_on_chars() {
        assert_eq!(preview("Café Réveil serves", 4), "Café...");
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("exact", 5), "exact");
    }

    #[test]
    fn test_subject() {
        let event = CalendarEvent {
            title: "Team Lunch Meeting".to_string(),
            ..CalendarEvent::default()
        };
        assert_eq!(LogNotifier::subject(&event), "Lunch recommendation for Team Lunch Meeting");
        assert_eq!(
            LogNotifier::subject(&CalendarEvent::default()),
            "Lunch recommendation for your lunch meeting"
        );
    }

    #[tokio::test]
    async fn test_missing_recipient() {
        let notifier = LogNotifier::new("  ", 200);
        let err = notifier
            .send("text", &CalendarEvent::default(), &Constraint::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::NoRecipient));

        let notifier = LogNotifier::new("me@example.com", 200);
        tokio_test::assert_ok!(
            notifier
                .send("text", &CalendarEvent::default(), &Constraint::default())
                .await
        );
    }
}
