// Service exports
pub mod calendar;
pub mod extractor;
pub mod gemini;
pub mod notifier;
pub mod synthesizer;
pub mod tracker;
pub mod venues;

pub use calendar::{CalendarError, EventSource, FileCalendar, MockCalendar};
pub use extractor::ConstraintExtractor;
pub use gemini::{GeminiClient, GenerationError, TextGenerator};
pub use notifier::{LogNotifier, NotificationSender, NotifyError};
pub use synthesizer::{ExplanationSynthesizer, SynthesisError, NO_OPTIONS_TEXT};
pub use tracker::{ProcessedEvents, TrackerError};
pub use venues::{RetrievalError, VenueDirectory, VenueRetriever};
