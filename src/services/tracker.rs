use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackerFile {
    #[serde(default)]
    event_ids: BTreeSet<String>,
}

/// Durable set of calendar event IDs that already received a recommendation
///
/// Stored as `{"event_ids": [...]}`. A missing or unreadable file starts the
/// tracker empty rather than failing.
#[derive(Debug)]
pub struct ProcessedEvents {
    path: PathBuf,
    event_ids: BTreeSet<String>,
}

impl ProcessedEvents {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let event_ids = match read_ids(&path) {
            Ok(ids) => ids,
            Err(TrackerError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Ignoring unreadable processed-events file: {}", e);
                BTreeSet::new()
            }
        };

        tracing::debug!(count = event_ids.len(), "Loaded processed events");
        Self { path, event_ids }
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.event_ids.contains(event_id)
    }

    /// Record an event ID and flush the whole set to disk
    ///
    /// The ID only joins the in-memory set once the write has succeeded.
    pub fn add(&mut self, event_id: &str) -> Result<(), TrackerError> {
        if self.event_ids.contains(event_id) {
            return Ok(());
        }
        let mut updated = self.event_ids.clone();
        updated.insert(event_id.to_string());
        self.save(&updated)?;
        self.event_ids = updated;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.event_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_ids.is_empty()
    }

    fn save(&self, event_ids: &BTreeSet<String>) -> Result<(), TrackerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = TrackerFile {
            event_ids: event_ids.clone(),
        };
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&file)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn read_ids(path: &Path) -> Result<BTreeSet<String>, TrackerError> {
    let raw = std::fs::read_to_string(path)?;
    let file: TrackerFile = serde_json::from_str(&raw)?;
    Ok(file.event_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_events.json");

        let mut tracker = ProcessedEvents::load(&path);
        assert!(tracker.is_empty());
        tracker.add("evt_1").unwrap();
        tracker.add("evt_1").unwrap();

        let reloaded = ProcessedEvents::load(&path);
        assert!(reloaded.contains("evt_1"));
        assert!(!reloaded.contains("evt_2"));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_events.json");

        let mut tracker = ProcessedEvents::load(&path);
        tracker.add("b").unwrap();
        tracker.add("a").unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"event_ids": ["a", "b"]}));
    }

    #[test]
    fn test_failed_save_leaves_id_unmarked() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let mut tracker = ProcessedEvents::load(blocker.join("processed_events.json"));
        assert!(tracker.add("evt_1").is_err());
        assert!(!tracker.contains("evt_1"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_events.json");
        std::fs::write(&path, "not json").unwrap();

        let tracker = ProcessedEvents::load(&path);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_legacy_unsorted_list_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_events.json");
        std::fs::write(&path, r#"{"event_ids": ["demo_lunch_2", "demo_lunch_1"]}"#).unwrap();

        let tracker = ProcessedEvents::load(&path);
        assert!(tracker.contains("demo_lunch_1"));
        assert!(tracker.contains("demo_lunch_2"));
    }
}
