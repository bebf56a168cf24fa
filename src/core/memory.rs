use std::collections::VecDeque;
use crate::models::MemoryEntry;

/// Default number of recent selections kept
pub const DEFAULT_MEMORY_CAP: usize = 3;

/// Bounded recent-history of chosen venues
///
/// Strict FIFO: once `cap` entries are held, recording a new one evicts the
/// oldest. Lives for one session and is never persisted.
#[derive(Debug, Clone)]
pub struct SelectionMemory {
    entries: VecDeque<MemoryEntry>,
    cap: usize,
}

impl SelectionMemory {
    /// A cap of zero is treated as one.
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn record(&mut self, name: impl Into<String>, category: impl Into<String>) {
        self.entries.push_back(MemoryEntry {
            name: name.into(),
            category: category.into(),
        });
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    /// Categories currently held, oldest first
    pub fn recent_categories(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.category.clone()).collect()
    }

    pub fn should_avoid(&self, category: &str) -> bool {
        let category = category.trim();
        self.entries
            .iter()
            .any(|e| e.category.trim().eq_ignore_ascii_case(category))
    }

    pub fn entries(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

impl Default for SelectionMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAP)
    }
}
