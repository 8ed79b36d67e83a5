use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const MAX_ENTRIES: usize = 40;

/// One line of the human-readable activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Bounded feed of recent activity, newest first.
#[derive(Debug, Default)]
pub struct ActivityFeed {
    entries: VecDeque<ActivityEntry>,
}

impl ActivityFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) -> ActivityEntry {
        let entry = ActivityEntry {
            timestamp: Utc::now(),
            message: message.into(),
        };
        self.entries.push_front(entry.clone());
        if self.entries.len() > MAX_ENTRIES {
            self.entries.pop_back();
        }
        entry
    }

    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut feed = ActivityFeed::new();
        feed.push("first");
        feed.push("second");
        assert_eq!(feed.entries().next().unwrap().message, "second");
    }

    #[test]
    fn test_bounded_to_forty_entries() {
        let mut feed = ActivityFeed::new();
        for i in 0..50 {
            feed.push(format!("entry {i}"));
        }
        assert_eq!(feed.len(), 40);
        // Oldest ten were evicted.
        assert_eq!(feed.entries().last().unwrap().message, "entry 10");
    }
}
