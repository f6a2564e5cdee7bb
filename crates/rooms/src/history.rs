//! Bounded, append-only conversation history.

use std::collections::VecDeque;

use nomi_domain::message::HistoryEntry;

/// Ordered history with FIFO eviction once `cap` is reached.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    cap: usize,
}

impl History {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cap: cap.max(1),
        }
    }

    /// Append an entry, evicting the oldest ones when over the cap.
    /// Returns the number of evicted entries.
    pub fn push(&mut self, entry: HistoryEntry) -> usize {
        self.entries.push_back(entry);
        let mut evicted = 0;
        while self.entries.len() > self.cap {
            self.entries.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// The last `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &HistoryEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(h: &History) -> Vec<String> {
        h.iter().map(|e| e.content.clone()).collect()
    }

    #[test]
    fn evicts_oldest_first() {
        let mut h = History::with_cap(3);
        for i in 0..5 {
            h.push(HistoryEntry::user("ada", format!("m{i}")));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(contents(&h), vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn push_reports_evictions() {
        let mut h = History::with_cap(1);
        assert_eq!(h.push(HistoryEntry::assistant("a")), 0);
        assert_eq!(h.push(HistoryEntry::assistant("b")), 1);
    }

    #[test]
    fn tail_returns_last_entries_in_order() {
        let mut h = History::with_cap(10);
        for i in 0..4 {
            h.push(HistoryEntry::user("ada", format!("m{i}")));
        }
        let tail: Vec<_> = h.tail(2).map(|e| e.content.as_str()).collect();
        assert_eq!(tail, vec!["m2", "m3"]);
        assert_eq!(h.tail(100).count(), 4);
    }
}
