// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Linear undo/redo history.
//!
//! A single vector of immutable entries with a cursor. Appending after an
//! undo discards the redo tail, so a branch that was undone cannot be
//! restored once a new edit lands.

/// History of snapshots with a cursor pointing at the live entry.
#[derive(Debug, Clone)]
pub struct History<T> {
    /// Recorded entries, oldest first
    entries: Vec<T>,
    /// Index of the live entry
    index: usize,
    /// Maximum number of entries to keep (None = unbounded)
    max_len: Option<usize>,
}

impl<T> History<T> {
    /// Start a history whose only entry is `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
            max_len: None,
        }
    }

    /// Same as [`History::new`] but evicts the oldest entries past `max_len`.
    pub fn with_limit(initial: T, max_len: usize) -> Self {
        Self {
            max_len: Some(max_len.max(1)),
            ..Self::new(initial)
        }
    }

    /// Truncate to the cursor, append `entry` and make it live.
    pub fn push(&mut self, entry: T) {
        self.entries.truncate(self.index + 1);
        self.entries.push(entry);

        if let Some(max_len) = self.max_len {
            let overflow = self.entries.len().saturating_sub(max_len);
            if overflow > 0 {
                self.entries.drain(..overflow);
            }
        }

        self.index = self.entries.len() - 1;
    }

    /// Step the cursor back. Returns false at the oldest entry.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Step the cursor forward. Returns false at the newest entry.
    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn current(&self) -> &T {
        &self.entries[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn is_at_start(&self) -> bool {
        self.index == 0
    }

    pub fn is_at_end(&self) -> bool {
        self.index + 1 == self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_after(commits: u32) -> History<u32> {
        let mut history = History::new(0);
        for i in 1..=commits {
            history.push(i);
        }
        history
    }

    #[test]
    fn test_back_at_start_is_noop() {
        let mut history = History::new("initial");
        assert!(!history.back());
        assert_eq!(history.index(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_replay_is_deterministic() {
        for n in 0..6u32 {
            for u in 0..=n {
                for r in 0..=u {
                    let mut history = history_after(n);
                    for _ in 0..u {
                        assert!(history.back());
                    }
                    for _ in 0..r {
                        assert!(history.forward());
                    }
                    let expected = history_after(n - u + r);
                    assert_eq!(history.current(), expected.current(), "n={n} u={u} r={r}");
                }
            }
        }
    }

    #[test]
    fn test_push_after_undo_discards_redo_tail() {
        let mut history = history_after(3);
        assert!(history.back());
        history.push(4);

        assert_eq!(history.len(), 4);
        assert_eq!(*history.current(), 4);
        assert!(!history.can_redo());
        assert!(!history.forward());

        assert!(history.back());
        assert_eq!(*history.current(), 2);
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut history = History::with_limit(0, 3);
        for i in 1..=5 {
            history.push(i);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(*history.current(), 5);
        assert!(history.back());
        assert!(history.back());
        assert!(!history.back());
        assert_eq!(*history.current(), 3);
    }
}
