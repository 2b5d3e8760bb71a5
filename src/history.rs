/// Linear undo/redo log of full state snapshots.
///
/// Entries are kept oldest first with a cursor on the live one. Committing
/// drops anything after the cursor, appends, and evicts from the front once
/// `max_size` is exceeded.
#[derive(Clone, Debug, PartialEq)]
pub struct History<T: Clone> {
    entries: Vec<T>,
    current: usize,
    max_size: usize,
    revision: u64,
}

impl<T: Clone> History<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            current: 0,
            max_size: max_size.max(1),
            revision: 0,
        }
    }

    pub fn with_initial(state: T, max_size: usize) -> Self {
        let mut history = Self::new(max_size);
        history.entries.push(state);
        history
    }

    /// Rebuilds a log from persisted parts. Returns `None` unless there is
    /// at least one entry and `index` points at one. Oversized logs lose
    /// their oldest entries and the index follows its entry down.
    pub fn from_parts(mut entries: Vec<T>, index: usize, max_size: usize) -> Option<Self> {
        if entries.is_empty() || index >= entries.len() {
            return None;
        }
        let max_size = max_size.max(1);
        let overflow = entries.len().saturating_sub(max_size);
        entries.drain(..overflow);
        Some(Self {
            entries,
            current: index.saturating_sub(overflow),
            max_size,
            revision: 0,
        })
    }

    /// Record a new state after the cursor. Clears the redo branch.
    pub fn commit(&mut self, state: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.current + 1);
        }
        self.entries.push(state);

        let overflow = self.entries.len().saturating_sub(self.max_size);
        if overflow > 0 {
            self.entries.drain(..overflow);
            log::debug!("history: evicted {} oldest entries", overflow);
        }
        self.current = self.entries.len() - 1;
        self.revision += 1;
    }

    /// Step back one entry and return it, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&T> {
        if self.entries.is_empty() || self.current == 0 {
            return None;
        }
        self.current -= 1;
        self.revision += 1;
        self.entries.get(self.current)
    }

    /// Step forward one entry and return it, or `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&T> {
        if self.current + 1 >= self.entries.len() {
            return None;
        }
        self.current += 1;
        self.revision += 1;
        self.entries.get(self.current)
    }

    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.current)
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    pub fn index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Bumped on every commit, undo and redo; lets persistence skip
    /// rewriting an unchanged log.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_history_is_empty() {
        let history: History<i32> = History::new(30);
        assert!(history.is_empty());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.current(), None);
    }

    #[test]
    fn commit_moves_cursor_to_last() {
        let mut history = History::with_initial(0, 30);
        history.commit(1);
        history.commit(2);
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);
        assert_eq!(history.current(), Some(&2));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_returns_previous_entry() {
        let mut history = History::with_initial(10, 30);
        history.commit(20);
        assert_eq!(history.undo(), Some(&10));
        assert_eq!(history.index(), 0);
        assert!(history.can_redo());
    }

    #[test]
    fn undo_then_redo_is_inverse() {
        let mut history = History::with_initial("s0".to_string(), 30);
        history.commit("s1".to_string());
        assert_eq!(history.undo().cloned(), Some("s0".to_string()));
        assert_eq!(history.redo().cloned(), Some("s1".to_string()));
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_at_oldest_is_noop() {
        let mut history = History::with_initial(1, 30);
        assert_eq!(history.undo(), None);
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn redo_at_newest_is_noop() {
        let mut history = History::with_initial(1, 30);
        history.commit(2);
        assert_eq!(history.redo(), None);
        assert_eq!(history.index(), 1);
    }

    #[test]
    fn commit_after_undo_discards_redo_branch() {
        let mut history = History::with_initial(1, 30);
        history.commit(2);
        history.commit(3);
        history.undo();
        history.undo();
        history.commit(4);

        assert_eq!(history.entries(), &[1, 4]);
        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some(&1));
    }

    #[test]
    fn respects_max_size_keeping_newest() {
        let max = 30;
        let mut history = History::new(max);
        for i in 0..(max + 5) {
            history.commit(i);
            assert!(history.len() <= max);
            assert!(history.index() < history.len());
        }
        let expected: Vec<usize> = (5..max + 5).collect();
        assert_eq!(history.entries(), expected.as_slice());
        assert_eq!(history.index(), max - 1);
    }

    #[test]
    fn undo_all_then_redo_all_after_eviction() {
        let mut history = History::new(3);
        for i in 1..=5 {
            history.commit(i);
        }
        assert_eq!(history.undo(), Some(&4));
        assert_eq!(history.undo(), Some(&3));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(&4));
        assert_eq!(history.redo(), Some(&5));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn max_size_zero_behaves_as_one() {
        let mut history = History::new(0);
        history.commit(1);
        history.commit(2);
        assert_eq!(history.entries(), &[2]);
        assert!(!history.can_undo());
    }

    #[test]
    fn index_is_monotonic_with_operations() {
        let mut history = History::with_initial(0, 30);
        let before = history.index();
        history.commit(1);
        assert!(history.index() > before);
        let before = history.index();
        history.undo();
        assert!(history.index() < before);
        let before = history.index();
        history.redo();
        assert!(history.index() > before);
    }

    #[test]
    fn revision_tracks_changes() {
        let mut history = History::with_initial(0, 30);
        let r0 = history.revision();
        history.commit(1);
        let r1 = history.revision();
        assert!(r1 > r0);
        history.redo();
        assert_eq!(history.revision(), r1);
        history.undo();
        assert!(history.revision() > r1);
    }

    mod from_parts_tests {
        use super::*;

        #[test]
        fn rejects_empty_and_bad_index() {
            assert!(History::<i32>::from_parts(vec![], 0, 30).is_none());
            assert!(History::from_parts(vec![1, 2], 2, 30).is_none());
        }

        #[test]
        fn keeps_valid_index() {
            let history = History::from_parts(vec![1, 2, 3], 1, 30).unwrap();
            assert_eq!(history.current(), Some(&2));
            assert!(history.can_redo());
        }

        #[test]
        fn trims_oversized_log_and_shifts_index() {
            let history = History::from_parts(vec![1, 2, 3, 4, 5], 3, 3).unwrap();
            assert_eq!(history.entries(), &[3, 4, 5]);
            assert_eq!(history.current(), Some(&4));
        }

        #[test]
        fn index_in_evicted_prefix_clamps_to_oldest() {
            let history = History::from_parts(vec![1, 2, 3, 4, 5], 0, 3).unwrap();
            assert_eq!(history.index(), 0);
            assert_eq!(history.current(), Some(&3));
        }
    }
}
