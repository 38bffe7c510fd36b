//! Change list - which item indices changed since the last reset
//!
//! Observers (viewers, statistics collectors) attach one to a scheduler and
//! drain it between updates instead of rescanning the whole population.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, ScheduleError};
use crate::core::types::{check_item, ItemId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChangeListSnapshot")]
pub struct ChangeList {
    /// Changed indices in the order they were first marked
    changes: Vec<ItemId>,
    /// `tracking[i]` is true while `i` is in `changes`
    tracking: Vec<bool>,
}

/// Unchecked wire form of a `ChangeList`
#[derive(Deserialize)]
struct ChangeListSnapshot {
    changes: Vec<ItemId>,
    tracking: Vec<bool>,
}

impl TryFrom<ChangeListSnapshot> for ChangeList {
    type Error = ScheduleError;

    fn try_from(snapshot: ChangeListSnapshot) -> Result<Self> {
        let ChangeListSnapshot { changes, tracking } = snapshot;
        let mut seen = vec![false; tracking.len()];
        for &id in &changes {
            match seen.get_mut(id) {
                Some(slot) if !*slot && tracking[id] => *slot = true,
                _ => {
                    return Err(ScheduleError::InvalidChangeList(format!(
                        "index {} is duplicated, untracked or beyond capacity {}",
                        id,
                        tracking.len()
                    )))
                }
            }
        }
        if seen != tracking {
            return Err(ScheduleError::InvalidChangeList(
                "tracked index missing from changes".into(),
            ));
        }
        Ok(Self { changes, tracking })
    }
}

impl ChangeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list able to track indices `0..capacity`
    pub fn with_capacity(capacity: usize) -> Self {
        let mut list = Self::default();
        list.resize_clear(capacity);
        list
    }

    /// Number of trackable indices
    pub fn capacity(&self) -> usize {
        self.tracking.len()
    }

    /// Number of distinct indices changed since the last reset
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    /// The `index`-th recorded change, or `None` past the end
    pub fn check_change_at(&self, index: usize) -> Option<ItemId> {
        self.changes.get(index).copied()
    }

    /// All recorded changes, oldest first
    pub fn changes(&self) -> &[ItemId] {
        &self.changes
    }

    pub fn is_marked(&self, id: ItemId) -> bool {
        self.tracking.get(id).copied().unwrap_or(false)
    }

    /// Reinitialize for `capacity` indices, dropping every recorded change
    pub fn resize_clear(&mut self, capacity: usize) {
        self.changes.clear();
        self.changes.reserve(capacity);
        self.tracking.clear();
        self.tracking.resize(capacity, false);
    }

    /// Record a change to `id`; marking an already-marked index does nothing
    pub fn mark_change(&mut self, id: ItemId) -> Result<()> {
        check_item(id, self.capacity())?;
        if !self.tracking[id] {
            self.tracking[id] = true;
            self.changes.push(id);
        }
        Ok(())
    }

    /// Like `mark_change`, growing the list if `id` is beyond its capacity
    pub fn push_change(&mut self, id: ItemId) {
        if id >= self.capacity() {
            self.tracking.resize(id + 1, false);
        }
        if !self.tracking[id] {
            self.tracking[id] = true;
            self.changes.push(id);
        }
    }

    /// Forget all recorded changes; costs O(changes), not O(capacity)
    pub fn reset(&mut self) {
        for &id in &self.changes {
            self.tracking[id] = false;
        }
        self.changes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ScheduleError;

    #[test]
    fn test_push_same_index_counts_once() {
        let mut list = ChangeList::new();
        list.push_change(4);
        list.push_change(4);
        assert_eq!(list.change_count(), 1);
        assert_eq!(list.check_change_at(0), Some(4));
        assert_eq!(list.capacity(), 5);
    }

    #[test]
    fn test_reset_clears_marks() {
        let mut list = ChangeList::with_capacity(10);
        list.mark_change(3).unwrap();
        list.mark_change(7).unwrap();
        assert!(list.is_marked(3));

        list.reset();
        assert_eq!(list.change_count(), 0);
        assert_eq!(list.check_change_at(0), None);
        assert!(!list.is_marked(3));
        assert!(!list.is_marked(7));

        // Marks are available again after the reset
        list.mark_change(3).unwrap();
        assert_eq!(list.changes(), &[3]);
    }

    #[test]
    fn test_order_is_first_mark_order() {
        let mut list = ChangeList::with_capacity(10);
        for id in [5, 1, 5, 9, 1, 0] {
            list.mark_change(id).unwrap();
        }
        assert_eq!(list.changes(), &[5, 1, 9, 0]);
    }

    #[test]
    fn test_mark_out_of_range_is_error() {
        let mut list = ChangeList::with_capacity(2);
        assert!(matches!(
            list.mark_change(2),
            Err(ScheduleError::ItemOutOfRange { id: 2, count: 2 })
        ));
        assert_eq!(list.change_count(), 0);
    }

    #[test]
    fn test_resize_clear_invalidates_marks() {
        let mut list = ChangeList::with_capacity(4);
        list.mark_change(1).unwrap();
        list.resize_clear(8);
        assert_eq!(list.capacity(), 8);
        assert_eq!(list.change_count(), 0);
        assert!(!list.is_marked(1));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut list = ChangeList::with_capacity(3);
        list.mark_change(2).unwrap();
        let json = serde_json::to_string(&list).unwrap();
        let restored: ChangeList = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, list);
    }

    #[test]
    fn test_snapshot_with_mismatched_marks_is_rejected() {
        for json in [
            r#"{"changes":[5],"tracking":[false]}"#,
            r#"{"changes":[0],"tracking":[false]}"#,
            r#"{"changes":[0,0],"tracking":[true]}"#,
            r#"{"changes":[],"tracking":[true]}"#,
        ] {
            assert!(serde_json::from_str::<ChangeList>(json).is_err(), "{}", json);
        }

        let mut list: ChangeList =
            serde_json::from_str(r#"{"changes":[1],"tracking":[false,true]}"#).unwrap();
        list.reset();
        assert_eq!(list.change_count(), 0);
        assert_eq!(list.capacity(), 2);
    }
}
