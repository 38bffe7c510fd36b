//! One bit-significance level of the integrated schedule
//!
//! A node holds every item whose merit has this bit set. Nodes form a chain
//! from most to least significant; each one alternates between walking its
//! own members and handing a turn to the next node down.

use std::collections::BTreeSet;
use std::ops::Bound;

use crate::core::types::ItemId;

/// What the node does on its next call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Yield own members in ascending id order
    Walk,
    /// Turn skipped; `process_size` has not been reached yet
    Idle,
    /// Forward calls to the next node until it finishes a pass
    Delegate,
}

#[derive(Debug, Clone)]
pub(crate) struct IntegratedScheduleNode {
    bit: u32,
    members: BTreeSet<ItemId>,
    /// Last member yielded in the current walk
    cursor: Option<ItemId>,
    /// Turns this node takes per pass of `next`
    process_size: u64,
    process_count: u64,
    phase: Phase,
    prev: Option<u32>,
    next: Option<u32>,
}

impl IntegratedScheduleNode {
    pub(crate) fn new(bit: u32) -> Self {
        Self {
            bit,
            members: BTreeSet::new(),
            cursor: None,
            process_size: 1,
            process_count: 0,
            phase: Phase::Walk,
            prev: None,
            next: None,
        }
    }

    pub(crate) fn bit(&self) -> u32 {
        self.bit
    }

    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn contains(&self, id: ItemId) -> bool {
        self.members.contains(&id)
    }

    pub(crate) fn members(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.members.iter().copied()
    }

    pub(crate) fn insert(&mut self, id: ItemId) {
        self.members.insert(id);
    }

    /// Removing the member under the cursor is fine: the walk resumes at its
    /// successor.
    pub(crate) fn remove(&mut self, id: ItemId) {
        self.members.remove(&id);
    }

    pub(crate) fn prev(&self) -> Option<u32> {
        self.prev
    }

    pub(crate) fn next(&self) -> Option<u32> {
        self.next
    }

    pub(crate) fn set_prev(&mut self, prev: Option<u32>) {
        self.prev = prev;
    }

    pub(crate) fn set_next(&mut self, next: Option<u32>) {
        self.next = next;
    }

    pub(crate) fn process_size(&self) -> u64 {
        self.process_size
    }

    pub(crate) fn set_process_size(&mut self, size: u64) {
        self.process_size = size.max(1);
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    /// Advance the walk; `None` means the walk just ended
    ///
    /// At the end of a walk the node moves to its off-turn: a real
    /// delegation once every `process_size` walks, idle otherwise.
    pub(crate) fn walk_step(&mut self) -> Option<ItemId> {
        debug_assert_eq!(self.phase, Phase::Walk);
        debug_assert!(!self.members.is_empty(), "walking an empty node");

        let next = match self.cursor {
            None => self.members.iter().next().copied(),
            Some(last) => self
                .members
                .range((Bound::Excluded(last), Bound::Unbounded))
                .next()
                .copied(),
        };

        self.cursor = next;
        if next.is_none() {
            self.process_count += 1;
            if self.process_count >= self.process_size {
                self.process_count = 0;
                self.phase = Phase::Delegate;
            } else {
                self.phase = Phase::Idle;
            }
        }
        next
    }

    /// End of an off-turn; the next call starts a fresh walk
    pub(crate) fn finish_turn(&mut self) {
        self.phase = Phase::Walk;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(node: &mut IntegratedScheduleNode) -> Vec<ItemId> {
        std::iter::from_fn(|| node.walk_step()).collect()
    }

    #[test]
    fn test_walk_is_ascending() {
        let mut node = IntegratedScheduleNode::new(3);
        for id in [9, 2, 5, 0] {
            node.insert(id);
        }
        assert_eq!(walk(&mut node), vec![0, 2, 5, 9]);
        assert_eq!(node.phase(), Phase::Delegate);
    }

    #[test]
    fn test_duplicate_insert_ignored() {
        let mut node = IntegratedScheduleNode::new(0);
        node.insert(4);
        node.insert(4);
        assert_eq!(node.len(), 1);
        node.remove(7);
        assert_eq!(node.len(), 1);
    }

    #[test]
    fn test_remove_under_cursor_resumes_at_successor() {
        let mut node = IntegratedScheduleNode::new(1);
        for id in [1, 3, 6] {
            node.insert(id);
        }
        assert_eq!(node.walk_step(), Some(1));
        assert_eq!(node.walk_step(), Some(3));
        node.remove(3);
        assert_eq!(node.walk_step(), Some(6));
        assert_eq!(node.walk_step(), None);
    }

    #[test]
    fn test_insert_behind_cursor_waits_for_next_walk() {
        let mut node = IntegratedScheduleNode::new(1);
        node.insert(4);
        node.insert(8);
        assert_eq!(node.walk_step(), Some(4));
        node.insert(2);
        assert_eq!(node.walk_step(), Some(8));
        assert_eq!(node.walk_step(), None);
        node.finish_turn();
        assert_eq!(walk(&mut node), vec![2, 4, 8]);
    }

    #[test]
    fn test_process_size_idles_between_delegations() {
        let mut node = IntegratedScheduleNode::new(5);
        node.insert(0);
        node.set_process_size(3);

        let mut phases = Vec::new();
        for _ in 0..3 {
            walk(&mut node);
            phases.push(node.phase());
            node.finish_turn();
        }
        assert_eq!(phases, vec![Phase::Idle, Phase::Idle, Phase::Delegate]);
    }
}
