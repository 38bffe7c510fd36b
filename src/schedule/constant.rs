//! Round robin over active items; every item with merit gets one cycle per round

use crate::core::error::Result;
use crate::core::merit::Merit;
use crate::core::types::{check_item, DemeId, ItemId};
use crate::index::ChangeList;
use crate::schedule::{note_change, Schedule};

#[derive(Debug, Clone)]
pub struct ConstSchedule {
    active: Vec<bool>,
    active_count: usize,
    /// Next id to examine
    cursor: usize,
    change_list: Option<ChangeList>,
}

impl ConstSchedule {
    pub fn new(item_count: usize) -> Self {
        tracing::debug!(items = item_count, "Creating constant schedule");
        Self {
            active: vec![false; item_count],
            active_count: 0,
            cursor: 0,
            change_list: None,
        }
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn is_active(&self, id: ItemId) -> bool {
        self.active.get(id).copied().unwrap_or(false)
    }
}

impl Schedule for ConstSchedule {
    fn item_count(&self) -> usize {
        self.active.len()
    }

    fn adjust(&mut self, id: ItemId, merit: Merit, _group: DemeId) -> Result<()> {
        check_item(id, self.item_count())?;

        let now_active = !merit.is_zero();
        if self.active[id] == now_active {
            return Ok(());
        }

        self.active[id] = now_active;
        if now_active {
            self.active_count += 1;
        } else {
            self.active_count -= 1;
        }
        note_change(&mut self.change_list, id);
        Ok(())
    }

    fn next_id(&mut self) -> Option<ItemId> {
        if self.active_count == 0 {
            return None;
        }

        let count = self.item_count();
        let mut id = self.cursor;
        while !self.active[id] {
            id = (id + 1) % count;
        }
        self.cursor = (id + 1) % count;
        Some(id)
    }

    fn status(&self, id: ItemId) -> f64 {
        if self.is_active(id) {
            1.0
        } else {
            0.0
        }
    }

    fn is_consistent(&self) -> bool {
        let counted = self.active.iter().filter(|&&a| a).count();
        counted == self.active_count && (self.active.is_empty() || self.cursor < self.active.len())
    }

    fn change_list(&self) -> Option<&ChangeList> {
        self.change_list.as_ref()
    }

    fn change_list_slot(&mut self) -> &mut Option<ChangeList> {
        &mut self.change_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule_with(merits: &[f64]) -> ConstSchedule {
        let mut schedule = ConstSchedule::new(merits.len());
        for (id, &merit) in merits.iter().enumerate() {
            schedule.set_merit(id, Merit::new(merit)).unwrap();
        }
        schedule
    }

    #[test]
    fn test_each_active_item_once_per_round() {
        let mut schedule = schedule_with(&[1.0, 0.0, 50.0, 3.0, 0.0]);
        assert_eq!(schedule.active_count(), 3);

        let round: Vec<_> = (0..3).map(|_| schedule.next_id().unwrap()).collect();
        assert_eq!(round, vec![0, 2, 3]);

        let round: Vec<_> = (0..3).map(|_| schedule.next_id().unwrap()).collect();
        assert_eq!(round, vec![0, 2, 3]);
    }

    #[test]
    fn test_merit_does_not_change_share() {
        let mut schedule = schedule_with(&[1.0, 1000.0]);
        let picks: Vec<_> = (0..4).map(|_| schedule.next_id().unwrap()).collect();
        assert_eq!(picks, vec![0, 1, 0, 1]);
        assert_eq!(schedule.status(1), 1.0);
    }

    #[test]
    fn test_inactive_never_returned_until_reactivated() {
        let mut schedule = schedule_with(&[1.0, 1.0, 1.0]);
        schedule.set_merit(1, Merit::new(0.0)).unwrap();
        for _ in 0..10 {
            assert_ne!(schedule.next_id(), Some(1));
        }

        schedule.set_merit(1, Merit::new(2.0)).unwrap();
        let picks: Vec<_> = (0..3).map(|_| schedule.next_id().unwrap()).collect();
        assert!(picks.contains(&1));
    }

    #[test]
    fn test_change_list_sees_activation_changes_only() {
        let mut schedule = ConstSchedule::new(4);
        schedule.set_change_list(Some(ChangeList::with_capacity(4)));

        schedule.set_merit(1, Merit::new(2.0)).unwrap();
        schedule.set_merit(1, Merit::new(3.0)).unwrap();
        schedule.set_merit(3, Merit::new(0.0)).unwrap();

        assert_eq!(schedule.change_list().unwrap().changes(), &[1]);
    }

    #[test]
    fn test_all_inactive_returns_none() {
        let mut schedule = schedule_with(&[0.0, 0.0]);
        assert_eq!(schedule.next_id(), None);
        assert!(schedule.is_consistent());
    }
}
