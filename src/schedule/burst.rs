//! Round robin in bursts: an item keeps the CPU for `burst_size` cycles in a row

use crate::core::error::{Result, ScheduleError};
use crate::core::merit::Merit;
use crate::core::types::{check_item, DemeId, ItemId};
use crate::index::ChangeList;
use crate::schedule::{note_change, Schedule};

#[derive(Debug, Clone)]
pub struct ConstBurstSchedule {
    active: Vec<bool>,
    active_count: usize,
    burst_size: usize,
    /// Item holding the current burst
    current: Option<ItemId>,
    /// Cycles already handed to `current` in this burst
    burst_used: usize,
    change_list: Option<ChangeList>,
}

impl ConstBurstSchedule {
    pub fn new(item_count: usize, burst_size: usize) -> Result<Self> {
        if burst_size == 0 {
            return Err(ScheduleError::InvalidConfig(
                "burst_size must be positive".into(),
            ));
        }
        tracing::debug!(items = item_count, burst_size, "Creating constant burst schedule");
        Ok(Self {
            active: vec![false; item_count],
            active_count: 0,
            burst_size,
            current: None,
            burst_used: 0,
            change_list: None,
        })
    }

    pub fn burst_size(&self) -> usize {
        self.burst_size
    }

    fn is_active(&self, id: ItemId) -> bool {
        self.active.get(id).copied().unwrap_or(false)
    }
}

impl Schedule for ConstBurstSchedule {
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
            if self.current == Some(id) {
                // Burst ends with the item; a quick revival must not resume it.
                self.burst_used = self.burst_size;
            }
        }
        note_change(&mut self.change_list, id);
        Ok(())
    }

    fn next_id(&mut self) -> Option<ItemId> {
        if self.active_count == 0 {
            return None;
        }

        if let Some(id) = self.current {
            if self.burst_used < self.burst_size && self.active[id] {
                self.burst_used += 1;
                return Some(id);
            }
        }

        let count = self.item_count();
        let mut id = self.current.map_or(0, |c| (c + 1) % count);
        while !self.active[id] {
            id = (id + 1) % count;
        }
        self.current = Some(id);
        self.burst_used = 1;
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
        counted == self.active_count
            && self.burst_used <= self.burst_size
            && self.current.map_or(true, |id| id < self.active.len())
    }

    fn change_list(&self) -> Option<&ChangeList> {
        self.change_list.as_ref()
    }

    fn change_list_slot(&mut self) -> &mut Option<ChangeList> {
        &mut self.change_list
    }
}
