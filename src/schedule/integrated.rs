//! Integrated slicing - exact, deterministic merit-proportional scheduling
//!
//! Merit is split into its binary digits. Every bit position that is set in
//! at least one item's merit gets a node holding those items. Nodes are
//! chained from most to least significant and interleaved so that a node
//! gets twice the turns of the level below it. Over one full period each
//! item runs exactly (integer part of) its merit times.
//!
//! Example: merits 4, 2, 1, 1 give nodes bit2 = {0}, bit1 = {1},
//! bit0 = {2, 3} and the cycle `0 1 0 2 3 0 1 0`.

use crate::core::error::Result;
use crate::core::merit::Merit;
use crate::core::types::{check_item, DemeId, ItemId};
use crate::index::ChangeList;
use crate::schedule::integrated_node::{IntegratedScheduleNode, Phase};
use crate::schedule::{note_change, Schedule};

/// `2^exp`, saturating for gaps wider than a u64
fn pow2(exp: u32) -> u64 {
    1u64.checked_shl(exp).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone)]
pub struct IntegratedSchedule {
    merit_chart: Vec<Merit>,
    /// Node arena indexed by bit position; the last slot is always occupied
    nodes: Vec<Option<IntegratedScheduleNode>>,
    num_active_nodes: usize,
    change_list: Option<ChangeList>,
}

impl IntegratedSchedule {
    pub fn new(item_count: usize) -> Self {
        tracing::debug!(items = item_count, "Creating integrated schedule");
        Self {
            merit_chart: vec![Merit::default(); item_count],
            nodes: Vec::new(),
            num_active_nodes: 0,
            change_list: None,
        }
    }

    /// Number of bit levels currently holding items
    pub fn num_active_nodes(&self) -> usize {
        self.num_active_nodes
    }

    /// Bit positions with a node, most significant first
    pub fn active_bits(&self) -> Vec<u32> {
        self.nodes
            .iter()
            .rev()
            .flatten()
            .map(|node| node.bit())
            .collect()
    }

    pub fn merit(&self, id: ItemId) -> Option<Merit> {
        self.merit_chart.get(id).copied()
    }

    fn top(&self) -> Option<u32> {
        self.nodes.len().checked_sub(1).map(|bit| bit as u32)
    }

    fn node_mut(&mut self, bit: u32) -> Option<&mut IntegratedScheduleNode> {
        self.nodes.get_mut(bit as usize)?.as_mut()
    }

    fn insert_member(&mut self, bit: u32, id: ItemId) {
        if self.node_mut(bit).is_none() {
            self.insert_node(bit);
        }
        if let Some(node) = self.node_mut(bit) {
            node.insert(id);
        }
    }

    fn remove_member(&mut self, bit: u32, id: ItemId) {
        let now_empty = match self.node_mut(bit) {
            Some(node) => {
                node.remove(id);
                node.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.remove_node(bit);
        }
    }

    /// Splice a new node between its nearest more- and less-significant neighbours
    fn insert_node(&mut self, bit: u32) {
        let slot = bit as usize;
        if slot >= self.nodes.len() {
            self.nodes.resize_with(slot + 1, || None);
        }

        let mut node = IntegratedScheduleNode::new(bit);

        let prev = (slot + 1..self.nodes.len()).find(|&b| self.nodes[b].is_some());
        if let Some(prev_bit) = prev.map(|b| b as u32) {
            node.set_prev(Some(prev_bit));
            if let Some(prev_node) = self.node_mut(prev_bit) {
                prev_node.set_next(Some(bit));
                prev_node.set_process_size(pow2(prev_bit - bit - 1));
            }
        }

        let next = (0..slot).rev().find(|&b| self.nodes[b].is_some());
        if let Some(next_bit) = next.map(|b| b as u32) {
            node.set_next(Some(next_bit));
            node.set_process_size(pow2(bit - next_bit - 1));
            if let Some(next_node) = self.node_mut(next_bit) {
                next_node.set_prev(Some(bit));
            }
        }

        self.nodes[slot] = Some(node);
        self.num_active_nodes += 1;
        tracing::trace!(bit, active = self.num_active_nodes, "Inserted merit bit node");
    }

    /// Splice a node out, folding its process size into its predecessor
    fn remove_node(&mut self, bit: u32) {
        let Some(old) = self.nodes.get_mut(bit as usize).and_then(Option::take) else {
            return;
        };

        if let Some(next_node) = old.next().and_then(|b| self.node_mut(b)) {
            next_node.set_prev(old.prev());
        }
        if let Some(prev_node) = old.prev().and_then(|b| self.node_mut(b)) {
            prev_node.set_next(old.next());
            let folded = old
                .process_size()
                .saturating_mul(prev_node.process_size())
                .saturating_mul(2);
            prev_node.set_process_size(folded);
        }

        while matches!(self.nodes.last(), Some(None)) {
            self.nodes.pop();
        }

        self.num_active_nodes -= 1;
        tracing::trace!(bit, active = self.num_active_nodes, "Removed merit bit node");
    }

    /// One call into the node chain starting at `top`
    ///
    /// Descends through delegating nodes to the first node that walks or
    /// idles. When that node finishes a pass, every delegating ancestor's
    /// turn is over too and `None` is returned.
    fn step(&mut self, top: u32) -> Option<ItemId> {
        let mut bit = top;
        loop {
            let node = self.node_mut(bit)?;
            match node.phase() {
                Phase::Walk => {
                    if let Some(id) = node.walk_step() {
                        return Some(id);
                    }
                    break;
                }
                Phase::Idle => {
                    node.finish_turn();
                    break;
                }
                Phase::Delegate => match node.next() {
                    Some(next) => bit = next,
                    None => {
                        node.finish_turn();
                        break;
                    }
                },
            }
        }

        let mut ancestor = top;
        while ancestor != bit {
            let node = self.node_mut(ancestor)?;
            node.finish_turn();
            ancestor = node.next()?;
        }
        None
    }
}

impl Schedule for IntegratedSchedule {
    fn item_count(&self) -> usize {
        self.merit_chart.len()
    }

    fn adjust(&mut self, id: ItemId, merit: Merit, _group: DemeId) -> Result<()> {
        check_item(id, self.item_count())?;

        let old_merit = self.merit_chart[id];
        if old_merit == merit {
            return Ok(());
        }
        self.merit_chart[id] = merit;
        note_change(&mut self.change_list, id);

        let magnitude = old_merit.num_bits().max(merit.num_bits());
        for bit in 0..magnitude {
            match (old_merit.bit(bit), merit.bit(bit)) {
                (true, false) => self.remove_member(bit, id),
                (false, true) => self.insert_member(bit, id),
                _ => {}
            }
        }
        Ok(())
    }

    fn next_id(&mut self) -> Option<ItemId> {
        let top = self.top()?;
        loop {
            if let Some(id) = self.step(top) {
                return Some(id);
            }
        }
    }

    fn status(&self, id: ItemId) -> f64 {
        self.merit(id).map_or(0.0, |merit| merit.value())
    }

    fn is_consistent(&self) -> bool {
        let present = self.nodes.iter().flatten().count();
        if present != self.num_active_nodes {
            return false;
        }
        if matches!(self.nodes.last(), Some(None)) {
            return false;
        }

        let find_prev = |bit: usize| {
            (bit + 1..self.nodes.len())
                .find(|&b| self.nodes[b].is_some())
                .map(|b| b as u32)
        };
        let find_next = |bit: usize| {
            (0..bit)
                .rev()
                .find(|&b| self.nodes[b].is_some())
                .map(|b| b as u32)
        };

        for (slot, node) in self.nodes.iter().enumerate() {
            let Some(node) = node else { continue };
            if node.bit() as usize != slot || node.is_empty() {
                return false;
            }
            if node.prev() != find_prev(slot) || node.next() != find_next(slot) {
                return false;
            }
            if let Some(next) = node.next() {
                if node.process_size() != pow2(node.bit() - next - 1) {
                    return false;
                }
            }
            if node.members().any(|id| !self.merit_chart[id].bit(node.bit())) {
                return false;
            }
        }

        let member_total: usize = self.nodes.iter().flatten().map(|node| node.len()).sum();
        let bit_total: usize = self
            .merit_chart
            .iter()
            .map(|merit| (0..merit.num_bits()).filter(|&b| merit.bit(b)).count())
            .sum();
        if member_total != bit_total {
            return false;
        }

        self.merit_chart.iter().enumerate().all(|(id, merit)| {
            (0..merit.num_bits()).filter(|&b| merit.bit(b)).all(|b| {
                self.nodes
                    .get(b as usize)
                    .and_then(Option::as_ref)
                    .map_or(false, |node| node.contains(id))
            })
        })
    }

    fn change_list(&self) -> Option<&ChangeList> {
        self.change_list.as_ref()
    }

    fn change_list_slot(&mut self) -> &mut Option<ChangeList> {
        &mut self.change_list
    }
}
