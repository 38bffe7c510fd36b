//! Probabilistic slicing - each cycle goes to an item drawn proportional to merit

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::error::Result;
use crate::core::merit::Merit;
use crate::core::types::{DemeId, ItemId};
use crate::index::{ChangeList, WeightedIndex};
use crate::schedule::{note_change, Schedule};

#[derive(Debug, Clone)]
pub struct ProbSchedule {
    chart: WeightedIndex,
    /// Random number generator (deterministic per seed)
    rng: ChaCha8Rng,
    change_list: Option<ChangeList>,
}

impl ProbSchedule {
    pub fn new(item_count: usize, rng: ChaCha8Rng) -> Self {
        tracing::debug!(items = item_count, "Creating probabilistic schedule");
        Self {
            chart: WeightedIndex::new(item_count),
            rng,
            change_list: None,
        }
    }

    pub fn with_seed(item_count: usize, seed: u64) -> Self {
        Self::new(item_count, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Sum of all merits
    pub fn total_merit(&self) -> f64 {
        self.chart.total_weight()
    }
}

impl Schedule for ProbSchedule {
    fn item_count(&self) -> usize {
        self.chart.len()
    }

    fn adjust(&mut self, id: ItemId, merit: Merit, _group: DemeId) -> Result<()> {
        let old = self.chart.weight(id);
        self.chart.set_weight(id, merit.value())?;
        if old != merit.value() {
            note_change(&mut self.change_list, id);
        }
        Ok(())
    }

    fn next_id(&mut self) -> Option<ItemId> {
        self.chart.sample(&mut self.rng)
    }

    fn status(&self, id: ItemId) -> f64 {
        self.chart.weight(id)
    }

    fn is_consistent(&self) -> bool {
        self.chart.is_consistent()
    }

    fn change_list(&self) -> Option<&ChangeList> {
        self.change_list.as_ref()
    }

    fn change_list_slot(&mut self) -> &mut Option<ChangeList> {
        &mut self.change_list
    }
}
