//! Deme-aware slicing
//!
//! Items are split into `num_demes` contiguous blocks of `deme_size`. A deme
//! is chosen first (round robin, or by living population), then a member is
//! drawn from it proportional to merit.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::error::{Result, ScheduleError};
use crate::core::merit::Merit;
use crate::core::types::{check_item, DemeId, ItemId};
use crate::index::{ChangeList, WeightedIndex};
use crate::schedule::{note_change, Schedule};

/// Fixed partition of item ids into equal contiguous demes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DemeLayout {
    num_demes: usize,
    deme_size: usize,
}

impl DemeLayout {
    fn new(item_count: usize, num_demes: usize) -> Result<Self> {
        if num_demes == 0 || item_count % num_demes != 0 {
            return Err(ScheduleError::InvalidConfig(format!(
                "item_count ({}) is not divisible by num_demes ({})",
                item_count, num_demes
            )));
        }
        Ok(Self {
            num_demes,
            deme_size: item_count / num_demes,
        })
    }

    fn item_count(&self) -> usize {
        self.num_demes * self.deme_size
    }

    fn deme_of(&self, id: ItemId) -> DemeId {
        if self.deme_size == 0 {
            0
        } else {
            id / self.deme_size
        }
    }

    /// Position of `id` inside `deme`, checking that it really lives there
    fn offset_in(&self, id: ItemId, deme: DemeId) -> Result<usize> {
        check_item(id, self.item_count())?;
        if deme >= self.num_demes {
            return Err(ScheduleError::DemeOutOfRange {
                deme,
                num_demes: self.num_demes,
            });
        }
        if self.deme_of(id) != deme {
            return Err(ScheduleError::ItemNotInDeme { id, deme });
        }
        Ok(id - deme * self.deme_size)
    }
}

/// Demes take cycles in turn; within a deme, members win proportional to merit
#[derive(Debug, Clone)]
pub struct DemeProbSchedule {
    layout: DemeLayout,
    charts: Vec<WeightedIndex>,
    /// Deme that received the previous cycle
    current_deme: DemeId,
    rng: ChaCha8Rng,
    change_list: Option<ChangeList>,
}

impl DemeProbSchedule {
    pub fn new(item_count: usize, num_demes: usize, rng: ChaCha8Rng) -> Result<Self> {
        let layout = DemeLayout::new(item_count, num_demes)?;
        tracing::debug!(
            items = item_count,
            demes = num_demes,
            deme_size = layout.deme_size,
            "Creating deme probabilistic schedule"
        );
        Ok(Self {
            layout,
            charts: vec![WeightedIndex::new(layout.deme_size); num_demes],
            // First call moves on to deme 0
            current_deme: num_demes - 1,
            rng,
            change_list: None,
        })
    }

    pub fn with_seed(item_count: usize, num_demes: usize, seed: u64) -> Result<Self> {
        Self::new(item_count, num_demes, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn num_demes(&self) -> usize {
        self.layout.num_demes
    }

    pub fn deme_size(&self) -> usize {
        self.layout.deme_size
    }

    pub fn deme_of(&self, id: ItemId) -> DemeId {
        self.layout.deme_of(id)
    }

    /// Total merit held by a deme
    pub fn deme_merit(&self, deme: DemeId) -> f64 {
        self.charts.get(deme).map_or(0.0, WeightedIndex::total_weight)
    }
}

impl Schedule for DemeProbSchedule {
    fn item_count(&self) -> usize {
        self.layout.item_count()
    }

    fn adjust(&mut self, id: ItemId, merit: Merit, group: DemeId) -> Result<()> {
        let offset = self.layout.offset_in(id, group)?;
        let chart = &mut self.charts[group];
        let old = chart.weight(offset);
        chart.set_weight(offset, merit.value())?;
        if old != merit.value() {
            note_change(&mut self.change_list, id);
        }
        Ok(())
    }

    fn next_id(&mut self) -> Option<ItemId> {
        let num_demes = self.layout.num_demes;
        for step in 1..=num_demes {
            let deme = (self.current_deme + step) % num_demes;
            if self.charts[deme].total_weight() > 0.0 {
                self.current_deme = deme;
                let offset = self.charts[deme].sample(&mut self.rng)?;
                return Some(deme * self.layout.deme_size + offset);
            }
        }

        tracing::warn!(demes = num_demes, "No deme has merit to schedule");
        None
    }

    fn status(&self, id: ItemId) -> f64 {
        let deme = self.layout.deme_of(id);
        match self.layout.offset_in(id, deme) {
            Ok(offset) => self.charts[deme].weight(offset),
            Err(_) => 0.0,
        }
    }

    fn is_consistent(&self) -> bool {
        self.charts.len() == self.layout.num_demes
            && self.current_deme < self.layout.num_demes
            && self
                .charts
                .iter()
                .all(|chart| chart.len() == self.layout.deme_size && chart.is_consistent())
    }

    fn change_list(&self) -> Option<&ChangeList> {
        self.change_list.as_ref()
    }

    fn change_list_slot(&mut self) -> &mut Option<ChangeList> {
        &mut self.change_list
    }

    fn group_of(&self, id: ItemId) -> DemeId {
        self.layout.deme_of(id)
    }
}

/// Demes win cycles proportional to their living population, members
/// proportional to merit
#[derive(Debug, Clone)]
pub struct ProbDemeProbSchedule {
    layout: DemeLayout,
    charts: Vec<WeightedIndex>,
    /// Weight of each deme = number of members with nonzero merit
    deme_chart: WeightedIndex,
    population: Vec<usize>,
    rng: ChaCha8Rng,
    change_list: Option<ChangeList>,
}

impl ProbDemeProbSchedule {
    pub fn new(item_count: usize, num_demes: usize, rng: ChaCha8Rng) -> Result<Self> {
        let layout = DemeLayout::new(item_count, num_demes)?;
        tracing::debug!(
            items = item_count,
            demes = num_demes,
            deme_size = layout.deme_size,
            "Creating population-weighted deme schedule"
        );
        Ok(Self {
            layout,
            charts: vec![WeightedIndex::new(layout.deme_size); num_demes],
            deme_chart: WeightedIndex::new(num_demes),
            population: vec![0; num_demes],
            rng,
            change_list: None,
        })
    }

    pub fn with_seed(item_count: usize, num_demes: usize, seed: u64) -> Result<Self> {
        Self::new(item_count, num_demes, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn num_demes(&self) -> usize {
        self.layout.num_demes
    }

    pub fn deme_size(&self) -> usize {
        self.layout.deme_size
    }

    pub fn deme_of(&self, id: ItemId) -> DemeId {
        self.layout.deme_of(id)
    }

    /// Members of `deme` with nonzero merit
    pub fn deme_population(&self, deme: DemeId) -> usize {
        self.population.get(deme).copied().unwrap_or(0)
    }
}

impl Schedule for ProbDemeProbSchedule {
    fn item_count(&self) -> usize {
        self.layout.item_count()
    }

    fn adjust(&mut self, id: ItemId, merit: Merit, group: DemeId) -> Result<()> {
        let offset = self.layout.offset_in(id, group)?;
        let chart = &mut self.charts[group];
        let old = chart.weight(offset);
        let new = merit.value();
        chart.set_weight(offset, new)?;

        if old == new {
            return Ok(());
        }
        note_change(&mut self.change_list, id);

        let population = &mut self.population[group];
        match (old > 0.0, new > 0.0) {
            (false, true) => *population += 1,
            (true, false) => *population -= 1,
            _ => return Ok(()),
        }
        self.deme_chart.set_weight(group, *population as f64)
    }

    fn next_id(&mut self) -> Option<ItemId> {
        let deme = self.deme_chart.sample(&mut self.rng)?;
        let offset = self.charts[deme].sample(&mut self.rng)?;
        Some(deme * self.layout.deme_size + offset)
    }

    fn status(&self, id: ItemId) -> f64 {
        let deme = self.layout.deme_of(id);
        match self.layout.offset_in(id, deme) {
            Ok(offset) => self.charts[deme].weight(offset),
            Err(_) => 0.0,
        }
    }

    fn is_consistent(&self) -> bool {
        if self.charts.len() != self.layout.num_demes || !self.deme_chart.is_consistent() {
            return false;
        }
        self.charts.iter().enumerate().all(|(deme, chart)| {
            let living = (0..chart.len()).filter(|&i| chart.weight(i) > 0.0).count();
            chart.is_consistent()
                && living == self.population[deme]
                && self.deme_chart.weight(deme) == living as f64
        })
    }

    fn change_list(&self) -> Option<&ChangeList> {
        self.change_list.as_ref()
    }

    fn change_list_slot(&mut self) -> &mut Option<ChangeList> {
        &mut self.change_list
    }

    fn group_of(&self, id: ItemId) -> DemeId {
        self.layout.deme_of(id)
    }
}
