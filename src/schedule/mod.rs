//! Time slicing - deciding which item's virtual CPU runs next
//!
//! The population manager calls `adjust` whenever an item's merit changes and
//! `next_id` once per simulated cycle. Every policy implements [`Schedule`];
//! [`Scheduler`] is the closed set of policies a run can be configured with.

pub mod burst;
pub mod constant;
pub mod deme;
pub mod integrated;
mod integrated_node;
pub mod prob;

pub use burst::ConstBurstSchedule;
pub use constant::ConstSchedule;
pub use deme::{DemeProbSchedule, ProbDemeProbSchedule};
pub use integrated::IntegratedSchedule;
pub use prob::ProbSchedule;

use crate::core::config::SlicingMethod;
use crate::core::error::Result;
use crate::core::merit::Merit;
use crate::core::types::{DemeId, ItemId};
use crate::index::ChangeList;

/// Common contract of every slicing policy
pub trait Schedule {
    /// Number of items the schedule was built for
    fn item_count(&self) -> usize;

    /// Record a new merit for `id`, which lives in group (deme) `group`
    ///
    /// Policies without demes ignore `group`.
    fn adjust(&mut self, id: ItemId, merit: Merit, group: DemeId) -> Result<()>;

    /// Pick the item that runs next, or `None` when nothing is active
    fn next_id(&mut self) -> Option<ItemId>;

    /// Scheduling weight currently recorded for `id` (0 for unknown ids)
    fn status(&self, id: ItemId) -> f64;

    /// Self-check of internal invariants, for tests and debugging
    fn is_consistent(&self) -> bool;

    /// Observer currently attached, if any
    fn change_list(&self) -> Option<&ChangeList>;

    /// Storage for the attached observer, backing the attach/detach defaults
    fn change_list_slot(&mut self) -> &mut Option<ChangeList>;

    /// Group an item belongs to under this policy
    fn group_of(&self, _id: ItemId) -> DemeId {
        0
    }

    /// `adjust` with the group derived from the item id
    fn set_merit(&mut self, id: ItemId, merit: Merit) -> Result<()> {
        let group = self.group_of(id);
        self.adjust(id, merit, group)
    }

    /// Attach (or with `None`, detach) an observer, returning the previous one
    fn set_change_list(&mut self, list: Option<ChangeList>) -> Option<ChangeList> {
        std::mem::replace(self.change_list_slot(), list)
    }

    fn change_list_mut(&mut self) -> Option<&mut ChangeList> {
        self.change_list_slot().as_mut()
    }
}

/// Tell an attached observer that `id` changed
#[inline]
pub(crate) fn note_change(list: &mut Option<ChangeList>, id: ItemId) {
    if let Some(list) = list {
        list.push_change(id);
    }
}

/// Every slicing policy, dispatched statically
#[derive(Debug)]
pub enum Scheduler {
    Constant(ConstSchedule),
    ConstantBurst(ConstBurstSchedule),
    Probabilistic(ProbSchedule),
    Integrated(IntegratedSchedule),
    DemeProbabilistic(DemeProbSchedule),
    ProbDemeProbabilistic(ProbDemeProbSchedule),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Scheduler::Constant($s) => $body,
            Scheduler::ConstantBurst($s) => $body,
            Scheduler::Probabilistic($s) => $body,
            Scheduler::Integrated($s) => $body,
            Scheduler::DemeProbabilistic($s) => $body,
            Scheduler::ProbDemeProbabilistic($s) => $body,
        }
    };
}

impl Scheduler {
    /// The slicing method this scheduler implements
    pub fn method(&self) -> SlicingMethod {
        match self {
            Scheduler::Constant(_) => SlicingMethod::Constant,
            Scheduler::ConstantBurst(_) => SlicingMethod::ConstantBurst,
            Scheduler::Probabilistic(_) => SlicingMethod::Probabilistic,
            Scheduler::Integrated(_) => SlicingMethod::Integrated,
            Scheduler::DemeProbabilistic(_) => SlicingMethod::DemeProbabilistic,
            Scheduler::ProbDemeProbabilistic(_) => SlicingMethod::ProbDemeProbabilistic,
        }
    }
}

impl Schedule for Scheduler {
    fn item_count(&self) -> usize {
        dispatch!(self, s => s.item_count())
    }

    fn adjust(&mut self, id: ItemId, merit: Merit, group: DemeId) -> Result<()> {
        dispatch!(self, s => s.adjust(id, merit, group))
    }

    fn next_id(&mut self) -> Option<ItemId> {
        dispatch!(self, s => s.next_id())
    }

    fn status(&self, id: ItemId) -> f64 {
        dispatch!(self, s => s.status(id))
    }

    fn is_consistent(&self) -> bool {
        dispatch!(self, s => s.is_consistent())
    }

    fn change_list(&self) -> Option<&ChangeList> {
        dispatch!(self, s => s.change_list())
    }

    fn change_list_slot(&mut self) -> &mut Option<ChangeList> {
        dispatch!(self, s => s.change_list_slot())
    }

    fn group_of(&self, id: ItemId) -> DemeId {
        dispatch!(self, s => s.group_of(id))
    }
}
