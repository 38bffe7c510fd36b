//! Merit Slicer - merit-proportional time slicing for digital organisms
//!
//! Each simulated cycle the population manager asks a [`schedule::Scheduler`]
//! which organism's virtual CPU runs next. Merit changes flow in through
//! [`schedule::Schedule::adjust`].

pub mod core;
pub mod index;
pub mod schedule;

pub use crate::core::config::{SchedulerConfig, SlicingMethod};
pub use crate::core::error::{Result, ScheduleError};
pub use crate::core::merit::Merit;
pub use crate::core::types::{DemeId, ItemId};
pub use crate::index::{ChangeList, WeightedIndex};
pub use crate::schedule::{Schedule, Scheduler};
