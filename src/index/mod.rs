//! Index structures shared by the scheduling policies

pub mod change_list;
pub mod weighted;

pub use change_list::ChangeList;
pub use weighted::WeightedIndex;
