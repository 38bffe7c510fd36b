pub mod config;
pub mod error;
pub mod merit;
pub mod types;

pub use config::{SchedulerConfig, SlicingMethod};
pub use merit::Merit;
