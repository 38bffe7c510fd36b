use thiserror::Error;

use crate::core::types::{DemeId, ItemId};

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Item {id} out of range (item count {count})")]
    ItemOutOfRange { id: ItemId, count: usize },

    #[error("Deme {deme} out of range ({num_demes} demes)")]
    DemeOutOfRange { deme: DemeId, num_demes: usize },

    #[error("Item {id} does not belong to deme {deme}")]
    ItemNotInDeme { id: ItemId, deme: DemeId },

    #[error("Position {position} outside total weight {total}")]
    PositionOutOfRange { position: f64, total: f64 },

    #[error("Invalid weight: {0}")]
    InvalidWeight(f64),

    #[error("Invalid change list: {0}")]
    InvalidChangeList(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown slicing method: {0}")]
    UnknownSlicingMethod(i64),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
