//! Scheduler configuration with documented parameters
//!
//! A population manager picks one slicing method at start-up and hands the
//! resulting `Scheduler` every merit change for the rest of the run.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{Result, ScheduleError};
use crate::schedule::{
    ConstBurstSchedule, ConstSchedule, DemeProbSchedule, IntegratedSchedule, ProbDemeProbSchedule,
    ProbSchedule, Scheduler,
};

/// How CPU cycles are divided between items
///
/// The numeric codes match the historical `SLICING_METHOD` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SlicingMethod {
    /// 0 - every active item receives the same number of cycles
    Constant,
    /// 1 - cycles are handed out at random, proportional to merit
    Probabilistic,
    /// 2 - cycles are handed out deterministically, exactly proportional to merit
    #[default]
    Integrated,
    /// 3 - demes take turns; members win their deme's cycles proportional to merit
    DemeProbabilistic,
    /// 4 - demes win cycles proportional to living population, members proportional to merit
    ProbDemeProbabilistic,
    /// 5 - constant slicing, but each item keeps the CPU for a burst of cycles
    ConstantBurst,
}

impl SlicingMethod {
    pub fn code(&self) -> i64 {
        match self {
            SlicingMethod::Constant => 0,
            SlicingMethod::Probabilistic => 1,
            SlicingMethod::Integrated => 2,
            SlicingMethod::DemeProbabilistic => 3,
            SlicingMethod::ProbDemeProbabilistic => 4,
            SlicingMethod::ConstantBurst => 5,
        }
    }

    /// Does this method partition items into demes?
    pub fn uses_demes(&self) -> bool {
        matches!(
            self,
            SlicingMethod::DemeProbabilistic | SlicingMethod::ProbDemeProbabilistic
        )
    }
}

impl TryFrom<i64> for SlicingMethod {
    type Error = ScheduleError;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            0 => Ok(SlicingMethod::Constant),
            1 => Ok(SlicingMethod::Probabilistic),
            2 => Ok(SlicingMethod::Integrated),
            3 => Ok(SlicingMethod::DemeProbabilistic),
            4 => Ok(SlicingMethod::ProbDemeProbabilistic),
            5 => Ok(SlicingMethod::ConstantBurst),
            other => Err(ScheduleError::UnknownSlicingMethod(other)),
        }
    }
}

/// Configuration for building a scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Which slicing policy to build
    pub slicing_method: SlicingMethod,

    /// Number of schedulable items (population cells)
    ///
    /// Fixed for the life of the scheduler.
    pub item_count: usize,

    /// Number of demes the items are split into
    ///
    /// Only read by the deme-aware methods. `item_count` must divide evenly,
    /// every deme holding `item_count / num_demes` consecutive items.
    pub num_demes: usize,

    /// Consecutive cycles an item keeps under `ConstantBurst`
    ///
    /// A burst of 1 is plain round robin.
    pub burst_size: usize,

    /// Seed for the probabilistic methods
    ///
    /// Each scheduler owns its own generator, so two runs with the same seed
    /// and the same sequence of merit changes pick the same items.
    pub seed: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            slicing_method: SlicingMethod::default(),
            item_count: 3600,
            num_demes: 1,
            burst_size: 1,
            seed: 0,
        }
    }
}

impl SchedulerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.item_count == 0 {
            return Err(ScheduleError::InvalidConfig(
                "item_count must be positive".into(),
            ));
        }

        if self.slicing_method == SlicingMethod::ConstantBurst && self.burst_size == 0 {
            return Err(ScheduleError::InvalidConfig(
                "burst_size must be positive".into(),
            ));
        }

        if self.slicing_method.uses_demes() {
            if self.num_demes == 0 {
                return Err(ScheduleError::InvalidConfig(
                    "num_demes must be positive".into(),
                ));
            }
            if self.item_count % self.num_demes != 0 {
                return Err(ScheduleError::InvalidConfig(format!(
                    "item_count ({}) is not divisible by num_demes ({})",
                    self.item_count, self.num_demes
                )));
            }
        }

        Ok(())
    }

    /// Parse a config from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from JSON
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, choosing the format from its extension (TOML unless `.json`)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Build the time slicer described by this config
    pub fn build(&self) -> Result<Scheduler> {
        self.validate()?;

        tracing::debug!(
            method = ?self.slicing_method,
            items = self.item_count,
            demes = self.num_demes,
            "Building time slicer"
        );

        let scheduler = match self.slicing_method {
            SlicingMethod::Constant => Scheduler::Constant(ConstSchedule::new(self.item_count)),
            SlicingMethod::ConstantBurst => Scheduler::ConstantBurst(ConstBurstSchedule::new(
                self.item_count,
                self.burst_size,
            )?),
            SlicingMethod::Probabilistic => Scheduler::Probabilistic(ProbSchedule::with_seed(
                self.item_count,
                self.seed,
            )),
            SlicingMethod::Integrated => {
                Scheduler::Integrated(IntegratedSchedule::new(self.item_count))
            }
            SlicingMethod::DemeProbabilistic => Scheduler::DemeProbabilistic(
                DemeProbSchedule::with_seed(self.item_count, self.num_demes, self.seed)?,
            ),
            SlicingMethod::ProbDemeProbabilistic => Scheduler::ProbDemeProbabilistic(
                ProbDemeProbSchedule::with_seed(self.item_count, self.num_demes, self.seed)?,
            ),
        };

        Ok(scheduler)
    }
}
