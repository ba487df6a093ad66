//! Configuration
//!
//! All structural and learning parameters in one place. Loaded from TOML,
//! immutable once a descriptor or store has been built from it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::params::{
    DEFAULT_BINARY_VALUE_AGGREGATION, DEFAULT_NEIGHBORHOOD_DIMENSIONS,
    DEFAULT_NEIGHBORHOOD_DURATIONS, DEFAULT_RANDOM_SEED, EQUIVALENT_DISTANCE,
    GOAL_VALUE_DISCOUNT_FACTOR, MAX_NEIGHBORHOOD_DENSITIES, SOLVE_GOAL_VALUE,
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Descriptor shape.
    pub morphognostic: MorphognosticConfig,
    /// Metamorph store learning parameters.
    pub store: StoreConfig,
    /// Agent driver parameters.
    pub agent: AgentConfig,
}

/// Shape of a morphognostic: event dimensions and neighborhood scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphognosticConfig {
    /// Value cardinality per event dimension. 1 = scalar accumulator,
    /// greater than 1 = one-hot frequency histogram.
    pub event_value_dimensions: Vec<usize>,
    /// Clamp densities to presence (at most 1.0) instead of averaging over the duration.
    pub binary_value_aggregation: bool,
    /// Event grid width, persisted for consumers.
    pub events_width: i32,
    /// Event grid height, persisted for consumers.
    pub events_height: i32,
    /// Neighborhoods, finest and nearest in time first.
    pub neighborhoods: Vec<NeighborhoodConfig>,
}

/// One aggregation scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborhoodConfig {
    /// Side length of the square neighborhood.
    pub extent: u32,
    /// Side length of each sector tile.
    pub sector_extent: u32,
    /// Number of most recent steps aggregated.
    pub duration: u32,
    /// Enabled event dimensions; absent means all enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_mask: Option<Vec<bool>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum compare distance at which a new snapshot merges into an existing node.
    pub equivalent_distance: f32,
    /// Multiplier applied per backward step of goal propagation.
    pub goal_value_discount: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Seed for the random tie-break in nearest-match lookups.
    pub random_seed: u64,
    /// Label per response code, stored alongside each metamorph.
    pub response_names: Vec<String>,
    /// Goal value recorded for a step that reaches the goal.
    pub solve_goal_value: f32,
}

impl Default for MorphognosticConfig {
    fn default() -> Self {
        let neighborhoods = DEFAULT_NEIGHBORHOOD_DIMENSIONS
            .iter()
            .zip(DEFAULT_NEIGHBORHOOD_DURATIONS)
            .map(|(&(extent, sector_extent), duration)| {
                NeighborhoodConfig::new(extent, sector_extent, duration)
            })
            .collect();
        Self {
            event_value_dimensions: vec![1],
            neighborhoods,
            binary_value_aggregation: DEFAULT_BINARY_VALUE_AGGREGATION,
            events_width: 0,
            events_height: 0,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            equivalent_distance: EQUIVALENT_DISTANCE,
            goal_value_discount: GOAL_VALUE_DISCOUNT_FACTOR,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            random_seed: DEFAULT_RANDOM_SEED,
            response_names: Vec::new(),
            solve_goal_value: SOLVE_GOAL_VALUE,
        }
    }
}

impl NeighborhoodConfig {
    #[must_use]
    pub const fn new(extent: u32, sector_extent: u32, duration: u32) -> Self {
        Self {
            extent,
            sector_extent,
            duration,
            dimension_mask: None,
        }
    }

    #[must_use]
    pub fn with_mask(mut self, mask: Vec<bool>) -> Self {
        self.dimension_mask = Some(mask);
        self
    }
}

impl MorphognosticConfig {
    /// Builds and validates a configuration.
    pub fn new(
        event_value_dimensions: Vec<usize>,
        neighborhoods: Vec<NeighborhoodConfig>,
        binary_value_aggregation: bool,
    ) -> Result<Self> {
        let config = Self {
            event_value_dimensions,
            neighborhoods,
            binary_value_aggregation,
            events_width: 0,
            events_height: 0,
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn event_dimensions(&self) -> usize {
        self.event_value_dimensions.len()
    }

    /// Oldest event age retained by the event log.
    #[must_use]
    pub fn max_event_age(&self) -> i32 {
        self.neighborhoods
            .last()
            .map_or(0, |n| n.duration.saturating_sub(1) as i32)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(d) = self.event_value_dimensions.iter().position(|&v| v == 0) {
            return Err(Error::config(format!("event dimension {d} has zero cardinality")));
        }
        let values_per_sector = self
            .event_value_dimensions
            .iter()
            .try_fold(0usize, |sum, &v| sum.checked_add(v))
            .ok_or_else(|| Error::config("event value cardinalities overflow"))?;
        let mut previous_duration = 0;
        for (i, n) in self.neighborhoods.iter().enumerate() {
            if n.extent == 0 || n.sector_extent == 0 {
                return Err(Error::config(format!(
                    "neighborhood {i}: extent and sector extent must be positive"
                )));
            }
            if n.duration == 0 {
                return Err(Error::config(format!("neighborhood {i}: duration must be positive")));
            }
            if n.duration < previous_duration {
                return Err(Error::config(format!(
                    "neighborhood {i}: duration {} is shorter than the previous neighborhood's {previous_duration}",
                    n.duration
                )));
            }
            if [n.extent, n.sector_extent, n.duration]
                .iter()
                .any(|&v| i32::try_from(v).is_err())
            {
                return Err(Error::config(format!("neighborhood {i}: value too large")));
            }
            let side = n.extent.div_ceil(n.sector_extent) as usize;
            let cells = side
                .checked_mul(side)
                .and_then(|sectors| sectors.checked_mul(values_per_sector));
            if cells.map_or(true, |cells| cells > MAX_NEIGHBORHOOD_DENSITIES) {
                return Err(Error::config(format!(
                    "neighborhood {i}: {side}x{side} sectors of {values_per_sector} densities exceed {MAX_NEIGHBORHOOD_DENSITIES}"
                )));
            }
            previous_duration = n.duration;
            if let Some(mask) = &n.dimension_mask {
                if mask.len() != self.event_dimensions() {
                    return Err(Error::config(format!(
                        "neighborhood {i}: mask has {} entries for {} event dimensions",
                        mask.len(),
                        self.event_dimensions()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.morphognostic.validate()?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Render as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
