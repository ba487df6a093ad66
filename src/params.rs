//! Default parameters.

/// Default neighborhood shapes: `(extent, sector_extent)`.
pub const DEFAULT_NEIGHBORHOOD_DIMENSIONS: [(u32, u32); 1] = [(3, 1)];
/// Default neighborhood durations, parallel to [`DEFAULT_NEIGHBORHOOD_DIMENSIONS`].
pub const DEFAULT_NEIGHBORHOOD_DURATIONS: [u32; 1] = [1];
pub const DEFAULT_BINARY_VALUE_AGGREGATION: bool = false;

/// Event value marking a dimension as not observed.
pub const UNKNOWN_VALUE: i32 = -1;

/// Maximum distance at which two descriptors are the same stored node.
pub const EQUIVALENT_DISTANCE: f32 = 0.0;
pub const GOAL_VALUE_DISCOUNT_FACTOR: f32 = 0.9;
/// Goal value assigned to a step that reaches the goal.
pub const SOLVE_GOAL_VALUE: f32 = 1.0;

/// Response code meaning "no response available".
pub const NO_RESPONSE: i32 = -1;

pub const DEFAULT_RANDOM_SEED: u64 = 4517;

/// Largest number of density cells (sectors times summed cardinalities) one
/// neighborhood may hold.
pub const MAX_NEIGHBORHOOD_DENSITIES: usize = 1 << 24;
