//! Multi-resolution spatiotemporal descriptors.
//!
//! This module provides:
//! - Short-term memory of recent events via an age-bounded log
//! - Nested neighborhoods aggregating that log into sector densities
//! - An orientation-rectified L1 distance between two descriptors
//! - The binary layout used to persist descriptors

mod codec;
pub mod event_log;
pub mod neighborhood;
pub mod orientation;

use std::fmt::Write as _;
use std::sync::Arc;

pub use event_log::{Event, EventLog};
pub use neighborhood::{DimensionMask, Neighborhood, Sector};
pub use orientation::Orientation;

use crate::config::MorphognosticConfig;
use crate::error::{Error, Result};
use crate::params::UNKNOWN_VALUE;

/// The full multi-scale descriptor of recent sensory history.
///
/// Neighborhoods are ordered finest and nearest in time first. They all read
/// the same event log, each filtering it by its own age band.
#[derive(Clone, Debug, PartialEq)]
pub struct Morphognostic {
    pub orientation: Orientation,
    config: Arc<MorphognosticConfig>,
    neighborhoods: Vec<Neighborhood>,
    events: EventLog,
    event_time: i32,
    event_names: Option<Vec<String>>,
}

impl Morphognostic {
    /// Creates an empty descriptor with the shape described by `config`.
    pub fn new(orientation: Orientation, config: Arc<MorphognosticConfig>) -> Result<Self> {
        config.validate()?;
        let neighborhoods = config
            .neighborhoods
            .iter()
            .map(|n| Neighborhood::new(n, &config.event_value_dimensions))
            .collect();
        let events = EventLog::new(config.max_event_age());
        Ok(Self {
            orientation,
            config,
            neighborhoods,
            events,
            event_time: 0,
            event_names: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &MorphognosticConfig {
        &self.config
    }

    #[must_use]
    pub fn shared_config(&self) -> Arc<MorphognosticConfig> {
        Arc::clone(&self.config)
    }

    #[must_use]
    pub fn neighborhoods(&self) -> &[Neighborhood] {
        &self.neighborhoods
    }

    pub fn neighborhoods_mut(&mut self) -> &mut [Neighborhood] {
        &mut self.neighborhoods
    }

    #[must_use]
    pub const fn events(&self) -> &EventLog {
        &self.events
    }

    /// Time stamp the next event will receive.
    #[must_use]
    pub const fn event_time(&self) -> i32 {
        self.event_time
    }

    #[must_use]
    pub fn event_dimensions(&self) -> usize {
        self.config.event_dimensions()
    }

    /// Labels for event dimensions, used by [`describe`](Self::describe).
    pub fn name_events(&mut self, names: Vec<String>) {
        self.event_names = Some(names);
    }

    /// Records an event at `(x, y)`, re-derives every neighborhood around
    /// that point, and advances the event clock.
    pub fn update(&mut self, event_values: &[i32], x: i32, y: i32) -> Result<()> {
        self.check_event(event_values)?;

        self.events.append(event_values, x, y, self.event_time);
        let binary = self.config.binary_value_aggregation;
        for neighborhood in &mut self.neighborhoods {
            neighborhood.update((x, y), &self.events, self.event_time, binary);
        }
        self.event_time += 1;
        Ok(())
    }

    fn check_event(&self, values: &[i32]) -> Result<()> {
        let cardinalities = &self.config.event_value_dimensions;
        if values.len() != cardinalities.len() {
            return Err(Error::invalid_event(format!(
                "expected {} values, found {}",
                cardinalities.len(),
                values.len()
            )));
        }
        for (d, (&value, &cardinality)) in values.iter().zip(cardinalities).enumerate() {
            if value == UNKNOWN_VALUE {
                continue;
            }
            let in_range = value >= 0 && (cardinality == 1 || (value as usize) < cardinality);
            if !in_range {
                return Err(Error::invalid_event(format!(
                    "dimension {d}: value {value} outside cardinality {cardinality}"
                )));
            }
        }
        Ok(())
    }

    /// Orientation-rectified L1 distance to `other`, summed over neighborhoods.
    ///
    /// Both descriptors must share the same neighborhood and sector structure.
    pub fn compare(&self, other: &Self) -> Result<f32> {
        if self.neighborhoods.len() != other.neighborhoods.len() {
            return Err(Error::mismatch(
                "neighborhoods",
                self.neighborhoods.len(),
                other.neighborhoods.len(),
            ));
        }
        let mut distance = 0.0;
        for (a, b) in self.neighborhoods.iter().zip(&other.neighborhoods) {
            distance += a.compare(self.orientation, b, other.orientation)?;
        }
        Ok(distance)
    }

    /// Flattened densities in the same order [`compare`](Self::compare) walks:
    /// neighborhood, rectified sector, dimension, value.
    #[must_use]
    pub fn rectified_densities(&self) -> Vec<f32> {
        self.neighborhoods
            .iter()
            .flat_map(|n| n.rectify(self.orientation))
            .flat_map(|densities| densities.iter().flatten().copied())
            .collect()
    }

    /// Zeroes every density and forgets logged events. The event clock keeps running.
    pub fn clear(&mut self) {
        for neighborhood in &mut self.neighborhoods {
            neighborhood.clear();
        }
        self.events.clear();
    }

    /// Zeroes the scalar density of `dimension` in every neighborhood and in
    /// every logged event.
    pub fn clear_event(&mut self, dimension: usize) -> Result<()> {
        for index in 0..self.neighborhoods.len() {
            self.clear_event_in(index, dimension)?;
        }
        Ok(())
    }

    /// Zeroes the scalar density of `dimension` in one neighborhood and in
    /// every logged event.
    pub fn clear_event_in(&mut self, neighborhood: usize, dimension: usize) -> Result<()> {
        if dimension >= self.event_dimensions() {
            return Err(Error::invalid_event(format!("no event dimension {dimension}")));
        }
        let count = self.neighborhoods.len();
        let n = self
            .neighborhoods
            .get_mut(neighborhood)
            .ok_or_else(|| Error::mismatch("neighborhood index", neighborhood, count))?;
        for sector in n.sectors_mut() {
            sector.set_density(dimension, 0, 0.0);
        }
        for event in self.events.iter_mut() {
            event.values[dimension] = 0;
        }
        Ok(())
    }

    /// Human-readable dump of parameters and densities.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let config = &self.config;
        let _ = writeln!(out, "neighborhoods={}", self.neighborhoods.len());
        let _ = writeln!(out, "binary_value_aggregation={}", config.binary_value_aggregation);
        let _ = writeln!(out, "orientation={} ({})", self.orientation.code(), self.orientation);
        let _ = writeln!(out, "event_value_dimensions={:?}", config.event_value_dimensions);
        let _ = writeln!(out, "events={}x{}", config.events_width, config.events_height);
        for (i, n) in self.neighborhoods.iter().enumerate() {
            let _ = writeln!(out, "neighborhood={i}");
            let _ = writeln!(out, "\tdx/dy={}/{}", n.dx, n.dy);
            let _ = writeln!(out, "\textent={} sector_extent={}", n.extent, n.sector_extent);
            let _ = writeln!(out, "\tepoch={} duration={}", n.epoch, n.duration);
            let _ = writeln!(out, "\tmask={:?}", n.mask().bits());
            let k = n.sectors_per_side();
            for x in 0..k {
                for y in 0..k {
                    let s = n.sector(x, y);
                    let _ = writeln!(out, "\tsector[{x}][{y}] dx/dy={}/{}", s.dx, s.dy);
                    for (d, values) in s.densities().iter().enumerate() {
                        if !n.mask().is_enabled(d) {
                            continue;
                        }
                        let name = self
                            .event_names
                            .as_ref()
                            .and_then(|names| names.get(d))
                            .map_or_else(String::new, |name| format!(" ({name})"));
                        let _ = writeln!(out, "\t\tdensities[{d}]{name} = {values:?}");
                    }
                }
            }
        }
        out
    }
}
