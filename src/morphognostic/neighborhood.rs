//! Neighborhoods: one spatial and temporal aggregation scale.
//!
//! A neighborhood is a square of `extent` cells tiled by a `k x k` grid of
//! sectors. Each sector holds, per event dimension, either a scalar
//! accumulator (cardinality 1) or a one-hot frequency histogram.

use crate::config::NeighborhoodConfig;
use crate::error::{Error, Result};
use crate::params::UNKNOWN_VALUE;

use super::event_log::EventLog;
use super::orientation::Orientation;

/// Per-dimension enable flags. Full by default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DimensionMask {
    bits: Vec<bool>,
}

impl DimensionMask {
    /// A mask with every dimension enabled.
    #[must_use]
    pub fn all(dimensions: usize) -> Self {
        Self {
            bits: vec![true; dimensions],
        }
    }

    #[must_use]
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    #[must_use]
    pub fn is_enabled(&self, dimension: usize) -> bool {
        self.bits.get(dimension).copied().unwrap_or(false)
    }

    /// True when no dimension is disabled.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.bits.iter().all(|&b| b)
    }

    #[must_use]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }
}

/// A spatial tile inside a neighborhood.
#[derive(Clone, Debug, PartialEq)]
pub struct Sector {
    /// Offset of the tile origin inside the neighborhood.
    pub dx: i32,
    pub dy: i32,
    /// Side length of the tile.
    pub extent: i32,
    densities: Vec<Vec<f32>>,
}

impl Sector {
    #[must_use]
    pub fn new(dx: i32, dy: i32, extent: i32, event_value_dimensions: &[usize]) -> Self {
        Self {
            dx,
            dy,
            extent,
            densities: event_value_dimensions.iter().map(|&n| vec![0.0; n]).collect(),
        }
    }

    /// Density vectors, one per event dimension.
    #[must_use]
    pub fn densities(&self) -> &[Vec<f32>] {
        &self.densities
    }

    #[must_use]
    pub fn density(&self, dimension: usize, index: usize) -> f32 {
        self.densities[dimension][index]
    }

    pub fn set_density(&mut self, dimension: usize, index: usize, density: f32) {
        self.densities[dimension][index] = density;
    }

    pub fn clear(&mut self) {
        for values in &mut self.densities {
            values.fill(0.0);
        }
    }

    /// Absolute center of this tile for a neighborhood whose origin is `origin`.
    const fn center(&self, origin: (i64, i64)) -> (i64, i64) {
        (
            origin.0 + self.dx as i64 + (self.extent / 2) as i64,
            origin.1 + self.dy as i64 + (self.extent / 2) as i64,
        )
    }

    fn accumulate(&mut self, dimension: usize, value: i32) {
        let Some(values) = self.densities.get_mut(dimension) else {
            return;
        };
        if values.len() == 1 {
            values[0] += value as f32;
        } else if let Some(slot) = usize::try_from(value).ok().and_then(|v| values.get_mut(v)) {
            *slot += 1.0;
        }
    }
}

/// One aggregation scale of a morphognostic.
#[derive(Clone, Debug, PartialEq)]
pub struct Neighborhood {
    /// Offset of the neighborhood origin from the update center.
    pub dx: i32,
    pub dy: i32,
    pub extent: i32,
    pub sector_extent: i32,
    /// Youngest event age aggregated.
    pub epoch: i32,
    /// Events younger than this are aggregated.
    pub duration: i32,
    sectors_per_side: usize,
    /// Sector grid indexed `x * sectors_per_side + y`.
    sectors: Vec<Sector>,
    mask: DimensionMask,
}

impl Neighborhood {
    /// Builds the sector tiling for `config`.
    ///
    /// Tiles per side are `k = ceil(extent / sector_extent)`; any excess
    /// coverage `k * sector_extent - extent` is spread evenly across the
    /// tile boundaries.
    #[must_use]
    pub fn new(config: &NeighborhoodConfig, event_value_dimensions: &[usize]) -> Self {
        let extent = config.extent as i32;
        let sector_extent = config.sector_extent as i32;
        let k = config.extent.div_ceil(config.sector_extent) as usize;
        let overlap = if k > 1 {
            ((k as i32 * sector_extent) - extent) as f32 / (k - 1) as f32
        } else {
            0.0
        };
        let offset = |i: usize| (i as f32 * sector_extent as f32 - i as f32 * overlap).round() as i32;

        let mut sectors = Vec::with_capacity(k * k);
        for x in 0..k {
            for y in 0..k {
                sectors.push(Sector::new(offset(x), offset(y), sector_extent, event_value_dimensions));
            }
        }

        let mask = config.dimension_mask.clone().map_or_else(
            || DimensionMask::all(event_value_dimensions.len()),
            DimensionMask::from_bits,
        );

        Self {
            dx: -extent / 2,
            dy: -extent / 2,
            extent,
            sector_extent,
            // Age bands are nested: every scale starts at the present.
            epoch: 0,
            duration: config.duration as i32,
            sectors_per_side: k,
            sectors,
            mask,
        }
    }

    #[must_use]
    pub const fn sectors_per_side(&self) -> usize {
        self.sectors_per_side
    }

    #[must_use]
    pub fn sector(&self, x: usize, y: usize) -> &Sector {
        &self.sectors[x * self.sectors_per_side + y]
    }

    pub fn sector_mut(&mut self, x: usize, y: usize) -> &mut Sector {
        &mut self.sectors[x * self.sectors_per_side + y]
    }

    /// Sectors in storage order (`x` outer, `y` inner).
    pub fn sectors(&self) -> impl Iterator<Item = &Sector> {
        self.sectors.iter()
    }

    pub fn sectors_mut(&mut self) -> impl Iterator<Item = &mut Sector> {
        self.sectors.iter_mut()
    }

    #[must_use]
    pub const fn mask(&self) -> &DimensionMask {
        &self.mask
    }

    pub fn set_mask(&mut self, mask: DimensionMask) {
        self.mask = mask;
    }

    pub fn clear(&mut self) {
        for sector in &mut self.sectors {
            sector.clear();
        }
    }

    /// Re-derives sector densities from the events whose age falls in
    /// `[epoch, duration)`, centered on `center`.
    pub fn update(&mut self, center: (i32, i32), events: &EventLog, now: i32, binary: bool) {
        self.clear();

        let origin = (
            i64::from(center.0) + i64::from(self.dx),
            i64::from(center.1) + i64::from(self.dy),
        );
        for event in events.iter() {
            let age = event.age(now);
            if age < self.epoch || age >= self.duration {
                continue;
            }
            let index = self.closest_sector(origin, (event.x, event.y));
            let sector = &mut self.sectors[index];
            for (d, &value) in event.values.iter().enumerate() {
                if value != UNKNOWN_VALUE && self.mask.is_enabled(d) {
                    sector.accumulate(d, value);
                }
            }
        }

        let duration = self.duration as f32;
        for sector in &mut self.sectors {
            for density in sector.densities.iter_mut().flatten() {
                if binary {
                    *density = density.min(1.0);
                } else {
                    *density /= duration;
                }
            }
        }
    }

    /// Index of the sector whose center is Manhattan-closest to `point`.
    /// The middle sector is the initial candidate; later ties keep the earlier sector.
    fn closest_sector(&self, origin: (i64, i64), point: (i32, i32)) -> usize {
        let distance = |sector: &Sector| {
            let (sx, sy) = sector.center(origin);
            (sx - i64::from(point.0)).abs() + (sy - i64::from(point.1)).abs()
        };
        let mid = self.sectors_per_side / 2;
        let mut best = mid * self.sectors_per_side + mid;
        let mut best_distance = distance(&self.sectors[best]);
        for (i, sector) in self.sectors.iter().enumerate() {
            let d = distance(sector);
            if d < best_distance {
                best_distance = d;
                best = i;
            }
        }
        best
    }

    /// Sector density records in the traversal order selected by `orientation`.
    #[must_use]
    pub fn rectify(&self, orientation: Orientation) -> Vec<&[Vec<f32>]> {
        orientation
            .traversal(self.sectors_per_side)
            .into_iter()
            .map(|(x, y)| self.sector(x, y).densities())
            .collect()
    }

    /// Fails unless `other` has the same sector grid and per-dimension cardinalities.
    pub fn check_shape(&self, other: &Self) -> Result<()> {
        if self.sectors_per_side != other.sectors_per_side {
            return Err(Error::mismatch(
                "sectors per side",
                self.sectors_per_side,
                other.sectors_per_side,
            ));
        }
        let (Some(a), Some(b)) = (self.sectors.first(), other.sectors.first()) else {
            return Ok(());
        };
        if a.densities.len() != b.densities.len() {
            return Err(Error::mismatch(
                "event dimensions",
                a.densities.len(),
                b.densities.len(),
            ));
        }
        for (va, vb) in a.densities.iter().zip(&b.densities) {
            if va.len() != vb.len() {
                return Err(Error::mismatch("value cardinality", va.len(), vb.len()));
            }
        }
        Ok(())
    }

    /// L1 distance between the rectified densities of two neighborhoods.
    pub fn compare(
        &self,
        orientation: Orientation,
        other: &Self,
        other_orientation: Orientation,
    ) -> Result<f32> {
        self.check_shape(other)?;
        let left = self.rectify(orientation);
        let right = other.rectify(other_orientation);
        let distance = left
            .iter()
            .zip(&right)
            .flat_map(|(a, b)| a.iter().zip(b.iter()))
            .flat_map(|(va, vb)| va.iter().zip(vb))
            .map(|(x, y)| (x - y).abs())
            .sum();
        Ok(distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighborhood(extent: u32, sector_extent: u32, duration: u32, dims: &[usize]) -> Neighborhood {
        Neighborhood::new(&NeighborhoodConfig::new(extent, sector_extent, duration), dims)
    }

    fn offsets(n: &Neighborhood) -> Vec<i32> {
        (0..n.sectors_per_side()).map(|x| n.sector(x, 0).dx).collect()
    }

    #[test]
    fn test_exact_tiling() {
        let n = neighborhood(9, 3, 1, &[1]);
        assert_eq!(n.sectors_per_side(), 3);
        assert_eq!(offsets(&n), vec![0, 3, 6]);
        assert_eq!((n.dx, n.dy), (-4, -4));
    }

    #[test]
    fn test_excess_coverage_spread_across_boundaries() {
        // k = 3 tiles of 2 cover 6 cells for an extent of 5.
        let n = neighborhood(5, 2, 1, &[1]);
        assert_eq!(n.sectors_per_side(), 3);
        assert_eq!(offsets(&n), vec![0, 2, 3]);
        let last = n.sector(2, 0);
        assert_eq!(last.dx + last.extent, 5);
    }

    #[test]
    fn test_single_tile() {
        let n = neighborhood(2, 3, 1, &[1]);
        assert_eq!(n.sectors_per_side(), 1);
        assert_eq!(offsets(&n), vec![0]);
    }

    #[test]
    fn test_sector_densities_shaped_per_dimension() {
        let n = neighborhood(3, 1, 1, &[1, 4]);
        let densities = n.sector(1, 1).densities();
        assert_eq!(densities.len(), 2);
        assert_eq!(densities[0].len(), 1);
        assert_eq!(densities[1].len(), 4);
        assert!(densities.iter().flatten().all(|&d| d == 0.0));
    }

    #[test]
    fn test_update_places_event_in_closest_sector() {
        let mut n = neighborhood(3, 1, 1, &[1]);
        let mut log = EventLog::new(0);
        log.append(&[2], 1, -1, 0);
        n.update((0, 0), &log, 0, false);

        // Origin (-1, -1): sector (2, 0) is centered at (1, -1).
        assert_eq!(n.sector(2, 0).density(0, 0), 2.0);
        let total: f32 = n.sectors().flat_map(|s| s.densities().iter().flatten()).sum();
        assert_eq!(total, 2.0);
    }

    #[test]
    fn test_update_one_hot_and_unknown() {
        let mut n = neighborhood(3, 1, 2, &[1, 3]);
        let mut log = EventLog::new(1);
        log.append(&[-1, 2], 0, 0, 0);
        log.append(&[4, 2], 0, 0, 1);
        n.update((0, 0), &log, 1, false);

        let center = n.sector(1, 1);
        assert!((center.density(0, 0) - 2.0).abs() < 1e-6);
        assert!((center.density(1, 2) - 1.0).abs() < 1e-6);
        assert_eq!(center.density(1, 0), 0.0);
    }

    #[test]
    fn test_update_binary_clamps() {
        let mut n = neighborhood(3, 1, 3, &[1, 2]);
        let mut log = EventLog::new(2);
        for t in 0..3 {
            log.append(&[5, 1], 0, 0, t);
        }
        n.update((0, 0), &log, 2, true);

        let center = n.sector(1, 1);
        assert_eq!(center.density(0, 0), 1.0);
        assert_eq!(center.density(1, 1), 1.0);
        assert_eq!(center.density(1, 0), 0.0);
    }

    #[test]
    fn test_update_ignores_events_outside_duration() {
        let mut n = neighborhood(3, 1, 1, &[1]);
        let mut log = EventLog::new(5);
        log.append(&[1], 0, 0, 0);
        n.update((0, 0), &log, 3, false);

        assert!(n.sectors().all(|s| s.density(0, 0) == 0.0));
    }

    #[test]
    fn test_mask_disables_dimension() {
        let config = NeighborhoodConfig::new(3, 1, 1).with_mask(vec![false, true]);
        let mut n = Neighborhood::new(&config, &[1, 1]);
        let mut log = EventLog::new(0);
        log.append(&[3, 4], 0, 0, 0);
        n.update((0, 0), &log, 0, false);

        assert_eq!(n.sector(1, 1).density(0, 0), 0.0);
        assert_eq!(n.sector(1, 1).density(1, 0), 4.0);
        assert!(!n.mask().is_full());
    }

    #[test]
    fn test_compare_rectifies_by_orientation() {
        let mut a = neighborhood(3, 1, 1, &[1]);
        let mut b = neighborhood(3, 1, 1, &[1]);
        a.sector_mut(0, 0).set_density(0, 0, 1.0);
        b.sector_mut(2, 2).set_density(0, 0, 1.0);

        assert_eq!(a.compare(Orientation::North, &b, Orientation::North).unwrap(), 2.0);
        assert_eq!(a.compare(Orientation::North, &b, Orientation::South).unwrap(), 0.0);
    }

    #[test]
    fn test_compare_shape_mismatch() {
        let a = neighborhood(3, 1, 1, &[1]);
        let b = neighborhood(5, 1, 1, &[1]);
        let c = neighborhood(3, 1, 1, &[2]);
        assert!(matches!(
            a.compare(Orientation::North, &b, Orientation::North),
            Err(Error::StructuralMismatch { .. })
        ));
        assert!(a.compare(Orientation::North, &c, Orientation::North).is_err());
    }
}
