//! Persisted layout of a morphognostic.
//!
//! Field order: neighborhood count, `(extent, sector_extent)` per
//! neighborhood, duration per neighborhood, binary aggregation flag,
//! orientation, event grid width and height, event dimension count,
//! cardinality per dimension; then per neighborhood a mask flag (and the mask
//! bits when set) followed by every density (sector `x` outer, `y` inner,
//! dimension, value); then the event log; then the event clock.

use std::io::{Read, Write};
use std::sync::Arc;

use crate::config::{MorphognosticConfig, NeighborhoodConfig};
use crate::error::{Error, Result};
use crate::wire;

use super::event_log::Event;
use super::neighborhood::DimensionMask;
use super::orientation::Orientation;
use super::Morphognostic;

fn read_u32<R: Read>(reader: &mut R, what: &str) -> Result<u32> {
    let value = wire::read_i32(reader)?;
    u32::try_from(value).map_err(|_| Error::format(format!("{what}: negative value {value}")))
}

impl Morphognostic {
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        let config = &self.config;
        wire::write_usize(writer, config.neighborhoods.len())?;
        for n in &config.neighborhoods {
            wire::write_usize(writer, n.extent as usize)?;
            wire::write_usize(writer, n.sector_extent as usize)?;
        }
        for n in &config.neighborhoods {
            wire::write_usize(writer, n.duration as usize)?;
        }
        wire::write_bool(writer, config.binary_value_aggregation)?;
        wire::write_i32(writer, self.orientation.code())?;
        wire::write_i32(writer, config.events_width)?;
        wire::write_i32(writer, config.events_height)?;
        wire::write_usize(writer, config.event_dimensions())?;
        for &cardinality in &config.event_value_dimensions {
            wire::write_usize(writer, cardinality)?;
        }

        for (n, nc) in self.neighborhoods.iter().zip(&config.neighborhoods) {
            if nc.dimension_mask.is_some() {
                wire::write_bool(writer, true)?;
                for &bit in n.mask().bits() {
                    wire::write_bool(writer, bit)?;
                }
            } else {
                wire::write_bool(writer, false)?;
            }
            for sector in n.sectors() {
                for &density in sector.densities().iter().flatten() {
                    wire::write_f32(writer, density)?;
                }
            }
        }

        wire::write_usize(writer, self.events.len())?;
        for event in self.events.iter() {
            for &value in &event.values {
                wire::write_i32(writer, value)?;
            }
            wire::write_i32(writer, event.x)?;
            wire::write_i32(writer, event.y)?;
            wire::write_i32(writer, event.time)?;
        }
        wire::write_i32(writer, self.event_time)?;
        writer.flush()?;
        Ok(())
    }

    /// Decodes a descriptor. Truncated or inconsistent input is an error;
    /// nothing is partially restored.
    pub fn load<R: Read>(reader: &mut R) -> Result<Self> {
        let count = wire::read_usize(reader, "neighborhood count")?;
        let mut shapes = Vec::with_capacity(wire::capacity_hint(count));
        for _ in 0..count {
            let extent = read_u32(reader, "neighborhood extent")?;
            let sector_extent = read_u32(reader, "sector extent")?;
            shapes.push((extent, sector_extent));
        }
        let mut neighborhoods = Vec::with_capacity(shapes.len());
        for (extent, sector_extent) in shapes {
            let duration = read_u32(reader, "neighborhood duration")?;
            neighborhoods.push(NeighborhoodConfig::new(extent, sector_extent, duration));
        }
        let binary_value_aggregation = wire::read_bool(reader, "binary aggregation flag")?;
        let orientation = Orientation::from_code(wire::read_i32(reader)?)?;
        let events_width = wire::read_i32(reader)?;
        let events_height = wire::read_i32(reader)?;
        let dimensions = wire::read_usize(reader, "event dimension count")?;
        let mut event_value_dimensions = Vec::with_capacity(wire::capacity_hint(dimensions));
        for _ in 0..dimensions {
            event_value_dimensions.push(wire::read_usize(reader, "value cardinality")?);
        }

        let config = MorphognosticConfig {
            event_value_dimensions,
            binary_value_aggregation,
            events_width,
            events_height,
            neighborhoods,
        };
        let mut m = Self::new(orientation, Arc::new(config))
            .map_err(|e| Error::format(format!("persisted structure is invalid: {e}")))?;

        let mut masks = Vec::with_capacity(m.neighborhoods.len());
        for n in &mut m.neighborhoods {
            let mask = if wire::read_bool(reader, "mask flag")? {
                let mut bits = Vec::with_capacity(dimensions);
                for _ in 0..dimensions {
                    bits.push(wire::read_bool(reader, "mask bit")?);
                }
                n.set_mask(DimensionMask::from_bits(bits.clone()));
                Some(bits)
            } else {
                None
            };
            masks.push(mask);
            for sector in n.sectors_mut() {
                for d in 0..dimensions {
                    for i in 0..sector.densities()[d].len() {
                        sector.set_density(d, i, wire::read_f32(reader)?);
                    }
                }
            }
        }
        let mut config = (*m.config).clone();
        for (nc, mask) in config.neighborhoods.iter_mut().zip(masks) {
            nc.dimension_mask = mask;
        }
        m.config = Arc::new(config);

        let len = wire::read_usize(reader, "event count")?;
        let mut events = Vec::with_capacity(wire::capacity_hint(len));
        for _ in 0..len {
            let mut values = Vec::with_capacity(dimensions);
            for _ in 0..dimensions {
                values.push(wire::read_i32(reader)?);
            }
            let x = wire::read_i32(reader)?;
            let y = wire::read_i32(reader)?;
            let time = wire::read_i32(reader)?;
            events.push(Event { values, x, y, time });
        }
        let event_time = wire::read_i32(reader)?;
        if event_time < 0 {
            return Err(Error::format(format!("negative event clock {event_time}")));
        }

        let max_age = i64::from(m.config.max_event_age());
        for event in events {
            let age = i64::from(event_time) - 1 - i64::from(event.time);
            if age < 0 || age > max_age {
                return Err(Error::format(format!(
                    "event at time {} outside the retained window before clock {event_time}",
                    event.time
                )));
            }
            m.check_event(&event.values)
                .map_err(|e| Error::format(format!("logged event: {e}")))?;
            m.events.restore(event);
        }
        m.event_time = event_time;
        Ok(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Morphognostic {
        let config = MorphognosticConfig::new(
            vec![1, 3],
            vec![
                NeighborhoodConfig::new(3, 1, 1).with_mask(vec![true, false]),
                NeighborhoodConfig::new(9, 3, 4),
            ],
            false,
        )
        .unwrap();
        let mut m = Morphognostic::new(Orientation::West, Arc::new(config)).unwrap();
        m.update(&[2, 1], 0, 0).unwrap();
        m.update(&[-1, 2], 1, 0).unwrap();
        m.update(&[5, 0], 1, 1).unwrap();
        m
    }

    #[test]
    fn test_roundtrip() {
        let m = sample();
        let mut buf = Vec::new();
        m.save(&mut buf).unwrap();
        let loaded = Morphognostic::load(&mut Cursor::new(buf)).unwrap();

        assert_eq!(loaded, m);
        assert_eq!(loaded.compare(&m).unwrap(), 0.0);
    }

    #[test]
    fn test_loaded_config_carries_masks() {
        let m = sample();
        let mut buf = Vec::new();
        m.save(&mut buf).unwrap();
        let loaded = Morphognostic::load(&mut Cursor::new(buf)).unwrap();

        let masks: Vec<_> = loaded
            .config()
            .neighborhoods
            .iter()
            .map(|n| n.dimension_mask.clone())
            .collect();
        assert_eq!(masks, vec![Some(vec![true, false]), None]);
        assert_eq!(loaded.config(), m.config());
    }

    #[test]
    fn test_header_layout() {
        let m = sample();
        let mut buf = Vec::new();
        m.save(&mut buf).unwrap();
        let mut r = Cursor::new(buf);
        assert_eq!(wire::read_i32(&mut r).unwrap(), 2);
        assert_eq!(wire::read_i32(&mut r).unwrap(), 3);
        assert_eq!(wire::read_i32(&mut r).unwrap(), 1);
        assert_eq!(wire::read_i32(&mut r).unwrap(), 9);
        assert_eq!(wire::read_i32(&mut r).unwrap(), 3);
        assert_eq!(wire::read_i32(&mut r).unwrap(), 1);
        assert_eq!(wire::read_i32(&mut r).unwrap(), 4);
        assert_eq!(wire::read_i32(&mut r).unwrap(), 0);
        assert_eq!(wire::read_i32(&mut r).unwrap(), Orientation::West.code());
    }

    #[test]
    fn test_every_truncation_fails() {
        let m = sample();
        let mut buf = Vec::new();
        m.save(&mut buf).unwrap();
        for cut in (0..buf.len()).step_by(7) {
            let result = Morphognostic::load(&mut Cursor::new(&buf[..cut]));
            assert!(result.is_err(), "truncation at {cut} decoded");
        }
    }

    #[test]
    fn test_corrupt_structure_is_format_error() {
        let mut buf = Vec::new();
        wire::write_i32(&mut buf, 1).unwrap();
        wire::write_i32(&mut buf, 0).unwrap();
        wire::write_i32(&mut buf, 1).unwrap();
        wire::write_i32(&mut buf, 1).unwrap();
        wire::write_i32(&mut buf, 0).unwrap();
        wire::write_i32(&mut buf, 0).unwrap();
        wire::write_i32(&mut buf, 0).unwrap();
        wire::write_i32(&mut buf, 0).unwrap();
        wire::write_i32(&mut buf, 1).unwrap();
        wire::write_i32(&mut buf, 1).unwrap();
        let err = Morphognostic::load(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }
}
