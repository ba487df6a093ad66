//! Flattened metamorph dataset for offline response predictors.
//!
//! One row per stored metamorph: the rectified densities in the order
//! [`Morphognostic::compare`] walks them, then the response.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::metamorph::MetamorphStore;
use crate::morphognostic::Morphognostic;

/// Column names for the densities of `morphognostic`:
/// `<neighborhood>-<sector slot>-<dimension>-<value>`.
#[must_use]
pub fn header(morphognostic: &Morphognostic) -> Vec<String> {
    let cardinalities = &morphognostic.config().event_value_dimensions;
    let mut columns = Vec::new();
    for (i, n) in morphognostic.neighborhoods().iter().enumerate() {
        let slots = n.sectors_per_side() * n.sectors_per_side();
        for slot in 0..slots {
            for (d, &cardinality) in cardinalities.iter().enumerate() {
                for v in 0..cardinality {
                    columns.push(format!("{i}-{slot}-{d}-{v}"));
                }
            }
        }
    }
    columns
}

/// Rectified densities and response of every stored metamorph, in store order.
#[must_use]
pub fn flatten_rows(store: &MetamorphStore) -> Vec<(Vec<f32>, i32)> {
    // Use rayon to flatten nodes in parallel
    store
        .metamorphs()
        .par_iter()
        .map(|m| (m.morphognostic.rectified_densities(), m.response))
        .collect()
}

/// Writes the header and one row per metamorph. Writes nothing for an
/// empty store. Returns the number of rows.
pub fn write_csv<W: Write>(store: &MetamorphStore, writer: &mut W) -> Result<usize> {
    let Some(first) = store.get(0) else {
        return Ok(0);
    };
    let mut columns = header(&first.morphognostic);
    columns.push("response".to_string());

    let records: Vec<Vec<String>> = flatten_rows(store)
        .into_par_iter()
        .map(|(densities, response)| {
            densities
                .iter()
                .map(ToString::to_string)
                .chain(std::iter::once(response.to_string()))
                .collect()
        })
        .collect();

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&columns)?;
    for record in &records {
        csv_writer.write_record(record)?;
    }
    csv_writer.flush()?;
    Ok(records.len())
}

/// Writes the dataset to `path`.
pub fn export(store: &MetamorphStore, path: &Path) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    let rows = write_csv(store, &mut writer)?;
    info!(rows, path = %path.display(), "exported metamorph dataset");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MorphognosticConfig, NeighborhoodConfig, StoreConfig};
    use crate::morphognostic::Orientation;
    use std::sync::Arc;

    #[test]
    fn test_header_columns() {
        let config = MorphognosticConfig::new(vec![1, 2], vec![NeighborhoodConfig::new(3, 1, 1)], false)
            .unwrap();
        let m = Morphognostic::new(Orientation::North, Arc::new(config)).unwrap();
        let columns = header(&m);
        assert_eq!(columns.len(), 9 * 3);
        assert_eq!(columns[0], "0-0-0-0");
        assert_eq!(columns[2], "0-0-1-1");
        assert_eq!(columns.len(), m.rectified_densities().len());
    }

    #[test]
    fn test_empty_store_writes_nothing() {
        let store = MetamorphStore::new(StoreConfig::default());
        let mut out = Vec::new();
        assert_eq!(write_csv(&store, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }
}
