//! Response predictors consulted instead of a direct store scan.

use crate::dataset::flatten_rows;
use crate::error::{Error, Result};
use crate::morphognostic::Morphognostic;

use super::MetamorphStore;

/// A trained mapping from flattened descriptor densities to a response.
///
/// Features are [`Morphognostic::rectified_densities`], the same ordering
/// used by the dataset export and by `compare`.
pub trait ResponsePredictor: Send + Sync {
    /// Predicted response, or `None` when the predictor has nothing to offer.
    fn predict(&self, features: &[f32]) -> Result<Option<i32>>;

    fn predict_descriptor(&self, descriptor: &Morphognostic) -> Result<Option<i32>> {
        self.predict(&descriptor.rectified_densities())
    }
}

/// One-nearest-neighbor predictor over a snapshot of a store's rows.
#[derive(Clone, Debug, Default)]
pub struct NearestNeighborPredictor {
    rows: Vec<(Vec<f32>, i32)>,
}

impl NearestNeighborPredictor {
    /// Snapshots every node of `store` as a training row.
    #[must_use]
    pub fn fit(store: &MetamorphStore) -> Self {
        Self {
            rows: flatten_rows(store),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ResponsePredictor for NearestNeighborPredictor {
    /// Response of the row at minimum L1 distance; the earliest row wins ties.
    fn predict(&self, features: &[f32]) -> Result<Option<i32>> {
        let mut best: Option<(f32, i32)> = None;
        for (row, response) in &self.rows {
            if row.len() != features.len() {
                return Err(Error::mismatch("feature length", row.len(), features.len()));
            }
            let distance: f32 = row.iter().zip(features).map(|(a, b)| (a - b).abs()).sum();
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, *response));
            }
        }
        Ok(best.map(|(_, response)| response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MorphognosticConfig, StoreConfig};
    use crate::morphognostic::Orientation;
    use std::sync::Arc;

    fn descriptor(value: i32) -> Morphognostic {
        let mut m = Morphognostic::new(Orientation::North, Arc::new(MorphognosticConfig::default())).unwrap();
        m.update(&[value], 0, 0).unwrap();
        m
    }

    #[test]
    fn test_predicts_nearest_row() {
        let mut store = MetamorphStore::new(StoreConfig::default());
        store.update_metamorphs(&descriptor(1), 10, 0.0).unwrap();
        store.update_metamorphs(&descriptor(8), 20, 0.0).unwrap();
        let predictor = NearestNeighborPredictor::fit(&store);

        assert_eq!(predictor.len(), 2);
        assert_eq!(predictor.predict_descriptor(&descriptor(2)).unwrap(), Some(10));
        assert_eq!(predictor.predict_descriptor(&descriptor(7)).unwrap(), Some(20));
    }

    #[test]
    fn test_empty_predictor() {
        let predictor = NearestNeighborPredictor::default();
        assert!(predictor.is_empty());
        assert_eq!(predictor.predict(&[0.0; 9]).unwrap(), None);
    }

    #[test]
    fn test_feature_length_mismatch() {
        let mut store = MetamorphStore::new(StoreConfig::default());
        store.update_metamorphs(&descriptor(1), 0, 0.0).unwrap();
        let predictor = NearestNeighborPredictor::fit(&store);
        assert!(predictor.predict(&[0.0; 4]).is_err());
    }
}
