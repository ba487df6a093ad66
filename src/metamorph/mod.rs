//! Metamorphs: stored associations between a descriptor snapshot, a
//! response and a goal value, linked to the nodes experienced before and
//! after them.

pub mod predictor;
pub mod store;

use std::io::{Read, Write};

pub use predictor::{NearestNeighborPredictor, ResponsePredictor};
pub use store::MetamorphStore;

use crate::error::Result;
use crate::morphognostic::Morphognostic;
use crate::wire;

/// A node of the causal memory graph.
#[derive(Clone, Debug)]
pub struct Metamorph {
    /// Frozen descriptor snapshot.
    pub morphognostic: Morphognostic,
    pub response: i32,
    pub response_name: String,
    pub goal_value: f32,
    /// Nodes experienced immediately before this one.
    pub cause_indexes: Vec<usize>,
    /// Nodes experienced immediately after this one.
    pub effect_indexes: Vec<usize>,
}

impl Metamorph {
    #[must_use]
    pub fn new(
        morphognostic: Morphognostic,
        response: i32,
        goal_value: f32,
        response_name: impl Into<String>,
    ) -> Self {
        Self {
            morphognostic,
            response,
            response_name: response_name.into(),
            goal_value,
            cause_indexes: Vec::new(),
            effect_indexes: Vec::new(),
        }
    }

    /// Same response and a descriptor at distance exactly zero.
    ///
    /// Independent of the store's equivalence threshold.
    pub fn equals(&self, other: &Self) -> Result<bool> {
        if self.response != other.response {
            return Ok(false);
        }
        Ok(self.morphognostic.compare(&other.morphognostic)? == 0.0)
    }

    /// Writes the descriptor, response, goal value, label, then the cause
    /// and effect index lists.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.morphognostic.save(writer)?;
        wire::write_i32(writer, self.response)?;
        wire::write_f32(writer, self.goal_value)?;
        wire::write_string(writer, &self.response_name)?;
        wire::write_indexes(writer, &self.cause_indexes)?;
        wire::write_indexes(writer, &self.effect_indexes)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load<R: Read>(reader: &mut R) -> Result<Self> {
        let morphognostic = Morphognostic::load(reader)?;
        let response = wire::read_i32(reader)?;
        let goal_value = wire::read_f32(reader)?;
        let response_name = wire::read_string(reader)?;
        let mut metamorph = Self::new(morphognostic, response, goal_value, response_name);
        metamorph.cause_indexes = wire::read_indexes(reader, "cause index")?;
        metamorph.effect_indexes = wire::read_indexes(reader, "effect index")?;
        Ok(metamorph)
    }
}

/// Structurally mismatched descriptors are never equal.
impl PartialEq for Metamorph {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other).unwrap_or(false)
    }
}
