//! The metamorph store: an append-only causal memory graph.
//!
//! Every recorded step either merges into an existing node or adds a new
//! one, links the previous step's node to it, and propagates a discounted
//! goal value backward through cause links.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::io::{Read, Write};

use rand::Rng;
use tracing::{debug, info, trace};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::morphognostic::{Morphognostic, Orientation};
use crate::wire;

use super::Metamorph;

/// Heading every stored descriptor is tagged with.
pub const STORED_ORIENTATION: Orientation = Orientation::North;

/// Growable collection of metamorph nodes plus the cursor of the most
/// recently recorded node.
#[derive(Clone, Debug, Default)]
pub struct MetamorphStore {
    metamorphs: Vec<Metamorph>,
    current: Option<usize>,
    config: StoreConfig,
}

/// A goal value waiting to be applied to a node during propagation.
struct Pending {
    value: f32,
    index: usize,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl MetamorphStore {
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            metamorphs: Vec::new(),
            current: None,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.metamorphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metamorphs.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Metamorph> {
        self.metamorphs.get(index)
    }

    #[must_use]
    pub fn metamorphs(&self) -> &[Metamorph] {
        &self.metamorphs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Metamorph> {
        self.metamorphs.iter()
    }

    /// Index of the node recorded by the previous step, if any.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Forgets the previous step so the next recording starts a new chain.
    pub fn reset_cursor(&mut self) {
        self.current = None;
    }

    /// Drops every node.
    pub fn clear(&mut self) {
        self.metamorphs.clear();
        self.current = None;
    }

    /// Records one step with an empty response label. See
    /// [`update_metamorphs_named`](Self::update_metamorphs_named).
    pub fn update_metamorphs(
        &mut self,
        descriptor: &Morphognostic,
        response: i32,
        goal_value: f32,
    ) -> Result<usize> {
        self.update_metamorphs_named(descriptor, response, goal_value, "")
    }

    /// Records one step and returns the index of the node it landed on.
    ///
    /// The first node within the equivalence distance absorbs the step;
    /// otherwise a frozen copy of `descriptor` becomes a new node. The
    /// previous step's node gains an effect edge to it (once per pair) and
    /// goal value flows backward from the new edge.
    pub fn update_metamorphs_named(
        &mut self,
        descriptor: &Morphognostic,
        response: i32,
        goal_value: f32,
        response_name: &str,
    ) -> Result<usize> {
        let mut snapshot = descriptor.clone();
        snapshot.orientation = STORED_ORIENTATION;

        let mut found = None;
        for (i, m) in self.metamorphs.iter().enumerate() {
            if m.morphognostic.compare(&snapshot)? <= self.config.equivalent_distance {
                found = Some(i);
                break;
            }
        }
        let found = if let Some(i) = found {
            i
        } else {
            self.metamorphs
                .push(Metamorph::new(snapshot, response, goal_value, response_name));
            let index = self.metamorphs.len() - 1;
            debug!(index, response, goal_value, "new metamorph");
            index
        };

        if let Some(current) = self.current {
            if !self.metamorphs[current].effect_indexes.contains(&found) {
                self.metamorphs[current].effect_indexes.push(found);
                self.metamorphs[found].cause_indexes.push(current);
                debug!(cause = current, effect = found, "metamorph edge");
                let effect_goal_value = self.metamorphs[found].goal_value;
                self.propagate_goal_value(current, effect_goal_value);
            }
        }
        self.current = Some(found);
        Ok(found)
    }

    /// Raises `index` to the discounted `effect_goal_value` if that is an
    /// improvement, then repeats for its causes.
    ///
    /// Nodes are settled highest value first and at most once, so cyclic
    /// cause graphs terminate.
    fn propagate_goal_value(&mut self, index: usize, effect_goal_value: f32) {
        let discount = self.config.goal_value_discount;
        let mut settled = HashSet::new();
        let mut pending = BinaryHeap::new();
        pending.push(Pending {
            value: effect_goal_value * discount,
            index,
        });

        while let Some(Pending { value, index }) = pending.pop() {
            if !settled.insert(index) {
                continue;
            }
            let node = &mut self.metamorphs[index];
            if value <= node.goal_value {
                continue;
            }
            trace!(index, from = node.goal_value, to = value, "goal value raised");
            node.goal_value = value;
            let next = value * discount;
            for &cause in &node.cause_indexes {
                if !settled.contains(&cause) {
                    pending.push(Pending { value: next, index: cause });
                }
            }
        }
    }

    /// Node closest to `query`. Exact distance ties are replaced with
    /// probability one half. `None` when the store is empty.
    #[allow(clippy::float_cmp)]
    pub fn nearest_match<R: Rng + ?Sized>(
        &self,
        query: &Morphognostic,
        rng: &mut R,
    ) -> Result<Option<usize>> {
        let mut best: Option<(usize, f32)> = None;
        for (i, m) in self.metamorphs.iter().enumerate() {
            let distance = query.compare(&m.morphognostic)?;
            let replace = match best {
                None => true,
                Some((_, d)) => distance < d || (distance == d && rng.random_bool(0.5)),
            };
            if replace {
                best = Some((i, distance));
            }
        }
        Ok(best.map(|(i, _)| i))
    }

    /// Response of the [`nearest_match`](Self::nearest_match) node.
    pub fn nearest_response<R: Rng + ?Sized>(
        &self,
        query: &Morphognostic,
        rng: &mut R,
    ) -> Result<Option<i32>> {
        Ok(self
            .nearest_match(query, rng)?
            .map(|i| self.metamorphs[i].response))
    }

    /// Node closest to `query`, preferring the higher goal value on exact
    /// distance ties. `None` when the store is empty.
    #[allow(clippy::float_cmp)]
    pub fn goal_seeking_match(&self, query: &Morphognostic) -> Result<Option<usize>> {
        let mut best: Option<(usize, f32)> = None;
        for (i, m) in self.metamorphs.iter().enumerate() {
            let distance = m.morphognostic.compare(query)?;
            let replace = match best {
                None => true,
                Some((j, d)) => {
                    distance < d
                        || (distance == d && m.goal_value > self.metamorphs[j].goal_value)
                }
            };
            if replace {
                best = Some((i, distance));
            }
        }
        Ok(best.map(|(i, _)| i))
    }

    /// Response of the [`goal_seeking_match`](Self::goal_seeking_match) node.
    pub fn goal_seeking_response(&self, query: &Morphognostic) -> Result<Option<i32>> {
        Ok(self
            .goal_seeking_match(query)?
            .map(|i| self.metamorphs[i].response))
    }

    /// Writes the node count followed by every node.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        wire::write_usize(writer, self.metamorphs.len())?;
        for m in &self.metamorphs {
            m.save(writer)?;
        }
        writer.flush()?;
        info!(nodes = self.metamorphs.len(), "saved metamorph store");
        Ok(())
    }

    /// Reads a store written by [`save`](Self::save). The cursor starts empty.
    pub fn load<R: Read>(reader: &mut R, config: StoreConfig) -> Result<Self> {
        let count = wire::read_usize(reader, "metamorph count")?;
        let mut metamorphs = Vec::with_capacity(wire::capacity_hint(count));
        for _ in 0..count {
            metamorphs.push(Metamorph::load(reader)?);
        }
        for (i, m) in metamorphs.iter().enumerate() {
            let dangling = m
                .cause_indexes
                .iter()
                .chain(&m.effect_indexes)
                .find(|&&link| link >= count);
            if let Some(link) = dangling {
                return Err(Error::format(format!(
                    "metamorph {i} links to missing node {link}"
                )));
            }
        }
        info!(nodes = count, "loaded metamorph store");
        Ok(Self {
            metamorphs,
            current: None,
            config,
        })
    }
}
