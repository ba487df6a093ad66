use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::config::{AgentConfig, Config, MorphognosticConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::metamorph::{MetamorphStore, NearestNeighborPredictor, ResponsePredictor};
use crate::morphognostic::{Morphognostic, Orientation};
use crate::params::NO_RESPONSE;

/// How the agent chooses its response each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Driver {
    /// Respond with the supplied response and record the step.
    #[default]
    TrainingOverride,
    /// Respond like the nearest stored metamorph.
    MetamorphDb,
    /// Ask the trained response predictor.
    MetamorphNn,
    /// Respond like the nearest stored metamorph with the highest goal value.
    GoalSeekingDb,
}

/// A learner that senses events, keeps a morphognostic of them, and
/// responds from (or trains) its metamorph store.
pub struct Agent {
    pub morphognostic: Morphognostic,
    pub metamorphs: MetamorphStore,
    pub driver: Driver,
    /// Response chosen by the last cycle.
    pub response: i32,
    predictor: Option<Box<dyn ResponsePredictor>>,
    rng: StdRng,
    config: AgentConfig,
}

impl Agent {
    /// Creates an agent facing north with an empty store.
    pub fn new(
        morphognostic: Arc<MorphognosticConfig>,
        store: StoreConfig,
        config: AgentConfig,
    ) -> Result<Self> {
        Ok(Self {
            morphognostic: Morphognostic::new(Orientation::North, morphognostic)?,
            metamorphs: MetamorphStore::new(store),
            driver: Driver::default(),
            response: NO_RESPONSE,
            predictor: None,
            rng: StdRng::seed_from_u64(config.random_seed),
            config,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            Arc::new(config.morphognostic.clone()),
            config.store.clone(),
            config.agent.clone(),
        )
    }

    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Sense/response cycle.
    ///
    /// Feeds the event into the morphognostic, picks a response according to
    /// the driver and, while training, records the step with `goal_value`.
    /// Lookups on an empty store or without a predictor yield [`NO_RESPONSE`].
    pub fn cycle(
        &mut self,
        event_values: &[i32],
        x: i32,
        y: i32,
        override_response: Option<i32>,
        goal_value: f32,
    ) -> Result<i32> {
        if self.driver == Driver::TrainingOverride && override_response.is_none() {
            return Err(Error::invalid_event("training cycle needs an override response"));
        }
        self.morphognostic.update(event_values, x, y)?;

        self.response = match self.driver {
            Driver::TrainingOverride => override_response.unwrap_or(NO_RESPONSE),
            Driver::MetamorphDb => self
                .metamorphs
                .nearest_response(&self.morphognostic, &mut self.rng)?
                .unwrap_or(NO_RESPONSE),
            Driver::MetamorphNn => self.predictor_response()?,
            Driver::GoalSeekingDb => self
                .metamorphs
                .goal_seeking_response(&self.morphognostic)?
                .unwrap_or(NO_RESPONSE),
        };

        if self.driver == Driver::TrainingOverride {
            let name = self.response_name(self.response);
            let index = self.metamorphs.update_metamorphs_named(
                &self.morphognostic,
                self.response,
                goal_value,
                &name,
            )?;
            debug!(index, response = self.response, "training step recorded");
        }
        Ok(self.response)
    }

    fn predictor_response(&self) -> Result<i32> {
        let Some(predictor) = &self.predictor else {
            warn!("no response predictor trained");
            return Ok(NO_RESPONSE);
        };
        Ok(predictor
            .predict_descriptor(&self.morphognostic)?
            .unwrap_or(NO_RESPONSE))
    }

    pub fn set_predictor(&mut self, predictor: Box<dyn ResponsePredictor>) {
        self.predictor = Some(predictor);
    }

    /// Fits a nearest-neighbor predictor on the current store.
    pub fn train_predictor(&mut self) {
        self.predictor = Some(Box::new(NearestNeighborPredictor::fit(&self.metamorphs)));
    }

    #[must_use]
    pub fn has_predictor(&self) -> bool {
        self.predictor.is_some()
    }

    /// Starts a new episode: forgets sensed events and the previous step,
    /// keeps the learned metamorphs.
    pub fn reset(&mut self) {
        self.morphognostic.clear();
        self.metamorphs.reset_cursor();
        self.response = NO_RESPONSE;
    }

    pub fn clear_metamorphs(&mut self) {
        self.metamorphs.clear();
    }

    /// Label for `response`: the configured name, its number when unnamed,
    /// `"invalid"` when negative.
    #[must_use]
    pub fn response_name(&self, response: i32) -> String {
        let Ok(index) = usize::try_from(response) else {
            return "invalid".to_string();
        };
        self.config
            .response_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| response.to_string())
    }
}
