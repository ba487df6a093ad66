#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]

//! Morphognostic spatiotemporal descriptors and a metamorph causal memory.

pub mod agent;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metamorph;
pub mod morphognostic;
pub mod params;
pub mod steps;
pub mod wire;

pub use agent::{Agent, Driver};
pub use config::Config;
pub use error::{Error, Result};
pub use metamorph::{Metamorph, MetamorphStore};
pub use morphognostic::{Morphognostic, Orientation};
