//! Environment.
use super::{Info, Step};
use anyhow::Result;

/// Represents an environment with discrete observations and actions.
///
/// Observations are indices in `[0, observation_dim)` and actions are indices
/// in `[0, action_dim)`. Conversion of observations into vectors is done by
/// the replay buffer and the agent, not by the environment.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<(usize, Self::Info)>;

    /// Performes an environment step.
    ///
    /// An action outside of `[0, action_dim)` is an error.
    fn step(&mut self, act: usize) -> Result<Step<Self>>
    where
        Self: Sized;

    /// Cardinality of the observation space.
    fn observation_dim(&self) -> usize;

    /// Number of actions.
    fn action_dim(&self) -> usize;
}
